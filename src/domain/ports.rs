use crate::domain::model::Claim;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Persistence port for committed claims. Claim records are the source of
/// truth for "who holds what"; the ledger counters must always equal a
/// recount of what this store holds.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn persist(&self, claim: &Claim) -> Result<()>;
    async fn load_all(&self) -> Result<Vec<Claim>>;
}
