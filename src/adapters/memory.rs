use crate::domain::model::Claim;
use crate::domain::ports::ClaimStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-memory claim store, the default backing for tests and the CLI driver.
#[derive(Debug, Default)]
pub struct MemoryClaimStore {
    claims: RwLock<Vec<Claim>>,
}

impl MemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClaimStore for MemoryClaimStore {
    async fn persist(&self, claim: &Claim) -> Result<()> {
        self.claims.write().await.push(claim.clone());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Claim>> {
        Ok(self.claims.read().await.clone())
    }
}
