use crate::core::allocator::AllocatorState;
use crate::domain::model::QueueEntry;
use crate::utils::error::{AllocError, EntityKind, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Read model over committed claims, ordered by sequence ascending.
///
/// Snapshots are taken under the allocator lock, so a read never observes a
/// half-applied reservation. Consumers poll; there is no push channel here.
pub struct SubmissionQueue {
    state: Arc<Mutex<AllocatorState>>,
}

impl SubmissionQueue {
    pub(crate) fn new(state: Arc<Mutex<AllocatorState>>) -> Self {
        Self { state }
    }

    /// All committed claims, oldest first.
    pub async fn list(&self) -> Vec<QueueEntry> {
        let state = self.state.lock().await;
        state
            .claims
            .iter()
            .enumerate()
            .map(|(idx, claim)| QueueEntry::from_claim(idx + 1, claim))
            .collect()
    }

    /// Claims referencing one faculty, positions within the filtered list.
    pub async fn list_for_faculty(&self, faculty_id: &str) -> Vec<QueueEntry> {
        let state = self.state.lock().await;
        state
            .claims
            .iter()
            .filter(|claim| claim.faculty_id == faculty_id)
            .enumerate()
            .map(|(idx, claim)| QueueEntry::from_claim(idx + 1, claim))
            .collect()
    }

    /// Claims referencing one domain, positions within the filtered list.
    pub async fn list_for_domain(&self, domain_id: &str) -> Vec<QueueEntry> {
        let state = self.state.lock().await;
        state
            .claims
            .iter()
            .filter(|claim| claim.domain_id == domain_id)
            .enumerate()
            .map(|(idx, claim)| QueueEntry::from_claim(idx + 1, claim))
            .collect()
    }

    /// 1-based rank of a group's committed claim in the full queue.
    pub async fn position_of(&self, group_id: &str) -> Result<usize> {
        let state = self.state.lock().await;
        state
            .claims
            .iter()
            .position(|claim| claim.group_id == group_id)
            .map(|idx| idx + 1)
            .ok_or_else(|| AllocError::NotFound {
                kind: EntityKind::Group,
                id: group_id.to_string(),
            })
    }
}
