use crate::core::ledger::CapacityLedger;
use crate::core::queue::SubmissionQueue;
use crate::domain::model::{
    Catalog, Claim, ClaimCommitted, ClaimReceipt, CapacitySnapshot, Group,
};
use crate::domain::ports::ClaimStore;
use crate::utils::error::{AllocError, EntityKind, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Mutable allocator state. Everything here is only ever touched while
/// holding the allocator mutex.
#[derive(Debug)]
pub(crate) struct AllocatorState {
    pub(crate) ledger: CapacityLedger,
    /// group id -> sequence of its committed claim
    pub(crate) committed: HashMap<String, u64>,
    /// committed claims in sequence order (the queue read model)
    pub(crate) claims: Vec<Claim>,
    pub(crate) next_sequence: u64,
}

/// Admission control for one-time (faculty, domain, topic) selections.
///
/// FCFS tie-break rule: the commit order of concurrent submissions is the
/// order in which they acquire the allocator mutex, and `sequence` records
/// exactly that order. There is no ordering guarantee tied to network
/// arrival or wall-clock timestamps; `submitted_at` is informational only.
pub struct ClaimAllocator<S: ClaimStore> {
    catalog: Catalog,
    groups: HashMap<String, Group>,
    store: S,
    state: Arc<Mutex<AllocatorState>>,
    events: broadcast::Sender<ClaimCommitted>,
}

impl<S: ClaimStore> ClaimAllocator<S> {
    pub fn new(catalog: Catalog, groups: Vec<Group>, store: S) -> Result<Self> {
        let mut group_map = HashMap::with_capacity(groups.len());
        for group in groups {
            if group_map.insert(group.id().to_string(), group).is_some() {
                return Err(AllocError::Validation {
                    message: "duplicate group id in roster".to_string(),
                });
            }
        }
        let ledger = CapacityLedger::from_catalog(&catalog);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            catalog,
            groups: group_map,
            store,
            state: Arc::new(Mutex::new(AllocatorState {
                ledger,
                committed: HashMap::new(),
                claims: Vec::new(),
                next_sequence: 0,
            })),
            events,
        })
    }

    /// Validate and commit a group's one-time selection.
    ///
    /// The critical section covers the already-claimed check, the capacity
    /// reserve, sequence assignment and the claim write. If the claim write
    /// fails, or this future is dropped while awaiting it, the reservation
    /// is rolled back so the ledger never drifts from the persisted claims.
    pub async fn submit(
        &self,
        group_id: &str,
        faculty_id: &str,
        domain_id: &str,
        topic_id: &str,
    ) -> Result<ClaimReceipt> {
        if !self.groups.contains_key(group_id) {
            return Err(AllocError::NotFound {
                kind: EntityKind::Group,
                id: group_id.to_string(),
            });
        }
        self.catalog
            .faculty(faculty_id)
            .ok_or_else(|| AllocError::NotFound {
                kind: EntityKind::Faculty,
                id: faculty_id.to_string(),
            })?;
        self.catalog
            .domain(domain_id)
            .ok_or_else(|| AllocError::NotFound {
                kind: EntityKind::Domain,
                id: domain_id.to_string(),
            })?;
        let topic = self
            .catalog
            .topic(topic_id)
            .ok_or_else(|| AllocError::NotFound {
                kind: EntityKind::Topic,
                id: topic_id.to_string(),
            })?;
        if topic.domain_id != domain_id {
            return Err(AllocError::InvalidTopic {
                topic_id: topic_id.to_string(),
                domain_id: domain_id.to_string(),
            });
        }

        let mut state = self.state.lock().await;
        if let Some(&sequence) = state.committed.get(group_id) {
            return Err(AllocError::AlreadyClaimed {
                group_id: group_id.to_string(),
                sequence,
            });
        }

        let AllocatorState {
            ledger,
            committed,
            claims,
            next_sequence,
        } = &mut *state;

        if let Err(e) = ledger.reserve(faculty_id, topic_id) {
            tracing::debug!(group = group_id, error = %e, "submission rejected");
            return Err(e);
        }

        let sequence = *next_sequence + 1;
        let claim = Claim {
            group_id: group_id.to_string(),
            faculty_id: faculty_id.to_string(),
            domain_id: domain_id.to_string(),
            topic_id: topic_id.to_string(),
            submitted_at: Utc::now(),
            sequence,
        };

        let guard = ReservationGuard::new(ledger, faculty_id, topic_id);
        if let Err(e) = self.store.persist(&claim).await {
            // guard rolls the reservation back on drop
            tracing::error!(group = group_id, error = %e, "claim write failed, rolling back reservation");
            return Err(AllocError::Storage {
                message: e.to_string(),
            });
        }
        guard.commit();

        *next_sequence = sequence;
        committed.insert(group_id.to_string(), sequence);
        claims.push(claim.clone());
        let queue_position = claims.len();
        drop(state);

        // absent or lagging subscribers must never fail a commit
        let _ = self.events.send(ClaimCommitted {
            claim: claim.clone(),
        });
        tracing::info!(
            group = group_id,
            faculty = faculty_id,
            topic = topic_id,
            sequence,
            "claim committed"
        );

        Ok(ClaimReceipt {
            sequence,
            submitted_at: claim.submitted_at,
            queue_position,
        })
    }

    /// Read model over committed claims, sharing this allocator's state.
    pub fn queue(&self) -> SubmissionQueue {
        SubmissionQueue::new(Arc::clone(&self.state))
    }

    /// Subscribe to claim-committed events.
    pub fn events(&self) -> broadcast::Receiver<ClaimCommitted> {
        self.events.subscribe()
    }

    pub async fn faculty_capacity(&self, faculty_id: &str) -> Result<CapacitySnapshot> {
        self.state.lock().await.ledger.faculty_snapshot(faculty_id)
    }

    pub async fn topic_capacity(&self, topic_id: &str) -> Result<CapacitySnapshot> {
        self.state.lock().await.ledger.topic_snapshot(topic_id)
    }

    /// Faculties that still have room, for selection screens.
    pub async fn available_faculties(&self) -> Vec<CapacitySnapshot> {
        self.state
            .lock()
            .await
            .ledger
            .faculty_snapshots()
            .into_iter()
            .filter(CapacitySnapshot::is_available)
            .collect()
    }

    /// Recompute per-entity committed-claim counts from the store and
    /// compare them with the ledger counters. Any drift is a fault.
    pub async fn verify_recount(&self) -> Result<()> {
        let persisted = self.store.load_all().await?;
        let mut faculty_counts: HashMap<&str, u32> = HashMap::new();
        let mut topic_counts: HashMap<&str, u32> = HashMap::new();
        for claim in &persisted {
            *faculty_counts.entry(claim.faculty_id.as_str()).or_default() += 1;
            *topic_counts.entry(claim.topic_id.as_str()).or_default() += 1;
        }

        let state = self.state.lock().await;
        for snap in state.ledger.faculty_snapshots() {
            let recount = faculty_counts.get(snap.id.as_str()).copied().unwrap_or(0);
            if snap.current != recount {
                return Err(AllocError::Storage {
                    message: format!(
                        "ledger drift for faculty {}: counter {} vs recount {}",
                        snap.id, snap.current, recount
                    ),
                });
            }
        }
        for snap in state.ledger.topic_snapshots() {
            let recount = topic_counts.get(snap.id.as_str()).copied().unwrap_or(0);
            if snap.current != recount {
                return Err(AllocError::Storage {
                    message: format!(
                        "ledger drift for topic {}: counter {} vs recount {}",
                        snap.id, snap.current, recount
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Rolls a reservation back on drop unless the claim write landed. Keeps
/// `reserve` all-or-nothing even when the submitting task is cancelled
/// mid-await.
struct ReservationGuard<'a> {
    ledger: &'a mut CapacityLedger,
    faculty_id: &'a str,
    topic_id: &'a str,
    armed: bool,
}

impl<'a> ReservationGuard<'a> {
    fn new(ledger: &'a mut CapacityLedger, faculty_id: &'a str, topic_id: &'a str) -> Self {
        Self {
            ledger,
            faculty_id,
            topic_id,
            armed: true,
        }
    }

    fn commit(mut self) {
        self.armed = false;
    }
}

impl Drop for ReservationGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.ledger.release(self.faculty_id, self.topic_id);
        }
    }
}
