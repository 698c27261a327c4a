use crate::utils::error::{AllocError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub roll_number: String,
    pub name: String,
    #[serde(default)]
    pub leader: bool,
}

/// A project group as handed over by the (out-of-scope) group-formation
/// flow. Immutable from the allocator's point of view. Fields are private
/// so the size and single-leader rules checked in [`Group::new`] cannot be
/// bypassed.
#[derive(Debug, Clone)]
pub struct Group {
    id: String,
    members: Vec<Member>,
}

impl Group {
    pub fn new(id: impl Into<String>, members: Vec<Member>) -> Result<Self> {
        let id = id.into();
        if !matches!(members.len(), 2 | 4) {
            return Err(AllocError::Validation {
                message: format!(
                    "group {} must have 2 or 4 members, got {}",
                    id,
                    members.len()
                ),
            });
        }
        let leaders = members.iter().filter(|m| m.leader).count();
        if leaders != 1 {
            return Err(AllocError::Validation {
                message: format!("group {} must have exactly one leader, got {}", id, leaders),
            });
        }
        let mut rolls: Vec<&str> = members.iter().map(|m| m.roll_number.as_str()).collect();
        rolls.sort_unstable();
        if rolls.windows(2).any(|w| w[0] == w[1]) {
            return Err(AllocError::Validation {
                message: format!("group {} has duplicate roll numbers", id),
            });
        }
        Ok(Self { id, members })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn leader(&self) -> &Member {
        // invariant established in new(): exactly one leader
        self.members
            .iter()
            .find(|m| m.leader)
            .unwrap_or(&self.members[0])
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }
}

fn default_max_groups() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faculty {
    pub id: String,
    pub name: String,
    #[serde(default = "default_max_groups")]
    pub max_groups: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub domain_id: String,
    #[serde(default = "default_max_groups")]
    pub max_groups: u32,
}

/// Immutable faculty/domain/topic definitions, as supplied by the
/// admin-managed catalog. The allocator never mutates these; live counts
/// belong to the capacity ledger.
#[derive(Debug, Clone)]
pub struct Catalog {
    faculties: HashMap<String, Faculty>,
    domains: HashMap<String, Domain>,
    topics: HashMap<String, Topic>,
}

impl Catalog {
    pub fn new(faculties: Vec<Faculty>, domains: Vec<Domain>, topics: Vec<Topic>) -> Result<Self> {
        let domains: HashMap<String, Domain> =
            domains.into_iter().map(|d| (d.id.clone(), d)).collect();
        for topic in &topics {
            if !domains.contains_key(&topic.domain_id) {
                return Err(AllocError::Validation {
                    message: format!(
                        "topic {} references unknown domain {}",
                        topic.id, topic.domain_id
                    ),
                });
            }
        }
        Ok(Self {
            faculties: faculties.into_iter().map(|f| (f.id.clone(), f)).collect(),
            domains,
            topics: topics.into_iter().map(|t| (t.id.clone(), t)).collect(),
        })
    }

    pub fn faculty(&self, id: &str) -> Option<&Faculty> {
        self.faculties.get(id)
    }

    pub fn domain(&self, id: &str) -> Option<&Domain> {
        self.domains.get(id)
    }

    pub fn topic(&self, id: &str) -> Option<&Topic> {
        self.topics.get(id)
    }

    pub fn faculties(&self) -> impl Iterator<Item = &Faculty> {
        self.faculties.values()
    }

    pub fn topics(&self) -> impl Iterator<Item = &Topic> {
        self.topics.values()
    }
}

/// Immutable record of a group's successful selection. `sequence` is the
/// FCFS order; `submitted_at` is informational only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub group_id: String,
    pub faculty_id: String,
    pub domain_id: String,
    pub topic_id: String,
    pub submitted_at: DateTime<Utc>,
    pub sequence: u64,
}

/// Point-in-time current/max counts for a faculty or topic, used both in
/// rejection reasons and in "N slots left" capacity reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacitySnapshot {
    pub id: String,
    pub name: String,
    pub current: u32,
    pub max: u32,
}

impl CapacitySnapshot {
    pub fn available_slots(&self) -> u32 {
        self.max.saturating_sub(self.current)
    }

    pub fn is_available(&self) -> bool {
        self.current < self.max
    }
}

/// Success payload of a submission, shaped for the HTTP layer.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimReceipt {
    pub sequence: u64,
    pub submitted_at: DateTime<Utc>,
    pub queue_position: usize,
}

/// One row of the submission queue view.
#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry {
    pub position: usize,
    pub group_id: String,
    pub faculty_id: String,
    pub domain_id: String,
    pub topic_id: String,
    pub sequence: u64,
    pub submitted_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn from_claim(position: usize, claim: &Claim) -> Self {
        Self {
            position,
            group_id: claim.group_id.clone(),
            faculty_id: claim.faculty_id.clone(),
            domain_id: claim.domain_id.clone(),
            topic_id: claim.topic_id.clone(),
            sequence: claim.sequence,
            submitted_at: claim.submitted_at,
        }
    }
}

/// Event broadcast after a claim is committed.
#[derive(Debug, Clone)]
pub struct ClaimCommitted {
    pub claim: Claim,
}
