use crate::domain::model::CapacitySnapshot;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Group,
    Faculty,
    Domain,
    Topic,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Group => "group",
            EntityKind::Faculty => "faculty",
            EntityKind::Domain => "domain",
            EntityKind::Topic => "topic",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum AllocError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("topic {topic_id} does not belong to domain {domain_id}")]
    InvalidTopic { topic_id: String, domain_id: String },

    #[error("group {group_id} already holds claim #{sequence}")]
    AlreadyClaimed { group_id: String, sequence: u64 },

    #[error("{}", capacity_exceeded_text(.faculty, .topic))]
    CapacityExceeded {
        faculty: Option<CapacitySnapshot>,
        topic: Option<CapacitySnapshot>,
    },

    #[error("claim storage failed: {message}")]
    Storage { message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("invalid value for {field}: {value} ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("missing required config field: {field}")]
    MissingConfig { field: String },

    #[error("config parsing error: {message}")]
    ConfigParse { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn capacity_exceeded_text(
    faculty: &Option<CapacitySnapshot>,
    topic: &Option<CapacitySnapshot>,
) -> String {
    let mut parts = Vec::new();
    if let Some(f) = faculty {
        parts.push(format!("faculty {} at capacity ({}/{})", f.id, f.current, f.max));
    }
    if let Some(t) = topic {
        parts.push(format!("topic {} at capacity ({}/{})", t.id, t.current, t.max));
    }
    if parts.is_empty() {
        "capacity exceeded".to_string()
    } else {
        parts.join(", ")
    }
}

impl AllocError {
    /// True only for internal faults worth alerting on. Rejections under
    /// contention (`CapacityExceeded`, `AlreadyClaimed`, ...) are expected
    /// outcomes and must not be logged as system errors.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            AllocError::Storage { .. } | AllocError::Io(_) | AllocError::Serialization(_)
        )
    }

    /// Message suitable for showing to the submitting group, with the
    /// current/max counts they need to pick a different option.
    pub fn user_message(&self) -> String {
        match self {
            AllocError::NotFound { kind, id } => {
                format!("The selected {} '{}' does not exist.", kind, id)
            }
            AllocError::InvalidTopic { topic_id, domain_id } => format!(
                "Topic '{}' is not offered under domain '{}'.",
                topic_id, domain_id
            ),
            AllocError::AlreadyClaimed { sequence, .. } => format!(
                "Your group already submitted a selection (queue #{}). Selections cannot be changed.",
                sequence
            ),
            AllocError::CapacityExceeded { faculty, topic } => {
                let mut parts = Vec::new();
                if let Some(f) = faculty {
                    parts.push(format!(
                        "Faculty {} has reached its maximum of {} groups ({}/{})",
                        f.name, f.max, f.current, f.max
                    ));
                }
                if let Some(t) = topic {
                    parts.push(format!(
                        "Topic {} has reached its maximum of {} groups ({}/{})",
                        t.name, t.max, t.current, t.max
                    ));
                }
                format!("{}. Please pick a different option and resubmit.", parts.join("; "))
            }
            AllocError::Storage { .. } | AllocError::Io(_) | AllocError::Serialization(_) => {
                "An internal error occurred while saving your selection. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AllocError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: &str, name: &str, current: u32, max: u32) -> CapacitySnapshot {
        CapacitySnapshot {
            id: id.to_string(),
            name: name.to_string(),
            current,
            max,
        }
    }

    #[test]
    fn test_capacity_exceeded_names_both_entities() {
        let err = AllocError::CapacityExceeded {
            faculty: Some(snapshot("F1", "Dr. Rao", 3, 3)),
            topic: Some(snapshot("T1", "Compilers", 2, 2)),
        };
        let text = err.to_string();
        assert!(text.contains("faculty F1 at capacity (3/3)"));
        assert!(text.contains("topic T1 at capacity (2/2)"));

        let user = err.user_message();
        assert!(user.contains("Dr. Rao"));
        assert!(user.contains("Compilers"));
    }

    #[test]
    fn test_fault_classification() {
        assert!(AllocError::Storage {
            message: "disk full".into()
        }
        .is_fault());
        assert!(!AllocError::AlreadyClaimed {
            group_id: "G1".into(),
            sequence: 1
        }
        .is_fault());
        assert!(!AllocError::NotFound {
            kind: EntityKind::Topic,
            id: "T9".into()
        }
        .is_fault());
    }
}
