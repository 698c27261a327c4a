use crate::domain::model::{CapacitySnapshot, Catalog};
use crate::utils::error::{AllocError, EntityKind, Result};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    current: u32,
    max: u32,
}

impl Slot {
    fn has_room(&self) -> bool {
        self.current < self.max
    }

    fn snapshot(&self, id: &str) -> CapacitySnapshot {
        CapacitySnapshot {
            id: id.to_string(),
            name: self.name.clone(),
            current: self.current,
            max: self.max,
        }
    }
}

/// Authoritative current-vs-max counters per faculty and per topic.
///
/// The ledger itself is not synchronized; callers must mutate it only inside
/// the allocator's critical section. `reserve` checks and increments both
/// counters as one unit, so a check-then-act race between two submissions is
/// impossible as long as that single-writer rule holds.
#[derive(Debug)]
pub struct CapacityLedger {
    faculties: HashMap<String, Slot>,
    topics: HashMap<String, Slot>,
}

impl CapacityLedger {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let faculties = catalog
            .faculties()
            .map(|f| {
                (
                    f.id.clone(),
                    Slot {
                        name: f.name.clone(),
                        current: 0,
                        max: f.max_groups,
                    },
                )
            })
            .collect();
        let topics = catalog
            .topics()
            .map(|t| {
                (
                    t.id.clone(),
                    Slot {
                        name: t.name.clone(),
                        current: 0,
                        max: t.max_groups,
                    },
                )
            })
            .collect();
        Self { faculties, topics }
    }

    pub fn has_faculty_capacity(&self, faculty_id: &str) -> Result<bool> {
        self.faculties
            .get(faculty_id)
            .map(Slot::has_room)
            .ok_or_else(|| AllocError::NotFound {
                kind: EntityKind::Faculty,
                id: faculty_id.to_string(),
            })
    }

    pub fn has_topic_capacity(&self, topic_id: &str) -> Result<bool> {
        self.topics
            .get(topic_id)
            .map(Slot::has_room)
            .ok_or_else(|| AllocError::NotFound {
                kind: EntityKind::Topic,
                id: topic_id.to_string(),
            })
    }

    /// Increment both counters, or neither. On rejection the error names
    /// every entity that was full, with its observed counts.
    pub fn reserve(&mut self, faculty_id: &str, topic_id: &str) -> Result<()> {
        let faculty = self
            .faculties
            .get_mut(faculty_id)
            .ok_or_else(|| AllocError::NotFound {
                kind: EntityKind::Faculty,
                id: faculty_id.to_string(),
            })?;
        let topic = self
            .topics
            .get_mut(topic_id)
            .ok_or_else(|| AllocError::NotFound {
                kind: EntityKind::Topic,
                id: topic_id.to_string(),
            })?;

        let faculty_full = (!faculty.has_room()).then(|| faculty.snapshot(faculty_id));
        let topic_full = (!topic.has_room()).then(|| topic.snapshot(topic_id));
        if faculty_full.is_some() || topic_full.is_some() {
            return Err(AllocError::CapacityExceeded {
                faculty: faculty_full,
                topic: topic_full,
            });
        }

        faculty.current += 1;
        topic.current += 1;
        Ok(())
    }

    /// Compensating decrement for a reservation whose claim write failed.
    /// Saturating; unknown ids are ignored (the matching reserve succeeded,
    /// so they cannot occur outside tests).
    pub fn release(&mut self, faculty_id: &str, topic_id: &str) {
        if let Some(faculty) = self.faculties.get_mut(faculty_id) {
            faculty.current = faculty.current.saturating_sub(1);
        }
        if let Some(topic) = self.topics.get_mut(topic_id) {
            topic.current = topic.current.saturating_sub(1);
        }
    }

    pub fn faculty_snapshot(&self, faculty_id: &str) -> Result<CapacitySnapshot> {
        self.faculties
            .get(faculty_id)
            .map(|slot| slot.snapshot(faculty_id))
            .ok_or_else(|| AllocError::NotFound {
                kind: EntityKind::Faculty,
                id: faculty_id.to_string(),
            })
    }

    pub fn topic_snapshot(&self, topic_id: &str) -> Result<CapacitySnapshot> {
        self.topics
            .get(topic_id)
            .map(|slot| slot.snapshot(topic_id))
            .ok_or_else(|| AllocError::NotFound {
                kind: EntityKind::Topic,
                id: topic_id.to_string(),
            })
    }

    /// Snapshots of all faculties, sorted by id for stable output.
    pub fn faculty_snapshots(&self) -> Vec<CapacitySnapshot> {
        let mut snaps: Vec<CapacitySnapshot> = self
            .faculties
            .iter()
            .map(|(id, slot)| slot.snapshot(id))
            .collect();
        snaps.sort_by(|a, b| a.id.cmp(&b.id));
        snaps
    }

    pub fn topic_snapshots(&self) -> Vec<CapacitySnapshot> {
        let mut snaps: Vec<CapacitySnapshot> = self
            .topics
            .iter()
            .map(|(id, slot)| slot.snapshot(id))
            .collect();
        snaps.sort_by(|a, b| a.id.cmp(&b.id));
        snaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Domain, Faculty, Topic};

    fn ledger() -> CapacityLedger {
        let catalog = Catalog::new(
            vec![
                Faculty {
                    id: "F1".into(),
                    name: "Dr. Rao".into(),
                    max_groups: 1,
                },
                Faculty {
                    id: "F2".into(),
                    name: "Dr. Iyer".into(),
                    max_groups: 5,
                },
            ],
            vec![Domain {
                id: "D1".into(),
                name: "Systems".into(),
            }],
            vec![
                Topic {
                    id: "T1".into(),
                    name: "Schedulers".into(),
                    domain_id: "D1".into(),
                    max_groups: 3,
                },
                Topic {
                    id: "T2".into(),
                    name: "Filesystems".into(),
                    domain_id: "D1".into(),
                    max_groups: 2,
                },
            ],
        )
        .unwrap();
        CapacityLedger::from_catalog(&catalog)
    }

    #[test]
    fn test_reserve_increments_both_counters() {
        let mut ledger = ledger();
        ledger.reserve("F1", "T1").unwrap();

        let faculty = ledger.faculty_snapshot("F1").unwrap();
        let topic = ledger.topic_snapshot("T1").unwrap();
        assert_eq!((faculty.current, faculty.max), (1, 1));
        assert_eq!((topic.current, topic.max), (1, 3));
        assert!(!ledger.has_faculty_capacity("F1").unwrap());
        assert!(ledger.has_topic_capacity("T1").unwrap());
    }

    #[test]
    fn test_reserve_rejects_when_faculty_full_without_touching_topic() {
        let mut ledger = ledger();
        ledger.reserve("F1", "T1").unwrap();

        let err = ledger.reserve("F1", "T1").unwrap_err();
        match err {
            crate::utils::error::AllocError::CapacityExceeded { faculty, topic } => {
                let faculty = faculty.expect("faculty side must be reported");
                assert_eq!((faculty.current, faculty.max), (1, 1));
                assert!(topic.is_none());
            }
            other => panic!("expected CapacityExceeded, got {other:?}"),
        }
        // failed reserve must not move the topic counter
        assert_eq!(ledger.topic_snapshot("T1").unwrap().current, 1);
    }

    #[test]
    fn test_reserve_reports_both_when_both_full() {
        let mut ledger = ledger();
        ledger.reserve("F1", "T2").unwrap();
        ledger.reserve("F2", "T2").unwrap();

        let err = ledger.reserve("F1", "T2").unwrap_err();
        match err {
            crate::utils::error::AllocError::CapacityExceeded { faculty, topic } => {
                assert!(faculty.is_some());
                assert!(topic.is_some());
            }
            other => panic!("expected CapacityExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_release_compensates_reserve() {
        let mut ledger = ledger();
        ledger.reserve("F1", "T1").unwrap();
        ledger.release("F1", "T1");

        assert_eq!(ledger.faculty_snapshot("F1").unwrap().current, 0);
        assert_eq!(ledger.topic_snapshot("T1").unwrap().current, 0);
        // saturating: a stray release never underflows
        ledger.release("F1", "T1");
        assert_eq!(ledger.faculty_snapshot("F1").unwrap().current, 0);
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let mut ledger = ledger();
        assert!(ledger.has_faculty_capacity("F9").is_err());
        assert!(ledger.has_topic_capacity("T9").is_err());
        assert!(ledger.reserve("F9", "T1").is_err());
        assert!(ledger.reserve("F1", "T9").is_err());
        // failed not-found reserve must not move any counter
        assert_eq!(ledger.faculty_snapshot("F1").unwrap().current, 0);
    }

    #[test]
    fn test_capacity_invariant_holds_under_exhaustion() {
        let mut ledger = ledger();
        let mut committed = 0;
        while ledger.reserve("F2", "T1").is_ok() {
            committed += 1;
        }
        assert_eq!(committed, 3); // T1 max

        for snap in ledger
            .faculty_snapshots()
            .into_iter()
            .chain(ledger.topic_snapshots())
        {
            assert!(snap.current <= snap.max, "{} over capacity", snap.id);
        }
    }
}
