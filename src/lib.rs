//! FCFS topic-claim allocator for university project groups.
//!
//! Groups race to claim a (faculty, domain, topic) triple under per-faculty
//! and per-topic capacity caps, first come first served. [`CapacityLedger`]
//! holds the slot counters, [`ClaimAllocator`] runs the admission-control
//! critical section, and [`SubmissionQueue`] is the ordered read model an
//! HTTP layer polls for queue display.
//!
//! Commit order of concurrent submissions is the order they acquire the
//! allocator mutex. `sequence` records that order; wall-clock timestamps
//! are informational only.

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::ScenarioConfig;

pub use adapters::memory::MemoryClaimStore;
pub use core::allocator::ClaimAllocator;
pub use core::ledger::CapacityLedger;
pub use core::queue::SubmissionQueue;
pub use domain::model::{
    CapacitySnapshot, Catalog, Claim, ClaimCommitted, ClaimReceipt, Domain, Faculty, Group,
    Member, QueueEntry, Topic,
};
pub use domain::ports::ClaimStore;
pub use utils::error::{AllocError, EntityKind, Result};
