pub mod allocator;
pub mod ledger;
pub mod queue;

pub use crate::domain::model::{
    CapacitySnapshot, Catalog, Claim, ClaimCommitted, ClaimReceipt, Group, Member, QueueEntry,
};
pub use crate::domain::ports::ClaimStore;
pub use crate::utils::error::Result;
