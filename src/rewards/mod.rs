//! Reward persistence
//!
//! The session reserves rewards locally; everything that touches the
//! remote profile lives here.

pub mod memory;
pub mod store;
pub mod sync;

pub use memory::MemoryProfileStore;
pub use store::{Profile, ProfileStore, ProfileUpdate, StoreError, UserId};
pub use sync::{RewardClaim, RewardSettlement, RewardSync, RewardTicket, SyncOutcome};
