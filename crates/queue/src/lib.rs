//! The notification queue.
//!
//! Tasks live in a single table keyed by collection date. The [`Enqueuer`]
//! inserts them idempotently; workers take them out one at a time through
//! [`TaskStore::claim_next`]. The store is the only coordination point
//! between the two sides.

pub mod enqueuer;
pub mod memory;
pub mod postgres;
pub mod schedule;
pub mod store;

pub use enqueuer::{Enqueuer, TriggerResult};
pub use memory::MemoryTaskStore;
pub use postgres::PgTaskStore;
pub use schedule::CollectionSchedule;
pub use store::{TaskClaim, TaskStore};
