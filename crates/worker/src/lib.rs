pub mod worker;

pub use worker::{NotificationWorker, TickOutcome, WorkerConfig};
