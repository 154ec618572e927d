//! Repository layer for database operations

pub mod queue;

pub use queue::{QueuedFacility, SqliteFailedQueue};
