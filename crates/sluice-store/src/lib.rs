//! Sluice Store
//!
//! This crate provides the value store that carries data between nodes during
//! a workflow run. Each slot is addressed by an absolute [`FlowPath`].
//!
//! A value offered to a path is delivered once to every consumer subscribed
//! to that path and disappears once the last of them has taken it. A path can
//! hold at most one undelivered value at a time.
//!
//! The store lives in memory for the duration of one run and is never shared
//! between workflow instances.

mod store;
mod types;

pub use store::ValueStore;
pub use types::PendingValue;

use sluice_workflow::{Endpoint, FlowPath};

/// Error type for store operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
  /// No value is pending at the path for this consumer.
  #[error("no value ready at {path} for {consumer}")]
  NotReady { path: FlowPath, consumer: Endpoint },

  /// The path still holds a value that has not been fully consumed.
  #[error("duplicate write to {path} by {producer}: value from {holder} not yet consumed")]
  DuplicateWrite {
    path: FlowPath,
    producer: Endpoint,
    holder: Endpoint,
  },
}
