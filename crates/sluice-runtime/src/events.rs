//! Execution events and notifiers for observability.
//!
//! Events are emitted while a workflow instance runs so callers can observe
//! progress, collect unused-data reports, stream to a UI, etc.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// A run has started.
  RunStarted { run_id: String, workflow: String },

  /// A node has fired. `firing` counts from one within the run.
  NodeFired {
    run_id: String,
    workflow: String,
    node: String,
    firing: u64,
  },

  /// A node published a value.
  ValueOffered {
    run_id: String,
    path: String,
    producer: String,
  },

  /// A value was never taken by some of its consumers.
  UnusedData {
    run_id: String,
    path: String,
    value: serde_json::Value,
    consumers: Vec<String>,
  },

  /// A run reached quiescence successfully.
  RunCompleted { run_id: String, firings: u64 },

  /// A run has failed.
  RunFailed { run_id: String, error: String },
}

/// Trait for receiving execution events.
///
/// The runtime calls `notify` for each event; implementations decide what to
/// do with them.
pub trait ExecutionNotifier: Send + Sync {
  /// Called when an execution event occurs.
  fn notify(&self, event: ExecutionEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
///
/// The channel is unbounded so a slow consumer never blocks a run.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  /// Create a new channel notifier.
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
