//! Sluice Runtime
//!
//! This crate drives compiled workflows. A [`Runtime`] configures a
//! definition once and then runs it repeatedly through the caller lifecycle:
//!
//! ```text
//! configure -> initialize -> set* -> run -> get* -> (initialize | wrapup)
//! ```
//!
//! Within a run the scheduler passes over the nodes in declaration order and
//! fires every node whose inputs are available and whose previous outputs
//! have been consumed, until a pass fires nothing. Composite nodes run their
//! nested workflow to quiescence in a private store on every firing.

mod coerce;
mod config;
mod error;
mod events;
mod executor;
mod instance;
mod runtime;
mod scheduler;

pub use coerce::{check_output, coerce_input};
pub use config::RuntimeConfig;
pub use error::{NodeFault, RunError};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use instance::{LifecycleState, WorkflowInstance};
pub use runtime::Runtime;
