//! Sluice Workflow
//!
//! This crate provides the compiled workflow representation for sluice.
//! A compiled workflow is the validated, resolved form of a
//! [`sluice_config::WorkflowDef`] that is ready to be instantiated.
//!
//! Key differences from `sluice-config`:
//! - Every node-local name is bound to an absolute [`FlowPath`]
//! - Anonymous nodes are named and firing limits are computed
//! - Composite nodes own a nested compiled [`Workflow`] whose external flows
//!   are the composite's boundary
//! - Producer and consumer tables are available through [`Graph`]

mod error;
mod graph;
mod node;
mod path;
mod workflow;

pub use error::ConfigurationError;
pub use graph::{Endpoint, Graph};
pub use node::{InputBinding, Node, NodeKind, OutputBinding};
pub use path::{FlowPath, Namespace};
pub use workflow::Workflow;
