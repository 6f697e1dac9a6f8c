//! Sluice Config
//!
//! This crate contains the serializable workflow definition types for sluice.
//! These types describe a dataflow graph before it is configured: nodes, the
//! flow paths they read and write, and the workflow's external inflows and
//! outflows.
//!
//! Definitions can be loaded from JSON files (via the CLI) or assembled in
//! code. The resolver takes these types, validates every binding and resolves
//! flow paths into a compiled workflow ready for execution.
//!
//! # Example
//!
//! ```json
//! {
//!   "name": "top",
//!   "inflows": { "u": "/inputNumber" },
//!   "outflows": { "v": "/incrementedInputNumber" },
//!   "nodes": [
//!     {
//!       "name": "increment",
//!       "type": "leaf",
//!       "body": "increment",
//!       "types": { "value": "integer" },
//!       "inflows": { "value": "/inputNumber" },
//!       "outflows": { "result": "/incrementedInputNumber" }
//!     }
//!   ]
//! }
//! ```

mod binding;
mod node;
mod types;
mod workflow;

pub use binding::{InflowDef, OutflowDef};
pub use node::{FiringPolicy, NodeDef, NodeType};
pub use types::ValueType;
pub use workflow::WorkflowDef;
