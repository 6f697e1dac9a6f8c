//! Sluice Body
//!
//! A node body is the opaque computation behind a leaf node: it receives the
//! node's bound inputs (upstream values, constants and the current sequence
//! element) and returns the values for its declared outputs. The engine does
//! not care how a body is implemented.
//!
//! Bodies are looked up by name through a [`BodyRegistry`] when a workflow is
//! configured and again when a node fires. [`StaticRegistry::builtin`] comes
//! pre-populated with the bodies in [`builtin`].

mod body;
pub mod builtin;
mod error;
mod registry;

pub use body::{Bindings, NodeBody};
pub use error::BodyError;
pub use registry::{BodyRegistry, StaticRegistry};

/// A registry holding every built-in body.
pub fn builtin_registry() -> StaticRegistry {
  StaticRegistry::builtin()
}
