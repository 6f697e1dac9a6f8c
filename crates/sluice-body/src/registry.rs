use std::collections::HashMap;
use std::sync::Arc;

use crate::body::NodeBody;
use crate::builtin;

/// Registry of named node bodies.
pub trait BodyRegistry: Send + Sync {
  /// Look up a body by name.
  fn get(&self, name: &str) -> Option<Arc<dyn NodeBody>>;

  /// Names of all registered bodies, sorted.
  fn names(&self) -> Vec<String>;
}

impl<T: BodyRegistry + ?Sized> BodyRegistry for Arc<T> {
  fn get(&self, name: &str) -> Option<Arc<dyn NodeBody>> {
    (**self).get(name)
  }

  fn names(&self) -> Vec<String> {
    (**self).names()
  }
}

/// An in-memory registry populated up front.
#[derive(Clone, Default)]
pub struct StaticRegistry {
  bodies: HashMap<String, Arc<dyn NodeBody>>,
}

impl StaticRegistry {
  /// Create an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a registry holding every built-in body.
  pub fn builtin() -> Self {
    let mut registry = Self::new();
    builtin::register_all(&mut registry);
    registry
  }

  /// Register a body under `name`, replacing any previous body of that name.
  pub fn register(&mut self, name: impl Into<String>, body: impl NodeBody + 'static) -> &mut Self {
    self.bodies.insert(name.into(), Arc::new(body));
    self
  }

  /// Builder-style variant of [`register`](Self::register).
  pub fn with(mut self, name: impl Into<String>, body: impl NodeBody + 'static) -> Self {
    self.register(name, body);
    self
  }
}

impl BodyRegistry for StaticRegistry {
  fn get(&self, name: &str) -> Option<Arc<dyn NodeBody>> {
    self.bodies.get(name).cloned()
  }

  fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.bodies.keys().cloned().collect();
    names.sort();
    names
  }
}

impl std::fmt::Debug for StaticRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StaticRegistry")
      .field("bodies", &self.names())
      .finish()
  }
}
