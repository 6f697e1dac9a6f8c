use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// An absolute, normalized slot address in a value store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowPath(String);

impl FlowPath {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for FlowPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for FlowPath {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

/// The root namespace of one workflow level.
///
/// The top-level workflow has an empty root. A workflow nested in composite
/// `node` of workflow `parent` is rooted at `<parent root>/<parent>.<node>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
  pub fn top() -> Self {
    Self::default()
  }

  pub fn root(&self) -> &str {
    &self.0
  }

  /// Namespace of the workflow owned by composite `node` of `workflow`.
  pub fn nested(&self, workflow: &str, node: &str) -> Namespace {
    Namespace(format!("{}/{}.{}", self.0, workflow, node))
  }

  /// Resolve a path declared by `node`.
  ///
  /// Rooted paths (leading `/`) resolve against this namespace; relative
  /// paths resolve against `<root>/<node>/`.
  pub fn resolve(&self, node: &str, raw: &str) -> Result<FlowPath, ConfigurationError> {
    match raw.strip_prefix('/') {
      Some(rest) => self.join(&self.0, raw, rest),
      None => self.join(&format!("{}/{}", self.0, node), raw, raw),
    }
  }

  /// Resolve a workflow-level (external) path. Relative paths are treated as
  /// rooted since there is no owning node.
  pub fn resolve_external(&self, raw: &str) -> Result<FlowPath, ConfigurationError> {
    let rest = raw.strip_prefix('/').unwrap_or(raw);
    self.join(&self.0, raw, rest)
  }

  fn join(&self, base: &str, raw: &str, rest: &str) -> Result<FlowPath, ConfigurationError> {
    let invalid = |reason: &str| ConfigurationError::InvalidPath {
      path: raw.to_string(),
      reason: reason.to_string(),
    };

    if rest.is_empty() {
      return Err(invalid("path is empty"));
    }
    if rest.ends_with('/') {
      return Err(invalid("trailing slash"));
    }
    for segment in rest.split('/') {
      match segment {
        "" => return Err(invalid("empty segment")),
        "." | ".." => return Err(invalid("relative segment")),
        _ => {}
      }
    }

    Ok(FlowPath(format!("{}/{}", base, rest)))
  }
}

impl fmt::Display for Namespace {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.0.is_empty() {
      f.write_str("/")
    } else {
      f.write_str(&self.0)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rooted_path_at_top_level() {
    let ns = Namespace::top();
    assert_eq!(ns.resolve("a", "/x").unwrap().as_str(), "/x");
    assert_eq!(ns.resolve("a", "/x/y").unwrap().as_str(), "/x/y");
  }

  #[test]
  fn test_relative_path_is_node_scoped() {
    let ns = Namespace::top();
    assert_eq!(ns.resolve("adder", "sum").unwrap().as_str(), "/adder/sum");
  }

  #[test]
  fn test_nested_namespace() {
    let ns = Namespace::top().nested("top", "multiplier");
    assert_eq!(ns.root(), "/top.multiplier");
    assert_eq!(
      ns.resolve("inner", "/product").unwrap().as_str(),
      "/top.multiplier/product"
    );
    assert_eq!(
      ns.resolve("inner", "tmp").unwrap().as_str(),
      "/top.multiplier/inner/tmp"
    );

    let deeper = ns.nested("multiplier", "inner");
    assert_eq!(deeper.root(), "/top.multiplier/multiplier.inner");
  }

  #[test]
  fn test_external_paths() {
    let ns = Namespace::top();
    assert_eq!(ns.resolve_external("/x").unwrap().as_str(), "/x");
    assert_eq!(ns.resolve_external("x").unwrap().as_str(), "/x");
  }

  #[test]
  fn test_invalid_paths() {
    let ns = Namespace::top();
    for raw in ["", "/", "/a//b", "/a/", "a/./b", "/../x"] {
      let err = ns.resolve("n", raw).unwrap_err();
      assert!(
        matches!(err, ConfigurationError::InvalidPath { .. }),
        "{raw:?} should be invalid"
      );
    }
  }
}
