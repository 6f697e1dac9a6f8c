//! Flow bindings between node-local names and flow paths.
//!
//! Both binding kinds accept a shorthand string form or a full object form:
//!
//! ```json
//! {
//!   "inflows": {
//!     "x": "/multiplier",
//!     "y": { "path": "/multiplicand", "receive_once": true },
//!     "scale": { "path": "/scale", "default": 1 }
//!   },
//!   "outflows": {
//!     "z": "/product",
//!     "note": { "path": "/note", "nullable": true }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a node input comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InflowDef {
  /// Shorthand: just the source path.
  Path(String),
  /// Full form with options.
  Detailed {
    path: String,
    /// Take the value once, then reuse it for every later firing of the run.
    #[serde(default)]
    receive_once: bool,
    /// The node may fire without a value on this input.
    #[serde(default)]
    optional: bool,
    /// Bound when no value is available. Implies `optional`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
  },
}

impl InflowDef {
  /// An input the node may fire without, bound to `default` when absent.
  pub fn optional(path: impl Into<String>, default: Option<Value>) -> Self {
    InflowDef::Detailed {
      path: path.into(),
      receive_once: false,
      optional: true,
      default,
    }
  }

  pub fn path(&self) -> &str {
    match self {
      InflowDef::Path(path) => path,
      InflowDef::Detailed { path, .. } => path,
    }
  }

  pub fn receive_once(&self) -> bool {
    match self {
      InflowDef::Path(_) => false,
      InflowDef::Detailed { receive_once, .. } => *receive_once,
    }
  }

  pub fn is_optional(&self) -> bool {
    match self {
      InflowDef::Path(_) => false,
      InflowDef::Detailed {
        optional, default, ..
      } => *optional || default.is_some(),
    }
  }

  pub fn default_value(&self) -> Option<&Value> {
    match self {
      InflowDef::Path(_) => None,
      InflowDef::Detailed { default, .. } => default.as_ref(),
    }
  }
}

impl From<&str> for InflowDef {
  fn from(path: &str) -> Self {
    InflowDef::Path(path.to_string())
  }
}

/// Where a node output goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutflowDef {
  /// Shorthand: just the destination path.
  Path(String),
  /// Full form with options.
  Detailed {
    path: String,
    /// A null (or missing) body output is silently not published.
    #[serde(default)]
    nullable: bool,
  },
}

impl OutflowDef {
  pub fn path(&self) -> &str {
    match self {
      OutflowDef::Path(path) => path,
      OutflowDef::Detailed { path, .. } => path,
    }
  }

  pub fn nullable(&self) -> bool {
    match self {
      OutflowDef::Path(_) => false,
      OutflowDef::Detailed { nullable, .. } => *nullable,
    }
  }
}

impl From<&str> for OutflowDef {
  fn from(path: &str) -> Self {
    OutflowDef::Path(path.to_string())
  }
}
