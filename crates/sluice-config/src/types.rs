use serde::{Deserialize, Serialize};

/// Declared type of a node-local variable.
///
/// Only simple primitive types are supported; `Any` disables checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
  Integer,
  Number,
  String,
  Boolean,
  List,
  Map,
  #[default]
  Any,
}

impl ValueType {
  /// Infer the type of a concrete value.
  pub fn of(value: &serde_json::Value) -> Self {
    match value {
      serde_json::Value::Bool(_) => ValueType::Boolean,
      serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => ValueType::Integer,
      serde_json::Value::Number(_) => ValueType::Number,
      serde_json::Value::String(_) => ValueType::String,
      serde_json::Value::Array(_) => ValueType::List,
      serde_json::Value::Object(_) => ValueType::Map,
      serde_json::Value::Null => ValueType::Any,
    }
  }

  /// Whether `value` already conforms to this type without coercion.
  pub fn accepts(&self, value: &serde_json::Value) -> bool {
    match self {
      ValueType::Any => true,
      // Integers are numbers too
      ValueType::Number => value.is_number(),
      other => ValueType::of(value) == *other,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      ValueType::Integer => "integer",
      ValueType::Number => "number",
      ValueType::String => "string",
      ValueType::Boolean => "boolean",
      ValueType::List => "list",
      ValueType::Map => "map",
      ValueType::Any => "any",
    }
  }
}

impl std::fmt::Display for ValueType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}
