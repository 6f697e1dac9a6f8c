//! Type coercion for node inputs and type checks for node outputs.
//!
//! Values arriving at a typed input are accepted as-is when they already
//! conform. Strings are parsed into the declared scalar or container type,
//! and integral floats are narrowed to integers. Outputs are never coerced,
//! only checked.

use serde_json::{Number, Value};
use sluice_config::ValueType;

use crate::error::NodeFault;

/// Coerce an input value to its declared type.
pub fn coerce_input(label: &str, value: Value, expected: ValueType) -> Result<Value, NodeFault> {
  if expected.accepts(&value) {
    return Ok(value);
  }

  let coerced = match (&value, expected) {
    (Value::String(s), ValueType::Integer) => s.trim().parse::<i64>().ok().map(Value::from),
    (Value::String(s), ValueType::Number) => s
      .trim()
      .parse::<f64>()
      .ok()
      .and_then(Number::from_f64)
      .map(Value::Number),
    (Value::String(s), ValueType::Boolean) => match s.trim().to_lowercase().as_str() {
      "true" => Some(Value::Bool(true)),
      "false" => Some(Value::Bool(false)),
      _ => None,
    },
    (Value::String(s), ValueType::List) => serde_json::from_str::<Value>(s)
      .ok()
      .filter(Value::is_array),
    (Value::String(s), ValueType::Map) => serde_json::from_str::<Value>(s)
      .ok()
      .filter(Value::is_object),
    (Value::Number(n), ValueType::Integer) => n
      .as_f64()
      .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
      .map(|f| Value::from(f as i64)),
    _ => None,
  };

  coerced.ok_or_else(|| NodeFault::InputType {
    label: label.to_string(),
    expected,
    actual: value,
  })
}

/// Check that an output value conforms to its declared type.
pub fn check_output(label: &str, value: &Value, expected: ValueType) -> Result<(), NodeFault> {
  if expected.accepts(value) {
    Ok(())
  } else {
    Err(NodeFault::OutputType {
      label: label.to_string(),
      expected,
      actual: value.clone(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_conforming_values_pass_through() {
    assert_eq!(coerce_input("x", json!(3), ValueType::Integer).unwrap(), json!(3));
    assert_eq!(coerce_input("x", json!(3), ValueType::Number).unwrap(), json!(3));
    assert_eq!(coerce_input("x", json!("s"), ValueType::Any).unwrap(), json!("s"));
  }

  #[test]
  fn test_coerce_integer() {
    assert_eq!(coerce_input("count", json!("42"), ValueType::Integer).unwrap(), json!(42));
    assert_eq!(coerce_input("count", json!(4.0), ValueType::Integer).unwrap(), json!(4));
  }

  #[test]
  fn test_coerce_number() {
    assert_eq!(coerce_input("price", json!("19.99"), ValueType::Number).unwrap(), json!(19.99));
  }

  #[test]
  fn test_coerce_boolean() {
    assert_eq!(coerce_input("on", json!("true"), ValueType::Boolean).unwrap(), json!(true));
    assert_eq!(coerce_input("on", json!("FALSE"), ValueType::Boolean).unwrap(), json!(false));
  }

  #[test]
  fn test_coerce_list_and_map() {
    assert_eq!(
      coerce_input("items", json!("[1, 2, 3]"), ValueType::List).unwrap(),
      json!([1, 2, 3])
    );
    assert_eq!(
      coerce_input("config", json!(r#"{"key": "value"}"#), ValueType::Map).unwrap(),
      json!({"key": "value"})
    );
  }

  #[test]
  fn test_coerce_invalid_integer() {
    let err = coerce_input("count", json!("not a number"), ValueType::Integer).unwrap_err();
    assert!(matches!(err, NodeFault::InputType { label, .. } if label == "count"));
    assert!(coerce_input("count", json!(1.5), ValueType::Integer).is_err());
  }

  #[test]
  fn test_coerce_invalid_boolean() {
    assert!(coerce_input("flag", json!("yes"), ValueType::Boolean).is_err());
  }

  #[test]
  fn test_list_string_must_parse_to_array() {
    assert!(coerce_input("items", json!(r#"{"a": 1}"#), ValueType::List).is_err());
  }

  #[test]
  fn test_check_output() {
    assert!(check_output("y", &json!("text"), ValueType::String).is_ok());
    let err = check_output("y", &json!("text"), ValueType::Integer).unwrap_err();
    assert!(matches!(err, NodeFault::OutputType { .. }));
  }
}
