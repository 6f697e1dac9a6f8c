//! Built-in bodies.
//!
//! | name        | inputs                                  | outputs   |
//! |-------------|-----------------------------------------|-----------|
//! | `identity`  | anything                                | the same  |
//! | `increment` | `value` (number)                        | `result`  |
//! | `add`       | every binding (numbers)                 | `sum`     |
//! | `multiply`  | every binding (numbers)                 | `product` |
//! | `concat`    | every binding except `separator`        | `text`    |
//! | `template`  | `template` (string), the rest as context| `text`    |
//! | `print`     | anything, logged at info level          | the same  |
//! | `count`     | `items` (list, map or string)           | `count`   |
//!
//! Arithmetic stays in integers while every operand is an integer and falls
//! back to floating point otherwise.

use serde_json::{Number, Value};
use tracing::info;

use crate::body::Bindings;
use crate::error::BodyError;
use crate::registry::StaticRegistry;

pub(crate) fn register_all(registry: &mut StaticRegistry) {
  registry
    .register("identity", identity)
    .register("increment", increment)
    .register("add", add)
    .register("multiply", multiply)
    .register("concat", concat)
    .register("template", template)
    .register("print", print)
    .register("count", count);
}

pub fn identity(inputs: &Bindings) -> Result<Bindings, BodyError> {
  Ok(inputs.clone())
}

pub fn increment(inputs: &Bindings) -> Result<Bindings, BodyError> {
  let value = required(inputs, "value")?;
  let result = fold_numbers([("value", value)], Operand::Int(1), i64::checked_add, |a, b| a + b)?;
  Ok(single("result", result))
}

pub fn add(inputs: &Bindings) -> Result<Bindings, BodyError> {
  let operands = inputs.iter().map(|(name, value)| (name.as_str(), value));
  let sum = fold_numbers(operands, Operand::Int(0), i64::checked_add, |a, b| a + b)?;
  Ok(single("sum", sum))
}

pub fn multiply(inputs: &Bindings) -> Result<Bindings, BodyError> {
  let operands = inputs.iter().map(|(name, value)| (name.as_str(), value));
  let product = fold_numbers(operands, Operand::Int(1), i64::checked_mul, |a, b| a * b)?;
  Ok(single("product", product))
}

pub fn concat(inputs: &Bindings) -> Result<Bindings, BodyError> {
  let separator = match inputs.get("separator") {
    None => "",
    Some(Value::String(s)) => s.as_str(),
    Some(other) => return Err(invalid("separator", "string", other)),
  };

  let parts: Vec<String> = inputs
    .iter()
    .filter(|(name, _)| name.as_str() != "separator")
    .map(|(_, value)| match value {
      Value::String(s) => s.clone(),
      other => other.to_string(),
    })
    .collect();

  Ok(single("text", Value::String(parts.join(separator))))
}

pub fn template(inputs: &Bindings) -> Result<Bindings, BodyError> {
  let source = match required(inputs, "template")? {
    Value::String(s) => s.as_str(),
    other => return Err(invalid("template", "string", other)),
  };

  let context: Bindings = inputs
    .iter()
    .filter(|(name, _)| name.as_str() != "template")
    .map(|(name, value)| (name.clone(), value.clone()))
    .collect();

  let env = minijinja::Environment::new();
  let rendered = env.render_str(source, &context)?;
  Ok(single("text", Value::String(rendered)))
}

pub fn print(inputs: &Bindings) -> Result<Bindings, BodyError> {
  for (name, value) in inputs {
    info!(target: "sluice::print", name = %name, value = %value, "print");
  }
  Ok(inputs.clone())
}

pub fn count(inputs: &Bindings) -> Result<Bindings, BodyError> {
  let len = match required(inputs, "items")? {
    Value::Array(items) => items.len(),
    Value::Object(map) => map.len(),
    Value::String(s) => s.chars().count(),
    other => return Err(invalid("items", "list, map or string", other)),
  };
  Ok(single("count", Value::from(len)))
}

#[derive(Debug, Clone, Copy)]
enum Operand {
  Int(i64),
  Float(f64),
}

impl Operand {
  fn parse(name: &str, value: &Value) -> Result<Self, BodyError> {
    match value {
      Value::Number(n) => match n.as_i64() {
        Some(i) => Ok(Operand::Int(i)),
        None => n
          .as_f64()
          .map(Operand::Float)
          .ok_or_else(|| invalid(name, "number", value)),
      },
      other => Err(invalid(name, "number", other)),
    }
  }

  fn as_f64(self) -> f64 {
    match self {
      Operand::Int(i) => i as f64,
      Operand::Float(f) => f,
    }
  }

  fn into_value(self) -> Result<Value, BodyError> {
    match self {
      Operand::Int(i) => Ok(Value::from(i)),
      Operand::Float(f) => Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| BodyError::failed(format!("result {} is not a finite number", f))),
    }
  }
}

fn fold_numbers<'a>(
  operands: impl IntoIterator<Item = (&'a str, &'a Value)>,
  init: Operand,
  int_op: fn(i64, i64) -> Option<i64>,
  float_op: fn(f64, f64) -> f64,
) -> Result<Value, BodyError> {
  let mut acc = init;
  for (name, value) in operands {
    let operand = Operand::parse(name, value)?;
    acc = match (acc, operand) {
      (Operand::Int(a), Operand::Int(b)) => Operand::Int(int_op(a, b).ok_or(BodyError::Overflow)?),
      (a, b) => Operand::Float(float_op(a.as_f64(), b.as_f64())),
    };
  }
  acc.into_value()
}

fn required<'a>(inputs: &'a Bindings, name: &str) -> Result<&'a Value, BodyError> {
  inputs.get(name).ok_or_else(|| BodyError::MissingInput {
    name: name.to_string(),
  })
}

fn invalid(name: &str, expected: &str, actual: &Value) -> BodyError {
  BodyError::InvalidInput {
    name: name.to_string(),
    expected: expected.to_string(),
    actual: actual.clone(),
  }
}

fn single(name: &str, value: Value) -> Bindings {
  Bindings::from([(name.to_string(), value)])
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn bindings(pairs: &[(&str, Value)]) -> Bindings {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.clone()))
      .collect()
  }

  #[test]
  fn test_increment() {
    let out = increment(&bindings(&[("value", json!(4))])).unwrap();
    assert_eq!(out["result"], json!(5));

    let out = increment(&bindings(&[("value", json!(1.5))])).unwrap();
    assert_eq!(out["result"], json!(2.5));
  }

  #[test]
  fn test_increment_missing_input() {
    let err = increment(&Bindings::new()).unwrap_err();
    assert!(matches!(err, BodyError::MissingInput { name } if name == "value"));
  }

  #[test]
  fn test_multiply_stays_integer() {
    let out = multiply(&bindings(&[("a", json!(3)), ("b", json!(4))])).unwrap();
    assert_eq!(out["product"], json!(12));
    assert!(out["product"].is_i64());
  }

  #[test]
  fn test_multiply_overflow() {
    let err = multiply(&bindings(&[("a", json!(i64::MAX)), ("b", json!(2))])).unwrap_err();
    assert!(matches!(err, BodyError::Overflow));
  }

  #[test]
  fn test_add_rejects_strings() {
    let err = add(&bindings(&[("a", json!(1)), ("b", json!("two"))])).unwrap_err();
    assert!(matches!(err, BodyError::InvalidInput { name, .. } if name == "b"));
  }

  #[test]
  fn test_concat_with_separator() {
    let out = concat(&bindings(&[
      ("a", json!("Hello")),
      ("b", json!("World")),
      ("separator", json!(", ")),
    ]))
    .unwrap();
    assert_eq!(out["text"], json!("Hello, World"));
  }

  #[test]
  fn test_template_renders_context() {
    let out = template(&bindings(&[
      ("template", json!("{{ greeting }} {{ name }}!")),
      ("greeting", json!("Hello")),
      ("name", json!("World")),
    ]))
    .unwrap();
    assert_eq!(out["text"], json!("Hello World!"));
  }

  #[test]
  fn test_template_syntax_error() {
    let err = template(&bindings(&[("template", json!("{{ unclosed"))])).unwrap_err();
    assert!(matches!(err, BodyError::Template(_)));
  }

  #[test]
  fn test_count() {
    let out = count(&bindings(&[("items", json!([1, 2, 3]))])).unwrap();
    assert_eq!(out["count"], json!(3));

    let err = count(&bindings(&[("items", json!(7))])).unwrap_err();
    assert!(matches!(err, BodyError::InvalidInput { .. }));
  }

  #[test]
  fn test_print_passes_through() {
    let inputs = bindings(&[("message", json!("hi"))]);
    assert_eq!(print(&inputs).unwrap(), inputs);
  }
}
