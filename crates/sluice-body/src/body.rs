use std::collections::BTreeMap;

use crate::error::BodyError;

/// Named values passed into and returned from a body.
pub type Bindings = BTreeMap<String, serde_json::Value>;

/// The computation behind a leaf node.
///
/// Implementations must be synchronous and must not rely on side effects
/// visible to the engine; only the returned bindings are published.
pub trait NodeBody: Send + Sync {
  fn invoke(&self, inputs: &Bindings) -> Result<Bindings, BodyError>;
}

impl<F> NodeBody for F
where
  F: Fn(&Bindings) -> Result<Bindings, BodyError> + Send + Sync,
{
  fn invoke(&self, inputs: &Bindings) -> Result<Bindings, BodyError> {
    self(inputs)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_closure_is_a_body() {
    let double = |inputs: &Bindings| -> Result<Bindings, BodyError> {
      let x = inputs["x"].as_i64().unwrap_or_default();
      Ok(Bindings::from([("y".to_string(), json!(x * 2))]))
    };

    let inputs = Bindings::from([("x".to_string(), json!(21))]);
    let outputs = double.invoke(&inputs).unwrap();
    assert_eq!(outputs["y"], 42);
  }
}
