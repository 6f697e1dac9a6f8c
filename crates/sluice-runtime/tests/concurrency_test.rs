//! Independent instances of one compiled workflow running in parallel.

use std::sync::Arc;

use serde_json::json;
use sluice_body::builtin_registry;
use sluice_config::WorkflowDef;
use sluice_runtime::{LifecycleState, RunError, Runtime, RuntimeConfig};

fn configured_multiplier() -> Runtime {
  let def: WorkflowDef =
    serde_json::from_str(include_str!("../../../demos/multiplier_subworkflow.json")).unwrap();
  let mut runtime = Runtime::new(def, Arc::new(builtin_registry()), RuntimeConfig::default());
  runtime.configure().unwrap();
  runtime
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_instances() {
  let runtime = configured_multiplier();

  let handles: Vec<_> = (0..16i64)
    .map(|u| {
      let mut instance = runtime.instance().unwrap();
      tokio::task::spawn_blocking(move || -> Result<(i64, serde_json::Value), RunError> {
        instance.initialize()?;
        instance.set("u", json!(u))?;
        instance.run()?;
        let v = instance.get("v")?;
        assert_eq!(instance.store_size(), 0);
        instance.wrapup()?;
        Ok((u, v))
      })
    })
    .collect();

  for handle in futures::future::join_all(handles).await {
    let handle = handle.expect("instance task panicked");
    let (u, v) = handle.unwrap();
    assert_eq!(v, json!(u * (u + 1)));
  }
}

#[test]
fn test_instances_do_not_share_state() {
  let runtime = configured_multiplier();
  let mut first = runtime.instance().unwrap();
  let mut second = runtime.instance().unwrap();

  first.initialize().unwrap();
  first.set("u", json!(3)).unwrap();
  first.run().unwrap();

  assert_eq!(second.state(), LifecycleState::Configured);
  second.initialize().unwrap();
  second.set("u", json!(1)).unwrap();
  second.run().unwrap();

  assert_eq!(first.get("v").unwrap(), json!(12));
  assert_eq!(second.get("v").unwrap(), json!(2));
  assert!(Arc::ptr_eq(first.workflow(), second.workflow()));
  assert_ne!(first.run_id(), second.run_id());
}

#[test]
fn test_instance_requires_configure() {
  let def = WorkflowDef::new("unconfigured");
  let runtime = Runtime::new(def, Arc::new(builtin_registry()), RuntimeConfig::default());
  assert!(matches!(
    runtime.instance(),
    Err(RunError::Protocol {
      state: LifecycleState::Unconfigured,
      ..
    })
  ));
}
