use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use sluice_body::builtin_registry;
use sluice_config::WorkflowDef;
use sluice_resolver::ResolverOptions;
use sluice_runtime::{RunError, Runtime, RuntimeConfig, WorkflowInstance};

/// Sluice - a reactive dataflow workflow engine
#[derive(Parser)]
#[command(name = "sluice")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Maximum node firings per workflow level in one run
  #[arg(long, global = true)]
  max_firings: Option<u64>,

  /// Reject workflows where a path has more than one producer
  #[arg(long, global = true)]
  strict_producers: bool,

  /// Do not report values left unconsumed at the end of a run
  #[arg(long, global = true)]
  quiet_unused: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve a workflow and print its compiled structure
  Validate {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Run a workflow once and print its outputs
  Run {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    #[command(flatten)]
    inputs: InputArgs,
  },

  /// Run a workflow once per value of one input, in parallel
  Sweep {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// The inflow key to sweep over
    #[arg(long)]
    input: String,

    /// JSON array of values for the swept inflow
    #[arg(long)]
    values: String,

    #[command(flatten)]
    inputs: InputArgs,

    /// Number of runs in flight at once
    #[arg(long, default_value_t = 4)]
    concurrency: usize,
  },
}

#[derive(Args)]
struct InputArgs {
  /// Inflow value as key=value; the value is parsed as JSON, else taken as a string
  #[arg(long = "set", value_name = "KEY=VALUE")]
  sets: Vec<String>,
}

impl InputArgs {
  fn parse(&self) -> Result<Vec<(String, Value)>> {
    self.sets.iter().map(|s| parse_assignment(s)).collect()
  }
}

fn main() -> Result<()> {
  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with(fmt::layer().with_writer(std::io::stderr))
    .init();

  let cli = Cli::parse();

  let config = RuntimeConfig {
    report_unused_data: !cli.quiet_unused,
    max_firings: cli.max_firings,
  };
  let options = ResolverOptions {
    strict_producers: cli.strict_producers,
  };

  match cli.command {
    Some(Commands::Validate { workflow_file }) => {
      validate(&workflow_file, config, options)?;
    }
    Some(Commands::Run {
      workflow_file,
      inputs,
    }) => {
      run_workflow(&workflow_file, &inputs.parse()?, config, options)?;
    }
    Some(Commands::Sweep {
      workflow_file,
      input,
      values,
      inputs,
      concurrency,
    }) => {
      let values: Vec<Value> =
        serde_json::from_str(&values).context("--values must be a JSON array")?;
      let fixed = inputs.parse()?;
      let rt = tokio::runtime::Runtime::new()?;
      let results = rt.block_on(async {
        let runtime = configured_runtime(&workflow_file, config, options)?;
        sweep(runtime, input, values, fixed, concurrency).await
      })?;
      println!("{}", serde_json::to_string_pretty(&results)?);
    }
    None => {
      println!("sluice - use --help to see available commands");
    }
  }

  Ok(())
}

fn load_definition(workflow_file: &Path) -> Result<WorkflowDef> {
  let content = std::fs::read_to_string(workflow_file)
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))
}

fn configured_runtime(
  workflow_file: &Path,
  config: RuntimeConfig,
  options: ResolverOptions,
) -> Result<Runtime> {
  let definition = load_definition(workflow_file)?;
  let mut runtime =
    Runtime::new(definition, Arc::new(builtin_registry()), config).with_resolver_options(options);
  runtime
    .configure()
    .context("failed to configure workflow")?;
  Ok(runtime)
}

/// Split `key=value`, parsing the value as JSON when possible.
fn parse_assignment(raw: &str) -> Result<(String, Value)> {
  let Some((key, value)) = raw.split_once('=') else {
    bail!("expected KEY=VALUE, got '{}'", raw);
  };
  if key.is_empty() {
    bail!("empty key in '{}'", raw);
  }

  let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
  Ok((key.to_string(), value))
}

fn validate(workflow_file: &Path, config: RuntimeConfig, options: ResolverOptions) -> Result<()> {
  let runtime = configured_runtime(workflow_file, config, options)?;
  let Some(workflow) = runtime.workflow() else {
    bail!("workflow was not configured");
  };

  let graph = workflow.graph();
  let nodes: Vec<Value> = workflow
    .nodes
    .iter()
    .map(|node| {
      json!({
        "name": node.name,
        "composite": node.is_composite(),
        "firing_limit": node.firing_limit,
        "inputs": node.inputs.iter().map(|i| i.path.to_string()).collect::<Vec<_>>(),
        "outputs": node.outputs.iter().map(|o| o.path.to_string()).collect::<Vec<_>>(),
        "downstream": graph.downstream(workflow, &node.name),
      })
    })
    .collect();

  let summary = json!({
    "workflow": workflow.name,
    "inflows": workflow.inflows,
    "outflows": workflow.outflows,
    "entry_points": graph.entry_points(),
    "nodes": nodes,
  });
  println!("{}", serde_json::to_string_pretty(&summary)?);
  Ok(())
}

fn run_workflow(
  workflow_file: &Path,
  inputs: &[(String, Value)],
  config: RuntimeConfig,
  options: ResolverOptions,
) -> Result<()> {
  let mut runtime = configured_runtime(workflow_file, config, options)?;

  runtime.initialize()?;
  for (key, value) in inputs {
    runtime
      .set(key, value.clone())
      .with_context(|| format!("failed to set inflow '{}'", key))?;
  }
  runtime.run().context("workflow run failed")?;
  let outputs = runtime.outputs()?;
  runtime.wrapup()?;

  println!("{}", serde_json::to_string_pretty(&outputs)?);
  Ok(())
}

/// One complete initialize/set/run/wrapup cycle on an instance.
fn run_once(
  instance: &mut WorkflowInstance,
  inputs: &[(String, Value)],
) -> Result<BTreeMap<String, Value>, RunError> {
  instance.initialize()?;
  for (key, value) in inputs {
    instance.set(key, value.clone())?;
  }
  instance.run()?;
  let outputs = instance.outputs()?;
  instance.wrapup()?;
  Ok(outputs)
}

async fn sweep(
  runtime: Runtime,
  input: String,
  values: Vec<Value>,
  fixed: Vec<(String, Value)>,
  concurrency: usize,
) -> Result<Vec<Value>> {
  let cancel = CancellationToken::new();
  let watcher = {
    let cancel = cancel.clone();
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupted, no further runs will be started");
        cancel.cancel();
      }
    })
  };

  let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
  let mut handles = Vec::with_capacity(values.len());

  for value in values {
    let permit = tokio::select! {
      _ = cancel.cancelled() => break,
      permit = semaphore.clone().acquire_owned() => permit.context("sweep semaphore closed")?,
    };

    let mut instance = runtime.instance()?;
    let mut inputs = fixed.clone();
    inputs.push((input.clone(), value.clone()));

    handles.push(tokio::task::spawn_blocking(move || {
      let _permit = permit;
      let result = run_once(&mut instance, &inputs);
      (value, result)
    }));
  }

  let joined = futures::future::join_all(handles).await;
  watcher.abort();

  joined
    .into_iter()
    .map(|handle| {
      let (value, result) = handle.context("sweep run panicked")?;
      Ok(match result {
        Ok(outputs) => json!({ "input": value, "outputs": outputs }),
        Err(e) => json!({ "input": value, "error": e.to_string() }),
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
  }

  #[test]
  fn test_parse_assignment() {
    assert_eq!(parse_assignment("u=3").unwrap(), ("u".to_string(), json!(3)));
    assert_eq!(
      parse_assignment("name=World").unwrap(),
      ("name".to_string(), json!("World"))
    );
    assert_eq!(
      parse_assignment("xs=[1,2]").unwrap(),
      ("xs".to_string(), json!([1, 2]))
    );
    assert!(parse_assignment("novalue").is_err());
    assert!(parse_assignment("=1").is_err());
  }

  #[test]
  fn test_load_definition_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
      file,
      r#"{{ "name": "tmp", "nodes": [{{ "name": "a", "type": "leaf", "body": "identity" }}] }}"#
    )
    .unwrap();

    let def = load_definition(file.path()).unwrap();
    assert_eq!(def.name, "tmp");
    assert_eq!(def.nodes.len(), 1);
  }

  #[test]
  fn test_load_definition_reports_parse_errors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();

    let err = load_definition(file.path()).unwrap_err();
    assert!(err.to_string().contains("failed to parse workflow file"));
  }

  #[test]
  fn test_demos_configure() {
    for name in [
      "hello.json",
      "greeting_sequence.json",
      "multiplier_subworkflow.json",
      "multiplier_with_2_inputs.json",
    ] {
      configured_runtime(&demo(name), RuntimeConfig::default(), ResolverOptions::default())
        .unwrap_or_else(|e| panic!("{name}: {e:#}"));
    }
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn test_sweep_multiplier() {
    let runtime = configured_runtime(
      &demo("multiplier_subworkflow.json"),
      RuntimeConfig::default(),
      ResolverOptions::default(),
    )
    .unwrap();

    let values = vec![json!(0), json!(1), json!(2), json!(3)];
    let results = sweep(runtime, "u".to_string(), values, vec![], 2).await.unwrap();

    let products: Vec<Value> = results.iter().map(|r| r["outputs"]["v"].clone()).collect();
    assert_eq!(products, vec![json!(0), json!(2), json!(6), json!(12)]);
  }
}
