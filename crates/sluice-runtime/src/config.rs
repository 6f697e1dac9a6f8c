/// Configuration for the runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
  /// Log and emit an event for values left undelivered at the end of a run.
  pub report_unused_data: bool,
  /// Upper bound on node firings per workflow level in one run.
  pub max_firings: Option<u64>,
}

impl Default for RuntimeConfig {
  fn default() -> Self {
    Self {
      report_unused_data: true,
      max_firings: None,
    }
  }
}
