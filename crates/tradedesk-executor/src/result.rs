//! Run results.

use serde::{Deserialize, Serialize};
use tradedesk_state::State;

/// A task failure that was absorbed by its node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
  pub node: String,
  pub task: String,
  /// Which entry into the node this happened on, starting at 1.
  pub visit: u32,
  /// Declared output fields that received their sentinel.
  pub fields: Vec<String>,
  pub error: String,
}

/// One node execution in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeVisit {
  pub node: String,
  pub visit: u32,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub failed_tasks: Vec<String>,
}

/// Result of executing a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResult {
  pub node: String,
  pub state: State,
  pub diagnostics: Vec<Diagnostic>,
}

/// Result of a complete run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
  /// Unique execution ID.
  pub execution_id: String,
  /// The state after the last node.
  pub state: State,
  pub diagnostics: Vec<Diagnostic>,
  pub trace: Vec<NodeVisit>,
}

impl ExecutionResult {
  /// Number of node executions in the run.
  pub fn steps(&self) -> usize {
    self.trace.len()
  }

  /// How many times `node` was entered.
  pub fn visits(&self, node: &str) -> usize {
    self.trace.iter().filter(|v| v.node == node).count()
  }

  pub fn is_degraded(&self) -> bool {
    !self.diagnostics.is_empty()
  }
}
