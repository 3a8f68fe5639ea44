//! Error types for graph execution.

use thiserror::Error;
use tradedesk_graph::RouteError;
use tradedesk_state::FieldViolation;

/// Errors that abort a run.
///
/// Task failures never show up here; they are recorded as
/// [`Diagnostic`](crate::Diagnostic)s on the result instead.
#[derive(Debug, Error)]
pub enum ExecutionError {
  /// The caller-supplied state does not fit the graph's schema.
  #[error("initial state rejected: {source}")]
  InvalidInitialState {
    #[source]
    source: FieldViolation,
  },

  /// A router produced a label with no branch. This is a graph bug.
  #[error(transparent)]
  Router(#[from] RouteError),

  #[error("node '{node}' is not part of the graph")]
  UnknownNode { node: String },

  /// The run kept going past the configured number of node executions.
  #[error("run exceeded {max_steps} node executions (next node '{node}')")]
  StepLimitExceeded { max_steps: usize, node: String },

  #[error("run timed out after {timeout_ms}ms")]
  RunTimeout { timeout_ms: u64 },

  #[error("run cancelled")]
  Cancelled,

  /// A spawned task could not be joined.
  #[error("task join error in node '{node}': {message}")]
  Join { node: String, message: String },
}
