//! Graph executor implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use tradedesk_graph::{Graph, Successor};
use tradedesk_state::State;

use crate::error::ExecutionError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::result::{Diagnostic, ExecutionResult, NodeResult, NodeVisit};

/// Configuration for the executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
  /// Limit for a single task. Expiry counts as a task failure.
  pub task_timeout: Option<Duration>,
  /// Limit for the whole run. Expiry aborts the run.
  pub run_timeout: Option<Duration>,
  /// Maximum number of node executions in one run.
  pub max_steps: usize,
}

impl Default for ExecutorConfig {
  fn default() -> Self {
    Self {
      task_timeout: None,
      run_timeout: None,
      max_steps: 256,
    }
  }
}

/// Walks a [`Graph`] from its start node to the terminal marker.
///
/// Exactly one node runs at a time. Concurrency exists only among the tasks
/// of a parallel node, and a node's merge is fully applied before the next
/// node starts.
///
/// Generic over `N: ExecutionNotifier` to allow different notification
/// strategies. Use `Executor::new()` for no-op notifications.
pub struct Executor<N: ExecutionNotifier = NoopNotifier> {
  pub(crate) config: ExecutorConfig,
  pub(crate) notifier: N,
}

/// Mutable bookkeeping of one run. Never outlives `execute`.
struct RunContext {
  execution_id: String,
  state: Arc<State>,
  current: String,
  visits: HashMap<String, u32>,
  diagnostics: Vec<Diagnostic>,
  trace: Vec<NodeVisit>,
}

impl RunContext {
  fn new(execution_id: &str, initial: State, start: &str) -> Self {
    Self {
      execution_id: execution_id.to_string(),
      state: Arc::new(initial),
      current: start.to_string(),
      visits: HashMap::new(),
      diagnostics: Vec::new(),
      trace: Vec::new(),
    }
  }

  /// Record an entry into the current node and return its visit number.
  fn enter(&mut self) -> u32 {
    let visit = self.visits.entry(self.current.clone()).or_insert(0);
    *visit += 1;
    *visit
  }

  fn finish(self) -> ExecutionResult {
    // The executor holds the only reference once the walk is over.
    let state = Arc::try_unwrap(self.state).unwrap_or_else(|shared| (*shared).clone());
    ExecutionResult {
      execution_id: self.execution_id,
      state,
      diagnostics: self.diagnostics,
      trace: self.trace,
    }
  }
}

impl Executor<NoopNotifier> {
  /// Create an executor that discards events.
  pub fn new(config: ExecutorConfig) -> Self {
    Self::with_notifier(config, NoopNotifier)
  }
}

impl<N: ExecutionNotifier> Executor<N> {
  /// Create an executor with a custom notifier.
  pub fn with_notifier(config: ExecutorConfig, notifier: N) -> Self {
    Self { config, notifier }
  }

  pub fn config(&self) -> &ExecutorConfig {
    &self.config
  }

  /// Run `graph` from its start node with `initial` as the first state.
  ///
  /// Returns the final state once a successor resolves to the terminal
  /// marker. Task failures do not abort the run; router errors, the step
  /// limit, the run timeout, and cancellation do.
  #[instrument(
    name = "graph_execute",
    skip(self, graph, initial, cancel),
    fields(start = %graph.start())
  )]
  pub async fn execute(
    &self,
    graph: &Graph,
    initial: State,
    cancel: CancellationToken,
  ) -> Result<ExecutionResult, ExecutionError> {
    let execution_id = uuid::Uuid::new_v4().to_string();

    info!(
      execution_id = %execution_id,
      start = %graph.start(),
      initial_fields = initial.len(),
      "run_started"
    );
    self.notifier.notify(ExecutionEvent::RunStarted {
      execution_id: execution_id.clone(),
      start: graph.start().to_string(),
    });

    let result = match graph.schema().check_state(&initial) {
      Ok(()) => {
        self
          .run_with_limits(graph, initial, &execution_id, &cancel)
          .await
      }
      Err(source) => Err(ExecutionError::InvalidInitialState { source }),
    };

    match &result {
      Ok(run) => {
        info!(
          execution_id = %execution_id,
          steps = run.steps(),
          diagnostics = run.diagnostics.len(),
          "run_completed"
        );
        self.notifier.notify(ExecutionEvent::RunCompleted {
          execution_id: execution_id.clone(),
          steps: run.steps(),
        });
      }
      Err(e) => {
        error!(execution_id = %execution_id, error = %e, "run_failed");
        self.notifier.notify(ExecutionEvent::RunFailed {
          execution_id: execution_id.clone(),
          error: e.to_string(),
        });
      }
    }

    result
  }

  /// Execute a single node against `state` without walking the graph.
  ///
  /// Useful for debugging one stage in isolation. Routing is not evaluated.
  pub async fn execute_node(
    &self,
    graph: &Graph,
    node: &str,
    state: State,
  ) -> Result<NodeResult, ExecutionError> {
    let def = graph.node(node).ok_or_else(|| ExecutionError::UnknownNode {
      node: node.to_string(),
    })?;
    graph
      .schema()
      .check_state(&state)
      .map_err(|source| ExecutionError::InvalidInitialState { source })?;

    let execution_id = uuid::Uuid::new_v4().to_string();
    let outcome = self
      .run_node(graph, def, Arc::new(state), 1, &execution_id)
      .await?;

    Ok(NodeResult {
      node: node.to_string(),
      state: outcome.state,
      diagnostics: outcome.diagnostics,
    })
  }

  /// Race the walk against cancellation and the run timeout.
  ///
  /// Losing the race drops the walk, and with it the tasks of the node that
  /// was running.
  async fn run_with_limits(
    &self,
    graph: &Graph,
    initial: State,
    execution_id: &str,
    cancel: &CancellationToken,
  ) -> Result<ExecutionResult, ExecutionError> {
    let run_timeout = self.config.run_timeout;
    let deadline = async move {
      match run_timeout {
        Some(limit) => tokio::time::sleep(limit).await,
        None => std::future::pending::<()>().await,
      }
    };

    tokio::select! {
      result = self.walk(graph, initial, execution_id, cancel) => result,
      _ = cancel.cancelled() => {
        warn!(execution_id = %execution_id, "run cancelled during node execution");
        Err(ExecutionError::Cancelled)
      }
      _ = deadline => {
        let timeout_ms = run_timeout.map(|d| d.as_millis() as u64).unwrap_or_default();
        warn!(execution_id = %execution_id, timeout_ms, "run timed out");
        Err(ExecutionError::RunTimeout { timeout_ms })
      }
    }
  }

  /// The graph walk proper.
  async fn walk(
    &self,
    graph: &Graph,
    initial: State,
    execution_id: &str,
    cancel: &CancellationToken,
  ) -> Result<ExecutionResult, ExecutionError> {
    let mut ctx = RunContext::new(execution_id, initial, graph.start());

    loop {
      if cancel.is_cancelled() {
        warn!(execution_id = %execution_id, "run cancelled");
        return Err(ExecutionError::Cancelled);
      }

      if ctx.trace.len() >= self.config.max_steps {
        return Err(ExecutionError::StepLimitExceeded {
          max_steps: self.config.max_steps,
          node: ctx.current.clone(),
        });
      }

      let node = graph
        .node(&ctx.current)
        .ok_or_else(|| ExecutionError::UnknownNode {
          node: ctx.current.clone(),
        })?;
      let visit = ctx.enter();

      let outcome = self
        .run_node(graph, node, Arc::clone(&ctx.state), visit, execution_id)
        .await?;

      ctx.trace.push(NodeVisit {
        node: node.name.clone(),
        visit,
        failed_tasks: outcome.diagnostics.iter().map(|d| d.task.clone()).collect(),
      });
      ctx.diagnostics.extend(outcome.diagnostics);
      ctx.state = Arc::new(outcome.state);

      let transition = graph.next(&node.name, &ctx.state)?;

      info!(
        execution_id = %execution_id,
        from = %node.name,
        label = ?transition.label,
        to = %transition.to,
        "routed"
      );
      self.notifier.notify(ExecutionEvent::Routed {
        execution_id: execution_id.to_string(),
        from: node.name.clone(),
        label: transition.label.clone(),
        to: transition.to.to_string(),
      });

      match transition.to {
        Successor::End => return Ok(ctx.finish()),
        Successor::Node(next) => ctx.current = next,
      }
    }
  }
}
