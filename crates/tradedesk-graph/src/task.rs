//! Tasks: the opaque units of work a node runs.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tradedesk_state::{FieldViolation, PartialState, State};

/// A unit of work run against a read-only state snapshot.
///
/// Implementations receive whatever they need (clients, credentials,
/// data providers) through their own constructors. A task must be safe to run
/// concurrently with its siblings: the only thing they share is the snapshot.
#[async_trait]
pub trait Task: Send + Sync {
  async fn run(&self, state: Arc<State>) -> Result<PartialState, TaskError>;
}

/// Adapter that turns an async closure into a [`Task`].
pub struct FnTask<F> {
  f: F,
}

/// Wrap an async closure as a [`Task`].
pub fn task_fn<F, Fut>(f: F) -> FnTask<F>
where
  F: Fn(Arc<State>) -> Fut + Send + Sync,
  Fut: Future<Output = Result<PartialState, TaskError>> + Send,
{
  FnTask { f }
}

#[async_trait]
impl<F, Fut> Task for FnTask<F>
where
  F: Fn(Arc<State>) -> Fut + Send + Sync,
  Fut: Future<Output = Result<PartialState, TaskError>> + Send,
{
  async fn run(&self, state: Arc<State>) -> Result<PartialState, TaskError> {
    (self.f)(state).await
  }
}

/// Errors a single task can end with.
///
/// None of these abort a run: the executor records them and fills the task's
/// declared fields with their sentinels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
  #[error("task failed: {message}")]
  Failed { message: String },

  /// Upstream data was missing or malformed.
  #[error("upstream data unavailable: {message}")]
  Upstream { message: String },

  /// An external service refused the call.
  #[error("external call rejected: {message}")]
  Rejected { message: String },

  #[error("task timed out after {timeout_ms}ms")]
  Timeout { timeout_ms: u64 },

  #[error("task wrote undeclared field '{field}'")]
  UndeclaredField { field: String },

  #[error("invalid task output: {0}")]
  InvalidOutput(#[from] FieldViolation),

  #[error("task panicked: {message}")]
  Panicked { message: String },
}

impl TaskError {
  pub fn failed(message: impl Into<String>) -> Self {
    TaskError::Failed {
      message: message.into(),
    }
  }

  pub fn upstream(message: impl Into<String>) -> Self {
    TaskError::Upstream {
      message: message.into(),
    }
  }

  pub fn rejected(message: impl Into<String>) -> Self {
    TaskError::Rejected {
      message: message.into(),
    }
  }
}

/// A task registered under a name and a fixed set of output fields.
///
/// The declared outputs are what the graph uses to check that sibling tasks
/// never write the same field. At run time a task may emit a subset of them.
#[derive(Clone)]
pub struct TaskDef {
  name: String,
  outputs: BTreeSet<String>,
  task: Arc<dyn Task>,
}

impl TaskDef {
  pub fn new<I, S>(name: impl Into<String>, outputs: I, task: impl Task + 'static) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::from_arc(name, outputs, Arc::new(task))
  }

  pub fn from_arc<I, S>(name: impl Into<String>, outputs: I, task: Arc<dyn Task>) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      name: name.into(),
      outputs: outputs.into_iter().map(Into::into).collect(),
      task,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn outputs(&self) -> &BTreeSet<String> {
    &self.outputs
  }

  pub fn declares(&self, field: &str) -> bool {
    self.outputs.contains(field)
  }

  pub fn task(&self) -> Arc<dyn Task> {
    Arc::clone(&self.task)
  }
}

impl fmt::Debug for TaskDef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TaskDef")
      .field("name", &self.name)
      .field("outputs", &self.outputs)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_task_fn_runs_closure() {
    let def = TaskDef::new(
      "echo",
      ["echo"],
      task_fn(|state: Arc<State>| async move {
        let subject = state.text("subject").unwrap_or_default().to_string();
        Ok::<_, TaskError>(PartialState::new().set("echo", subject))
      }),
    );

    let state = Arc::new(State::new().with("subject", "X"));
    let out = def.task().run(state).await.unwrap();

    assert_eq!(out.get("echo"), Some(&serde_json::json!("X")));
    assert!(def.declares("echo"));
    assert!(!def.declares("subject"));
  }

  #[tokio::test]
  async fn test_task_fn_propagates_errors() {
    let task = task_fn(|_state: Arc<State>| async move {
      Err::<PartialState, _>(TaskError::upstream("no rows"))
    });

    let err = task.run(Arc::new(State::new())).await.unwrap_err();
    assert_eq!(err, TaskError::upstream("no rows"));
    assert_eq!(err.to_string(), "upstream data unavailable: no rows");
  }
}
