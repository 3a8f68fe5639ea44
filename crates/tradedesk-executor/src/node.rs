//! Running the tasks of one node and folding their outputs.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use tradedesk_graph::{Graph, NodeDef, Task, TaskDef, TaskError};
use tradedesk_state::{PartialState, Schema, State, Value, merge};

use crate::error::ExecutionError;
use crate::events::{ExecutionEvent, ExecutionNotifier};
use crate::executor::Executor;
use crate::result::Diagnostic;

/// What one node execution produced.
pub(crate) struct NodeOutcome {
  pub state: State,
  pub diagnostics: Vec<Diagnostic>,
}

impl<N: ExecutionNotifier> Executor<N> {
  /// Run every task of `node` against the same snapshot and merge.
  ///
  /// Partials are merged in task declaration order, so the result never
  /// depends on which task finished first. A failed task contributes its
  /// declared fields set to their sentinels instead of its output.
  pub(crate) async fn run_node(
    &self,
    graph: &Graph,
    node: &NodeDef,
    snapshot: Arc<State>,
    visit: u32,
    execution_id: &str,
  ) -> Result<NodeOutcome, ExecutionError> {
    info!(
      execution_id = %execution_id,
      node = %node.name,
      visit,
      tasks = node.tasks.len(),
      "node_started"
    );
    self.notifier.notify(ExecutionEvent::NodeStarted {
      execution_id: execution_id.to_string(),
      node: node.name.clone(),
      visit,
    });

    let results = self.run_tasks(node, &snapshot).await?;
    let schema = graph.schema();

    let mut updates = Vec::with_capacity(node.tasks.len() + 1);
    let mut diagnostics = Vec::new();

    for (def, result) in node.tasks.iter().zip(results) {
      match result.and_then(|partial| check_output(def, &partial, schema).map(|()| partial)) {
        Ok(partial) => {
          debug!(node = %node.name, task = %def.name(), fields = partial.len(), "task_completed");
          self.notifier.notify(ExecutionEvent::TaskCompleted {
            execution_id: execution_id.to_string(),
            node: node.name.clone(),
            task: def.name().to_string(),
            fields: partial.fields().map(str::to_string).collect(),
          });
          updates.push(partial);
        }
        Err(e) => {
          warn!(
            execution_id = %execution_id,
            node = %node.name,
            task = %def.name(),
            error = %e,
            "task_failed"
          );
          self.notifier.notify(ExecutionEvent::TaskFailed {
            execution_id: execution_id.to_string(),
            node: node.name.clone(),
            task: def.name().to_string(),
            error: e.to_string(),
          });
          updates.push(sentinels(def, schema));
          diagnostics.push(Diagnostic {
            node: node.name.clone(),
            task: def.name().to_string(),
            visit,
            fields: def.outputs().iter().cloned().collect(),
            error: e.to_string(),
          });
        }
      }
    }

    // The counter moves whatever the tasks did, so loops keyed on it end.
    if let Some(counter) = &node.counter {
      updates.push(PartialState::new().set(counter.clone(), next_count(snapshot.get(counter))));
    }

    let state = merge(&snapshot, &updates, schema);

    info!(
      execution_id = %execution_id,
      node = %node.name,
      visit,
      failed = diagnostics.len(),
      "node_completed"
    );
    self.notifier.notify(ExecutionEvent::NodeCompleted {
      execution_id: execution_id.to_string(),
      node: node.name.clone(),
      visit,
    });

    Ok(NodeOutcome { state, diagnostics })
  }

  /// Collect one result per task, in declaration order.
  async fn run_tasks(
    &self,
    node: &NodeDef,
    snapshot: &Arc<State>,
  ) -> Result<Vec<Result<PartialState, TaskError>>, ExecutionError> {
    let timeout = self.config.task_timeout;

    if !node.is_parallel() {
      let mut results = Vec::with_capacity(node.tasks.len());
      for def in &node.tasks {
        results.push(run_task(def.task(), Arc::clone(snapshot), timeout).await);
      }
      return Ok(results);
    }

    // Dropping the set aborts whatever is still running.
    let mut join_set = JoinSet::new();
    for (index, def) in node.tasks.iter().enumerate() {
      let task = def.task();
      let state = Arc::clone(snapshot);
      join_set.spawn(async move { (index, run_task(task, state, timeout).await) });
    }

    let mut slots: Vec<Option<Result<PartialState, TaskError>>> =
      node.tasks.iter().map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
      let (index, result) = joined.map_err(|e| ExecutionError::Join {
        node: node.name.clone(),
        message: e.to_string(),
      })?;
      slots[index] = Some(result);
    }

    slots
      .into_iter()
      .map(|slot| {
        slot.ok_or_else(|| ExecutionError::Join {
          node: node.name.clone(),
          message: "task finished without a result".to_string(),
        })
      })
      .collect()
  }
}

/// Run one task with panic capture and an optional time limit.
async fn run_task(
  task: Arc<dyn Task>,
  state: Arc<State>,
  timeout: Option<Duration>,
) -> Result<PartialState, TaskError> {
  let fut = AssertUnwindSafe(task.run(state)).catch_unwind();

  let caught = match timeout {
    Some(limit) => match tokio::time::timeout(limit, fut).await {
      Ok(caught) => caught,
      Err(_) => {
        return Err(TaskError::Timeout {
          timeout_ms: limit.as_millis() as u64,
        });
      }
    },
    None => fut.await,
  };

  caught.unwrap_or_else(|panic| {
    Err(TaskError::Panicked {
      message: panic_message(panic.as_ref()),
    })
  })
}

/// A task may only write what it declared, and only values the schema accepts.
fn check_output(def: &TaskDef, partial: &PartialState, schema: &Schema) -> Result<(), TaskError> {
  for (field, value) in partial.iter() {
    if !def.declares(field) {
      return Err(TaskError::UndeclaredField {
        field: field.clone(),
      });
    }
    schema.check_update(field, value)?;
  }
  Ok(())
}

fn sentinels(def: &TaskDef, schema: &Schema) -> PartialState {
  def
    .outputs()
    .iter()
    .map(|field| (field.clone(), schema.sentinel(field)))
    .collect()
}

/// Counter after one more completion.
///
/// Absent, null, and negative values count as zero; the count saturates
/// instead of wrapping so it never moves backwards.
fn next_count(current: Option<&Value>) -> u64 {
  current.and_then(Value::as_u64).unwrap_or(0).saturating_add(1)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
  if let Some(s) = panic.downcast_ref::<&str>() {
    s.to_string()
  } else if let Some(s) = panic.downcast_ref::<String>() {
    s.clone()
  } else {
    "task panicked".to_string()
  }
}
