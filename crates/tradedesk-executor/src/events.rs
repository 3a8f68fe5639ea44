//! Execution events and notifiers for observability.
//!
//! Events are emitted during a run so callers can stream progress, keep an
//! audit trail, or drive a UI without touching the executor.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during a graph run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
  /// A run has started at the graph's start node.
  RunStarted { execution_id: String, start: String },

  /// A node is about to run its tasks.
  NodeStarted {
    execution_id: String,
    node: String,
    visit: u32,
  },

  /// A task returned a valid partial state.
  TaskCompleted {
    execution_id: String,
    node: String,
    task: String,
    fields: Vec<String>,
  },

  /// A task failed; its fields were filled with sentinels.
  TaskFailed {
    execution_id: String,
    node: String,
    task: String,
    error: String,
  },

  /// A node's merge has been applied.
  NodeCompleted {
    execution_id: String,
    node: String,
    visit: u32,
  },

  /// The run moved from one node to the next (or to the end).
  Routed {
    execution_id: String,
    from: String,
    label: Option<String>,
    to: String,
  },

  /// The run reached the terminal marker.
  RunCompleted { execution_id: String, steps: usize },

  /// The run was aborted.
  RunFailed { execution_id: String, error: String },
}

/// Trait for receiving execution events.
///
/// The executor calls `notify` for each event and never waits on the
/// implementation, so `notify` must not block.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls the graph walk. Volume is a
  // handful of events per node.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with its receiving end.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Events are best effort once the receiver is gone.
    let _ = self.sender.send(event);
  }
}
