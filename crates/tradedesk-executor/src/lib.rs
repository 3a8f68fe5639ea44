//! Graph execution for tradedesk.
//!
//! This crate provides the [`Executor`] which handles:
//! - The sequential walk from the start node to the terminal marker
//! - Parallel nodes: every task runs concurrently on one shared snapshot
//! - Deterministic merging of task outputs into the next state
//! - Task failures, converted into sentinel values and [`Diagnostic`]s
//! - Per-task timeouts, a run timeout, and cancellation
//!
//! Progress is reported through `tracing` and, optionally, through an
//! [`ExecutionNotifier`].

mod error;
mod events;
mod executor;
mod node;
mod result;

pub use error::ExecutionError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use executor::{Executor, ExecutorConfig};
pub use result::{Diagnostic, ExecutionResult, NodeResult, NodeVisit};
