//! Tradedesk Graph
//!
//! This crate provides the static description of a run: the tasks that do the
//! work, the nodes that group them, the edges and routers that connect nodes,
//! and the [`Graph`] that ties everything to a [`Schema`](tradedesk_state::Schema).
//!
//! A [`Graph`] can only be obtained through [`GraphBuilder::build`], which
//! checks every reference, every declared output field, and every bounded loop
//! once, before any run starts. The executor trusts a built graph.
//!
//! ```text
//!   start ─▶ gather(parallel: a, b) ─▶ debate ─┬─▶ decide ─▶ END
//!                                     ▲        │
//!                                     └────────┘  BoundedLoop(round < max)
//! ```

mod builder;
mod error;
mod graph;
mod node;
mod router;
mod task;

pub use builder::GraphBuilder;
pub use error::GraphError;
pub use graph::{
  EdgeDescription, Graph, GraphDescription, NodeDescription, RouteError, TaskDescription,
  Transition,
};
pub use node::{MergePolicy, NodeDef};
pub use router::{BoundedLoop, ConditionalEdge, Edge, END, Router, Successor};
pub use task::{FnTask, Task, TaskDef, TaskError, task_fn};
