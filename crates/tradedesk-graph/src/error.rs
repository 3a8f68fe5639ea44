use thiserror::Error;

/// Graph construction failures.
///
/// Every variant describes a bug in the graph definition. None of them can
/// occur once [`GraphBuilder::build`](crate::GraphBuilder::build) has returned
/// a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  #[error("duplicate node: {0}")]
  DuplicateNode(String),

  #[error("node '{node}' declares task '{task}' more than once")]
  DuplicateTask { node: String, task: String },

  #[error("node '{0}' has no tasks")]
  EmptyNode(String),

  #[error("no start node set")]
  MissingStart,

  #[error("start node not found: {0}")]
  StartNotFound(String),

  #[error("edge references unknown node: from={from}, to={to}")]
  InvalidEdge { from: String, to: String },

  #[error("node '{0}' has no outgoing edge")]
  NoSuccessor(String),

  #[error("node '{0}' has more than one outgoing edge")]
  MultipleSuccessors(String),

  #[error("conditional edge from '{0}' has no branches")]
  EmptyBranches(String),

  #[error("task '{task}' in node '{node}' declares unknown field '{field}'")]
  UnknownField {
    node: String,
    task: String,
    field: String,
  },

  #[error("tasks '{first}' and '{second}' in node '{node}' both write '{field}'")]
  OverlappingOutputs {
    node: String,
    field: String,
    first: String,
    second: String,
  },

  #[error("counter '{field}' of node '{node}' is also declared by task '{task}'")]
  CounterOwnedByTask {
    node: String,
    field: String,
    task: String,
  },

  #[error("counter field '{field}' must be declared in the schema as an integer")]
  InvalidCounter { field: String },

  #[error("bounded loop from '{node}' requires the node to increment '{counter}'")]
  UncountedLoop { node: String, counter: String },

  #[error("node '{0}' is unreachable from the start node")]
  Unreachable(String),
}
