use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradedesk_state::{Schema, State};

use crate::node::{MergePolicy, NodeDef};
use crate::router::{BoundedLoop, Edge, Successor};

/// A validated graph, ready to be walked by an executor.
///
/// Built only through [`GraphBuilder`](crate::GraphBuilder). Every node has
/// exactly one outgoing edge and every name an edge can produce refers to a
/// registered node or to the terminal marker.
#[derive(Debug, Clone)]
pub struct Graph {
  pub(crate) schema: Schema,
  pub(crate) nodes: BTreeMap<String, NodeDef>,
  pub(crate) edges: BTreeMap<String, Edge>,
  pub(crate) start: String,
}

/// The outcome of following a node's edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
  /// Branch label returned by the router; `None` for static edges.
  pub label: Option<String>,
  pub to: Successor,
}

/// A router produced a label with no registered branch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("router on '{from}' returned unknown label '{label}'")]
pub struct RouteError {
  pub from: String,
  pub label: String,
}

impl Graph {
  pub fn schema(&self) -> &Schema {
    &self.schema
  }

  pub fn start(&self) -> &str {
    &self.start
  }

  pub fn node(&self, name: &str) -> Option<&NodeDef> {
    self.nodes.get(name)
  }

  pub fn nodes(&self) -> impl Iterator<Item = &NodeDef> {
    self.nodes.values()
  }

  pub fn edge(&self, from: &str) -> Option<&Edge> {
    self.edges.get(from)
  }

  /// Bounded loops registered on this graph, keyed by source node.
  pub fn loops(&self) -> impl Iterator<Item = (&str, &BoundedLoop)> {
    self.edges.iter().filter_map(|(from, edge)| match edge {
      Edge::Conditional(cond) => cond.bound.as_ref().map(|b| (from.as_str(), b)),
      Edge::Static(_) => None,
    })
  }

  /// Resolve the successor of `from` given the state its node produced.
  pub fn next(&self, from: &str, state: &State) -> Result<Transition, RouteError> {
    match self.edges.get(from) {
      Some(Edge::Static(to)) => Ok(Transition {
        label: None,
        to: to.clone(),
      }),
      Some(Edge::Conditional(cond)) => {
        let label = cond.router.route(state);
        match cond.branches.get(&label) {
          Some(to) => Ok(Transition {
            to: to.clone(),
            label: Some(label),
          }),
          None => Err(RouteError {
            from: from.to_string(),
            label,
          }),
        }
      }
      // Unreachable for a built graph: every node has an edge.
      None => Err(RouteError {
        from: from.to_string(),
        label: String::new(),
      }),
    }
  }

  /// Serializable summary of the graph structure.
  pub fn describe(&self) -> GraphDescription {
    let nodes = self
      .nodes
      .values()
      .map(|node| NodeDescription {
        name: node.name.clone(),
        parallel: node.is_parallel(),
        merge_policy: node.merge_policy,
        counter: node.counter.clone(),
        tasks: node
          .tasks
          .iter()
          .map(|t| TaskDescription {
            name: t.name().to_string(),
            outputs: t.outputs().iter().cloned().collect(),
          })
          .collect(),
      })
      .collect();

    let edges = self
      .edges
      .iter()
      .map(|(from, edge)| match edge {
        Edge::Static(to) => EdgeDescription::Static {
          from: from.clone(),
          to: to.to_string(),
        },
        Edge::Conditional(cond) => EdgeDescription::Conditional {
          from: from.clone(),
          branches: cond
            .branches
            .iter()
            .map(|(label, to)| (label.clone(), to.to_string()))
            .collect(),
          bound: cond.bound.clone(),
        },
      })
      .collect();

    GraphDescription {
      start: self.start.clone(),
      nodes,
      edges,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDescription {
  pub start: String,
  pub nodes: Vec<NodeDescription>,
  pub edges: Vec<EdgeDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescription {
  pub name: String,
  pub parallel: bool,
  pub merge_policy: MergePolicy,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub counter: Option<String>,
  pub tasks: Vec<TaskDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescription {
  pub name: String,
  pub outputs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgeDescription {
  Static {
    from: String,
    to: String,
  },
  Conditional {
    from: String,
    branches: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bound: Option<BoundedLoop>,
  },
}
