//! Graph construction and validation.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

use tradedesk_state::{FieldKind, Reducer, Schema};

use crate::error::GraphError;
use crate::graph::Graph;
use crate::node::{MergePolicy, NodeDef};
use crate::router::{BoundedLoop, ConditionalEdge, Edge, Router, Successor};

/// Collects nodes and edges, then validates them all at once in [`build`].
///
/// Registration never fails on its own: problems such as duplicate names are
/// remembered and reported by `build`, so a builder can be assembled in one
/// chained expression.
///
/// [`build`]: GraphBuilder::build
#[derive(Default)]
pub struct GraphBuilder {
  schema: Schema,
  nodes: BTreeMap<String, NodeDef>,
  edges: BTreeMap<String, Edge>,
  start: Option<String>,
  allow_unreachable: bool,
  errors: Vec<GraphError>,
}

impl GraphBuilder {
  pub fn new(schema: Schema) -> Self {
    Self {
      schema,
      ..Self::default()
    }
  }

  pub fn add_node(mut self, node: NodeDef) -> Self {
    if self.nodes.contains_key(&node.name) {
      self.errors.push(GraphError::DuplicateNode(node.name.clone()));
    } else {
      self.nodes.insert(node.name.clone(), node);
    }
    self
  }

  /// Static edge. `to` may be [`END`](crate::END).
  pub fn add_edge(self, from: impl Into<String>, to: impl Into<String>) -> Self {
    let to = Successor::from_name(to);
    self.insert_edge(from.into(), Edge::Static(to))
  }

  /// Conditional edge: after `from` completes, `router` picks a label and the
  /// run continues at `branches[label]`. Targets may be [`END`](crate::END).
  pub fn add_conditional_edge<R, I, L, T>(self, from: impl Into<String>, router: R, branches: I) -> Self
  where
    R: Router + 'static,
    I: IntoIterator<Item = (L, T)>,
    L: Into<String>,
    T: Into<String>,
  {
    let edge = ConditionalEdge {
      router: Arc::new(router),
      branches: collect_branches(branches),
      bound: None,
    };
    self.insert_edge(from.into(), Edge::Conditional(edge))
  }

  /// Bounded loop on `from`: continue at `continue_to` while `counter < max`,
  /// then go to `exit_to`.
  ///
  /// `from` must be a node that increments `counter` (see
  /// [`NodeDef::counting`]), which is what guarantees the loop terminates.
  pub fn add_bounded_loop(
    self,
    from: impl Into<String>,
    counter: impl Into<String>,
    max: u64,
    continue_to: impl Into<String>,
    exit_to: impl Into<String>,
  ) -> Self {
    let bound = BoundedLoop::new(counter, max);
    let continue_to: String = continue_to.into();
    let exit_to: String = exit_to.into();
    let edge = ConditionalEdge {
      router: Arc::new(bound.clone()),
      branches: collect_branches([
        (BoundedLoop::CONTINUE, continue_to),
        (BoundedLoop::EXIT, exit_to),
      ]),
      bound: Some(bound),
    };
    self.insert_edge(from.into(), Edge::Conditional(edge))
  }

  pub fn set_start(mut self, name: impl Into<String>) -> Self {
    self.start = Some(name.into());
    self
  }

  /// Accept nodes that cannot be reached from the start node.
  pub fn allow_unreachable(mut self) -> Self {
    self.allow_unreachable = true;
    self
  }

  fn insert_edge(mut self, from: String, edge: Edge) -> Self {
    if self.edges.contains_key(&from) {
      self.errors.push(GraphError::MultipleSuccessors(from));
    } else {
      self.edges.insert(from, edge);
    }
    self
  }

  /// Validate everything and produce the graph.
  pub fn build(self) -> Result<Graph, GraphError> {
    if let Some(err) = self.errors.into_iter().next() {
      return Err(err);
    }

    let start = self.start.ok_or(GraphError::MissingStart)?;
    if !self.nodes.contains_key(&start) {
      return Err(GraphError::StartNotFound(start));
    }

    for node in self.nodes.values() {
      validate_node(node, &self.schema)?;
    }

    for (from, edge) in &self.edges {
      validate_edge(from, edge, &self.nodes, &self.schema)?;
    }

    if let Some(node) = self.nodes.keys().find(|n| !self.edges.contains_key(*n)) {
      return Err(GraphError::NoSuccessor(node.clone()));
    }

    if !self.allow_unreachable {
      let reached = reachable(&start, &self.edges);
      if let Some(node) = self.nodes.keys().find(|n| !reached.contains(n.as_str())) {
        return Err(GraphError::Unreachable(node.clone()));
      }
    }

    Ok(Graph {
      schema: self.schema,
      nodes: self.nodes,
      edges: self.edges,
      start,
    })
  }
}

fn collect_branches<I, L, T>(branches: I) -> BTreeMap<String, Successor>
where
  I: IntoIterator<Item = (L, T)>,
  L: Into<String>,
  T: Into<String>,
{
  branches
    .into_iter()
    .map(|(label, to)| (label.into(), Successor::from_name(to)))
    .collect()
}

fn validate_node(node: &NodeDef, schema: &Schema) -> Result<(), GraphError> {
  if node.tasks.is_empty() {
    return Err(GraphError::EmptyNode(node.name.clone()));
  }

  let mut names = HashSet::new();
  for task in &node.tasks {
    if !names.insert(task.name()) {
      return Err(GraphError::DuplicateTask {
        node: node.name.clone(),
        task: task.name().to_string(),
      });
    }

    if let Some(field) = task.outputs().iter().find(|f| !schema.contains(f.as_str())) {
      return Err(GraphError::UnknownField {
        node: node.name.clone(),
        task: task.name().to_string(),
        field: field.clone(),
      });
    }
  }

  if let Some(counter) = &node.counter {
    check_counter_field(counter, schema)?;
    if let Some(task) = node.tasks.iter().find(|t| t.declares(counter)) {
      return Err(GraphError::CounterOwnedByTask {
        node: node.name.clone(),
        field: counter.clone(),
        task: task.name().to_string(),
      });
    }
  }

  // First writer of each field, to name both sides of an overlap.
  let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
  for task in &node.tasks {
    for field in task.outputs() {
      match owners.get(field.as_str()) {
        None => {
          owners.insert(field.as_str(), task.name());
        }
        Some(first) => {
          let shared_ok = node.merge_policy == MergePolicy::Reducers
            && schema.reducer(field) == Reducer::Append;
          if !shared_ok {
            return Err(GraphError::OverlappingOutputs {
              node: node.name.clone(),
              field: field.clone(),
              first: first.to_string(),
              second: task.name().to_string(),
            });
          }
        }
      }
    }
  }

  Ok(())
}

fn validate_edge(
  from: &str,
  edge: &Edge,
  nodes: &BTreeMap<String, NodeDef>,
  schema: &Schema,
) -> Result<(), GraphError> {
  let targets = edge.targets();
  if targets.is_empty() {
    return Err(GraphError::EmptyBranches(from.to_string()));
  }

  let first_target = targets.first().map(|t| t.to_string()).unwrap_or_default();
  let source = nodes.get(from).ok_or_else(|| GraphError::InvalidEdge {
    from: from.to_string(),
    to: first_target,
  })?;

  for target in targets {
    if let Successor::Node(to) = target
      && !nodes.contains_key(to)
    {
      return Err(GraphError::InvalidEdge {
        from: from.to_string(),
        to: to.clone(),
      });
    }
  }

  if let Edge::Conditional(cond) = edge
    && let Some(bound) = &cond.bound
  {
    check_counter_field(&bound.counter, schema)?;
    if source.counter.as_deref() != Some(bound.counter.as_str()) {
      return Err(GraphError::UncountedLoop {
        node: from.to_string(),
        counter: bound.counter.clone(),
      });
    }
  }

  Ok(())
}

fn check_counter_field(field: &str, schema: &Schema) -> Result<(), GraphError> {
  match schema.get(field) {
    Some(spec) if spec.kind == FieldKind::Integer && spec.reducer == Reducer::Overwrite => Ok(()),
    _ => Err(GraphError::InvalidCounter {
      field: field.to_string(),
    }),
  }
}

fn reachable<'a>(start: &'a str, edges: &'a BTreeMap<String, Edge>) -> BTreeSet<&'a str> {
  let mut seen = BTreeSet::new();
  let mut queue = VecDeque::from([start]);
  while let Some(name) = queue.pop_front() {
    if !seen.insert(name) {
      continue;
    }
    if let Some(edge) = edges.get(name) {
      queue.extend(edge.targets().into_iter().filter_map(Successor::node));
    }
  }
  seen
}
