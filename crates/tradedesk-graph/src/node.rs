use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::task::TaskDef;

/// How the partial states of a parallel node are allowed to combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
  /// Sibling tasks must declare pairwise disjoint output fields.
  #[default]
  Disjoint,
  /// Siblings may share a field only if the schema gives it an appending
  /// reducer. Everything else must still be disjoint.
  Reducers,
}

/// A named step of the graph.
///
/// One task makes a sequential node, two or more a parallel node. A node may
/// own a counter field that it increments by one every time it completes,
/// whatever its tasks did. Bounded loops rely on that.
#[derive(Debug, Clone)]
pub struct NodeDef {
  pub name: String,
  pub tasks: Vec<TaskDef>,
  pub merge_policy: MergePolicy,
  pub counter: Option<String>,
}

impl NodeDef {
  pub fn sequential(name: impl Into<String>, task: TaskDef) -> Self {
    Self::parallel(name, [task])
  }

  pub fn parallel(name: impl Into<String>, tasks: impl IntoIterator<Item = TaskDef>) -> Self {
    Self {
      name: name.into(),
      tasks: tasks.into_iter().collect(),
      merge_policy: MergePolicy::Disjoint,
      counter: None,
    }
  }

  pub fn with_merge_policy(mut self, merge_policy: MergePolicy) -> Self {
    self.merge_policy = merge_policy;
    self
  }

  /// Make the node increment `field` on every completion.
  pub fn counting(mut self, field: impl Into<String>) -> Self {
    self.counter = Some(field.into());
    self
  }

  pub fn is_parallel(&self) -> bool {
    self.tasks.len() > 1
  }

  /// Every field this node may write, including its counter.
  pub fn outputs(&self) -> BTreeSet<String> {
    self
      .tasks
      .iter()
      .flat_map(|t| t.outputs().iter().cloned())
      .chain(self.counter.iter().cloned())
      .collect()
  }
}
