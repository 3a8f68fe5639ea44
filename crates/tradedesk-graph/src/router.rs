//! Edges and routers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tradedesk_state::State;

/// Terminal marker accepted wherever a node name is expected.
pub const END: &str = "__end__";

/// Where a run goes after a node completes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Successor {
  Node(String),
  End,
}

impl Successor {
  /// Parse a node name, mapping [`END`] to [`Successor::End`].
  pub fn from_name(name: impl Into<String>) -> Self {
    let name = name.into();
    if name == END {
      Successor::End
    } else {
      Successor::Node(name)
    }
  }

  pub fn node(&self) -> Option<&str> {
    match self {
      Successor::Node(name) => Some(name),
      Successor::End => None,
    }
  }
}

impl fmt::Display for Successor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Successor::Node(name) => write!(f, "{}", name),
      Successor::End => write!(f, "{}", END),
    }
  }
}

/// Chooses a branch label from the state after a node completes.
///
/// Must be pure and total: every reachable state yields a label, and the same
/// state always yields the same label.
pub trait Router: Send + Sync {
  fn route(&self, state: &State) -> String;
}

impl<F> Router for F
where
  F: Fn(&State) -> String + Send + Sync,
{
  fn route(&self, state: &State) -> String {
    self(state)
  }
}

/// Router for a loop guarded by a monotonic counter.
///
/// Returns [`BoundedLoop::CONTINUE`] while the counter is below `max` and
/// [`BoundedLoop::EXIT`] afterwards. An absent, null, or negative counter
/// reads as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedLoop {
  pub counter: String,
  pub max: u64,
}

impl BoundedLoop {
  pub const CONTINUE: &'static str = "continue";
  pub const EXIT: &'static str = "exit";

  pub fn new(counter: impl Into<String>, max: u64) -> Self {
    Self {
      counter: counter.into(),
      max,
    }
  }

  /// Current counter value as seen by the router.
  pub fn rounds(&self, state: &State) -> u64 {
    state
      .get(&self.counter)
      .and_then(|v| v.as_u64())
      .unwrap_or(0)
  }
}

impl Router for BoundedLoop {
  fn route(&self, state: &State) -> String {
    let label = if self.rounds(state) < self.max {
      Self::CONTINUE
    } else {
      Self::EXIT
    };
    label.to_string()
  }
}

/// A router together with the label → successor table it routes through.
#[derive(Clone)]
pub struct ConditionalEdge {
  pub(crate) router: Arc<dyn Router>,
  pub(crate) branches: BTreeMap<String, Successor>,
  pub(crate) bound: Option<BoundedLoop>,
}

impl ConditionalEdge {
  pub fn router(&self) -> &dyn Router {
    self.router.as_ref()
  }

  pub fn branches(&self) -> &BTreeMap<String, Successor> {
    &self.branches
  }

  /// The loop bound, when this edge was registered as a bounded loop.
  pub fn bound(&self) -> Option<&BoundedLoop> {
    self.bound.as_ref()
  }
}

impl fmt::Debug for ConditionalEdge {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ConditionalEdge")
      .field("branches", &self.branches)
      .field("bound", &self.bound)
      .finish_non_exhaustive()
  }
}

/// The single outgoing edge of a node.
#[derive(Debug, Clone)]
pub enum Edge {
  Static(Successor),
  Conditional(ConditionalEdge),
}

impl Edge {
  /// Every successor this edge can lead to.
  pub fn targets(&self) -> Vec<&Successor> {
    match self {
      Edge::Static(to) => vec![to],
      Edge::Conditional(cond) => cond.branches.values().collect(),
    }
  }
}
