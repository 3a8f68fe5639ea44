//! Construction-time validation of graphs.

use std::sync::Arc;

use tradedesk_graph::{
  BoundedLoop, END, GraphBuilder, GraphError, MergePolicy, NodeDef, Successor, TaskDef, TaskError,
  task_fn,
};
use tradedesk_state::{FieldSpec, PartialState, Schema, State};

fn schema() -> Schema {
  Schema::new()
    .field("subject", FieldSpec::text())
    .field("a", FieldSpec::integer())
    .field("b", FieldSpec::integer())
    .field("round", FieldSpec::integer())
    .field("log", FieldSpec::log())
    .field("result", FieldSpec::text())
}

fn noop(name: &str, outputs: &[&str]) -> TaskDef {
  TaskDef::new(
    name,
    outputs.iter().copied(),
    task_fn(|_state: Arc<State>| async move { Ok::<_, TaskError>(PartialState::new()) }),
  )
}

fn example_builder(max: u64) -> GraphBuilder {
  GraphBuilder::new(schema())
    .add_node(NodeDef::parallel(
      "gather",
      [noop("a", &["a"]), noop("b", &["b"])],
    ))
    .add_node(NodeDef::sequential("debate", noop("debate", &["log"])).counting("round"))
    .add_node(NodeDef::sequential("decide", noop("decide", &["result"])))
    .set_start("gather")
    .add_edge("gather", "debate")
    .add_bounded_loop("debate", "round", max, "debate", "decide")
    .add_edge("decide", END)
}

#[test]
fn test_example_graph_builds() {
  let graph = example_builder(2).build().unwrap();

  assert_eq!(graph.start(), "gather");
  assert!(graph.node("gather").unwrap().is_parallel());
  assert!(!graph.node("debate").unwrap().is_parallel());

  let loops: Vec<_> = graph.loops().collect();
  assert_eq!(loops.len(), 1);
  assert_eq!(loops[0].0, "debate");
  assert_eq!(loops[0].1, &BoundedLoop::new("round", 2));
}

#[test]
fn test_next_follows_static_and_conditional_edges() {
  let graph = example_builder(2).build().unwrap();

  let t = graph.next("gather", &State::new()).unwrap();
  assert_eq!(t.to, Successor::Node("debate".to_string()));
  assert_eq!(t.label, None);

  let t = graph.next("debate", &State::new().with("round", 1)).unwrap();
  assert_eq!(t.to, Successor::Node("debate".to_string()));
  assert_eq!(t.label.as_deref(), Some(BoundedLoop::CONTINUE));

  let t = graph.next("debate", &State::new().with("round", 2)).unwrap();
  assert_eq!(t.to, Successor::Node("decide".to_string()));

  let t = graph.next("decide", &State::new()).unwrap();
  assert_eq!(t.to, Successor::End);
}

#[test]
fn test_unknown_router_label_is_a_route_error() {
  let graph = GraphBuilder::new(schema())
    .add_node(NodeDef::sequential("only", noop("only", &["a"])))
    .set_start("only")
    .add_conditional_edge("only", |_: &State| "elsewhere".to_string(), [("done", END)])
    .build()
    .unwrap();

  let err = graph.next("only", &State::new()).unwrap_err();
  assert_eq!(err.from, "only");
  assert_eq!(err.label, "elsewhere");
}

#[test]
fn test_edge_to_unregistered_node_fails() {
  let result = GraphBuilder::new(schema())
    .add_node(NodeDef::sequential("a", noop("a", &["a"])))
    .set_start("a")
    .add_edge("a", "ghost")
    .build();

  assert_eq!(
    result.unwrap_err(),
    GraphError::InvalidEdge {
      from: "a".to_string(),
      to: "ghost".to_string(),
    }
  );
}

#[test]
fn test_branch_to_unregistered_node_fails() {
  let result = GraphBuilder::new(schema())
    .add_node(NodeDef::sequential("a", noop("a", &["a"])))
    .set_start("a")
    .add_conditional_edge("a", |_: &State| "x".to_string(), [("x", "ghost")])
    .build();

  assert!(matches!(result, Err(GraphError::InvalidEdge { .. })));
}

#[test]
fn test_edge_from_unregistered_node_fails() {
  let result = GraphBuilder::new(schema())
    .add_node(NodeDef::sequential("a", noop("a", &["a"])))
    .set_start("a")
    .add_edge("a", END)
    .add_edge("ghost", "a")
    .build();

  assert!(matches!(result, Err(GraphError::InvalidEdge { .. })));
}

#[test]
fn test_missing_and_unknown_start() {
  let result = GraphBuilder::new(schema())
    .add_node(NodeDef::sequential("a", noop("a", &["a"])))
    .add_edge("a", END)
    .build();
  assert_eq!(result.unwrap_err(), GraphError::MissingStart);

  let result = GraphBuilder::new(schema())
    .add_node(NodeDef::sequential("a", noop("a", &["a"])))
    .add_edge("a", END)
    .set_start("b")
    .build();
  assert_eq!(result.unwrap_err(), GraphError::StartNotFound("b".to_string()));
}

#[test]
fn test_duplicate_node_fails() {
  let result = GraphBuilder::new(schema())
    .add_node(NodeDef::sequential("a", noop("a", &["a"])))
    .add_node(NodeDef::sequential("a", noop("b", &["b"])))
    .set_start("a")
    .add_edge("a", END)
    .build();

  assert_eq!(result.unwrap_err(), GraphError::DuplicateNode("a".to_string()));
}

#[test]
fn test_two_edges_from_one_node_fails() {
  let result = GraphBuilder::new(schema())
    .add_node(NodeDef::sequential("a", noop("a", &["a"])))
    .set_start("a")
    .add_edge("a", END)
    .add_edge("a", END)
    .build();

  assert_eq!(
    result.unwrap_err(),
    GraphError::MultipleSuccessors("a".to_string())
  );
}

#[test]
fn test_node_without_edge_fails() {
  let result = GraphBuilder::new(schema())
    .add_node(NodeDef::sequential("a", noop("a", &["a"])))
    .set_start("a")
    .build();

  assert_eq!(result.unwrap_err(), GraphError::NoSuccessor("a".to_string()));
}

#[test]
fn test_empty_node_and_duplicate_task_fail() {
  let result = GraphBuilder::new(schema())
    .add_node(NodeDef::parallel("a", Vec::<TaskDef>::new()))
    .set_start("a")
    .add_edge("a", END)
    .build();
  assert_eq!(result.unwrap_err(), GraphError::EmptyNode("a".to_string()));

  let result = GraphBuilder::new(schema())
    .add_node(NodeDef::parallel("a", [noop("t", &["a"]), noop("t", &["b"])]))
    .set_start("a")
    .add_edge("a", END)
    .build();
  assert!(matches!(result, Err(GraphError::DuplicateTask { .. })));
}

#[test]
fn test_overlapping_outputs_fail() {
  let result = GraphBuilder::new(schema())
    .add_node(NodeDef::parallel(
      "gather",
      [noop("a", &["a"]), noop("b", &["b", "a"])],
    ))
    .set_start("gather")
    .add_edge("gather", END)
    .build();

  assert_eq!(
    result.unwrap_err(),
    GraphError::OverlappingOutputs {
      node: "gather".to_string(),
      field: "a".to_string(),
      first: "a".to_string(),
      second: "b".to_string(),
    }
  );
}

#[test]
fn test_reducer_policy_allows_shared_append_fields_only() {
  let shared_log = GraphBuilder::new(schema())
    .add_node(
      NodeDef::parallel("gather", [noop("a", &["a", "log"]), noop("b", &["b", "log"])])
        .with_merge_policy(MergePolicy::Reducers),
    )
    .set_start("gather")
    .add_edge("gather", END)
    .build();
  assert!(shared_log.is_ok());

  let shared_log_disjoint_policy = GraphBuilder::new(schema())
    .add_node(NodeDef::parallel(
      "gather",
      [noop("a", &["log"]), noop("b", &["log"])],
    ))
    .set_start("gather")
    .add_edge("gather", END)
    .build();
  assert!(matches!(
    shared_log_disjoint_policy,
    Err(GraphError::OverlappingOutputs { .. })
  ));

  let shared_scalar = GraphBuilder::new(schema())
    .add_node(
      NodeDef::parallel("gather", [noop("a", &["a"]), noop("b", &["a"])])
        .with_merge_policy(MergePolicy::Reducers),
    )
    .set_start("gather")
    .add_edge("gather", END)
    .build();
  assert!(matches!(
    shared_scalar,
    Err(GraphError::OverlappingOutputs { .. })
  ));
}

#[test]
fn test_unknown_output_field_fails() {
  let result = GraphBuilder::new(schema())
    .add_node(NodeDef::sequential("a", noop("a", &["nope"])))
    .set_start("a")
    .add_edge("a", END)
    .build();

  assert!(matches!(result, Err(GraphError::UnknownField { .. })));
}

#[test]
fn test_bounded_loop_requires_counting_node() {
  let result = GraphBuilder::new(schema())
    .add_node(NodeDef::sequential("debate", noop("debate", &["log"])))
    .add_node(NodeDef::sequential("decide", noop("decide", &["result"])))
    .set_start("debate")
    .add_bounded_loop("debate", "round", 2, "debate", "decide")
    .add_edge("decide", END)
    .build();

  assert_eq!(
    result.unwrap_err(),
    GraphError::UncountedLoop {
      node: "debate".to_string(),
      counter: "round".to_string(),
    }
  );
}

#[test]
fn test_counter_must_be_an_integer_field_not_owned_by_a_task() {
  let result = GraphBuilder::new(schema())
    .add_node(NodeDef::sequential("debate", noop("debate", &["log"])).counting("result"))
    .set_start("debate")
    .add_edge("debate", END)
    .build();
  assert_eq!(
    result.unwrap_err(),
    GraphError::InvalidCounter {
      field: "result".to_string(),
    }
  );

  let result = GraphBuilder::new(schema())
    .add_node(NodeDef::sequential("debate", noop("debate", &["round"])).counting("round"))
    .set_start("debate")
    .add_edge("debate", END)
    .build();
  assert!(matches!(result, Err(GraphError::CounterOwnedByTask { .. })));
}

#[test]
fn test_unreachable_nodes() {
  let builder = || {
    GraphBuilder::new(schema())
      .add_node(NodeDef::sequential("a", noop("a", &["a"])))
      .add_node(NodeDef::sequential("island", noop("b", &["b"])))
      .set_start("a")
      .add_edge("a", END)
      .add_edge("island", END)
  };

  assert_eq!(
    builder().build().unwrap_err(),
    GraphError::Unreachable("island".to_string())
  );
  assert!(builder().allow_unreachable().build().is_ok());
}

#[test]
fn test_describe() {
  let graph = example_builder(3).build().unwrap();
  let description = graph.describe();

  assert_eq!(description.start, "gather");
  assert_eq!(description.nodes.len(), 3);

  let json = serde_json::to_value(&description).unwrap();
  let edges = json["edges"].as_array().unwrap();
  let debate = edges
    .iter()
    .find(|e| e["from"] == "debate")
    .unwrap();
  assert_eq!(debate["type"], "conditional");
  assert_eq!(debate["branches"]["continue"], "debate");
  assert_eq!(debate["branches"]["exit"], "decide");
  assert_eq!(debate["bound"]["max"], 3);
}
