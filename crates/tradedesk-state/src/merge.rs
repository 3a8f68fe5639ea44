//! The merge step.
//!
//! `merge` is the only way a run moves from one state to the next. It is a
//! pure function of its inputs: the base is cloned, never touched.

use std::collections::BTreeMap;

use crate::Value;
use crate::schema::{Reducer, Schema};
use crate::state::{PartialState, State};

/// Fold `updates` into `base`, in slice order.
///
/// Fields absent from every update are carried over unchanged and no field is
/// ever removed. For disjoint updates the slice order does not affect the
/// result. `base` is taken as is; it is not checked against `schema`.
pub fn merge(base: &State, updates: &[PartialState], schema: &Schema) -> State {
  let mut next = base.clone();
  let fields = next.fields_mut();
  for update in updates {
    for (name, value) in update.iter() {
      apply(fields, name, value.clone(), schema.reducer(name));
    }
  }
  next
}

/// Single-update form of [`merge`].
pub fn merge_one(base: &State, update: &PartialState, schema: &Schema) -> State {
  merge(base, std::slice::from_ref(update), schema)
}

fn apply(fields: &mut BTreeMap<String, Value>, name: &str, value: Value, reducer: Reducer) {
  match reducer {
    Reducer::Overwrite => {
      fields.insert(name.to_string(), value);
    }
    Reducer::Append => {
      let slot = fields
        .entry(name.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));

      // Null starts an empty list. `merge` does not validate `base`, so a
      // direct caller can also hand in a scalar; it becomes the first element.
      if !slot.is_array() {
        let previous = slot.take();
        *slot = match previous {
          Value::Null => Value::Array(Vec::new()),
          other => Value::Array(vec![other]),
        };
      }

      if let Value::Array(items) = slot {
        match value {
          Value::Array(more) => items.extend(more),
          other => items.push(other),
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::FieldSpec;
  use serde_json::json;

  fn schema() -> Schema {
    Schema::new()
      .field("subject", FieldSpec::text())
      .field("a", FieldSpec::integer())
      .field("b", FieldSpec::integer())
      .field("c", FieldSpec::text())
      .field("log", FieldSpec::log())
  }

  #[test]
  fn test_single_update_overwrites_and_keeps_the_rest() {
    let base = State::new().with("subject", "X").with("a", 1);
    let update = PartialState::new().set("a", 5);

    let next = merge_one(&base, &update, &schema());

    assert_eq!(next.integer("a"), Some(5));
    assert_eq!(next.text("subject"), Some("X"));
    // base is untouched
    assert_eq!(base.integer("a"), Some(1));
  }

  #[test]
  fn test_empty_update_is_identity() {
    let base = State::new().with("subject", "X");
    let next = merge(&base, &[PartialState::new()], &schema());
    assert_eq!(next, base);

    let next = merge(&base, &[], &schema());
    assert_eq!(next, base);
  }

  #[test]
  fn test_disjoint_updates_are_order_independent() {
    let base = State::new().with("subject", "X");
    let updates = [
      PartialState::new().set("a", 1),
      PartialState::new().set("b", 2),
      PartialState::new().set("c", "three"),
    ];

    let expected = merge(&base, &updates, &schema());
    let permutations = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    for order in permutations {
      let reordered: Vec<PartialState> = order.iter().map(|i| updates[*i].clone()).collect();
      assert_eq!(merge(&base, &reordered, &schema()), expected, "{:?}", order);
    }

    assert_eq!(
      expected.to_json(),
      json!({"subject": "X", "a": 1, "b": 2, "c": "three"})
    );
  }

  #[test]
  fn test_null_is_written_not_deleted() {
    let base = State::new().with("c", "value");
    let next = merge_one(&base, &PartialState::new().set("c", Value::Null), &schema());
    assert!(next.contains("c"));
    assert_eq!(next.get("c"), Some(&Value::Null));
  }

  #[test]
  fn test_append_accumulates() {
    let schema = schema();
    let base = State::new();

    let first = merge_one(&base, &PartialState::new().set("log", "entry1"), &schema);
    let second = merge_one(&first, &PartialState::new().set("log", json!(["entry2"])), &schema);

    assert_eq!(second.get("log"), Some(&json!(["entry1", "entry2"])));
  }

  #[test]
  fn test_append_onto_scalar_or_null() {
    let schema = schema();
    let base = State::new().with("log", Value::Null);
    let next = merge_one(&base, &PartialState::new().set("log", "x"), &schema);
    assert_eq!(next.get("log"), Some(&json!(["x"])));

    let base = State::new().with("log", "legacy");
    let next = merge_one(&base, &PartialState::new().set("log", "x"), &schema);
    assert_eq!(next.get("log"), Some(&json!(["legacy", "x"])));
  }

  #[test]
  fn test_unknown_fields_overwrite() {
    let base = State::new().with("extra", 1);
    let next = merge_one(&base, &PartialState::new().set("extra", 2), &schema());
    assert_eq!(next.integer("extra"), Some(2));
  }
}
