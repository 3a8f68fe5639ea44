use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Value;
use crate::error::FieldViolation;
use crate::state::State;

/// The shape a field's value must have.
///
/// `Null` is accepted for every kind: it is the default "unavailable" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
  Text,
  Integer,
  Number,
  Bool,
  List,
  Record,
  Any,
}

impl FieldKind {
  pub fn accepts(&self, value: &Value) -> bool {
    if value.is_null() {
      return true;
    }
    match self {
      FieldKind::Text => value.is_string(),
      FieldKind::Integer => value.is_i64() || value.is_u64(),
      FieldKind::Number => value.is_number(),
      FieldKind::Bool => value.is_boolean(),
      FieldKind::List => value.is_array(),
      FieldKind::Record => value.is_object(),
      FieldKind::Any => true,
    }
  }
}

impl fmt::Display for FieldKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      FieldKind::Text => "text",
      FieldKind::Integer => "integer",
      FieldKind::Number => "number",
      FieldKind::Bool => "bool",
      FieldKind::List => "list",
      FieldKind::Record => "record",
      FieldKind::Any => "any",
    };
    write!(f, "{}", s)
  }
}

/// How an update to a field combines with the value already in the state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
  /// The update replaces the previous value.
  #[default]
  Overwrite,
  /// The update is appended to a list: a list update is concatenated, any
  /// other value is pushed as a single element.
  Append,
}

/// Declaration of a single state field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
  pub kind: FieldKind,
  #[serde(default)]
  pub reducer: Reducer,
  /// Written in place of real data when the task owning this field fails.
  #[serde(default)]
  pub sentinel: Value,
}

impl FieldSpec {
  pub fn new(kind: FieldKind) -> Self {
    Self {
      kind,
      reducer: Reducer::Overwrite,
      sentinel: Value::Null,
    }
  }

  pub fn text() -> Self {
    Self::new(FieldKind::Text)
  }

  pub fn integer() -> Self {
    Self::new(FieldKind::Integer)
  }

  pub fn list() -> Self {
    Self::new(FieldKind::List)
  }

  pub fn any() -> Self {
    Self::new(FieldKind::Any)
  }

  /// A list field whose updates accumulate.
  pub fn log() -> Self {
    Self::new(FieldKind::List).with_reducer(Reducer::Append)
  }

  pub fn with_reducer(mut self, reducer: Reducer) -> Self {
    self.reducer = reducer;
    self
  }

  pub fn with_sentinel(mut self, sentinel: impl Into<Value>) -> Self {
    self.sentinel = sentinel.into();
    self
  }
}

/// Static registry of every field a graph may read or write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
  fields: BTreeMap<String, FieldSpec>,
}

impl Schema {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder form of [`Schema::insert`].
  pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
    self.insert(name, spec);
    self
  }

  pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) {
    self.fields.insert(name.into(), spec);
  }

  pub fn get(&self, name: &str) -> Option<&FieldSpec> {
    self.fields.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.fields.contains_key(name)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.fields.keys().map(String::as_str)
  }

  /// Reducer for a field. Unknown fields overwrite.
  pub fn reducer(&self, name: &str) -> Reducer {
    self.get(name).map(|s| s.reducer).unwrap_or_default()
  }

  /// Sentinel for a field. Unknown fields get `Null`.
  pub fn sentinel(&self, name: &str) -> Value {
    self
      .get(name)
      .map(|s| s.sentinel.clone())
      .unwrap_or(Value::Null)
  }

  /// Check a single update against the schema.
  ///
  /// Updates to an appending field may be a single element, so only the
  /// field's existence is checked for those.
  pub fn check_update(&self, name: &str, value: &Value) -> Result<(), FieldViolation> {
    let spec = self.get(name).ok_or_else(|| FieldViolation::UnknownField {
      field: name.to_string(),
    })?;

    if spec.reducer == Reducer::Append || spec.kind.accepts(value) {
      return Ok(());
    }

    Err(FieldViolation::KindMismatch {
      field: name.to_string(),
      expected: spec.kind,
      actual: type_name(value).to_string(),
    })
  }

  /// Check every field of a full state.
  pub fn check_state(&self, state: &State) -> Result<(), FieldViolation> {
    for (name, value) in state.iter() {
      let spec = self.get(name).ok_or_else(|| FieldViolation::UnknownField {
        field: name.clone(),
      })?;
      if !spec.kind.accepts(value) {
        return Err(FieldViolation::KindMismatch {
          field: name.clone(),
          expected: spec.kind,
          actual: type_name(value).to_string(),
        });
      }
    }
    Ok(())
  }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "bool",
    Value::Number(n) if n.is_f64() => "number",
    Value::Number(_) => "integer",
    Value::String(_) => "text",
    Value::Array(_) => "list",
    Value::Object(_) => "record",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn schema() -> Schema {
    Schema::new()
      .field("subject", FieldSpec::text())
      .field("round", FieldSpec::integer())
      .field("log", FieldSpec::log())
      .field("score", FieldSpec::new(FieldKind::Number))
  }

  #[test]
  fn test_check_update_kinds() {
    let schema = schema();
    assert!(schema.check_update("subject", &json!("X")).is_ok());
    assert!(schema.check_update("round", &json!(2)).is_ok());
    assert!(schema.check_update("score", &json!(1.5)).is_ok());
    assert!(schema.check_update("score", &json!(1)).is_ok());

    let err = schema.check_update("round", &json!("two")).unwrap_err();
    assert_eq!(
      err,
      FieldViolation::KindMismatch {
        field: "round".to_string(),
        expected: FieldKind::Integer,
        actual: "text".to_string(),
      }
    );
  }

  #[test]
  fn test_null_is_accepted_for_every_kind() {
    let schema = schema();
    for name in ["subject", "round", "log", "score"] {
      assert!(schema.check_update(name, &Value::Null).is_ok(), "{}", name);
    }
  }

  #[test]
  fn test_append_accepts_single_elements() {
    let schema = schema();
    assert!(schema.check_update("log", &json!("entry")).is_ok());
    assert!(schema.check_update("log", &json!(["a", "b"])).is_ok());
  }

  #[test]
  fn test_unknown_field_is_rejected() {
    let err = schema().check_update("nope", &json!(1)).unwrap_err();
    assert!(matches!(err, FieldViolation::UnknownField { .. }));
    assert_eq!(err.field(), "nope");
  }

  #[test]
  fn test_check_state() {
    let schema = schema();
    let ok = State::new().with("subject", "X").with("round", 0);
    assert!(schema.check_state(&ok).is_ok());

    let bad = State::new().with("log", "not a list");
    assert!(matches!(
      schema.check_state(&bad),
      Err(FieldViolation::KindMismatch { .. })
    ));
  }

  #[test]
  fn test_defaults_for_unknown_fields() {
    let schema = Schema::new().field(
      "signal",
      FieldSpec::text().with_sentinel("[unavailable]"),
    );
    assert_eq!(schema.reducer("missing"), Reducer::Overwrite);
    assert_eq!(schema.sentinel("missing"), Value::Null);
    assert_eq!(schema.sentinel("signal"), json!("[unavailable]"));
  }
}
