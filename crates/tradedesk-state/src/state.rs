use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Value;
use crate::error::StateError;
use crate::schema::type_name;

/// The accumulated record of a run.
///
/// Fields are kept in a sorted map so two states with the same content compare
/// and serialize identically regardless of the order their fields were written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
  fields: BTreeMap<String, Value>,
}

impl State {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder used to assemble an initial state.
  pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
    self.fields.insert(field.into(), value.into());
    self
  }

  /// Build a state from a JSON object.
  pub fn from_json(value: Value) -> Result<Self, StateError> {
    match value {
      Value::Object(map) => Ok(map.into_iter().collect()),
      other => Err(StateError::NotAnObject {
        actual: type_name(&other).to_string(),
      }),
    }
  }

  pub fn to_json(&self) -> Value {
    Value::Object(
      self
        .fields
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect(),
    )
  }

  pub fn get(&self, field: &str) -> Option<&Value> {
    self.fields.get(field)
  }

  pub fn contains(&self, field: &str) -> bool {
    self.fields.contains_key(field)
  }

  /// String value of a field, if it holds one.
  pub fn text(&self, field: &str) -> Option<&str> {
    self.get(field).and_then(Value::as_str)
  }

  /// Integer value of a field, if it holds one.
  pub fn integer(&self, field: &str) -> Option<i64> {
    self.get(field).and_then(Value::as_i64)
  }

  /// List value of a field, if it holds one.
  pub fn list(&self, field: &str) -> Option<&[Value]> {
    self.get(field).and_then(Value::as_array).map(Vec::as_slice)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
    self.fields.iter()
  }

  pub fn len(&self) -> usize {
    self.fields.len()
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty()
  }

  pub(crate) fn fields_mut(&mut self) -> &mut BTreeMap<String, Value> {
    &mut self.fields
  }
}

impl FromIterator<(String, Value)> for State {
  fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
    Self {
      fields: iter.into_iter().collect(),
    }
  }
}

/// The fields one task (or one node) contributes in a single step.
///
/// May be empty. A partial never removes a field from the state; to signal
/// "no data" a task writes an explicit empty or sentinel value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartialState {
  fields: BTreeMap<String, Value>,
}

impl PartialState {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder form of [`PartialState::insert`].
  pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
    self.insert(field, value);
    self
  }

  pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
    self.fields.insert(field.into(), value.into());
  }

  pub fn get(&self, field: &str) -> Option<&Value> {
    self.fields.get(field)
  }

  pub fn contains(&self, field: &str) -> bool {
    self.fields.contains_key(field)
  }

  pub fn fields(&self) -> impl Iterator<Item = &str> {
    self.fields.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
    self.fields.iter()
  }

  pub fn len(&self) -> usize {
    self.fields.len()
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty()
  }
}

impl FromIterator<(String, Value)> for PartialState {
  fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
    Self {
      fields: iter.into_iter().collect(),
    }
  }
}

impl IntoIterator for PartialState {
  type Item = (String, Value);
  type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

  fn into_iter(self) -> Self::IntoIter {
    self.fields.into_iter()
  }
}
