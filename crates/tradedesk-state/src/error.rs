use thiserror::Error;

use crate::schema::FieldKind;

/// A field update that does not fit the schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldViolation {
  #[error("unknown field '{field}'")]
  UnknownField { field: String },

  #[error("field '{field}' expects {expected}, got {actual}")]
  KindMismatch {
    field: String,
    expected: FieldKind,
    actual: String,
  },
}

impl FieldViolation {
  /// Name of the offending field.
  pub fn field(&self) -> &str {
    match self {
      FieldViolation::UnknownField { field } => field,
      FieldViolation::KindMismatch { field, .. } => field,
    }
  }
}

#[derive(Debug, Error)]
pub enum StateError {
  #[error("state must be a JSON object, got {actual}")]
  NotAnObject { actual: String },

  #[error(transparent)]
  Field(#[from] FieldViolation),
}
