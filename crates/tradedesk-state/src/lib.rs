//! Tradedesk State
//!
//! The state threaded through a graph run. A run starts from a caller-supplied
//! [`State`], every node produces one or more [`PartialState`]s, and [`merge`]
//! folds them into the next [`State`]. Nothing in this crate mutates a state
//! that someone else can observe: merging always yields a fresh value.
//!
//! Fields are described by a static [`Schema`] which fixes their kind, how
//! updates combine ([`Reducer`]), and the sentinel written when the task that
//! owns a field fails.

mod error;
mod merge;
mod schema;
mod state;

pub use error::{FieldViolation, StateError};
pub use merge::{merge, merge_one};
pub use schema::{FieldKind, FieldSpec, Reducer, Schema};
pub use state::{PartialState, State};

/// Field values are plain JSON.
pub type Value = serde_json::Value;
