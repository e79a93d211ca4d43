use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the pure compilation layer (predicates, field resolution and wire codecs).
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum QueryError {
    #[error("malformed wire payload: {0}")]
    MalformedWire(String),

    #[error("invalid predicate: {0}")]
    InvalidPredicate(String),

    #[error("operator '{operator}' cannot be expressed in the {encoding} encoding")]
    UnsupportedOperator { operator: String, encoding: String },

    #[error("field '{0}' is a custom attribute and is only valid in a Search query")]
    CustomFieldInFilterQuery(String),
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::MalformedWire(err.to_string())
    }
}

/// The result of a failed `create` call, as reported by the caller's directory client.
///
/// Only `NameConflict` is treated specially by the reconciler; everything else is
/// surfaced unchanged.
#[derive(Debug, Error)]
pub enum CreateError<E> {
    #[error("a group named '{0}' already exists")]
    NameConflict(String),

    #[error(transparent)]
    Backend(E),
}

/// Errors raised while reconciling a group against the directory.
#[derive(Debug, Error)]
pub enum ReconcileError<E> {
    #[error("failed to compile group configuration: {0}")]
    Compile(#[from] QueryError),

    #[error("directory error: {0}")]
    Backend(#[source] E),

    #[error("{matches} groups are named '{name}'")]
    AmbiguousName { name: String, matches: usize },

    #[error("creating group '{name}' conflicted, but no group by that name could be found")]
    UnresolvedConflict { name: String },
}
