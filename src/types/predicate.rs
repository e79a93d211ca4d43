//! A single field/operator/value filter condition.

use std::fmt::{Display, Formatter, Result as FmtResult};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::QueryError;
use crate::fields::{self, ResolvedField};

use super::operator::Operator;

/// Separator between the values of an `in` predicate, e.g. `"Eng|Sales"`.
pub const IN_SEPARATOR: char = '|';

/// One filter condition of a dynamic-group membership query.
///
/// The derived ordering is `(field, operator, value)`, which is the order
/// predicates are emitted in on the wire.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub struct FilterPredicate {
    /// User-facing field name, either a standard field (`department`) or a custom attribute (`area`).
    pub field: String,
    pub operator: Operator,
    /// For `in`, a `|`-delimited set of values.
    pub value: String,
}

impl FilterPredicate {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Operator::Ne, value)
    }

    /// Build an `in` predicate from a list of values.
    pub fn any_of<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let value = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .join(&IN_SEPARATOR.to_string());
        Self::new(field, Operator::In, value)
    }

    /// The trimmed, non-empty segments of the value, in the order given.
    ///
    /// Only meaningful for `in`; other operators treat the value as a single literal.
    pub fn in_segments(&self) -> Vec<&str> {
        self.value
            .split(IN_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if self.field.trim().is_empty() {
            return Err(QueryError::InvalidPredicate(format!(
                "empty field name in predicate '{self}'"
            )));
        }
        if let ResolvedField::Custom { sanitized } = fields::resolve(&self.field) {
            // Both would decode to a different field than the one declared.
            if sanitized.is_empty() {
                return Err(QueryError::InvalidPredicate(format!(
                    "field '{}' has no characters usable in an attribute name",
                    self.field
                )));
            }
            if fields::is_standard_field(&sanitized) {
                return Err(QueryError::InvalidPredicate(format!(
                    "custom attribute '{}' sanitizes to the standard field '{sanitized}'",
                    self.field
                )));
            }
        }
        if self.value.is_empty() {
            return Err(QueryError::InvalidPredicate(format!(
                "empty value for field '{}'",
                self.field
            )));
        }
        if self.operator == Operator::In && self.in_segments().is_empty() {
            return Err(QueryError::InvalidPredicate(format!(
                "'in' predicate on field '{}' has no values in '{}'",
                self.field, self.value
            )));
        }
        Ok(())
    }

    /// The canonical form used for comparison.
    ///
    /// `in` values are trimmed, sorted and de-duplicated; an `in` with a single value
    /// collapses to `eq`.
    pub fn canonical(&self) -> Self {
        let field = self.field.trim().to_string();
        if self.operator != Operator::In {
            return Self::new(field, self.operator, self.value.clone());
        }

        let segments: Vec<&str> = self.in_segments().into_iter().sorted().dedup().collect();
        match segments.as_slice() {
            [single] => Self::eq(field, *single),
            _ => Self::any_of(field, segments),
        }
    }
}

impl Display for FilterPredicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}
