//! Caller-tunable behavior for the compilers and the reconciler.
//!
//! Both option sets deserialize from camelCase with every field optional, so they
//! can be embedded directly in a provider's configuration block.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// What the Search encoder does with operators it has no token form for (`gt`, `ge`, `lt`, `le`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum OperatorPolicy {
    /// Reject the query with `QueryError::UnsupportedOperator`.
    #[default]
    Strict,
    /// Encode the predicate as `$eq` and log a warning.
    Lenient,
}

/// What the reconciler does when several groups share the requested name.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum AmbiguityPolicy {
    /// Adopt the first match returned by the directory and log a warning.
    #[default]
    PickFirst,
    /// Fail with `ReconcileError::AmbiguousName`.
    Fail,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerOptions {
    pub operator_policy: OperatorPolicy,
}

impl CompilerOptions {
    pub fn with_operator_policy(mut self, policy: OperatorPolicy) -> Self {
        self.operator_policy = policy;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReconcilerOptions {
    pub ambiguity: AmbiguityPolicy,
    /// Re-read the group after converging and report any drift.
    pub verify: bool,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            ambiguity: AmbiguityPolicy::default(),
            verify: true,
        }
    }
}

impl ReconcilerOptions {
    pub fn with_ambiguity(mut self, policy: AmbiguityPolicy) -> Self {
        self.ambiguity = policy;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}
