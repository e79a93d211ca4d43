//! Predicate operators and their Search-encoding counterparts.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// The operator of a single filter predicate, as the user writes it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ToSchema,
    AsRefStr,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Operator {
    Eq,
    Ne,
    /// Membership in a `|`-delimited set of values.
    In,
    Gt,
    Ge,
    Lt,
    Le,
}

/// Operators available inside a Search token (`field:$op:value`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, AsRefStr, Display, EnumString,
)]
pub enum SearchOperator {
    #[strum(serialize = "$eq")]
    Eq,
    #[strum(serialize = "$ne")]
    Ne,
}

impl SearchOperator {
    /// Map a predicate operator onto the Search encoding, if it has a direct counterpart.
    ///
    /// `in` has none: it is decomposed into one `$eq` token per value by the encoder.
    pub fn from_operator(operator: Operator) -> Option<Self> {
        match operator {
            Operator::Eq => Some(Self::Eq),
            Operator::Ne => Some(Self::Ne),
            _ => None,
        }
    }

    pub fn to_operator(self) -> Operator {
        match self {
            Self::Eq => Operator::Eq,
            Self::Ne => Operator::Ne,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;
    use yare::parameterized;

    #[parameterized(
        eq = { "eq", Operator::Eq },
        ne = { "ne", Operator::Ne },
        is_in = { "in", Operator::In },
        gt = { "gt", Operator::Gt },
        ge = { "ge", Operator::Ge },
        lt = { "lt", Operator::Lt },
        le = { "le", Operator::Le },
    )]
    fn test_operator_from_str(input: &str, expected: Operator) {
        assert_eq!(Operator::from_str(input).unwrap(), expected);
        assert_eq!(expected.as_ref(), input);
    }

    #[test]
    fn test_operator_rejects_unknown() {
        assert!(Operator::from_str("like").is_err());
        assert!(Operator::from_str("EQ").is_err());
    }

    #[test]
    fn test_operator_serde_matches_strum() {
        for op in Operator::iter() {
            let serialized = serde_json::to_value(op).unwrap();
            assert_eq!(serialized, serde_json::json!(op.to_string()));
        }
    }

    #[parameterized(
        eq = { "$eq", SearchOperator::Eq },
        ne = { "$ne", SearchOperator::Ne },
    )]
    fn test_search_operator_round_trip(input: &str, expected: SearchOperator) {
        let op = SearchOperator::from_str(input).unwrap();
        assert_eq!(op, expected);
        assert_eq!(op.to_string(), input);
        assert_eq!(SearchOperator::from_operator(op.to_operator()), Some(op));
    }

    #[test]
    fn test_search_operator_has_no_range_or_set_form() {
        for op in [Operator::In, Operator::Gt, Operator::Ge, Operator::Lt, Operator::Le] {
            assert_eq!(SearchOperator::from_operator(op), None);
        }
        assert!(SearchOperator::from_str("$in").is_err());
    }
}
