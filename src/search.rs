//! The string-token `Search` encoding.
//!
//! The wire value is a JSON document serialized into a string:
//! `{"filter":["department:$eq:Eng","attributes[name=area].value:$ne:north"]}`.
//! Tokens only know `$eq` and `$ne`, so an `in` predicate is decomposed into one
//! `$eq` token per value, and decoding regroups `$eq` tokens that share a field
//! back into a single `in`.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use tracing::warn;

use crate::config::{CompilerOptions, OperatorPolicy};
use crate::error::QueryError;
use crate::fields;
use crate::traits::QueryCodec;
use crate::types::{FilterPredicate, Operator, QueryType, SearchOperator};
use crate::wire::SearchFilter;

const TOKEN_SEPARATOR: char = ':';

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchCompiler {
    options: CompilerOptions,
}

impl SearchCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    /// Pick the token operator for a predicate operator that has no `$` form.
    fn fallback_operator(&self, predicate: &FilterPredicate) -> Result<SearchOperator, QueryError> {
        match self.options.operator_policy {
            OperatorPolicy::Strict => Err(QueryError::UnsupportedOperator {
                operator: predicate.operator.to_string(),
                encoding: QueryType::Search.to_string(),
            }),
            OperatorPolicy::Lenient => {
                warn!(
                    event = "Encode",
                    phase = "Search",
                    field = predicate.field.as_str(),
                    operator = predicate.operator.as_ref(),
                    "operator has no Search form, encoding as $eq"
                );
                Ok(SearchOperator::Eq)
            }
        }
    }

    /// Split one predicate into `(field, op, value)` token parts, `in` becoming one `$eq` per value.
    fn decompose(
        &self,
        predicate: &FilterPredicate,
    ) -> Result<Vec<(String, SearchOperator, String)>, QueryError> {
        if predicate.operator == Operator::In {
            return Ok(predicate
                .in_segments()
                .into_iter()
                .map(|segment| {
                    (
                        predicate.field.clone(),
                        SearchOperator::Eq,
                        segment.to_string(),
                    )
                })
                .collect());
        }

        let op = match SearchOperator::from_operator(predicate.operator) {
            Some(op) => op,
            None => self.fallback_operator(predicate)?,
        };
        Ok(vec![(predicate.field.clone(), op, predicate.value.clone())])
    }
}

impl QueryCodec for SearchCompiler {
    type Wire = str;

    fn query_type(&self) -> &'static str {
        QueryType::Search.as_str()
    }

    fn encode(&self, predicates: &[FilterPredicate]) -> Result<String, QueryError> {
        let mut resolved = predicates
            .iter()
            .map(|predicate| {
                predicate.validate()?;
                Ok(FilterPredicate::new(
                    fields::to_wire(&predicate.field),
                    predicate.operator,
                    predicate.value.clone(),
                ))
            })
            .collect::<Result<Vec<_>, QueryError>>()?;

        // Cross-predicate order is normalized; the value order inside an `in` is kept.
        resolved.sort();

        let mut filter = Vec::new();
        for predicate in &resolved {
            for (field, op, value) in self.decompose(predicate)? {
                filter.push(format!("{field}{TOKEN_SEPARATOR}{op}{TOKEN_SEPARATOR}{value}"));
            }
        }

        Ok(serde_json::to_string(&SearchFilter { filter })?)
    }

    fn decode(&self, wire: &str) -> Result<Vec<FilterPredicate>, QueryError> {
        let document: SearchFilter = serde_json::from_str(wire)?;
        let tokens = document
            .filter
            .iter()
            .enumerate()
            .map(|(index, token)| parse_token(index, token))
            .collect::<Result<Vec<_>, QueryError>>()?;

        Ok(regroup(tokens))
    }

    fn normalize(&self, predicates: &[FilterPredicate]) -> Vec<FilterPredicate> {
        let mut tokens = Vec::new();
        let mut untokenized = Vec::new();

        for predicate in predicates.iter().map(FilterPredicate::canonical) {
            match self.decompose(&predicate) {
                Ok(parts) => tokens.extend(parts),
                // Only reachable under the strict policy, where encoding fails anyway.
                Err(_) => untokenized.push(predicate),
            }
        }

        let mut normalized: Vec<FilterPredicate> = regroup(tokens)
            .iter()
            .map(FilterPredicate::canonical)
            .chain(untokenized)
            .collect();
        normalized.sort();
        normalized
    }
}

/// Split `field:$op:value` into user-facing parts, keeping any further `:` inside the value.
fn parse_token(index: usize, token: &str) -> Result<(String, SearchOperator, String), QueryError> {
    let mut parts = token.splitn(3, TOKEN_SEPARATOR);
    let (Some(field), Some(op), Some(value)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(QueryError::MalformedWire(format!(
            "search token {index} '{token}' is not of the form field:$op:value"
        )));
    };

    if field.is_empty() || value.is_empty() {
        return Err(QueryError::MalformedWire(format!(
            "search token {index} '{token}' has an empty field or value"
        )));
    }

    let op = SearchOperator::from_str(op).map_err(|_| {
        QueryError::MalformedWire(format!(
            "search token {index} '{token}' has unknown operator '{op}'"
        ))
    })?;

    let field = fields::from_wire(field);
    if field.is_empty() {
        return Err(QueryError::MalformedWire(format!(
            "search token {index} '{token}' names an empty attribute"
        )));
    }

    Ok((field, op, value.to_string()))
}

/// Collapse token parts back into predicates.
///
/// Parts are grouped by `(field, op)`; values keep encounter order and repeats are dropped.
/// An `$eq` group with several values becomes one `in`; `$ne` has no set form, so
/// each of its values stays a separate `ne`.
fn regroup<I>(parts: I) -> Vec<FilterPredicate>
where
    I: IntoIterator<Item = (String, SearchOperator, String)>,
{
    let mut groups: BTreeMap<(String, SearchOperator), (Vec<String>, BTreeSet<String>)> =
        BTreeMap::new();
    for (field, op, value) in parts {
        let (values, seen) = groups.entry((field, op)).or_default();
        if seen.insert(value.clone()) {
            values.push(value);
        }
    }

    let mut predicates: Vec<FilterPredicate> = groups
        .into_iter()
        .flat_map(|((field, op), (values, _))| match op {
            SearchOperator::Eq if values.len() > 1 => vec![FilterPredicate::any_of(field, values)],
            _ => values
                .into_iter()
                .map(|value| FilterPredicate::new(field.clone(), op.to_operator(), value))
                .collect(),
        })
        .collect();
    predicates.sort();
    predicates
}
