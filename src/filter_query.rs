//! The structured `FilterQuery` encoding.
//!
//! Each predicate maps 1:1 onto a `{field, operator, value}` entry. `in` is native
//! to this encoding, so nothing is decomposed; its values are sent sorted and
//! de-duplicated. Only standard fields are accepted.

use std::str::FromStr;

use itertools::Itertools;

use crate::error::QueryError;
use crate::fields::{self, ResolvedField};
use crate::traits::QueryCodec;
use crate::types::{FilterPredicate, IN_SEPARATOR, Operator, QueryType};
use crate::wire::FilterWire;

#[derive(Debug, Clone, Copy, Default)]
pub struct FilterQueryCompiler;

impl FilterQueryCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl QueryCodec for FilterQueryCompiler {
    type Wire = [FilterWire];

    fn query_type(&self) -> &'static str {
        QueryType::FilterQuery.as_str()
    }

    fn encode(&self, predicates: &[FilterPredicate]) -> Result<Vec<FilterWire>, QueryError> {
        let mut entries = predicates
            .iter()
            .map(|predicate| {
                predicate.validate()?;
                let field = match fields::resolve(&predicate.field) {
                    ResolvedField::Standard { wire } => wire.to_string(),
                    ResolvedField::Custom { .. } => {
                        return Err(QueryError::CustomFieldInFilterQuery(
                            predicate.field.clone(),
                        ));
                    }
                };
                Ok((field, predicate.operator, wire_value(predicate)))
            })
            .collect::<Result<Vec<_>, QueryError>>()?;

        entries.sort();

        Ok(entries
            .into_iter()
            .map(|(field, operator, value)| FilterWire {
                field,
                operator: operator.to_string(),
                value,
            })
            .collect())
    }

    fn decode(&self, wire: &[FilterWire]) -> Result<Vec<FilterPredicate>, QueryError> {
        let mut predicates = wire
            .iter()
            .enumerate()
            .map(|(index, entry)| decode_entry(index, entry))
            .collect::<Result<Vec<_>, QueryError>>()?;
        predicates.sort();
        Ok(predicates)
    }
}

fn wire_value(predicate: &FilterPredicate) -> String {
    match predicate.operator {
        Operator::In => predicate
            .in_segments()
            .into_iter()
            .sorted()
            .dedup()
            .join(&IN_SEPARATOR.to_string()),
        _ => predicate.value.clone(),
    }
}

fn decode_entry(index: usize, entry: &FilterWire) -> Result<FilterPredicate, QueryError> {
    let missing = [
        ("field", &entry.field),
        ("operator", &entry.operator),
        ("value", &entry.value),
    ]
    .into_iter()
    .find(|(_, v)| v.is_empty());

    if let Some((name, _)) = missing {
        return Err(QueryError::MalformedWire(format!(
            "filter entry {index} is missing '{name}'"
        )));
    }

    let operator = Operator::from_str(&entry.operator).map_err(|_| {
        QueryError::MalformedWire(format!(
            "filter entry {index} has unknown operator '{}'",
            entry.operator
        ))
    })?;

    Ok(FilterPredicate::new(
        fields::from_wire(&entry.field),
        operator,
        entry.value.clone(),
    ))
}
