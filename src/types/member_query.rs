//! Membership queries: a query type plus its predicates.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::CompilerOptions;
use crate::error::QueryError;
use crate::filter_query::FilterQueryCompiler;
use crate::search::SearchCompiler;
use crate::traits::QueryCodec;
use crate::wire::MemberQueryWire;

use super::predicate::FilterPredicate;

/// The two wire encodings a membership query can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum QueryType {
    /// Structured filter list; standard fields only.
    FilterQuery,
    /// String-encoded search tokens; required for custom attributes.
    Search,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FilterQuery => "FilterQuery",
            Self::Search => "Search",
        }
    }
}

impl AsRef<str> for QueryType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for QueryType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FilterQuery" => Ok(Self::FilterQuery),
            "Search" => Ok(Self::Search),
            _ => Err(QueryError::MalformedWire(format!(
                "unknown query type '{s}' (expected FilterQuery or Search)"
            ))),
        }
    }
}

impl Display for QueryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// A dynamic-group membership query.
///
/// Built fresh from declared configuration on every pass and never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "queryType")]
pub enum MemberQuery {
    FilterQuery { predicates: Vec<FilterPredicate> },
    Search { predicates: Vec<FilterPredicate> },
}

impl MemberQuery {
    pub fn new(query_type: QueryType, predicates: Vec<FilterPredicate>) -> Self {
        match query_type {
            QueryType::FilterQuery => Self::FilterQuery { predicates },
            QueryType::Search => Self::Search { predicates },
        }
    }

    pub fn filter_query(predicates: Vec<FilterPredicate>) -> Self {
        Self::FilterQuery { predicates }
    }

    pub fn search(predicates: Vec<FilterPredicate>) -> Self {
        Self::Search { predicates }
    }

    pub fn query_type(&self) -> QueryType {
        match self {
            Self::FilterQuery { .. } => QueryType::FilterQuery,
            Self::Search { .. } => QueryType::Search,
        }
    }

    pub fn predicates(&self) -> &[FilterPredicate] {
        match self {
            Self::FilterQuery { predicates } | Self::Search { predicates } => predicates,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.predicates().is_empty()
    }

    /// Compile into the wire form for this query's type.
    pub fn to_wire(&self, options: &CompilerOptions) -> Result<MemberQueryWire, QueryError> {
        match self {
            Self::FilterQuery { predicates } => Ok(MemberQueryWire::FilterQuery {
                filters: FilterQueryCompiler.encode(predicates)?,
            }),
            Self::Search { predicates } => Ok(MemberQueryWire::Search {
                search_filters: SearchCompiler::new(*options).encode(predicates)?,
            }),
        }
    }

    /// Reconstruct a query from the wire, dispatching on its `queryType`.
    pub fn from_wire(wire: &MemberQueryWire, options: &CompilerOptions) -> Result<Self, QueryError> {
        match wire {
            MemberQueryWire::FilterQuery { filters } => Ok(Self::FilterQuery {
                predicates: FilterQueryCompiler.decode(filters)?,
            }),
            MemberQueryWire::Search { search_filters } => Ok(Self::Search {
                predicates: SearchCompiler::new(*options).decode(search_filters)?,
            }),
        }
    }

    /// The same query with predicates rewritten into the shape a wire round trip produces.
    pub fn normalized(&self, options: &CompilerOptions) -> Self {
        match self {
            Self::FilterQuery { predicates } => Self::FilterQuery {
                predicates: FilterQueryCompiler.normalize(predicates),
            },
            Self::Search { predicates } => Self::Search {
                predicates: SearchCompiler::new(*options).normalize(predicates),
            },
        }
    }

    /// The same query with predicates replaced.
    pub fn with_predicates(&self, predicates: Vec<FilterPredicate>) -> Self {
        Self::new(self.query_type(), predicates)
    }
}
