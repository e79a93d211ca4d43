//! Compiler for dynamic-group membership queries, and the create-or-adopt
//! reconciler for groups keyed by name.
//!
//! A membership query is a list of `field operator value` predicates. The directory
//! accepts it in one of two encodings:
//!
//! - `FilterQuery`: a structured `{field, operator, value}` list, standard fields only.
//! - `Search`: a JSON string of `field:$op:value` tokens, which also reaches custom
//!   attributes through `attributes[name=<attr>].value` paths.
//!
//! ```rust
//! use memberquery_core::{CompilerOptions, FilterPredicate, MemberQuery, MemberQueryWire};
//!
//! let query = MemberQuery::search(vec![
//!     FilterPredicate::any_of("department", ["Eng", "Sales"]),
//!     FilterPredicate::eq("area", "north"),
//! ]);
//! let options = CompilerOptions::default();
//! let wire = query.to_wire(&options).unwrap();
//! let MemberQueryWire::Search { search_filters } = &wire else { unreachable!() };
//! assert_eq!(
//!     search_filters,
//!     r#"{"filter":["attributes[name=area].value:$eq:north","department:$eq:Eng","department:$eq:Sales"]}"#
//! );
//! assert_eq!(MemberQuery::from_wire(&wire, &options).unwrap(), query.normalized(&options));
//! ```

pub use config::{AmbiguityPolicy, CompilerOptions, OperatorPolicy, ReconcilerOptions};
pub use diff::{ExemptionDelta, GroupDelta, PredicateDelta};
pub use error::{CreateError, QueryError, ReconcileError};
pub use fields::{AttributeNames, ResolvedField};
pub use filter_query::FilterQueryCompiler;
pub use reconciler::{GroupDirectory, Outcome, ReconcileState, Reconciled, Reconciler};
pub use search::SearchCompiler;
pub use traits::QueryCodec;
pub use types::{
    DEFAULT_SUBJECT_TYPE, Exemption, FilterPredicate, GroupIdentity, GroupSpec, GroupState,
    IN_SEPARATOR, MemberQuery, MembershipMethod, Operator, QueryType, SearchOperator,
    decode_exemptions, encode_exemptions,
};
pub use wire::{
    ExemptionWire, FilterWire, GroupPayload, GroupRecord, MemberQueryWire, SearchFilter,
};

mod config;
mod diff;
mod error;
pub mod fields;
mod filter_query;
mod reconciler;
mod search;
mod traits;
mod types;
mod wire;
