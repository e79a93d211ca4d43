//! Data model for membership queries and the groups that carry them.
//!
//! Canonical forms:
//! - Predicate: `field operator value`, e.g. `department in Eng|Sales`
//! - Query: `FilterQuery { predicates }` or `Search { predicates }`
//! - Exemption: `{subject_id, subject_type}` with `subject_type` defaulting to `USER`

mod exemption;
mod group;
mod member_query;
mod operator;
mod predicate;

pub use exemption::{DEFAULT_SUBJECT_TYPE, Exemption, decode_exemptions, encode_exemptions};
pub use group::{GroupIdentity, GroupSpec, GroupState, MembershipMethod};
pub use member_query::{MemberQuery, QueryType};
pub use operator::{Operator, SearchOperator};
pub use predicate::{FilterPredicate, IN_SEPARATOR};
