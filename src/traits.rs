use crate::error::QueryError;
use crate::types::FilterPredicate;

/// A bidirectional translation between predicates and one wire encoding of a membership query.
pub trait QueryCodec {
    /// The borrowed wire representation accepted by `decode`; `encode` produces its owned form.
    type Wire: ?Sized + ToOwned;

    /// The `queryType` tag this codec handles.
    fn query_type(&self) -> &'static str;

    /// Compile predicates into the wire form, resolving user-facing field names.
    fn encode(
        &self,
        predicates: &[FilterPredicate],
    ) -> Result<<Self::Wire as ToOwned>::Owned, QueryError>;

    /// Reconstruct predicates from the wire form, sorted so they can be compared
    /// against declared state regardless of how the backend ordered them.
    fn decode(&self, wire: &Self::Wire) -> Result<Vec<FilterPredicate>, QueryError>;

    /// Rewrite predicates into the form `decode(encode(..))` yields, for drift comparison.
    fn normalize(&self, predicates: &[FilterPredicate]) -> Vec<FilterPredicate> {
        let mut normalized: Vec<FilterPredicate> =
            predicates.iter().map(FilterPredicate::canonical).collect();
        normalized.sort();
        normalized
    }
}
