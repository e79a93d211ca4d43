//! Drift between declared and observed group configuration.
//!
//! Predicates are compared by wire field, operator and canonical value, so a custom
//! attribute declared as `cost-center` matches the `costcenter` the directory echoes back.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::CompilerOptions;
use crate::fields;
use crate::types::{Exemption, FilterPredicate, GroupSpec, GroupState, MemberQuery, Operator};

type PredicateKey = (String, Operator, String);

fn keyed(predicates: &[FilterPredicate]) -> BTreeMap<PredicateKey, FilterPredicate> {
    predicates
        .iter()
        .map(FilterPredicate::canonical)
        .map(|p| ((fields::to_wire(&p.field), p.operator, p.value.clone()), p))
        .collect()
}

/// Predicates present on only one side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PredicateDelta {
    /// Declared but not observed.
    pub added: Vec<FilterPredicate>,
    /// Observed but no longer declared.
    pub removed: Vec<FilterPredicate>,
}

impl PredicateDelta {
    pub fn between(desired: &[FilterPredicate], actual: &[FilterPredicate]) -> Self {
        let desired = keyed(desired);
        let actual = keyed(actual);

        Self {
            added: desired
                .iter()
                .filter(|(key, _)| !actual.contains_key(*key))
                .map(|(_, p)| p.clone())
                .collect(),
            removed: actual
                .iter()
                .filter(|(key, _)| !desired.contains_key(*key))
                .map(|(_, p)| p.clone())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Exemptions present on only one side. Order and duplicates are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExemptionDelta {
    pub added: Vec<Exemption>,
    pub removed: Vec<Exemption>,
}

impl ExemptionDelta {
    pub fn between(desired: &[Exemption], actual: &[Exemption]) -> Self {
        let desired: BTreeSet<&Exemption> = desired.iter().collect();
        let actual: BTreeSet<&Exemption> = actual.iter().collect();

        Self {
            added: desired.difference(&actual).map(|e| (*e).clone()).collect(),
            removed: actual.difference(&desired).map(|e| (*e).clone()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Everything about a group's membership rules that differs between declaration and directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupDelta {
    pub query_type_changed: bool,
    pub membership_method_changed: bool,
    pub description_changed: bool,
    pub predicates: PredicateDelta,
    pub exemptions: ExemptionDelta,
}

impl GroupDelta {
    pub fn between(desired: &GroupSpec, actual: &GroupState, options: &CompilerOptions) -> Self {
        let normalize = |query: Option<&MemberQuery>| {
            query
                .map(|q| q.normalized(options).predicates().to_vec())
                .unwrap_or_default()
        };

        let desired_query = desired.member_query.as_ref();
        let actual_query = actual.member_query.as_ref();

        Self {
            query_type_changed: desired_query.map(MemberQuery::query_type)
                != actual_query.map(MemberQuery::query_type),
            membership_method_changed: desired.membership_method != actual.membership_method,
            description_changed: desired.description != actual.description,
            predicates: PredicateDelta::between(
                &normalize(desired_query),
                &normalize(actual_query),
            ),
            exemptions: ExemptionDelta::between(&desired.exemptions, &actual.exemptions),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.query_type_changed
            && !self.membership_method_changed
            && !self.description_changed
            && self.predicates.is_empty()
            && self.exemptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GroupIdentity, MembershipMethod};

    #[test]
    fn test_predicate_delta_ignores_order_and_in_value_order() {
        let desired = vec![
            FilterPredicate::any_of("department", ["Sales", "Eng"]),
            FilterPredicate::eq("location", "Oslo"),
        ];
        let actual = vec![
            FilterPredicate::eq("location", "Oslo"),
            FilterPredicate::any_of("department", ["Eng", "Sales"]),
        ];
        assert!(PredicateDelta::between(&desired, &actual).is_empty());
    }

    #[test]
    fn test_predicate_delta_matches_sanitized_custom_fields() {
        let desired = vec![FilterPredicate::eq("cost-center", "42")];
        let actual = vec![FilterPredicate::eq("costcenter", "42")];
        assert!(PredicateDelta::between(&desired, &actual).is_empty());
    }

    #[test]
    fn test_predicate_delta_reports_both_sides() {
        let desired = vec![
            FilterPredicate::eq("department", "Eng"),
            FilterPredicate::ne("area", "north"),
        ];
        let actual = vec![
            FilterPredicate::eq("department", "Eng"),
            FilterPredicate::ne("area", "south"),
        ];
        let delta = PredicateDelta::between(&desired, &actual);
        assert_eq!(delta.added, vec![FilterPredicate::ne("area", "north")]);
        assert_eq!(delta.removed, vec![FilterPredicate::ne("area", "south")]);
    }

    #[test]
    fn test_exemption_delta() {
        let desired = vec![Exemption::user("u1"), Exemption::user("u2")];
        let actual = vec![Exemption::user("u2"), Exemption::user("u3"), Exemption::user("u2")];
        let delta = ExemptionDelta::between(&desired, &actual);
        assert_eq!(delta.added, vec![Exemption::user("u1")]);
        assert_eq!(delta.removed, vec![Exemption::user("u3")]);
    }

    #[test]
    fn test_group_delta_search_in_equals_split_eq() {
        let options = CompilerOptions::default();
        let desired = GroupSpec::new("eng-team").with_member_query(MemberQuery::search(vec![
            FilterPredicate::eq("department", "Eng"),
            FilterPredicate::eq("department", "Sales"),
        ]));
        let actual = GroupState {
            identity: GroupIdentity::new("g-1", "eng-team"),
            description: None,
            membership_method: MembershipMethod::DynamicAutomated,
            member_query: Some(MemberQuery::search(vec![FilterPredicate::any_of(
                "department",
                ["Sales", "Eng"],
            )])),
            exemptions: vec![],
        };
        let delta = GroupDelta::between(&desired, &actual, &options);
        assert!(delta.is_empty(), "unexpected drift: {delta:?}");
    }

    #[test]
    fn test_group_delta_detects_query_type_change() {
        let options = CompilerOptions::default();
        let predicates = vec![FilterPredicate::eq("department", "Eng")];
        let desired = GroupSpec::new("eng-team")
            .with_member_query(MemberQuery::filter_query(predicates.clone()));
        let actual = GroupState {
            identity: GroupIdentity::new("g-1", "eng-team"),
            description: None,
            membership_method: MembershipMethod::DynamicAutomated,
            member_query: Some(MemberQuery::search(predicates)),
            exemptions: vec![],
        };
        let delta = GroupDelta::between(&desired, &actual, &options);
        assert!(delta.query_type_changed);
        assert!(delta.predicates.is_empty());
        assert!(!delta.is_empty());
    }
}
