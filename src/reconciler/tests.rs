use super::*;
use crate::config::OperatorPolicy;
use crate::error::QueryError;
use crate::tests::directory::{DirectoryError, InMemoryDirectory};
use crate::types::{Exemption, FilterPredicate, MemberQuery, Operator};
use yare::parameterized;

use ReconcileState::{Adopting, Converged, Creating, Resolving};

fn eng_team() -> GroupSpec {
    GroupSpec::new("eng-team")
        .with_description("Engineering")
        .with_member_query(MemberQuery::search(vec![
            FilterPredicate::any_of("department", ["Eng", "Platform"]),
            FilterPredicate::eq("cost-center", "42"),
            FilterPredicate::ne("state", "SUSPENDED"),
        ]))
        .with_exemptions(vec![Exemption::user("u-contractor")])
}

#[test]
fn test_creates_missing_group() {
    let directory = InMemoryDirectory::new();
    let reconciled = Reconciler::new(&directory).ensure(&eng_team()).unwrap();

    assert_eq!(reconciled.outcome, Outcome::Created);
    assert_eq!(reconciled.identity, GroupIdentity::new("g-1", "eng-team"));
    assert_eq!(reconciled.transitions, vec![Resolving, Creating, Converged]);
    assert_eq!(directory.calls(), vec!["find", "create", "read"]);
    assert!(reconciled.is_in_sync(), "drift: {:?}", reconciled.drift);
}

#[test]
fn test_adopts_existing_group() {
    let directory = InMemoryDirectory::new().with_group("eng-team");
    let reconciled = Reconciler::new(&directory).ensure(&eng_team()).unwrap();

    assert_eq!(reconciled.outcome, Outcome::Adopted);
    assert_eq!(reconciled.identity.id, "g-1");
    assert_eq!(reconciled.transitions, vec![Resolving, Adopting, Converged]);
    assert_eq!(directory.calls(), vec!["find", "update", "read"]);
    assert!(reconciled.is_in_sync());
}

#[test]
fn test_lookup_requires_exact_name() {
    let directory = InMemoryDirectory::new().with_group("eng-team-legacy");
    let reconciled = Reconciler::new(&directory).ensure(&eng_team()).unwrap();

    assert_eq!(reconciled.outcome, Outcome::Created);
    assert_eq!(reconciled.identity.id, "g-2");
}

#[test]
fn test_name_conflict_adopts_after_one_retry() {
    let directory = InMemoryDirectory::new().racing_create("eng-team");
    let reconciled = Reconciler::new(&directory).ensure(&eng_team()).unwrap();

    assert_eq!(reconciled.outcome, Outcome::Adopted);
    assert_eq!(
        reconciled.transitions,
        vec![Resolving, Creating, Resolving, Adopting, Converged]
    );
    assert_eq!(
        directory.calls(),
        vec!["find", "create", "find", "update", "read"]
    );
    // The racing writer's description is replaced by ours.
    let state = reconciled.state.unwrap();
    assert_eq!(state.description.as_deref(), Some("Engineering"));
}

#[test]
fn test_unresolvable_conflict_fails_without_looping() {
    let directory = InMemoryDirectory::new().phantom_conflicts(5);
    let result = Reconciler::new(&directory).ensure(&eng_team());

    match result {
        Err(ReconcileError::UnresolvedConflict { name }) => assert_eq!(name, "eng-team"),
        other => panic!("Expected UnresolvedConflict, got {other:?}"),
    }
    assert_eq!(directory.count("create"), 1);
    assert_eq!(directory.count("find"), 2);
    assert!(directory.records().is_empty());
}

#[test]
fn test_create_backend_error_is_not_retried() {
    let directory = InMemoryDirectory::new().failing_create(DirectoryError::Unauthorized);
    let result = Reconciler::new(&directory).ensure(&eng_team());

    assert!(matches!(
        result,
        Err(ReconcileError::Backend(DirectoryError::Unauthorized))
    ));
    assert_eq!(directory.calls(), vec!["find", "create"]);
}

#[test]
fn test_lookup_backend_error_is_surfaced() {
    let directory = InMemoryDirectory::new().failing_find(DirectoryError::Unauthorized);
    let result = Reconciler::new(&directory).ensure(&eng_team());

    assert!(matches!(
        result,
        Err(ReconcileError::Backend(DirectoryError::Unauthorized))
    ));
    assert_eq!(directory.calls(), vec!["find"]);
}

#[test]
fn test_compile_error_touches_nothing() {
    let spec = GroupSpec::new("eng-team").with_member_query(MemberQuery::search(vec![
        FilterPredicate::new("employeeIdentifier", Operator::Gt, "100"),
    ]));
    let directory = InMemoryDirectory::new();
    let result = Reconciler::new(&directory).ensure(&spec);

    assert!(matches!(
        result,
        Err(ReconcileError::Compile(QueryError::UnsupportedOperator { .. }))
    ));
    assert!(directory.calls().is_empty());
}

#[test]
fn test_lenient_compiler_sends_range_operators_as_eq() {
    let spec = GroupSpec::new("eng-team").with_member_query(MemberQuery::search(vec![
        FilterPredicate::new("employeeIdentifier", Operator::Gt, "100"),
    ]));
    let directory = InMemoryDirectory::new();
    let reconciled = Reconciler::new(&directory)
        .with_compiler_options(
            CompilerOptions::default().with_operator_policy(OperatorPolicy::Lenient),
        )
        .ensure(&spec)
        .unwrap();

    // Normalization applies the same fallback, so the `eq` read back is not drift.
    assert!(reconciled.is_in_sync());
    let query = reconciled.state.unwrap().member_query.unwrap();
    assert_eq!(
        query.predicates(),
        &[FilterPredicate::eq("employeeIdentifier", "100")]
    );
}

#[parameterized(
    pick_first = { AmbiguityPolicy::PickFirst },
    fail = { AmbiguityPolicy::Fail },
)]
fn test_ambiguous_name(policy: AmbiguityPolicy) {
    let directory = InMemoryDirectory::new()
        .with_group("eng-team")
        .with_group("eng-team");
    let result = Reconciler::new(&directory)
        .with_options(ReconcilerOptions::default().with_ambiguity(policy))
        .ensure(&eng_team());

    match policy {
        AmbiguityPolicy::PickFirst => {
            let reconciled = result.unwrap();
            assert_eq!(reconciled.outcome, Outcome::Adopted);
            assert_eq!(reconciled.identity.id, "g-1");
        }
        AmbiguityPolicy::Fail => {
            match result {
                Err(ReconcileError::AmbiguousName { name, matches }) => {
                    assert_eq!(name, "eng-team");
                    assert_eq!(matches, 2);
                }
                other => panic!("Expected AmbiguousName, got {other:?}"),
            }
            assert_eq!(directory.calls(), vec!["find"]);
        }
    }
}

#[test]
fn test_verify_can_be_disabled() {
    let directory = InMemoryDirectory::new();
    let reconciled = Reconciler::new(&directory)
        .with_options(ReconcilerOptions::default().with_verify(false))
        .ensure(&eng_team())
        .unwrap();

    assert!(reconciled.state.is_none());
    assert!(reconciled.drift.is_none());
    assert!(!reconciled.is_in_sync());
    assert_eq!(directory.calls(), vec!["find", "create"]);
}

#[test]
fn test_second_pass_is_idempotent() {
    let directory = InMemoryDirectory::new().reordering();
    let reconciler = Reconciler::new(&directory);

    let first = reconciler.ensure(&eng_team()).unwrap();
    let stored_after_first = directory.records();
    let second = reconciler.ensure(&eng_team()).unwrap();

    assert_eq!(first.outcome, Outcome::Created);
    assert_eq!(second.outcome, Outcome::Adopted);
    assert_eq!(first.identity, second.identity);
    assert!(second.drift.unwrap().is_empty());
    assert_eq!(directory.records(), stored_after_first);
    assert_eq!(first.state, second.state);
}

#[test]
fn test_verified_state_keeps_declared_attribute_spelling() {
    let directory = InMemoryDirectory::new();
    let reconciled = Reconciler::new(&directory).ensure(&eng_team()).unwrap();

    let state = reconciled.state.unwrap();
    let query = state.member_query.unwrap();
    assert_eq!(
        query.predicates(),
        &[
            FilterPredicate::eq("cost-center", "42"),
            FilterPredicate::any_of("department", ["Eng", "Platform"]),
            FilterPredicate::ne("state", "SUSPENDED"),
        ]
    );
    assert_eq!(state.exemptions, vec![Exemption::user("u-contractor")]);
}

#[test]
fn test_filter_query_group() {
    let spec = GroupSpec::new("sales").with_member_query(MemberQuery::filter_query(vec![
        FilterPredicate::eq("department", "Sales"),
        FilterPredicate::new("employeeIdentifier", Operator::Ge, "1000"),
    ]));
    let directory = InMemoryDirectory::new().reordering();
    let reconciled = Reconciler::new(&directory).ensure(&spec).unwrap();

    assert!(reconciled.is_in_sync());
    let query = reconciled.state.unwrap().member_query.unwrap();
    assert_eq!(query.query_type(), crate::types::QueryType::FilterQuery);
}

#[test]
fn test_custom_attribute_shadowing_a_standard_field_is_rejected() {
    let spec = GroupSpec::new("eng-team").with_member_query(MemberQuery::search(vec![
        FilterPredicate::eq("st-ate", "x"),
    ]));
    let directory = InMemoryDirectory::new();
    let result = Reconciler::new(&directory).ensure(&spec);

    assert!(matches!(
        result,
        Err(ReconcileError::Compile(QueryError::InvalidPredicate(_)))
    ));
    assert!(directory.calls().is_empty());
}
