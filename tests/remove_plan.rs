// tests/remove_plan.rs

//! Standalone remove planner: reverse transitive closure over the
//! installed state.

mod common;

use caravel::resolver::{create_remove_plan, RemovePlanType, RequestType};
use caravel::{PackageSpec, Triplet};
use common::*;

/// Removing a package removes its installed dependents first
#[test]
fn test_remove_pulls_in_dependents() {
    let status = status_db(vec![
        installed("a", "", &["b"]),
        installed("b", "", &[]),
    ]);

    let plan = create_remove_plan(&[spec("b")], &status).unwrap();

    let names: Vec<&str> = plan.iter().map(|p| p.spec.name()).collect();
    assert_eq!(names, vec!["a", "b"], "dependent a is removed before b");

    let a = &plan[0];
    assert_eq!(a.plan_type, RemovePlanType::Remove);
    assert_eq!(a.request_type, RequestType::AutoSelected);

    let b = &plan[1];
    assert_eq!(b.request_type, RequestType::UserRequested);
}

/// The closure is transitive
#[test]
fn test_remove_closure_is_transitive() {
    let status = status_db(vec![
        installed("top", "", &["mid"]),
        installed("mid", "", &["leaf"]),
        installed("leaf", "", &[]),
    ]);

    let plan = create_remove_plan(&[spec("leaf")], &status).unwrap();

    let names: Vec<&str> = plan.iter().map(|p| p.spec.name()).collect();
    assert_eq!(names, vec!["top", "mid", "leaf"]);
}

/// A spec absent from the status database is reported, not expanded
#[test]
fn test_remove_not_installed() {
    let status = status_db(vec![installed("a", "", &["ghost"])]);

    let plan = create_remove_plan(&[spec("ghost")], &status).unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].plan_type, RemovePlanType::NotInstalled);
    assert_eq!(plan[0].request_type, RequestType::UserRequested);
}

/// Reverse dependencies only exist within one triplet
#[test]
fn test_remove_is_triplet_scoped() {
    let other = Triplet::new("x86-windows").unwrap();
    let mut rows = vec![installed("b", "", &[])];
    rows.push(caravel::status::StatusParagraph::installed(
        PackageSpec::new("a", other),
        "",
        vec!["b".to_string()],
    ));
    let status = status_db(rows);

    // a:x86-windows depends on b, but b is being removed on x64-linux.
    let plan = create_remove_plan(&[spec("b")], &status).unwrap();

    let names: Vec<&str> = plan.iter().map(|p| p.spec.name()).collect();
    assert_eq!(names, vec!["b"], "cross-triplet dependent is untouched");
}

/// Requesting two packages where one depends on the other keeps both
/// user-requested and emits each once
#[test]
fn test_remove_deduplicates_overlapping_requests() {
    let status = status_db(vec![
        installed("a", "", &["b"]),
        installed("b", "", &[]),
    ]);

    let plan = create_remove_plan(&[spec("a"), spec("b")], &status).unwrap();

    let names: Vec<&str> = plan.iter().map(|p| p.spec.name()).collect();
    assert_eq!(names, vec!["a", "b"]);
    for action in &plan {
        assert_eq!(action.request_type, RequestType::UserRequested);
    }
}
