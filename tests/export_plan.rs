// tests/export_plan.rs

//! Standalone export planner: topological sort over cached binary or port
//! source metadata.

mod common;

use caravel::control::BinaryControlFile;
use caravel::provider::MapBinaryProvider;
use caravel::resolver::{create_export_plan, ExportPlanType, RequestType};
use caravel::{Error, PackageSpec};
use common::*;
use std::collections::HashMap;

fn binaries(files: &[&str]) -> MapBinaryProvider {
    let mut map: HashMap<PackageSpec, BinaryControlFile> = HashMap::new();
    for text in files {
        let bcf = BinaryControlFile::parse(text).expect("test CONTROL must parse");
        map.insert(bcf.core_paragraph.spec.clone(), bcf);
    }
    MapBinaryProvider::new(map)
}

/// A cached binary package is preferred over port metadata
#[test]
fn test_prefers_built_binary() {
    let provider = PortTree::new()
        .port("Source: a\nVersion: 1\n")
        .provider();
    let binaries = binaries(&["Package: a\nVersion: 1\nArchitecture: x64-linux\n"]);
    let status = status_db(vec![]);

    let plan = create_export_plan(&provider, &binaries, &[spec("a")], &status).unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].plan_type, ExportPlanType::AlreadyBuilt);
    assert_eq!(plan[0].request_type, RequestType::UserRequested);
}

/// Port metadata is the fallback when no binary is cached
#[test]
fn test_falls_back_to_port_metadata() {
    let provider = PortTree::new()
        .port("Source: a\nVersion: 1\n")
        .provider();
    let status = status_db(vec![]);

    let plan =
        create_export_plan(&provider, &binaries(&[]), &[spec("a")], &status).unwrap();

    assert_eq!(plan[0].plan_type, ExportPlanType::PortAvailableButNotBuilt);
}

/// Neither binary nor port metadata is fatal
#[test]
fn test_missing_package_is_fatal() {
    let provider = PortTree::new().provider();
    let status = status_db(vec![]);

    let err =
        create_export_plan(&provider, &binaries(&[]), &[spec("ghost")], &status).unwrap_err();
    assert!(matches!(err, Error::NoSuchPackage(_)), "got {err}");
}

/// Binary dependencies pull their closure in, dependencies first
#[test]
fn test_binary_dependencies_expand_in_order() {
    let provider = PortTree::new()
        .port("Source: b\nVersion: 1\n")
        .provider();
    let binaries = binaries(&[
        "Package: a\nVersion: 1\nArchitecture: x64-linux\nDepends: b\n",
    ]);
    let status = status_db(vec![]);

    let plan = create_export_plan(&provider, &binaries, &[spec("a")], &status).unwrap();

    let names: Vec<&str> = plan.iter().map(|p| p.spec.name()).collect();
    assert_eq!(names, vec!["b", "a"], "dependency b is exported before a");
    assert_eq!(plan[0].plan_type, ExportPlanType::PortAvailableButNotBuilt);
    assert_eq!(plan[0].request_type, RequestType::AutoSelected);
}

/// Source metadata dependencies respect platform qualifiers
#[test]
fn test_source_dependencies_are_triplet_filtered() {
    let provider = PortTree::new()
        .port("Source: a\nVersion: 1\nBuild-Depends: b, w (windows)\n")
        .port("Source: b\nVersion: 1\n")
        .provider();
    let status = status_db(vec![]);

    let plan =
        create_export_plan(&provider, &binaries(&[]), &[spec("a")], &status).unwrap();

    let names: Vec<&str> = plan.iter().map(|p| p.spec.name()).collect();
    assert_eq!(names, vec!["b", "a"], "windows-only dependency is dropped");
}
