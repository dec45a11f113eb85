// tests/common/mod.rs

//! Shared builders for planner integration tests.

#![allow(dead_code)]

use caravel::control::SourceControlFile;
use caravel::provider::MapPortFileProvider;
use caravel::status::{StatusParagraph, StatusParagraphs};
use caravel::{AnyAction, PackageSpec, Triplet};
use std::collections::HashMap;

/// The triplet used by all tests unless a test names its own
pub fn triplet() -> Triplet {
    Triplet::new("x64-linux").unwrap()
}

pub fn spec(name: &str) -> PackageSpec {
    PackageSpec::new(name, triplet())
}

/// Builder for a map-backed port tree
#[derive(Default)]
pub struct PortTree {
    files: HashMap<String, SourceControlFile>,
}

impl PortTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a port from CONTROL text; the name comes from the Source field
    pub fn port(mut self, control: &str) -> Self {
        let scf = SourceControlFile::parse(control).expect("test CONTROL must parse");
        self.files.insert(scf.core_paragraph.name.clone(), scf);
        self
    }

    pub fn provider(self) -> MapPortFileProvider {
        MapPortFileProvider::new(self.files)
    }
}

/// An installed row on the default triplet
pub fn installed(name: &str, feature: &str, depends: &[&str]) -> StatusParagraph {
    StatusParagraph::installed(
        spec(name),
        feature,
        depends.iter().map(|d| d.to_string()).collect(),
    )
}

pub fn status_db(rows: Vec<StatusParagraph>) -> StatusParagraphs {
    StatusParagraphs::new(rows)
}

/// Names of the remove actions, in plan order
pub fn remove_names(plan: &[AnyAction]) -> Vec<String> {
    plan.iter()
        .filter_map(|action| action.remove())
        .map(|action| action.spec.name().to_string())
        .collect()
}

/// Names of the install actions, in plan order
pub fn install_names(plan: &[AnyAction]) -> Vec<String> {
    plan.iter()
        .filter_map(|action| action.install())
        .map(|action| action.spec.name().to_string())
        .collect()
}
