// src/resolver/plan.rs

//! Plan action data structures
//!
//! The serializer emits an ordered list of `AnyAction`s; each is exactly
//! one of an install or a remove. Actions carry owned copies (or `Rc`
//! handles into caller-owned metadata) of everything they need, so they
//! outlive the planner that produced them.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::control::{filter_dependencies, BinaryControlFile, SourceControlFile};
use crate::spec::PackageSpec;
use crate::status::StatusParagraph;
use crate::triplet::Triplet;

/// Whether a plan entry exists because the user asked for it or because the
/// planner pulled it in
///
/// Only explicitly seeded clusters are user-requested; dependency clusters
/// never inherit the flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    UserRequested,
    AutoSelected,
}

/// What an install action will actually do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPlanType {
    /// Build from source, then install
    BuildAndInstall,
    /// Install a cached binary package without building
    Install,
    /// Nothing to do; surfaced only for user requests
    AlreadyInstalled,
    /// Excluded from the operation by the caller
    Excluded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovePlanType {
    NotInstalled,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPlanType {
    AlreadyBuilt,
    PortAvailableButNotBuilt,
}

/// Per-action build options surfaced by the renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Build the port's upstream HEAD instead of the pinned version
    pub use_head_version: bool,
}

/// One install step of a plan
#[derive(Debug, Clone)]
pub struct InstallPlanAction {
    pub spec: PackageSpec,
    /// Port metadata; present for `BuildAndInstall`
    pub source_control_file: Option<Rc<SourceControlFile>>,
    pub plan_type: InstallPlanType,
    pub request_type: RequestType,
    /// Features the step installs (or, for `AlreadyInstalled`, the features
    /// already present)
    pub feature_list: BTreeSet<String>,
    pub build_options: BuildOptions,
}

impl InstallPlanAction {
    /// A step that builds the port from source and installs it
    pub fn build_and_install(
        spec: PackageSpec,
        scf: Rc<SourceControlFile>,
        features: BTreeSet<String>,
        request_type: RequestType,
    ) -> Self {
        Self {
            spec,
            source_control_file: Some(scf),
            plan_type: InstallPlanType::BuildAndInstall,
            request_type,
            feature_list: features,
            build_options: BuildOptions::default(),
        }
    }

    /// A step recording that the request was already satisfied
    pub fn already_installed(
        spec: PackageSpec,
        features: BTreeSet<String>,
        request_type: RequestType,
    ) -> Self {
        Self {
            spec,
            source_control_file: None,
            plan_type: InstallPlanType::AlreadyInstalled,
            request_type,
            feature_list: features,
            build_options: BuildOptions::default(),
        }
    }

    /// Rendered name: `name:triplet`, or `name[f1,f2]:triplet` with features
    pub fn display_name(&self) -> String {
        if self.feature_list.is_empty() {
            return self.spec.to_string();
        }
        let features: Vec<&str> = self.feature_list.iter().map(String::as_str).collect();
        format!(
            "{}[{}]:{}",
            self.spec.name(),
            features.join(","),
            self.spec.triplet()
        )
    }
}

/// One remove step of a plan
#[derive(Debug, Clone)]
pub struct RemovePlanAction {
    pub spec: PackageSpec,
    pub plan_type: RemovePlanType,
    pub request_type: RequestType,
}

/// One step of an export plan
#[derive(Debug, Clone)]
pub struct ExportPlanAction {
    pub spec: PackageSpec,
    pub any_paragraph: AnyParagraph,
    pub plan_type: ExportPlanType,
    pub request_type: RequestType,
}

/// A plan item: exactly one of install or remove
#[derive(Debug, Clone)]
pub enum AnyAction {
    Install(InstallPlanAction),
    Remove(RemovePlanAction),
}

impl AnyAction {
    pub fn spec(&self) -> &PackageSpec {
        match self {
            AnyAction::Install(action) => &action.spec,
            AnyAction::Remove(action) => &action.spec,
        }
    }

    pub fn install(&self) -> Option<&InstallPlanAction> {
        match self {
            AnyAction::Install(action) => Some(action),
            AnyAction::Remove(_) => None,
        }
    }

    pub fn remove(&self) -> Option<&RemovePlanAction> {
        match self {
            AnyAction::Remove(action) => Some(action),
            AnyAction::Install(_) => None,
        }
    }
}

/// Metadata envelope: exactly one of an installed row, a cached binary
/// package, or port source metadata
#[derive(Debug, Clone)]
pub enum AnyParagraph {
    Status(StatusParagraph),
    Binary(Rc<BinaryControlFile>),
    Source(Rc<SourceControlFile>),
}

impl AnyParagraph {
    /// The package dependencies the envelope declares, resolved against a
    /// triplet; self-references are dropped
    pub fn dependencies(&self, triplet: &Triplet) -> Vec<PackageSpec> {
        match self {
            AnyParagraph::Status(row) => {
                PackageSpec::from_dependencies_of_port(row.spec.name(), &row.depends, triplet)
            }
            AnyParagraph::Binary(bcf) => PackageSpec::from_dependencies_of_port(
                bcf.core_paragraph.spec.name(),
                &bcf.flattened_depends(),
                triplet,
            ),
            AnyParagraph::Source(scf) => {
                let depends = filter_dependencies(&scf.core_paragraph.depends, triplet);
                PackageSpec::from_dependencies_of_port(&scf.core_paragraph.name, &depends, triplet)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> Triplet {
        Triplet::new("x64-linux").unwrap()
    }

    #[test]
    fn test_display_name_with_features() {
        let action = InstallPlanAction::already_installed(
            PackageSpec::new("curl", t()),
            BTreeSet::from(["core".to_string(), "ssl".to_string()]),
            RequestType::UserRequested,
        );
        assert_eq!(action.display_name(), "curl[core,ssl]:x64-linux");
    }

    #[test]
    fn test_display_name_without_features() {
        let action = InstallPlanAction::already_installed(
            PackageSpec::new("curl", t()),
            BTreeSet::new(),
            RequestType::UserRequested,
        );
        assert_eq!(action.display_name(), "curl:x64-linux");
    }

    #[test]
    fn test_any_paragraph_dependencies_from_source() {
        let scf = SourceControlFile::parse(
            "Source: curl\nVersion: 1\nBuild-Depends: zlib, winsock (windows)\n",
        )
        .unwrap();
        let deps = AnyParagraph::Source(Rc::new(scf)).dependencies(&t());
        assert_eq!(deps.len(), 1, "windows-only dependency is filtered out");
        assert_eq!(deps[0].name(), "zlib");
    }

    #[test]
    fn test_any_paragraph_dependencies_from_status() {
        let row = StatusParagraph::installed(
            PackageSpec::new("curl", t()),
            "",
            vec!["zlib".to_string(), "curl".to_string()],
        );
        let deps = AnyParagraph::Status(row).dependencies(&t());
        assert_eq!(deps.len(), 1, "self-reference is dropped");
    }
}
