// src/resolver/mod.rs

//! Dependency planning
//!
//! Computes ordered remove/install plans from user requests, the installed
//! state and port metadata: the cluster arena and mark engine for
//! feature-aware installation, plus standalone remove and export planners
//! built on the same topological-sort primitive.

mod cluster;
mod engine;
mod graph;
mod plan;
mod render;

pub use cluster::{Cluster, ClusterGraph, ClusterId, FeatureNodeEdges};
pub use engine::{
    create_export_plan, create_feature_install_plan, create_install_plan, create_remove_plan,
    PackageGraph,
};
pub use graph::{topological_sort, AdjacencyProvider, Graph};
pub use plan::{
    AnyAction, AnyParagraph, BuildOptions, ExportPlanAction, ExportPlanType, InstallPlanAction,
    InstallPlanType, RemovePlanAction, RemovePlanType, RequestType,
};
pub use render::{print_plan, to_output_string};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::SourceControlFile;
    use crate::error::Error;
    use crate::provider::MapPortFileProvider;
    use crate::spec::{FeatureSpec, PackageSpec};
    use crate::status::{StatusParagraph, StatusParagraphs};
    use crate::triplet::Triplet;
    use std::collections::HashMap;

    fn t() -> Triplet {
        Triplet::new("x64-linux").unwrap()
    }

    fn spec(name: &str) -> PackageSpec {
        PackageSpec::new(name, t())
    }

    fn provider(files: &[(&str, &str)]) -> MapPortFileProvider {
        let mut map = HashMap::new();
        for (name, text) in files {
            map.insert(name.to_string(), SourceControlFile::parse(text).unwrap());
        }
        MapPortFileProvider::new(map)
    }

    fn installed(name: &str, feature: &str, depends: &[&str]) -> StatusParagraph {
        StatusParagraph::installed(
            spec(name),
            feature,
            depends.iter().map(|d| d.to_string()).collect(),
        )
    }

    #[test]
    fn test_reinstalling_installed_feature_is_a_no_op() {
        // Re-requesting a feature the package already has must not schedule
        // any work, only surface the request.
        let provider = provider(&[("a", "Source: a\nVersion: 1\n\nFeature: x\nDescription: x\n")]);
        let status =
            StatusParagraphs::new(vec![installed("a", "", &[]), installed("a", "x", &[])]);

        let requests = FeatureSpec::parse_list("a[x]", &t()).unwrap();
        let plan = create_feature_install_plan(&provider, &requests, &status).unwrap();

        assert_eq!(plan.len(), 1);
        let action = plan[0].install().expect("expected an install action");
        assert_eq!(action.plan_type, InstallPlanType::AlreadyInstalled);
        assert_eq!(action.request_type, RequestType::UserRequested);
    }

    #[test]
    fn test_upgrade_replays_original_features() {
        let provider = provider(&[
            ("a", "Source: a\nVersion: 1\nBuild-Depends: b\n"),
            ("b", "Source: b\nVersion: 1\n"),
        ]);
        let status =
            StatusParagraphs::new(vec![installed("a", "", &["b"]), installed("b", "", &[])]);

        let mut pgraph = PackageGraph::new(&provider, &status);
        pgraph.upgrade(&spec("b")).unwrap();
        let plan = pgraph.serialize().unwrap();

        let removes: Vec<&str> = plan
            .iter()
            .filter_map(|a| a.remove())
            .map(|r| r.spec.name())
            .collect();
        let installs: Vec<&str> = plan
            .iter()
            .filter_map(|a| a.install())
            .map(|i| i.spec.name())
            .collect();

        // Upgrading b drags its installed dependent a through the rebuild.
        assert_eq!(removes, vec!["a", "b"]);
        assert_eq!(installs, vec!["b", "a"]);
        for action in plan.iter().filter_map(|a| a.install()) {
            assert!(action.feature_list.contains("core"));
        }
    }

    #[test]
    fn test_spec_only_plan_rejects_removes() {
        // Adding a feature to an installed package forces a rebuild; the
        // spec-only wrapper must refuse a plan shaped like that.
        let feature_ports =
            provider(&[("a", "Source: a\nVersion: 1\n\nFeature: x\nDescription: x\n")]);
        let status = StatusParagraphs::new(vec![installed("a", "", &[])]);
        let requests = FeatureSpec::parse_list("a[x]", &t()).unwrap();
        let feature_plan =
            create_feature_install_plan(&feature_ports, &requests, &status).unwrap();
        assert!(
            feature_plan.iter().any(|a| a.remove().is_some()),
            "feature addition to an installed package must schedule a remove"
        );

        // The spec-only entry point never names features itself, but a port
        // whose core dependencies request one reproduces the same
        // remove-bearing shape through it.
        let spec_ports = provider(&[
            ("outer", "Source: outer\nVersion: 1\nBuild-Depends: inner[extra]\n"),
            (
                "inner",
                "Source: inner\nVersion: 1\n\nFeature: extra\nDescription: extra\n",
            ),
        ]);
        let status = StatusParagraphs::new(vec![installed("inner", "", &[])]);
        let err = create_install_plan(&spec_ports, &[spec("outer")], &status).unwrap_err();
        assert!(matches!(err, Error::FeaturePackagesRequired(_)), "got {err}");
    }

    #[test]
    fn test_rebuild_without_port_definition_fails() {
        // b is installed and depends on a, but b's port is gone: the
        // cascading rebuild cannot name b's port, so serialization fails.
        let provider = provider(&[("a", "Source: a\nVersion: 1\n\nFeature: x\nDescription: x\n")]);
        let status =
            StatusParagraphs::new(vec![installed("a", "", &[]), installed("b", "", &["a"])]);

        let requests = FeatureSpec::parse_list("a[x]", &t()).unwrap();
        let err = create_feature_install_plan(&provider, &requests, &status).unwrap_err();
        assert!(matches!(err, Error::MissingPort(_)), "got {err}");
    }

    #[test]
    fn test_wildcard_requires_port_metadata() {
        let provider = provider(&[]);
        let status = StatusParagraphs::default();
        let requests = vec![FeatureSpec::new(spec("ghost"), "*")];
        let err = create_feature_install_plan(&provider, &requests, &status).unwrap_err();
        assert!(matches!(err, Error::NoSuchPackage(_)), "got {err}");
    }

    #[test]
    fn test_wildcard_expands_all_features() {
        let provider = provider(&[(
            "a",
            "Source: a\nVersion: 1\n\nFeature: x\nDescription: x\n\nFeature: y\nDescription: y\n",
        )]);
        let status = StatusParagraphs::default();
        let requests = vec![FeatureSpec::new(spec("a"), "*")];
        let plan = create_feature_install_plan(&provider, &requests, &status).unwrap();

        assert_eq!(plan.len(), 1);
        let action = plan[0].install().unwrap();
        assert_eq!(action.plan_type, InstallPlanType::BuildAndInstall);
        for feature in ["core", "x", "y"] {
            assert!(action.feature_list.contains(feature), "missing {feature}");
        }
    }
}
