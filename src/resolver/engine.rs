// src/resolver/engine.rs

//! The feature-aware planning engine
//!
//! `PackageGraph` couples the cluster arena with two accumulating graphs:
//! the install graph (edges point from dependent to dependency) and the
//! remove graph (edges point from a removed package to its installed
//! dependents). The mutually recursive `mark_plus` / `mark_minus`
//! procedures fill both while propagating the transient-uninstall state,
//! and `serialize` turns them into an ordered action list: all removes
//! first (dependents before dependencies), then all installs (dependencies
//! before dependents).
//!
//! The standalone remove and export planners reuse the same topological
//! sort over ad-hoc adjacency providers instead of a cluster arena.

use std::collections::HashSet;

use tracing::warn;

use super::cluster::{ClusterGraph, ClusterId};
use super::graph::{topological_sort, AdjacencyProvider, Graph};
use super::plan::{
    AnyAction, AnyParagraph, ExportPlanAction, ExportPlanType, InstallPlanAction, RemovePlanAction,
    RemovePlanType, RequestType,
};
use crate::error::{Error, Result};
use crate::provider::{BinaryPackageProvider, PortFileProvider};
use crate::spec::{FeatureSpec, PackageSpec};
use crate::status::{StatusParagraph, StatusParagraphs};

/// Outcome of marking one feature for install
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkPlusResult {
    FeatureNotFound,
    Success,
}

/// The install and remove graphs accumulated while marking
#[derive(Default)]
struct GraphPlan {
    remove_graph: Graph<ClusterId>,
    install_graph: Graph<ClusterId>,
}

/// Name lookup for cycle diagnostics when topo-sorting a plan graph
struct PlanTopo<'g, 'a> {
    arena: &'g ClusterGraph<'a>,
    graph: &'g Graph<ClusterId>,
}

impl AdjacencyProvider<ClusterId, ClusterId> for PlanTopo<'_, '_> {
    fn adjacency_list(&self, data: &ClusterId) -> Vec<ClusterId> {
        self.graph.adjacency(data).to_vec()
    }

    fn load_vertex_data(&self, key: &ClusterId) -> Result<ClusterId> {
        Ok(*key)
    }

    fn key_name(&self, key: &ClusterId) -> String {
        self.arena.cluster(*key).spec.to_string()
    }
}

/// The feature-aware package planner
///
/// One instance plans one run: seed it with `install` / `upgrade` requests,
/// then call `serialize`. All mutation is confined to the instance; the
/// port provider and status snapshot are read-only collaborators.
pub struct PackageGraph<'a> {
    graph: ClusterGraph<'a>,
    plan: GraphPlan,
}

impl<'a> PackageGraph<'a> {
    /// Create a planner over a port provider and the installed state
    pub fn new(provider: &'a dyn PortFileProvider, status_db: &StatusParagraphs) -> Self {
        let mut graph = ClusterGraph::new(provider);
        graph.seed_installed(status_db);
        Self {
            graph,
            plan: GraphPlan::default(),
        }
    }

    /// Seed the plan with a user install request
    pub fn install(&mut self, fspec: &FeatureSpec) -> Result<()> {
        let id = self.graph.get(fspec.spec());
        self.graph.cluster_mut(id).request_type = RequestType::UserRequested;

        if fspec.feature() == "*" {
            let features = match &self.graph.cluster(id).source_control_file {
                Some(scf) => scf
                    .feature_paragraphs
                    .iter()
                    .map(|f| f.name.clone())
                    .collect::<Vec<_>>(),
                None => return Err(Error::NoSuchPackage(fspec.spec().to_string())),
            };
            for feature in features {
                self.mark_plus_or_fail(&feature, id)?;
            }
            self.mark_plus_or_fail("core", id)?;
        } else {
            self.mark_plus_or_fail(fspec.feature(), id)?;
        }

        // Surface the request in the plan even when nothing had to be marked.
        self.plan.install_graph.add_vertex(id);
        Ok(())
    }

    /// Seed the plan with an upgrade request: remove and reinstate
    pub fn upgrade(&mut self, spec: &PackageSpec) -> Result<()> {
        let id = self.graph.get(spec);
        self.graph.cluster_mut(id).request_type = RequestType::UserRequested;
        self.mark_minus(id)
    }

    fn mark_plus_or_fail(&mut self, feature: &str, id: ClusterId) -> Result<()> {
        match self.mark_plus(feature, id)? {
            MarkPlusResult::Success => Ok(()),
            MarkPlusResult::FeatureNotFound => Err(Error::FeatureNotFound {
                spec: self.graph.cluster(id).spec.to_string(),
                feature: if feature.is_empty() {
                    "core".to_string()
                } else {
                    feature.to_string()
                },
            }),
        }
    }

    fn mark_plus(&mut self, feature: &str, id: ClusterId) -> Result<MarkPlusResult> {
        if feature.is_empty() {
            // Core was not named explicitly in the reference.
            return self.mark_plus("core", id);
        }

        let has_originals;
        {
            let cluster = self.graph.cluster_mut(id);
            let already_plus = match cluster.edges.get(feature) {
                None => return Ok(MarkPlusResult::FeatureNotFound),
                Some(node) => node.plus,
            };
            if already_plus {
                return Ok(MarkPlusResult::Success);
            }

            // Adding a feature that is not currently installed forces a
            // rebuild, which transiently uninstalls the package.
            if !cluster.original_features.contains(feature) {
                cluster.transient_uninstalled = true;
            }
            if !cluster.transient_uninstalled {
                // Installed and unchanged; nothing to record.
                return Ok(MarkPlusResult::Success);
            }

            if let Some(node) = cluster.edges.get_mut(feature) {
                node.plus = true;
            }
            has_originals = !cluster.original_features.is_empty();
        }

        if has_originals {
            // The package is installed but must change: schedule its removal
            // and the reinstatement of its original features.
            self.mark_minus(id)?;
        }

        self.plan.install_graph.add_vertex(id);
        self.graph
            .cluster_mut(id)
            .to_install_features
            .insert(feature.to_string());

        if feature != "core" {
            // Every feature implicitly depends on its package's core.
            if self.mark_plus("core", id)? == MarkPlusResult::FeatureNotFound {
                return Err(Error::FeatureNotFound {
                    spec: self.graph.cluster(id).spec.to_string(),
                    feature: "core".to_string(),
                });
            }
        }

        let build_edges = self
            .graph
            .cluster(id)
            .edges
            .get(feature)
            .map(|node| node.build_edges.clone())
            .unwrap_or_default();
        for depend in build_edges {
            let dep_id = self.graph.get(depend.spec());
            if self.mark_plus(depend.feature(), dep_id)? == MarkPlusResult::FeatureNotFound {
                let dependent = FeatureSpec::new(self.graph.cluster(id).spec.clone(), feature);
                return Err(Error::UnsatisfiableDependency {
                    dependency: depend.to_string(),
                    dependent: dependent.to_string(),
                });
            }
            if dep_id != id {
                self.plan.install_graph.add_edge(id, dep_id);
            }
        }

        Ok(MarkPlusResult::Success)
    }

    fn mark_minus(&mut self, id: ClusterId) -> Result<()> {
        if self.graph.cluster(id).will_remove {
            return Ok(());
        }
        self.graph.cluster_mut(id).will_remove = true;
        self.plan.remove_graph.add_vertex(id);

        let remove_edges: Vec<FeatureSpec> = self
            .graph
            .cluster(id)
            .edges
            .values()
            .flat_map(|node| node.remove_edges.iter().cloned())
            .collect();
        for depend in remove_edges {
            let dep_id = self.graph.get(depend.spec());
            self.plan.remove_graph.add_edge(id, dep_id);
            self.mark_minus(dep_id)?;
        }

        self.graph.cluster_mut(id).transient_uninstalled = true;

        // Reinstate what was installed before; losing a feature's port
        // definition degrades to a warning, removal still proceeds.
        let originals: Vec<String> = self
            .graph
            .cluster(id)
            .original_features
            .iter()
            .cloned()
            .collect();
        for original in originals {
            if self.mark_plus(&original, id)? == MarkPlusResult::FeatureNotFound {
                let spec = FeatureSpec::new(self.graph.cluster(id).spec.clone(), original);
                warn!("could not reinstall feature {spec}");
            }
        }
        Ok(())
    }

    /// Emit the ordered action list: removes first, then installs
    pub fn serialize(&self) -> Result<Vec<AnyAction>> {
        let remove_order = topological_sort(
            self.plan.remove_graph.vertex_list(),
            &PlanTopo {
                arena: &self.graph,
                graph: &self.plan.remove_graph,
            },
        )?;
        let install_order = topological_sort(
            self.plan.install_graph.vertex_list(),
            &PlanTopo {
                arena: &self.graph,
                graph: &self.plan.install_graph,
            },
        )?;

        let mut plan = Vec::new();

        for id in remove_order {
            let cluster = self.graph.cluster(id);
            let scf = cluster
                .source_control_file
                .as_ref()
                .ok_or_else(|| Error::MissingPort(cluster.spec.to_string()))?;
            // Canonical name from the port, triplet from the cluster.
            let spec = PackageSpec::new(
                scf.core_paragraph.name.clone(),
                cluster.spec.triplet().clone(),
            );
            plan.push(AnyAction::Remove(RemovePlanAction {
                spec,
                plan_type: RemovePlanType::Remove,
                request_type: cluster.request_type,
            }));
        }

        for id in install_order {
            let cluster = self.graph.cluster(id);
            if cluster.transient_uninstalled {
                // The package leaves installed state during the plan; a full
                // build-and-install is required.
                let scf = cluster
                    .source_control_file
                    .clone()
                    .ok_or_else(|| Error::MissingPort(cluster.spec.to_string()))?;
                plan.push(AnyAction::Install(InstallPlanAction::build_and_install(
                    cluster.spec.clone(),
                    scf,
                    cluster.to_install_features.clone(),
                    cluster.request_type,
                )));
            } else {
                // Untouched by the plan; only surfaced for explicit requests.
                if cluster.request_type != RequestType::UserRequested {
                    continue;
                }
                plan.push(AnyAction::Install(InstallPlanAction::already_installed(
                    cluster.spec.clone(),
                    cluster.original_features.clone(),
                    cluster.request_type,
                )));
            }
        }

        Ok(plan)
    }
}

/// Compute the full feature-aware install plan for a set of requests
pub fn create_feature_install_plan(
    provider: &dyn PortFileProvider,
    specs: &[FeatureSpec],
    status_db: &StatusParagraphs,
) -> Result<Vec<AnyAction>> {
    let mut pgraph = PackageGraph::new(provider, status_db);
    for spec in specs {
        pgraph.install(spec)?;
    }
    pgraph.serialize()
}

/// Spec-only install plan; fails if the plan turns out to need removals
pub fn create_install_plan(
    provider: &dyn PortFileProvider,
    specs: &[PackageSpec],
    status_db: &StatusParagraphs,
) -> Result<Vec<InstallPlanAction>> {
    let fspecs: Vec<FeatureSpec> = specs
        .iter()
        .map(|spec| FeatureSpec::new(spec.clone(), ""))
        .collect();
    let plan = create_feature_install_plan(provider, &fspecs, status_db)?;

    let mut actions = Vec::with_capacity(plan.len());
    for action in plan {
        match action {
            AnyAction::Install(install) => actions.push(install),
            AnyAction::Remove(remove) => {
                return Err(Error::FeaturePackagesRequired(remove.spec.to_string()));
            }
        }
    }
    Ok(actions)
}

/// Plan the unconditional removal of `specs` and every installed dependent
pub fn create_remove_plan(
    specs: &[PackageSpec],
    status_db: &StatusParagraphs,
) -> Result<Vec<RemovePlanAction>> {
    struct RemoveAdjacency<'s> {
        status_db: &'s StatusParagraphs,
        installed: Vec<&'s StatusParagraph>,
        requested: HashSet<PackageSpec>,
    }

    impl AdjacencyProvider<PackageSpec, RemovePlanAction> for RemoveAdjacency<'_> {
        fn adjacency_list(&self, plan: &RemovePlanAction) -> Vec<PackageSpec> {
            if plan.plan_type == RemovePlanType::NotInstalled {
                return Vec::new();
            }
            let spec = &plan.spec;
            self.installed
                .iter()
                .filter(|row| row.spec.triplet() == spec.triplet())
                .filter(|row| {
                    row.depends
                        .iter()
                        .any(|dep| dep.split('[').next() == Some(spec.name()))
                })
                .map(|row| row.spec.clone())
                .collect()
        }

        fn load_vertex_data(&self, spec: &PackageSpec) -> Result<RemovePlanAction> {
            let request_type = if self.requested.contains(spec) {
                RequestType::UserRequested
            } else {
                RequestType::AutoSelected
            };
            let plan_type = if self.status_db.find_installed(spec).is_none() {
                RemovePlanType::NotInstalled
            } else {
                RemovePlanType::Remove
            };
            Ok(RemovePlanAction {
                spec: spec.clone(),
                plan_type,
                request_type,
            })
        }

        fn key_name(&self, spec: &PackageSpec) -> String {
            spec.to_string()
        }
    }

    let provider = RemoveAdjacency {
        status_db,
        installed: status_db.installed_ports(),
        requested: specs.iter().cloned().collect(),
    };
    topological_sort(specs.to_vec(), &provider)
}

/// Plan an export: topo-sort over cached binary or port source metadata
pub fn create_export_plan(
    provider: &dyn PortFileProvider,
    binaries: &dyn BinaryPackageProvider,
    specs: &[PackageSpec],
    _status_db: &StatusParagraphs,
) -> Result<Vec<ExportPlanAction>> {
    struct ExportAdjacency<'s> {
        provider: &'s dyn PortFileProvider,
        binaries: &'s dyn BinaryPackageProvider,
        requested: HashSet<PackageSpec>,
    }

    impl AdjacencyProvider<PackageSpec, ExportPlanAction> for ExportAdjacency<'_> {
        fn adjacency_list(&self, plan: &ExportPlanAction) -> Vec<PackageSpec> {
            plan.any_paragraph.dependencies(plan.spec.triplet())
        }

        fn load_vertex_data(&self, spec: &PackageSpec) -> Result<ExportPlanAction> {
            let request_type = if self.requested.contains(spec) {
                RequestType::UserRequested
            } else {
                RequestType::AutoSelected
            };

            if let Some(bcf) = self.binaries.get_binary_control_file(spec) {
                return Ok(ExportPlanAction {
                    spec: spec.clone(),
                    any_paragraph: AnyParagraph::Binary(bcf),
                    plan_type: ExportPlanType::AlreadyBuilt,
                    request_type,
                });
            }
            if let Some(scf) = self.provider.get_control_file(spec.name()) {
                return Ok(ExportPlanAction {
                    spec: spec.clone(),
                    any_paragraph: AnyParagraph::Source(scf),
                    plan_type: ExportPlanType::PortAvailableButNotBuilt,
                    request_type,
                });
            }
            Err(Error::NoSuchPackage(spec.to_string()))
        }

        fn key_name(&self, spec: &PackageSpec) -> String {
            spec.to_string()
        }
    }

    let adjacency = ExportAdjacency {
        provider,
        binaries,
        requested: specs.iter().cloned().collect(),
    };
    topological_sort(specs.to_vec(), &adjacency)
}
