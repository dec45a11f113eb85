// src/resolver/cluster.rs

//! Per-package planner state: clusters and the lazily materialized arena
//!
//! A cluster gathers everything the mark engine needs to know about one
//! `PackageSpec`: the port's declared features and build edges, the
//! installed rows and reverse dependencies, and the flags accumulated while
//! planning. Clusters reference each other by spec through their edges; the
//! arena hands out stable `ClusterId` handles so the mutually recursive
//! mark procedures never hold overlapping borrows.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

use tracing::debug;

use super::plan::RequestType;
use crate::control::{filter_dependencies_to_specs, SourceControlFile};
use crate::provider::PortFileProvider;
use crate::spec::{FeatureSpec, PackageSpec};
use crate::status::{StatusParagraph, StatusParagraphs};

/// Install/remove wiring of one feature within a cluster
#[derive(Debug, Clone, Default)]
pub struct FeatureNodeEdges {
    /// Forward build-time dependencies of this feature
    pub build_edges: Vec<FeatureSpec>,
    /// Installed features that depend on this one (populated from the
    /// installed state only)
    pub remove_edges: Vec<FeatureSpec>,
    /// Marked for install in the current plan
    pub plus: bool,
}

/// Stable handle to a cluster in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterId(usize);

/// Planner working state for one package instance
#[derive(Debug)]
pub struct Cluster {
    pub spec: PackageSpec,
    /// Port metadata; absent for installed-only packages whose port was
    /// removed upstream
    pub source_control_file: Option<Rc<SourceControlFile>>,
    /// Installed rows for this spec
    pub status_paragraphs: Vec<StatusParagraph>,
    /// Feature name -> edges; always contains "core" when an SCF is present
    pub edges: BTreeMap<String, FeatureNodeEdges>,
    /// Features the plan will install
    pub to_install_features: BTreeSet<String>,
    /// Features currently installed on disk ("core" included when installed)
    pub original_features: BTreeSet<String>,
    /// Scheduled for removal in the plan
    pub will_remove: bool,
    /// After the plan step the package will (or did) leave "installed" state
    pub transient_uninstalled: bool,
    pub request_type: RequestType,
}

impl Cluster {
    fn new(spec: PackageSpec) -> Self {
        Self {
            spec,
            source_control_file: None,
            status_paragraphs: Vec::new(),
            edges: BTreeMap::new(),
            to_install_features: BTreeSet::new(),
            original_features: BTreeSet::new(),
            will_remove: false,
            transient_uninstalled: true,
            request_type: RequestType::AutoSelected,
        }
    }
}

/// Arena of clusters, materialized on demand from a port provider
pub struct ClusterGraph<'a> {
    clusters: Vec<Cluster>,
    index: HashMap<PackageSpec, ClusterId>,
    provider: &'a dyn PortFileProvider,
}

impl<'a> ClusterGraph<'a> {
    pub fn new(provider: &'a dyn PortFileProvider) -> Self {
        Self {
            clusters: Vec::new(),
            index: HashMap::new(),
            provider,
        }
    }

    /// Handle for the cluster of `spec`, materializing it on first access
    pub fn get(&mut self, spec: &PackageSpec) -> ClusterId {
        if let Some(&id) = self.index.get(spec) {
            return id;
        }

        let mut cluster = Cluster::new(spec.clone());
        if let Some(scf) = self.provider.get_control_file(spec.name()) {
            cluster_from_scf(&scf, &mut cluster);
            cluster.source_control_file = Some(scf);
        } else {
            debug!("no port metadata for {spec}");
        }

        let id = ClusterId(self.clusters.len());
        self.clusters.push(cluster);
        self.index.insert(spec.clone(), id);
        id
    }

    pub fn cluster(&self, id: ClusterId) -> &Cluster {
        &self.clusters[id.0]
    }

    pub fn cluster_mut(&mut self, id: ClusterId) -> &mut Cluster {
        &mut self.clusters[id.0]
    }

    /// Seed the arena from the installed state
    ///
    /// First pass: materialize a cluster per installed row, record the row
    /// and its feature in `original_features`, and clear
    /// `transient_uninstalled`. Second pass: record each row as a reverse
    /// ("remove") edge on every cluster it depends on, so removal can
    /// discover dependents without rescanning the installed list.
    pub fn seed_installed(&mut self, status_db: &StatusParagraphs) {
        let installed: Vec<StatusParagraph> = status_db
            .installed_ports()
            .into_iter()
            .cloned()
            .collect();

        for row in &installed {
            let id = self.get(&row.spec);
            let cluster = self.cluster_mut(id);
            cluster.transient_uninstalled = false;
            cluster.status_paragraphs.push(row.clone());
            // An empty feature field is the "core" paragraph of the package.
            if row.feature.is_empty() {
                cluster.original_features.insert("core".to_string());
            } else {
                cluster.original_features.insert(row.feature.clone());
            }
        }

        for row in &installed {
            let reverse = FeatureSpec::from_strings_and_triplet(&row.depends, row.spec.triplet());
            for dependency in reverse {
                let dep_id = self.get(dependency.spec());
                let feature = if dependency.feature().is_empty() {
                    "core"
                } else {
                    dependency.feature()
                };
                let node = self
                    .cluster_mut(dep_id)
                    .edges
                    .entry(feature.to_string())
                    .or_default();
                node.remove_edges
                    .push(FeatureSpec::new(row.spec.clone(), row.feature.clone()));
            }
        }
    }
}

fn cluster_from_scf(scf: &SourceControlFile, cluster: &mut Cluster) {
    let triplet = cluster.spec.triplet().clone();

    let core = FeatureNodeEdges {
        build_edges: filter_dependencies_to_specs(&scf.core_paragraph.depends, &triplet),
        ..Default::default()
    };
    cluster.edges.insert("core".to_string(), core);

    for feature in &scf.feature_paragraphs {
        let node = FeatureNodeEdges {
            build_edges: filter_dependencies_to_specs(&feature.depends, &triplet),
            ..Default::default()
        };
        cluster.edges.insert(feature.name.clone(), node);
    }
}
