// src/lib.rs

//! Caravel Package Manager
//!
//! Planning core of a source-based, triplet-aware C/C++ package manager.
//! Given a set of requested package+feature references, the installed
//! state and a provider of port metadata, caravel computes an ordered
//! sequence of remove and install actions that satisfies every request,
//! all transitive build dependencies, and reinstates the features of any
//! package that had to be uninstalled along the way.
//!
//! # Architecture
//!
//! - Ports: CONTROL-file metadata, looked up through `PortFileProvider`
//! - Status database: one paragraph per installed feature, read-only input
//! - Cluster graph: lazily materialized per-package planning state
//! - Mark engine: feature-aware install/remove propagation
//! - Plans: ordered action lists, rendered by `print_plan`

pub mod config;
pub mod control;
mod error;
pub mod paragraph;
pub mod provider;
pub mod resolver;
pub mod spec;
pub mod status;
pub mod triplet;

pub use error::{Error, Result};
pub use spec::{FeatureSpec, PackageSpec};
pub use triplet::Triplet;

pub use resolver::{
    create_export_plan, create_feature_install_plan, create_install_plan, create_remove_plan,
    print_plan, AnyAction, AnyParagraph, ExportPlanAction, ExportPlanType, InstallPlanAction,
    InstallPlanType, PackageGraph, RemovePlanAction, RemovePlanType, RequestType,
};
