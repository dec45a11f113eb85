// src/commands.rs
//! Command handlers for the caravel CLI

use anyhow::{bail, Result};
use caravel::config::PlannerConfig;
use caravel::provider::{PackagesDirCache, PathsPortFileProvider, PortFileProvider};
use caravel::resolver::{self, AnyAction, AnyParagraph, ExportPlanType, RemovePlanType};
use caravel::status::StatusParagraphs;
use caravel::{FeatureSpec, PackageSpec, RequestType, Triplet};
use std::path::{Path, PathBuf};
use tracing::info;

/// Shared setup: config file plus flag overrides
struct Workspace {
    triplet: Triplet,
    ports_dir: PathBuf,
    status_file: PathBuf,
    packages_dir: PathBuf,
}

impl Workspace {
    fn resolve(
        config: Option<&Path>,
        ports: Option<&Path>,
        status: Option<&Path>,
        packages: Option<&Path>,
        triplet: Option<&str>,
    ) -> Result<Self> {
        let config = PlannerConfig::load(config)?;
        let triplet = Triplet::new(triplet.unwrap_or(&config.default_triplet))?;
        Ok(Self {
            triplet,
            ports_dir: ports.map(Path::to_path_buf).unwrap_or(config.ports_dir),
            status_file: status.map(Path::to_path_buf).unwrap_or(config.status_file),
            packages_dir: packages
                .map(Path::to_path_buf)
                .unwrap_or(config.packages_dir),
        })
    }

    fn status_db(&self) -> Result<StatusParagraphs> {
        Ok(StatusParagraphs::load(&self.status_file)?)
    }

    fn parse_package_specs(&self, specs: &[String]) -> Result<Vec<PackageSpec>> {
        specs
            .iter()
            .map(|raw| Ok(PackageSpec::parse(raw, &self.triplet)?))
            .collect()
    }
}

pub fn cmd_install(
    specs: &[String],
    config: Option<&Path>,
    ports: Option<&Path>,
    status: Option<&Path>,
    triplet: Option<&str>,
    recurse: bool,
    head: bool,
) -> Result<()> {
    let workspace = Workspace::resolve(config, ports, status, None, triplet)?;
    let status_db = workspace.status_db()?;
    let provider = PathsPortFileProvider::new(&workspace.ports_dir);

    let mut fspecs = Vec::new();
    for raw in specs {
        fspecs.extend(FeatureSpec::parse_list(raw, &workspace.triplet)?);
    }

    let mut plan = resolver::create_feature_install_plan(&provider, &fspecs, &status_db)?;

    if head {
        for action in &mut plan {
            if let AnyAction::Install(install) = action {
                if install.request_type == RequestType::UserRequested {
                    install.build_options.use_head_version = true;
                }
            }
        }
    }

    if plan.is_empty() {
        info!("nothing to do");
        return Ok(());
    }

    resolver::print_plan(&plan, recurse)?;
    Ok(())
}

pub fn cmd_remove(
    specs: &[String],
    config: Option<&Path>,
    status: Option<&Path>,
    triplet: Option<&str>,
    recurse: bool,
) -> Result<()> {
    let workspace = Workspace::resolve(config, None, status, None, triplet)?;
    let status_db = workspace.status_db()?;
    let pspecs = workspace.parse_package_specs(specs)?;

    let plan = resolver::create_remove_plan(&pspecs, &status_db)?;

    for action in &plan {
        if action.plan_type == RemovePlanType::NotInstalled {
            info!("{} is not installed", action.spec);
        }
    }

    let removes: Vec<_> = plan
        .iter()
        .filter(|action| action.plan_type == RemovePlanType::Remove)
        .collect();
    if removes.is_empty() {
        info!("nothing to remove");
        return Ok(());
    }

    println!("The following packages will be removed:");
    for action in &removes {
        println!(
            "{}",
            resolver::to_output_string(
                action.request_type,
                &action.spec.to_string(),
                Default::default()
            )
        );
    }

    let has_cascades = removes
        .iter()
        .any(|action| action.request_type == RequestType::AutoSelected);
    if has_cascades && !recurse {
        bail!("additional packages (*) need to be removed; re-run with --recurse");
    }
    Ok(())
}

pub fn cmd_export(
    specs: &[String],
    config: Option<&Path>,
    ports: Option<&Path>,
    packages: Option<&Path>,
    status: Option<&Path>,
    triplet: Option<&str>,
) -> Result<()> {
    let workspace = Workspace::resolve(config, ports, status, packages, triplet)?;
    let status_db = workspace.status_db()?;
    let provider = PathsPortFileProvider::new(&workspace.ports_dir);
    let binaries = PackagesDirCache::new(&workspace.packages_dir);
    let pspecs = workspace.parse_package_specs(specs)?;

    let plan = resolver::create_export_plan(&provider, &binaries, &pspecs, &status_db)?;

    let built: Vec<_> = plan
        .iter()
        .filter(|action| action.plan_type == ExportPlanType::AlreadyBuilt)
        .collect();
    let not_built: Vec<_> = plan
        .iter()
        .filter(|action| action.plan_type == ExportPlanType::PortAvailableButNotBuilt)
        .collect();

    if !built.is_empty() {
        println!("The following packages will be exported:");
        for action in &built {
            println!(
                "{}",
                resolver::to_output_string(
                    action.request_type,
                    &action.spec.to_string(),
                    Default::default()
                )
            );
        }
    }

    if !not_built.is_empty() {
        println!("The following packages need to be built before they can be exported:");
        for action in &not_built {
            println!(
                "{}",
                resolver::to_output_string(
                    action.request_type,
                    &action.spec.to_string(),
                    Default::default()
                )
            );
        }
        bail!("export requires all packages to be built");
    }
    Ok(())
}

pub fn cmd_depends(
    port: &str,
    config: Option<&Path>,
    ports: Option<&Path>,
    status: Option<&Path>,
    triplet: Option<&str>,
) -> Result<()> {
    let workspace = Workspace::resolve(config, ports, status, None, triplet)?;
    let status_db = workspace.status_db()?;
    let provider = PathsPortFileProvider::new(&workspace.ports_dir);
    let spec = PackageSpec::parse(port, &workspace.triplet)?;

    // Prefer what is actually installed over the port's current metadata.
    let paragraph = if let Some(row) = status_db.find_installed(&spec) {
        AnyParagraph::Status(row.clone())
    } else if let Some(scf) = provider.get_control_file(spec.name()) {
        AnyParagraph::Source(scf)
    } else {
        bail!("could not find package {spec}");
    };

    for dependency in paragraph.dependencies(spec.triplet()) {
        println!("{dependency}");
    }
    Ok(())
}
