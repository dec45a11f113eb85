// src/resolver/render.rs

//! Human-readable plan rendering
//!
//! Actions are grouped into categories, sorted by package name within each,
//! and printed one line per package: user-requested entries indented,
//! auto-selected entries starred. When the plan removes packages and the
//! caller did not opt into `--recurse`, rendering prints the plan and then
//! fails so the CLI exits non-zero.

use tracing::warn;

use super::plan::{
    AnyAction, BuildOptions, InstallPlanAction, InstallPlanType, RemovePlanAction, RequestType,
};
use crate::error::{Error, Result};

/// Format one plan line
pub fn to_output_string(request_type: RequestType, s: &str, options: BuildOptions) -> String {
    let from_head = if options.use_head_version {
        " (from HEAD)"
    } else {
        ""
    };
    match request_type {
        RequestType::AutoSelected => format!("  * {s}{from_head}"),
        RequestType::UserRequested => format!("    {s}{from_head}"),
    }
}

/// Categorize, sort and print a plan; gate removals on `is_recursive`
pub fn print_plan(action_plan: &[AnyAction], is_recursive: bool) -> Result<()> {
    let mut remove_plans: Vec<&RemovePlanAction> = Vec::new();
    let mut rebuilt_plans: Vec<&InstallPlanAction> = Vec::new();
    let mut only_install_plans: Vec<&InstallPlanAction> = Vec::new();
    let mut new_plans: Vec<&InstallPlanAction> = Vec::new();
    let mut already_installed_plans: Vec<&InstallPlanAction> = Vec::new();
    let mut excluded: Vec<&InstallPlanAction> = Vec::new();

    let has_non_user_requested = action_plan.iter().any(|action| {
        action
            .install()
            .is_some_and(|plan| plan.request_type != RequestType::UserRequested)
    });

    for action in action_plan {
        match action {
            AnyAction::Remove(remove) => remove_plans.push(remove),
            AnyAction::Install(install) => {
                // Removes precede installs, so a rebuild's remove half is
                // already recorded when its install half arrives.
                if remove_plans.iter().any(|plan| plan.spec == install.spec) {
                    rebuilt_plans.push(install);
                } else {
                    match install.plan_type {
                        InstallPlanType::Install => only_install_plans.push(install),
                        InstallPlanType::AlreadyInstalled => {
                            if install.request_type == RequestType::UserRequested {
                                already_installed_plans.push(install);
                            }
                        }
                        InstallPlanType::BuildAndInstall => new_plans.push(install),
                        InstallPlanType::Excluded => excluded.push(install),
                    }
                }
            }
        }
    }

    remove_plans.sort_by(|a, b| a.spec.name().cmp(b.spec.name()));
    for plans in [
        &mut rebuilt_plans,
        &mut only_install_plans,
        &mut new_plans,
        &mut already_installed_plans,
        &mut excluded,
    ] {
        plans.sort_by(|a, b| a.spec.name().cmp(b.spec.name()));
    }

    let section = |plans: &[&InstallPlanAction]| -> String {
        plans
            .iter()
            .map(|p| to_output_string(p.request_type, &p.display_name(), p.build_options))
            .collect::<Vec<_>>()
            .join("\n")
    };

    if !excluded.is_empty() {
        println!("The following packages are excluded:\n{}", section(&excluded));
    }
    if !already_installed_plans.is_empty() {
        println!(
            "The following packages are already installed:\n{}",
            section(&already_installed_plans)
        );
    }
    if !rebuilt_plans.is_empty() {
        println!(
            "The following packages will be rebuilt:\n{}",
            section(&rebuilt_plans)
        );
    }
    if !new_plans.is_empty() {
        println!(
            "The following packages will be built and installed:\n{}",
            section(&new_plans)
        );
    }
    if !only_install_plans.is_empty() {
        println!(
            "The following packages will be directly installed:\n{}",
            section(&only_install_plans)
        );
    }
    if has_non_user_requested {
        println!("Additional packages (*) will be modified to complete this operation.");
    }

    if !remove_plans.is_empty() && !is_recursive {
        warn!("if you are sure you want to rebuild the above packages, run the command with --recurse");
        return Err(Error::NonRecursiveRemoves);
    }
    Ok(())
}
