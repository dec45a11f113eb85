// src/main.rs
//! Caravel Package Manager - CLI Entry Point

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

mod commands;

// =============================================================================
// CLI Definitions
// =============================================================================

#[derive(Parser)]
#[command(name = "caravel")]
#[command(author = "Caravel Project")]
#[command(version)]
#[command(about = "Source-based, triplet-aware C/C++ package manager", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan the installation of packages and features
    Install {
        /// Package references (name[features][:triplet])
        #[arg(required = true)]
        specs: Vec<String>,

        /// Path to a caravel.toml config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Root of the ports tree
        #[arg(long)]
        ports: Option<PathBuf>,

        /// Path to the installed-state status file
        #[arg(long)]
        status: Option<PathBuf>,

        /// Default triplet for specs that do not name one
        #[arg(short, long)]
        triplet: Option<String>,

        /// Allow plans that remove and rebuild installed packages
        #[arg(long)]
        recurse: bool,

        /// Build requested ports from upstream HEAD
        #[arg(long)]
        head: bool,
    },

    /// Plan the removal of installed packages
    Remove {
        /// Package references (name[:triplet])
        #[arg(required = true)]
        specs: Vec<String>,

        /// Path to a caravel.toml config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to the installed-state status file
        #[arg(long)]
        status: Option<PathBuf>,

        /// Default triplet for specs that do not name one
        #[arg(short, long)]
        triplet: Option<String>,

        /// Also remove packages that depend on the requested ones
        #[arg(long)]
        recurse: bool,
    },

    /// Plan an export of built packages and their dependencies
    Export {
        /// Package references (name[:triplet])
        #[arg(required = true)]
        specs: Vec<String>,

        /// Path to a caravel.toml config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Root of the ports tree
        #[arg(long)]
        ports: Option<PathBuf>,

        /// Cache of built binary packages
        #[arg(long)]
        packages: Option<PathBuf>,

        /// Path to the installed-state status file
        #[arg(long)]
        status: Option<PathBuf>,

        /// Default triplet for specs that do not name one
        #[arg(short, long)]
        triplet: Option<String>,
    },

    /// Show the dependencies of a package
    Depends {
        /// Package reference (name[:triplet])
        port: String,

        /// Path to a caravel.toml config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Root of the ports tree
        #[arg(long)]
        ports: Option<PathBuf>,

        /// Path to the installed-state status file
        #[arg(long)]
        status: Option<PathBuf>,

        /// Default triplet for specs that do not name one
        #[arg(short, long)]
        triplet: Option<String>,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Install { specs, config, ports, status, triplet, recurse, head }) => {
            commands::cmd_install(
                &specs,
                config.as_deref(),
                ports.as_deref(),
                status.as_deref(),
                triplet.as_deref(),
                recurse,
                head,
            )
        }

        Some(Commands::Remove { specs, config, status, triplet, recurse }) => {
            commands::cmd_remove(
                &specs,
                config.as_deref(),
                status.as_deref(),
                triplet.as_deref(),
                recurse,
            )
        }

        Some(Commands::Export { specs, config, ports, packages, status, triplet }) => {
            commands::cmd_export(
                &specs,
                config.as_deref(),
                ports.as_deref(),
                packages.as_deref(),
                status.as_deref(),
                triplet.as_deref(),
            )
        }

        Some(Commands::Depends { port, config, ports, status, triplet }) => {
            commands::cmd_depends(
                &port,
                config.as_deref(),
                ports.as_deref(),
                status.as_deref(),
                triplet.as_deref(),
            )
        }

        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
