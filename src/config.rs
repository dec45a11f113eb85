// src/config.rs

//! Planner configuration
//!
//! An optional `caravel.toml` supplies the defaults the CLI would otherwise
//! hard-code: the default triplet and the locations of the ports tree, the
//! status file and the packages cache. Command-line flags override any
//! value loaded from the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Planner defaults, loadable from `caravel.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Triplet assumed when a spec does not name one
    #[serde(default = "default_triplet")]
    pub default_triplet: String,

    /// Root of the ports tree (`<ports>/<name>/CONTROL`)
    #[serde(default = "default_ports_dir")]
    pub ports_dir: PathBuf,

    /// Installed-state status file
    #[serde(default = "default_status_file")]
    pub status_file: PathBuf,

    /// Cache of built binary packages
    #[serde(default = "default_packages_dir")]
    pub packages_dir: PathBuf,
}

fn default_triplet() -> String {
    "x64-linux".to_string()
}

fn default_ports_dir() -> PathBuf {
    PathBuf::from("ports")
}

fn default_status_file() -> PathBuf {
    PathBuf::from("installed/status")
}

fn default_packages_dir() -> PathBuf {
    PathBuf::from("packages")
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_triplet: default_triplet(),
            ports_dir: default_ports_dir(),
            status_file: default_status_file(),
            packages_dir: default_packages_dir(),
        }
    }
}

impl PlannerConfig {
    /// Parse a TOML config string
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| Error::Parse {
            line: 0,
            message: format!("invalid config: {err}"),
        })
    }

    /// Load from a file; `None` or a missing file yields the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => return Ok(Self::default()),
        };
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }
}
