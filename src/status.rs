// src/status.rs

//! Installed-state snapshot
//!
//! The status database holds one paragraph per installed feature: the core
//! paragraph of a package has an empty `Feature` field, extra features carry
//! their name. The planner treats the snapshot as read-only reference data.

use std::path::Path;

use crate::error::{Error, Result};
use crate::paragraph::{parse_comma_list, parse_paragraphs, Paragraph};
use crate::spec::PackageSpec;
use crate::triplet::Triplet;

/// What the user asked the package state to converge to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Want {
    Unknown,
    Install,
    Hold,
    Deinstall,
    Purge,
}

impl Want {
    fn parse(s: &str) -> Self {
        match s {
            "install" => Want::Install,
            "hold" => Want::Hold,
            "deinstall" => Want::Deinstall,
            "purge" => Want::Purge,
            _ => Want::Unknown,
        }
    }
}

/// How far installation of the package actually got
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Unknown,
    NotInstalled,
    HalfInstalled,
    Installed,
}

impl InstallState {
    fn parse(s: &str) -> Self {
        match s {
            "not-installed" => InstallState::NotInstalled,
            "half-installed" => InstallState::HalfInstalled,
            "installed" => InstallState::Installed,
            _ => InstallState::Unknown,
        }
    }
}

/// One installed-feature row of the status database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusParagraph {
    pub spec: PackageSpec,
    /// Feature this row describes ("" = core)
    pub feature: String,
    /// Flattened dependency names, resolved against the package's triplet
    pub depends: Vec<String>,
    pub want: Want,
    pub state: InstallState,
}

impl StatusParagraph {
    /// Build a row that is fully installed (the common case in tests)
    pub fn installed(spec: PackageSpec, feature: &str, depends: Vec<String>) -> Self {
        Self {
            spec,
            feature: feature.to_string(),
            depends,
            want: Want::Install,
            state: InstallState::Installed,
        }
    }

    /// True when the row is present and fully installed
    pub fn is_installed(&self) -> bool {
        self.want == Want::Install && self.state == InstallState::Installed
    }

    fn from_paragraph(paragraph: &Paragraph, line: usize) -> Result<Self> {
        let name = paragraph.require("Package", line)?;
        let triplet = Triplet::new(paragraph.require("Architecture", line)?)?;
        let status = paragraph.require("Status", line)?;

        // "install ok installed": want, error flag, install state
        let mut words = status.split_whitespace();
        let want = Want::parse(words.next().unwrap_or_default());
        let state = InstallState::parse(words.nth(1).unwrap_or_default());

        Ok(Self {
            spec: PackageSpec::new(name, triplet),
            feature: paragraph.get("Feature").unwrap_or_default().to_string(),
            depends: parse_comma_list(paragraph.get("Depends").unwrap_or_default()),
            want,
            state,
        })
    }
}

/// The full installed-state snapshot
#[derive(Debug, Clone, Default)]
pub struct StatusParagraphs {
    paragraphs: Vec<StatusParagraph>,
}

impl StatusParagraphs {
    /// Wrap an in-memory set of rows
    pub fn new(paragraphs: Vec<StatusParagraph>) -> Self {
        Self { paragraphs }
    }

    /// Load a status file; a missing file is an empty installation
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse status-file text
    pub fn parse(text: &str) -> Result<Self> {
        let mut paragraphs = Vec::new();
        for (paragraph, line) in parse_paragraphs(text)? {
            paragraphs.push(StatusParagraph::from_paragraph(&paragraph, line)?);
        }
        Ok(Self { paragraphs })
    }

    /// Find the installed core row for a package, if any
    pub fn find_installed(&self, spec: &PackageSpec) -> Option<&StatusParagraph> {
        self.paragraphs
            .iter()
            .find(|p| p.feature.is_empty() && p.is_installed() && &p.spec == spec)
    }

    /// All installed rows, core and feature alike
    pub fn installed_ports(&self) -> Vec<&StatusParagraph> {
        self.paragraphs.iter().filter(|p| p.is_installed()).collect()
    }

    /// Iterate every row regardless of state
    pub fn iter(&self) -> impl Iterator<Item = &StatusParagraph> {
        self.paragraphs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> Triplet {
        Triplet::new("x64-linux").unwrap()
    }

    const STATUS: &str = "\
Package: zlib
Architecture: x64-linux
Status: install ok installed

Package: curl
Architecture: x64-linux
Depends: zlib
Status: install ok installed

Package: curl
Feature: ssl
Architecture: x64-linux
Depends: openssl
Status: install ok installed

Package: gone
Architecture: x64-linux
Status: purge ok not-installed
";

    #[test]
    fn test_parse_and_filter_installed() {
        let db = StatusParagraphs::parse(STATUS).unwrap();
        assert_eq!(db.iter().count(), 4);
        assert_eq!(db.installed_ports().len(), 3, "purged row is not installed");
    }

    #[test]
    fn test_find_installed_matches_core_row_only() {
        let db = StatusParagraphs::parse(STATUS).unwrap();
        let curl = PackageSpec::new("curl", t());
        let row = db.find_installed(&curl).unwrap();
        assert_eq!(row.feature, "");
        assert_eq!(row.depends, vec!["zlib".to_string()]);

        let gone = PackageSpec::new("gone", t());
        assert!(db.find_installed(&gone).is_none());
    }

    #[test]
    fn test_missing_status_field_fails() {
        assert!(StatusParagraphs::parse("Package: a\nArchitecture: x64-linux\n").is_err());
    }
}
