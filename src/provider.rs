// src/provider.rs

//! Port and binary-package metadata providers
//!
//! The planner looks ports up by name through `PortFileProvider`, and the
//! export planner looks cached binary packages up through
//! `BinaryPackageProvider`. Providers hand out `Rc` handles so plan actions
//! can own the metadata they reference without borrowing from the planner.
//!
//! The path-backed providers parse on first access and memoize for their
//! lifetime, negative results included; a port that fails to parse is
//! reported as "not found" and the plan fails later if the port turns out
//! to be required.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::debug;

use crate::control::{BinaryControlFile, SourceControlFile};
use crate::spec::PackageSpec;

/// Lookup interface for port metadata
pub trait PortFileProvider {
    /// The control file for a port name, if the port exists and parses
    fn get_control_file(&self, name: &str) -> Option<Rc<SourceControlFile>>;
}

/// Provider backed by a caller-supplied map (tests, overlays)
pub struct MapPortFileProvider {
    ports: HashMap<String, Rc<SourceControlFile>>,
}

impl MapPortFileProvider {
    pub fn new(ports: HashMap<String, SourceControlFile>) -> Self {
        Self {
            ports: ports
                .into_iter()
                .map(|(name, scf)| (name, Rc::new(scf)))
                .collect(),
        }
    }
}

impl PortFileProvider for MapPortFileProvider {
    fn get_control_file(&self, name: &str) -> Option<Rc<SourceControlFile>> {
        self.ports.get(name).cloned()
    }
}

/// Provider backed by an on-disk ports tree (`<root>/<name>/CONTROL`)
pub struct PathsPortFileProvider {
    ports_dir: PathBuf,
    cache: RefCell<HashMap<String, Option<Rc<SourceControlFile>>>>,
}

impl PathsPortFileProvider {
    pub fn new(ports_dir: impl Into<PathBuf>) -> Self {
        Self {
            ports_dir: ports_dir.into(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    fn load_port(&self, name: &str) -> Option<Rc<SourceControlFile>> {
        let control_path = self.ports_dir.join(name).join("CONTROL");
        let text = match std::fs::read_to_string(&control_path) {
            Ok(text) => text,
            Err(err) => {
                debug!("no port file at {}: {err}", control_path.display());
                return None;
            }
        };
        match SourceControlFile::parse(&text) {
            Ok(scf) => Some(Rc::new(scf)),
            Err(err) => {
                debug!("failed to parse {}: {err}", control_path.display());
                None
            }
        }
    }
}

impl PortFileProvider for PathsPortFileProvider {
    fn get_control_file(&self, name: &str) -> Option<Rc<SourceControlFile>> {
        if let Some(cached) = self.cache.borrow().get(name) {
            return cached.clone();
        }
        let loaded = self.load_port(name);
        self.cache
            .borrow_mut()
            .insert(name.to_string(), loaded.clone());
        loaded
    }
}

/// Lookup interface for cached binary packages
pub trait BinaryPackageProvider {
    /// The binary control file for a built package, if one is cached
    fn get_binary_control_file(&self, spec: &PackageSpec) -> Option<Rc<BinaryControlFile>>;
}

/// Binary provider backed by a caller-supplied map (tests)
#[derive(Default)]
pub struct MapBinaryProvider {
    packages: HashMap<PackageSpec, Rc<BinaryControlFile>>,
}

impl MapBinaryProvider {
    pub fn new(packages: HashMap<PackageSpec, BinaryControlFile>) -> Self {
        Self {
            packages: packages
                .into_iter()
                .map(|(spec, bcf)| (spec, Rc::new(bcf)))
                .collect(),
        }
    }
}

impl BinaryPackageProvider for MapBinaryProvider {
    fn get_binary_control_file(&self, spec: &PackageSpec) -> Option<Rc<BinaryControlFile>> {
        self.packages.get(spec).cloned()
    }
}

/// Binary provider backed by the packages directory
/// (`<root>/<name>_<triplet>/CONTROL`)
pub struct PackagesDirCache {
    packages_dir: PathBuf,
    cache: RefCell<HashMap<PackageSpec, Option<Rc<BinaryControlFile>>>>,
}

impl PackagesDirCache {
    pub fn new(packages_dir: impl Into<PathBuf>) -> Self {
        Self {
            packages_dir: packages_dir.into(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    fn load_package(&self, spec: &PackageSpec) -> Option<Rc<BinaryControlFile>> {
        let dir_name = format!("{}_{}", spec.name(), spec.triplet());
        let control_path = self.packages_dir.join(dir_name).join("CONTROL");
        let text = match std::fs::read_to_string(&control_path) {
            Ok(text) => text,
            Err(err) => {
                debug!("no cached package at {}: {err}", control_path.display());
                return None;
            }
        };
        match BinaryControlFile::parse(&text) {
            Ok(bcf) => Some(Rc::new(bcf)),
            Err(err) => {
                debug!("failed to parse {}: {err}", control_path.display());
                None
            }
        }
    }
}

impl BinaryPackageProvider for PackagesDirCache {
    fn get_binary_control_file(&self, spec: &PackageSpec) -> Option<Rc<BinaryControlFile>> {
        if let Some(cached) = self.cache.borrow().get(spec) {
            return cached.clone();
        }
        let loaded = self.load_package(spec);
        self.cache.borrow_mut().insert(spec.clone(), loaded.clone());
        loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triplet::Triplet;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_map_provider_lookup() {
        let scf = SourceControlFile::parse("Source: zlib\nVersion: 1.2.11\n").unwrap();
        let provider = MapPortFileProvider::new(HashMap::from([("zlib".to_string(), scf)]));

        assert!(provider.get_control_file("zlib").is_some());
        assert!(provider.get_control_file("curl").is_none());
    }

    #[test]
    fn test_paths_provider_loads_and_memoizes() {
        let root = TempDir::new().unwrap();
        let port_dir = root.path().join("zlib");
        fs::create_dir_all(&port_dir).unwrap();
        fs::write(port_dir.join("CONTROL"), "Source: zlib\nVersion: 1.2.11\n").unwrap();

        let provider = PathsPortFileProvider::new(root.path());
        let first = provider.get_control_file("zlib").unwrap();
        assert_eq!(first.core_paragraph.name, "zlib");

        // A second lookup must come from the memo, so rewriting the port on
        // disk is not observed within one provider lifetime.
        fs::write(port_dir.join("CONTROL"), "Source: other\nVersion: 9\n").unwrap();
        let second = provider.get_control_file("zlib").unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_paths_provider_treats_parse_errors_as_missing() {
        let root = TempDir::new().unwrap();
        let port_dir = root.path().join("broken");
        fs::create_dir_all(&port_dir).unwrap();
        fs::write(port_dir.join("CONTROL"), "not a control file\n").unwrap();

        let provider = PathsPortFileProvider::new(root.path());
        assert!(provider.get_control_file("broken").is_none());
        assert!(provider.get_control_file("absent").is_none());
    }

    #[test]
    fn test_packages_dir_cache_lookup() {
        let root = TempDir::new().unwrap();
        let pkg_dir = root.path().join("zlib_x64-linux");
        fs::create_dir_all(&pkg_dir).unwrap();
        fs::write(
            pkg_dir.join("CONTROL"),
            "Package: zlib\nVersion: 1.2.11\nArchitecture: x64-linux\n",
        )
        .unwrap();

        let cache = PackagesDirCache::new(root.path());
        let spec = PackageSpec::new("zlib", Triplet::new("x64-linux").unwrap());
        assert!(cache.get_binary_control_file(&spec).is_some());

        let other = PackageSpec::new("zlib", Triplet::new("x86-windows").unwrap());
        assert!(cache.get_binary_control_file(&other).is_none());
    }
}
