// src/spec.rs

//! Package and feature identities
//!
//! A `PackageSpec` names one package instance: a port name plus the triplet
//! it is built for. A `FeatureSpec` narrows that down to a single feature of
//! the package; the empty feature string stands for the bare package ("core")
//! in user references and installed-state rows.
//!
//! User references are written `name`, `name:triplet`, `name[feat1,feat2]`
//! or `name[feat]:triplet`; a missing triplet falls back to the default
//! triplet supplied by the caller.

use std::fmt;

use crate::error::{Error, Result};
use crate::triplet::Triplet;

/// Identity of one package instance: `(name, triplet)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageSpec {
    name: String,
    triplet: Triplet,
}

impl PackageSpec {
    /// Create a spec from a validated name and triplet
    pub fn new(name: impl Into<String>, triplet: Triplet) -> Self {
        Self {
            name: name.into(),
            triplet,
        }
    }

    /// Parse `name` or `name:triplet`, defaulting the triplet when absent
    pub fn parse(input: &str, default_triplet: &Triplet) -> Result<Self> {
        let (name, triplet) = split_triplet(input, default_triplet)?;
        validate_name(input, name)?;
        Ok(Self {
            name: name.to_string(),
            triplet,
        })
    }

    /// The port name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The target triplet
    pub fn triplet(&self) -> &Triplet {
        &self.triplet
    }

    /// Resolve a port's flattened dependency names against a triplet
    ///
    /// Self-references are dropped: a port never depends on itself.
    pub fn from_dependencies_of_port(
        port: &str,
        depends: &[String],
        triplet: &Triplet,
    ) -> Vec<PackageSpec> {
        depends
            .iter()
            .filter(|dep| dep.as_str() != port)
            .map(|dep| PackageSpec::new(dep.clone(), triplet.clone()))
            .collect()
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.triplet)
    }
}

/// Identity of one feature of one package instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureSpec {
    spec: PackageSpec,
    feature: String,
}

impl FeatureSpec {
    /// Create a feature spec; an empty feature denotes the bare package
    pub fn new(spec: PackageSpec, feature: impl Into<String>) -> Self {
        Self {
            spec,
            feature: feature.into(),
        }
    }

    /// The package identity
    pub fn spec(&self) -> &PackageSpec {
        &self.spec
    }

    /// The feature name ("" for the bare package)
    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Parse a user reference, expanding a feature list
    ///
    /// `zlib` yields one spec with the empty feature; `zlib[a,b]:x64-linux`
    /// yields one spec per listed feature. `*` is accepted as a feature name
    /// and expanded later against the port's declared features.
    pub fn parse_list(input: &str, default_triplet: &Triplet) -> Result<Vec<FeatureSpec>> {
        let (head, features) = match input.find('[') {
            None => (input.to_string(), None),
            Some(open) => {
                let close = input.rfind(']').ok_or_else(|| Error::InvalidSpec {
                    input: input.to_string(),
                    reason: "unterminated feature list".to_string(),
                })?;
                if close < open {
                    return Err(Error::InvalidSpec {
                        input: input.to_string(),
                        reason: "malformed feature list".to_string(),
                    });
                }
                let list = input[open + 1..close].to_string();
                let head = format!("{}{}", &input[..open], &input[close + 1..]);
                (head, Some(list))
            }
        };

        let spec = PackageSpec::parse(&head, default_triplet)?;

        let features = match features {
            None => return Ok(vec![FeatureSpec::new(spec, "")]),
            Some(f) => f,
        };

        let mut out = Vec::new();
        for feature in features.split(',') {
            let feature = feature.trim();
            if feature.is_empty() {
                return Err(Error::InvalidSpec {
                    input: input.to_string(),
                    reason: "empty feature name in feature list".to_string(),
                });
            }
            out.push(FeatureSpec::new(spec.clone(), feature));
        }
        Ok(out)
    }

    /// Resolve installed-state dependency strings (`name` or `name[feature]`)
    /// against the depending package's triplet
    pub fn from_strings_and_triplet(depends: &[String], triplet: &Triplet) -> Vec<FeatureSpec> {
        depends
            .iter()
            .map(|dep| match (dep.find('['), dep.rfind(']')) {
                (Some(open), Some(close)) if open < close => FeatureSpec::new(
                    PackageSpec::new(&dep[..open], triplet.clone()),
                    &dep[open + 1..close],
                ),
                _ => FeatureSpec::new(PackageSpec::new(dep.clone(), triplet.clone()), ""),
            })
            .collect()
    }
}

impl fmt::Display for FeatureSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.feature.is_empty() {
            write!(f, "{}", self.spec)
        } else {
            write!(
                f,
                "{}[{}]:{}",
                self.spec.name(),
                self.feature,
                self.spec.triplet()
            )
        }
    }
}

fn split_triplet<'a>(input: &'a str, default_triplet: &Triplet) -> Result<(&'a str, Triplet)> {
    match input.find(':') {
        None => Ok((input, default_triplet.clone())),
        Some(pos) => {
            let triplet = Triplet::new(&input[pos + 1..]).map_err(|_| Error::InvalidSpec {
                input: input.to_string(),
                reason: "invalid triplet".to_string(),
            })?;
            Ok((&input[..pos], triplet))
        }
    }
}

fn validate_name(input: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidSpec {
            input: input.to_string(),
            reason: "package name is empty".to_string(),
        });
    }
    let valid = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.';
    if !name.chars().all(valid) {
        return Err(Error::InvalidSpec {
            input: input.to_string(),
            reason: "package names may only contain alphanumerics, '-', '_' and '.'".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(name: &str) -> Triplet {
        Triplet::new(name).unwrap()
    }

    #[test]
    fn test_parse_bare_name_uses_default_triplet() {
        let spec = PackageSpec::parse("zlib", &t("x64-linux")).unwrap();
        assert_eq!(spec.name(), "zlib");
        assert_eq!(spec.triplet(), &t("x64-linux"));
    }

    #[test]
    fn test_parse_explicit_triplet() {
        let spec = PackageSpec::parse("zlib:arm64-osx", &t("x64-linux")).unwrap();
        assert_eq!(spec.triplet(), &t("arm64-osx"));
    }

    #[test]
    fn test_parse_rejects_bad_name() {
        assert!(PackageSpec::parse("", &t("x64-linux")).is_err());
        assert!(PackageSpec::parse("zl ib", &t("x64-linux")).is_err());
    }

    #[test]
    fn test_feature_list_expansion() {
        let specs = FeatureSpec::parse_list("curl[ssl,http2]:x86-windows", &t("x64-linux")).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].to_string(), "curl[ssl]:x86-windows");
        assert_eq!(specs[1].to_string(), "curl[http2]:x86-windows");
    }

    #[test]
    fn test_no_feature_list_yields_empty_feature() {
        let specs = FeatureSpec::parse_list("curl", &t("x64-linux")).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].feature(), "");
    }

    #[test]
    fn test_unterminated_feature_list_is_rejected() {
        assert!(FeatureSpec::parse_list("curl[ssl", &t("x64-linux")).is_err());
        assert!(FeatureSpec::parse_list("curl[a,]", &t("x64-linux")).is_err());
    }

    #[test]
    fn test_dependencies_of_port_skip_self() {
        let deps = vec!["zlib".to_string(), "curl".to_string()];
        let specs = PackageSpec::from_dependencies_of_port("curl", &deps, &t("x64-linux"));
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name(), "zlib");
    }

    #[test]
    fn test_status_depends_with_feature() {
        let deps = vec!["curl[ssl]".to_string(), "zlib".to_string()];
        let specs = FeatureSpec::from_strings_and_triplet(&deps, &t("x64-linux"));
        assert_eq!(specs[0].feature(), "ssl");
        assert_eq!(specs[1].feature(), "");
    }
}
