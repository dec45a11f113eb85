// src/control.rs

//! Port metadata: source and binary control files
//!
//! A port's CONTROL file declares a core paragraph (name, version, build
//! dependencies) and zero or more feature paragraphs. A cached binary
//! package carries a flattened variant of the same data. Both are parsed
//! from the shared paragraph format.
//!
//! Dependency entries are written `name[features]:triplet (qualifier)`,
//! every part after the name optional. A qualifier of `tag` restricts the
//! entry to triplets whose name contains `tag`; `!tag` excludes them.

use std::fmt;

use crate::error::{Error, Result};
use crate::paragraph::{parse_comma_list, parse_paragraphs, Paragraph};
use crate::spec::{FeatureSpec, PackageSpec};
use crate::triplet::Triplet;

/// One entry of a `Build-Depends` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Name of the depended-upon port
    pub name: String,
    /// Features requested from the port (empty = bare package)
    pub features: Vec<String>,
    /// Target triplet override; inherits the depending port's triplet when absent
    pub triplet: Option<Triplet>,
    /// Platform qualifier (`tag` or `!tag`), matched against the triplet name
    pub qualifier: Option<String>,
}

impl Dependency {
    /// Parse one dependency entry
    pub fn parse(input: &str) -> Result<Self> {
        let mut rest = input.trim();

        let qualifier = match (rest.find('('), rest.ends_with(')')) {
            (Some(open), true) => {
                let qualifier = rest[open + 1..rest.len() - 1].trim().to_string();
                rest = rest[..open].trim_end();
                if qualifier.is_empty() {
                    None
                } else {
                    Some(qualifier)
                }
            }
            (Some(_), false) | (None, true) => {
                return Err(Error::InvalidSpec {
                    input: input.to_string(),
                    reason: "malformed platform qualifier".to_string(),
                });
            }
            (None, false) => None,
        };

        let triplet = match rest.find(':') {
            None => None,
            Some(pos) => {
                let triplet = Triplet::new(rest[pos + 1..].trim())?;
                rest = &rest[..pos];
                Some(triplet)
            }
        };

        let features = match (rest.find('['), rest.rfind(']')) {
            (None, None) => Vec::new(),
            (Some(open), Some(close)) if open < close => {
                let features = parse_comma_list(&rest[open + 1..close]);
                rest = &rest[..open];
                features
            }
            _ => {
                return Err(Error::InvalidSpec {
                    input: input.to_string(),
                    reason: "malformed feature list".to_string(),
                });
            }
        };

        let name = rest.trim();
        if name.is_empty() {
            return Err(Error::InvalidSpec {
                input: input.to_string(),
                reason: "dependency name is empty".to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            features,
            triplet,
            qualifier,
        })
    }

    /// Whether this entry applies when building for `triplet`
    pub fn applies_to(&self, triplet: &Triplet) -> bool {
        match self.qualifier.as_deref() {
            None => true,
            Some(q) => match q.strip_prefix('!') {
                Some(tag) => !triplet.canonical_name().contains(tag),
                None => triplet.canonical_name().contains(q),
            },
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.features.is_empty() {
            write!(f, "[{}]", self.features.join(","))?;
        }
        if let Some(triplet) = &self.triplet {
            write!(f, ":{triplet}")?;
        }
        if let Some(qualifier) = &self.qualifier {
            write!(f, " ({qualifier})")?;
        }
        Ok(())
    }
}

/// Parse a full `Build-Depends` field value
pub fn parse_depends_field(value: &str) -> Result<Vec<Dependency>> {
    parse_comma_list_respecting_brackets(value)
        .iter()
        .map(|entry| Dependency::parse(entry))
        .collect()
}

// A feature list inside an entry also uses commas, so the field cannot be
// split with a plain `split(',')`.
fn parse_comma_list_respecting_brackets(value: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    for c in value.chars() {
        match c {
            '[' | '(' => {
                depth += 1;
                current.push(c);
            }
            ']' | ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                if !current.trim().is_empty() {
                    entries.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        entries.push(current.trim().to_string());
    }
    entries
}

/// Drop entries that do not apply to `triplet` and flatten to names
pub fn filter_dependencies(depends: &[Dependency], triplet: &Triplet) -> Vec<String> {
    depends
        .iter()
        .filter(|dep| dep.applies_to(triplet))
        .map(|dep| dep.name.clone())
        .collect()
}

/// Drop entries that do not apply to `triplet` and expand to feature specs
///
/// The target triplet is the entry's override when present, otherwise the
/// depending port's. A bare entry becomes the dependency's "core" feature.
pub fn filter_dependencies_to_specs(
    depends: &[Dependency],
    triplet: &Triplet,
) -> Vec<FeatureSpec> {
    let mut specs = Vec::new();
    for dep in depends {
        if !dep.applies_to(triplet) {
            continue;
        }
        let target = dep.triplet.clone().unwrap_or_else(|| triplet.clone());
        let spec = PackageSpec::new(dep.name.clone(), target);
        if dep.features.is_empty() {
            specs.push(FeatureSpec::new(spec, "core"));
        } else {
            for feature in &dep.features {
                let feature = if feature.is_empty() { "core" } else { feature };
                specs.push(FeatureSpec::new(spec.clone(), feature));
            }
        }
    }
    specs
}

/// The core paragraph of a port's CONTROL file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceParagraph {
    pub name: String,
    pub version: String,
    pub description: String,
    pub depends: Vec<Dependency>,
}

/// One feature paragraph of a port's CONTROL file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureParagraph {
    pub name: String,
    pub description: String,
    pub depends: Vec<Dependency>,
}

/// Parsed port metadata: core paragraph plus feature paragraphs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceControlFile {
    pub core_paragraph: SourceParagraph,
    pub feature_paragraphs: Vec<FeatureParagraph>,
}

impl SourceControlFile {
    /// Parse a CONTROL file
    pub fn parse(text: &str) -> Result<Self> {
        let paragraphs = parse_paragraphs(text)?;
        let mut iter = paragraphs.into_iter();

        let (core, core_line) = iter.next().ok_or_else(|| Error::Parse {
            line: 1,
            message: "CONTROL file has no paragraphs".to_string(),
        })?;

        let core_paragraph = SourceParagraph {
            name: core.require("Source", core_line)?.to_string(),
            version: core.require("Version", core_line)?.to_string(),
            description: core.get("Description").unwrap_or_default().to_string(),
            depends: parse_depends_field(core.get("Build-Depends").unwrap_or_default())?,
        };

        let mut feature_paragraphs = Vec::new();
        for (paragraph, line) in iter {
            let name = paragraph.require("Feature", line)?.to_string();
            if name == "core" || name == "*" {
                return Err(Error::Parse {
                    line,
                    message: format!("'{name}' is a reserved feature name"),
                });
            }
            feature_paragraphs.push(FeatureParagraph {
                name,
                description: paragraph.get("Description").unwrap_or_default().to_string(),
                depends: parse_depends_field(paragraph.get("Build-Depends").unwrap_or_default())?,
            });
        }

        Ok(Self {
            core_paragraph,
            feature_paragraphs,
        })
    }

    /// Look up a feature paragraph by name
    pub fn find_feature(&self, name: &str) -> Option<&FeatureParagraph> {
        self.feature_paragraphs.iter().find(|f| f.name == name)
    }
}

/// One paragraph of a cached binary package's CONTROL file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryParagraph {
    pub spec: PackageSpec,
    pub version: String,
    /// Feature this paragraph describes ("" = core)
    pub feature: String,
    pub description: String,
    /// Flattened dependency names, resolved against the package's triplet
    pub depends: Vec<String>,
}

impl BinaryParagraph {
    fn from_paragraph(paragraph: &Paragraph, line: usize) -> Result<Self> {
        let name = paragraph.require("Package", line)?;
        let triplet = Triplet::new(paragraph.require("Architecture", line)?)?;
        Ok(Self {
            spec: PackageSpec::new(name, triplet),
            version: paragraph.get("Version").unwrap_or_default().to_string(),
            feature: paragraph.get("Feature").unwrap_or_default().to_string(),
            description: paragraph.get("Description").unwrap_or_default().to_string(),
            depends: parse_comma_list(paragraph.get("Depends").unwrap_or_default()),
        })
    }
}

/// Parsed metadata of a cached binary package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryControlFile {
    pub core_paragraph: BinaryParagraph,
    pub features: Vec<BinaryParagraph>,
}

impl BinaryControlFile {
    /// Parse a cached package's CONTROL file
    pub fn parse(text: &str) -> Result<Self> {
        let paragraphs = parse_paragraphs(text)?;
        let mut iter = paragraphs.into_iter();

        let (core, core_line) = iter.next().ok_or_else(|| Error::Parse {
            line: 1,
            message: "binary CONTROL file has no paragraphs".to_string(),
        })?;
        let core_paragraph = BinaryParagraph::from_paragraph(&core, core_line)?;

        let mut features = Vec::new();
        for (paragraph, line) in iter {
            features.push(BinaryParagraph::from_paragraph(&paragraph, line)?);
        }

        Ok(Self {
            core_paragraph,
            features,
        })
    }

    /// All dependency names of the core paragraph and every feature
    pub fn flattened_depends(&self) -> Vec<String> {
        let mut depends: Vec<String> = self
            .features
            .iter()
            .flat_map(|f| f.depends.iter().cloned())
            .collect();
        depends.extend(self.core_paragraph.depends.iter().cloned());
        depends
    }
}
