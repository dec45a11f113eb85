// src/triplet.rs

//! Target triplet identifiers
//!
//! A triplet names a target platform (architecture, OS, linkage), e.g.
//! `x64-linux` or `x86-windows-static`. Packages built for different
//! triplets live in disjoint dependency universes: the planner never draws
//! an edge between ports of different triplets.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A target platform identifier
///
/// Triplet names are case-insensitive and stored in canonical (lowercase)
/// form, so `X64-Linux` and `x64-linux` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triplet {
    canonical_name: String,
}

impl Triplet {
    /// Parse and canonicalize a triplet name
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::InvalidSpec {
                input: name.to_string(),
                reason: "triplet name is empty".to_string(),
            });
        }

        let valid = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.';
        if !name.chars().all(valid) {
            return Err(Error::InvalidSpec {
                input: name.to_string(),
                reason: "triplet names may only contain alphanumerics, '-', '_' and '.'"
                    .to_string(),
            });
        }

        Ok(Self {
            canonical_name: name.to_ascii_lowercase(),
        })
    }

    /// The canonical (lowercase) name
    pub fn canonical_name(&self) -> &str {
        &self.canonical_name
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name)
    }
}

impl FromStr for Triplet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
