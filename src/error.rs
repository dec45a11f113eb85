// src/error.rs

//! Error types for the caravel planning core

use thiserror::Error;

/// Errors that can occur while computing or rendering an installation plan
#[derive(Error, Debug)]
pub enum Error {
    /// A requested or depended-upon feature is not declared by the port
    #[error("package {spec} does not declare feature '{feature}'")]
    FeatureNotFound { spec: String, feature: String },

    /// No port definition and no installed record exists for a package
    #[error("could not find package {0}")]
    NoSuchPackage(String),

    /// A transitive build dependency could not be satisfied
    #[error("unable to satisfy dependency {dependency} of {dependent}")]
    UnsatisfiableDependency { dependency: String, dependent: String },

    /// A package must be rebuilt but its port definition is gone
    #[error("cannot rebuild {0}: its port definition is no longer available")]
    MissingPort(String),

    /// The dependency graph contains a cycle
    #[error("circular dependency detected involving {0}")]
    CircularDependency(String),

    /// The plan removes packages but the caller did not pass --recurse
    #[error("the plan requires removing packages; re-run with --recurse")]
    NonRecursiveRemoves,

    /// A spec-only plan turned out to need feature packages
    #[error("the installation plan for {0} requires feature packages support")]
    FeaturePackagesRequired(String),

    /// A package or feature reference could not be parsed
    #[error("invalid package specifier '{input}': {reason}")]
    InvalidSpec { input: String, reason: String },

    /// A control or status paragraph could not be parsed
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for caravel operations
pub type Result<T> = std::result::Result<T, Error>;
