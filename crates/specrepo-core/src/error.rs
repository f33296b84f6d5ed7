//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Specification not found: {path}")]
    SpecNotFound { path: String },

    #[error("Invalid specification {path}: {message}")]
    InvalidSpec { path: String, message: String },

    #[error("Invalid package name '{name}': must be a single path segment")]
    InvalidPackageName { name: String },

    #[error("Failed to parse specification: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid version '{input}': {source}")]
    InvalidVersion {
        input: String,
        #[source]
        source: semver::Error,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
