//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use miette::Diagnostic;
use specrepo_repo::RepoError;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// The running tool is outside a repository's declared range
    #[error("{message}")]
    #[diagnostic(code(specrepo::cli::incompatible))]
    Incompatible {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Repository state prevents the operation
    #[error("{message}")]
    #[diagnostic(code(specrepo::cli::repository))]
    Repository {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Unknown repository or package
    #[error("{message}")]
    #[diagnostic(code(specrepo::cli::not_found))]
    NotFound {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Settings file or directory resolution failed
    #[error("Configuration error: {message}")]
    #[diagnostic(code(specrepo::cli::config))]
    Config { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(specrepo::cli::io))]
    Io { message: String },

    /// Internal error (unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(specrepo::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Incompatible { .. } => exit_codes::INCOMPATIBLE,
            CliError::Repository { .. } => exit_codes::REPOSITORY_ERROR,
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a not-found error with help text
    pub fn not_found(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<RepoError> for CliError {
    fn from(err: RepoError) -> Self {
        let message = err.to_string();
        match err {
            RepoError::UpdateRejected { source, .. } => CliError::from(*source),
            RepoError::IncompatibleRepository { .. } => CliError::Incompatible {
                message,
                help: Some(
                    "Install a specrepo release within the repository's supported range"
                        .to_string(),
                ),
            },
            RepoError::MalformedMetadata { name, path } => CliError::Repository {
                message,
                help: Some(format!(
                    "Resolve the conflict markers in {}, or reset the `{}` repository to its upstream",
                    path, name
                )),
            },
            RepoError::MasterRepositoryUnavailable { path, .. } => CliError::Repository {
                message,
                help: Some(format!(
                    "Clone a spec repository into {}, or point --repos-dir at an existing repositories directory",
                    path
                )),
            },
            RepoError::RepositoryNotFound { .. } => CliError::NotFound {
                message,
                help: Some(
                    "Run `specrepo repo list` to see the available repositories".to_string(),
                ),
            },
            RepoError::InvalidConfig { message } => CliError::Config { message },
            RepoError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            _ => CliError::Repository {
                message,
                help: None,
            },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
