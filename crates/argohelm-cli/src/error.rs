//! CLI error types with exit code handling
//!
//! Library errors are folded into one of a handful of categories, each
//! with its own exit code. The library's help text, when it has one, is
//! carried over.

use argohelm_core::{ArgsError, CoreError, VcsError};
use argohelm_engine::EngineError;
use argohelm_repo::RepoError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// The application document or its references are invalid
    #[error("{message}")]
    #[diagnostic(code(argohelm::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// `helm template` failed
    #[error("{message}")]
    #[diagnostic(code(argohelm::cli::template))]
    Template {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Chart download, checkout or lookup failed
    #[error("Chart error: {message}")]
    #[diagnostic(code(argohelm::cli::chart))]
    Chart {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(argohelm::cli::io))]
    Io { message: String },

    /// Anything else, already formatted
    #[error("{message}")]
    #[diagnostic(code(argohelm::cli::error))]
    Other {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Template { .. } => exit_codes::TEMPLATE_ERROR,
            CliError::Chart { .. } => exit_codes::CHART_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: None,
        }
    }

    /// Create a general error with help text
    pub fn other_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// IO error annotated with what was being done
    pub fn io(context: impl std::fmt::Display, err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{}: {}", context, err),
        }
    }
}

fn help_of(diagnostic: &dyn Diagnostic) -> Option<String> {
    diagnostic.help().map(|h| h.to_string())
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Read { .. } => CliError::Io {
                message: err.to_string(),
            },
            CoreError::Vcs(e) => e.into(),
            CoreError::Args(e) => e.into(),
            _ => CliError::Validation {
                help: help_of(&err),
                message: err.to_string(),
            },
        }
    }
}

impl From<ArgsError> for CliError {
    fn from(err: ArgsError) -> Self {
        let ArgsError::UnresolvedReferences(cause) = &err;
        CliError::Validation {
            help: help_of(cause),
            message: err.to_string(),
        }
    }
}

impl From<VcsError> for CliError {
    fn from(err: VcsError) -> Self {
        CliError::Other {
            help: help_of(&err),
            message: err.to_string(),
        }
    }
}

impl From<RepoError> for CliError {
    fn from(err: RepoError) -> Self {
        let help = match &err {
            RepoError::VersionNotFound { .. } | RepoError::UnsatisfiableConstraint { .. } => {
                Some("check targetRevision against the versions the repository publishes".to_string())
            }
            RepoError::Git(e) => help_of(e),
            _ => None,
        };
        CliError::Chart {
            message: err.to_string(),
            help,
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Io(e) => e.into(),
            _ => CliError::Template {
                help: help_of(&err),
                message: err.to_string(),
            },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
