//! Engine error types

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Main engine error type
#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    #[error("Failed to run {}: {source}", .program.display())]
    #[diagnostic(
        code(argohelm::engine::spawn),
        help("install helm or point --helm-bin at it")
    )]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Helm template execution failed with exit code {}:\n{stderr}", .code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    #[diagnostic(code(argohelm::engine::template))]
    TemplateFailed { code: Option<i32>, stderr: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(argohelm::engine::io))]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    #[diagnostic(code(argohelm::engine::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
