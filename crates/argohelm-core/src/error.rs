//! Core error types
//!
//! Each stage of the pipeline has its own error type so callers can tell a
//! malformed document from an inconsistent one, and both from a reference
//! that cannot be resolved on this machine. [`CoreError`] wraps them all for
//! callers that just want to propagate.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// The document is not shaped like an Application at all
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("Invalid application.yaml: document must be a mapping")]
    #[diagnostic(code(argohelm::structure::not_a_mapping))]
    NotAMapping,

    #[error("Invalid application.yaml: missing 'sources' or 'source' in spec")]
    #[diagnostic(
        code(argohelm::structure::missing_sources),
        help("declare the chart under spec.sources (list) or spec.source (mapping)")
    )]
    MissingSources,

    #[error("Invalid application.yaml: 'sources' must be a list")]
    #[diagnostic(code(argohelm::structure::sources_not_a_list))]
    SourcesNotASequence,

    #[error("Invalid application.yaml: 'source' must be a mapping")]
    #[diagnostic(code(argohelm::structure::source_not_a_mapping))]
    SourceNotAMapping,

    #[error("Invalid application.yaml: sources[{index}] must be a mapping")]
    #[diagnostic(code(argohelm::structure::source_entry))]
    SourceEntryNotAMapping { index: usize },

    #[error("Invalid application.yaml: sources[{index}].helm is invalid: {message}")]
    #[diagnostic(code(argohelm::structure::helm))]
    InvalidHelmConfig { index: usize, message: String },
}

/// The document is well formed but semantically inconsistent
///
/// Validation is fail-fast: only the first violation is ever reported.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid resource kind: 'Application' expected, got '{found}'")]
    #[diagnostic(code(argohelm::validation::kind))]
    InvalidKind { found: String },

    #[error("Duplicate ref sources found: {}", .names.join(", "))]
    #[diagnostic(
        code(argohelm::validation::duplicate_ref),
        help("every source declaring 'ref' needs a unique name")
    )]
    DuplicateRefs { names: Vec<String> },

    #[error(
        "Source {index} is invalid: must be either a Helm chart (with 'chart' or 'path'+'helm') \
         or a reference source (with 'ref')"
    )]
    #[diagnostic(code(argohelm::validation::source_shape))]
    InvalidSource { index: usize },

    #[error("Application does not use Helm: no Helm chart source found")]
    #[diagnostic(code(argohelm::validation::no_chart))]
    NoChartSource,

    #[error(
        "Multiple Helm charts found: sources {indices:?} define Helm charts. \
         Only one Helm chart per application is supported."
    )]
    #[diagnostic(code(argohelm::validation::multiple_charts))]
    MultipleChartSources { indices: Vec<usize> },

    #[error("valueFile '{entry}' must use ref prefix (e.g., $ref_name/path) when ref sources are defined")]
    #[diagnostic(code(argohelm::validation::missing_ref_prefix))]
    MissingRefPrefix { entry: String },

    #[error("valueFile '{entry}': ref/path expected but not found")]
    #[diagnostic(code(argohelm::validation::malformed_ref))]
    MalformedRef { entry: String },

    #[error(
        "valueFile '{entry}' references undefined ref '{name}'. Available refs: {}",
        .available.join(", ")
    )]
    #[diagnostic(code(argohelm::validation::undefined_ref))]
    UndefinedRef {
        entry: String,
        name: String,
        available: Vec<String>,
    },
}

/// Reference or value-file resolution failed
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error(
        "Multiple ref sources found ({}) but no --ref-map provided",
        .names.join(", ")
    )]
    #[diagnostic(
        code(argohelm::resolve::ambiguous),
        help("map each ref to a local path, e.g. --ref-map values=/path/to/values --ref-map other=/path/to/other")
    )]
    AmbiguousReference { names: Vec<String> },

    #[error("Working directory {} is not in a git repository: {reason}", .workdir.display())]
    #[diagnostic(
        code(argohelm::resolve::not_tracked),
        help("run inside a git checkout or map the ref explicitly with --ref-map")
    )]
    NotAVersionControlledTree { workdir: PathBuf, reason: String },

    #[error("valueFile '{entry}' should start with a ref prefix ($name/path)")]
    #[diagnostic(code(argohelm::resolve::malformed))]
    MalformedReference { entry: String },

    #[error("Ref '{name}' in valueFile '{entry}' not found in mapping")]
    #[diagnostic(code(argohelm::resolve::unmapped))]
    UnmappedReference { name: String, entry: String },
}

/// The argument builder could not complete
///
/// Resolver-internal distinctions are collapsed here; the cause stays
/// reachable through [`std::error::Error::source`].
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum ArgsError {
    #[error("Could not resolve references: {0}")]
    #[diagnostic(code(argohelm::args::unresolved))]
    UnresolvedReferences(#[source] ResolveError),
}

/// A git invocation failed
#[derive(Error, Debug, Diagnostic)]
pub enum VcsError {
    #[error("{} is not inside a git working tree", .path.display())]
    #[diagnostic(code(argohelm::vcs::not_tracked))]
    NotTracked { path: PathBuf },

    #[error("Failed to run `{command}`: {source}")]
    #[diagnostic(code(argohelm::vcs::spawn), help("is git installed and on PATH?"))]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed: {stderr}")]
    #[diagnostic(code(argohelm::vcs::command))]
    CommandFailed { command: String, stderr: String },
}

/// Umbrella error for the core crate
#[derive(Error, Debug, Diagnostic)]
pub enum CoreError {
    #[error("Failed to read {}: {source}", .path.display())]
    #[diagnostic(code(argohelm::io))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", .path.display())]
    #[diagnostic(code(argohelm::yaml))]
    Yaml { path: PathBuf, message: String },

    #[error("Invalid YAML: {message}")]
    #[diagnostic(code(argohelm::yaml))]
    InvalidYaml { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Args(#[from] ArgsError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Vcs(#[from] VcsError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
