//! argohelm core - ArgoCD Application model and reference resolution
//!
//! This crate turns an ArgoCD Application document into the argument list
//! for `helm template`:
//! - `Application`: validated, read-only view of the document
//! - `RefResolver`: maps reference-source names to local directories
//! - `value_files`: rewrites `$name/path` entries into concrete paths
//! - `HelmArgs`: composes the final argument list
//! - `Git`: the git command line, used to find the working-tree root

pub mod application;
pub mod args;
pub mod error;
pub mod refs;
pub mod value_files;
pub mod vcs;

pub use application::{Application, ChartKind, ChartSpec, HelmConfig, Source, SourceKind};
pub use args::HelmArgs;
pub use error::{
    ArgsError, CoreError, ResolveError, Result, StructureError, ValidationError, VcsError,
};
pub use refs::{RefMapping, RefResolver, RefSources};
pub use value_files::ValueFileRef;
pub use vcs::{Git, WorktreeLocator};
