//! argohelm chart fetching
//!
//! Makes the chart named by an Application available on disk:
//!
//! - **HTTP repositories**: `index.yaml` lookup, digest-checked download
//! - **OCI registries**: anonymous pull of the Helm content layer
//! - **Git repositories**: cached checkout, chart path linked into place
//!
//! Everything lands under the working directory (see [`cache`]).

pub mod archive;
pub mod cache;
pub mod error;
pub mod fetch;
pub mod git;
pub mod http;
pub mod index;
pub mod oci;

pub use cache::{ChartCache, repo_name_from_url};
pub use error::{RepoError, Result};
pub use fetch::ChartFetcher;
pub use http::HttpRepository;
pub use index::{ChartEntry, RepositoryIndex};
pub use oci::OciRegistry;
