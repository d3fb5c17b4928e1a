//! HTTP repository implementation
//!
//! Supports traditional Helm repositories serving an `index.yaml`.

use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::archive::extract_chart_archive;
use crate::cache::repo_name_from_url;
use crate::error::{RepoError, Result};
use crate::index::{ChartEntry, RepositoryIndex};

/// Timeout applied to every repository request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP repository client
pub struct HttpRepository {
    url: String,
    name: String,
    client: reqwest::Client,
}

impl HttpRepository {
    /// Create a client for the repository at `url`
    pub fn new(url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("argohelm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RepoError::NetworkError {
                message: e.to_string(),
            })?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            name: repo_name_from_url(url),
            client,
        })
    }

    /// Repository name derived from the URL
    pub fn name(&self) -> &str {
        &self.name
    }

    fn index_url(&self) -> String {
        format!("{}/index.yaml", self.url)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await.map_err(|e| RepoError::NetworkError {
            message: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }

    /// Fetch the repository index
    pub async fn fetch_index(&self) -> Result<RepositoryIndex> {
        let data = self.get_bytes(&self.index_url()).await?;
        RepositoryIndex::from_bytes(&data)
    }

    /// Resolve a possibly relative download URL against the repository
    pub fn resolve_url(&self, url: &str) -> Result<String> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Ok(url.to_string());
        }

        let base = Url::parse(&format!("{}/", self.url)).map_err(|e| {
            RepoError::InvalidRepositoryUrl {
                url: self.url.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(base.join(url)?.to_string())
    }

    /// Download a chart archive, verifying its digest when the index has one
    pub async fn download(&self, entry: &ChartEntry) -> Result<Vec<u8>> {
        let url = entry.download_url().ok_or_else(|| RepoError::ChartNotFound {
            name: entry.name.clone(),
            repo: self.name.clone(),
        })?;

        let data = self.get_bytes(&self.resolve_url(url)?).await?;

        if let Some(expected_digest) = &entry.digest {
            let actual_digest = compute_digest(&data);
            if !digest_matches(expected_digest, &actual_digest) {
                return Err(RepoError::IntegrityCheckFailed {
                    name: entry.name.clone(),
                    expected: expected_digest.clone(),
                    actual: actual_digest,
                });
            }
        }

        Ok(data)
    }

    /// Download `name` at `version` and extract it under `dest`
    pub async fn download_to(&self, name: &str, version: &str, dest: &Path) -> Result<()> {
        let index = self.fetch_index().await?;
        let entry = index.resolve(name, version, &self.name)?;
        tracing::debug!("Downloading chart {}:{} from {}", name, entry.version, self.url);

        let data = self.download(entry).await?;
        extract_chart_archive(&data, dest)
    }
}

/// Compute SHA256 digest of data
fn compute_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Check if two digests match (with or without the `sha256:` prefix)
fn digest_matches(expected: &str, actual: &str) -> bool {
    let normalize = |d: &str| {
        d.trim()
            .to_lowercase()
            .replace("sha256:", "")
            .replace("sha256-", "")
    };
    normalize(expected) == normalize(actual)
}
