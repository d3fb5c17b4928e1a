//! Chart fetching entry point

use argohelm_core::{ChartKind, ChartSpec, Git};
use std::path::PathBuf;

use crate::cache::ChartCache;
use crate::error::{RepoError, Result};
use crate::git;
use crate::http::HttpRepository;
use crate::oci::OciRegistry;

/// Fetches a chart into the local cache and returns its directory
pub struct ChartFetcher {
    cache: ChartCache,
    git: Git,
}

impl ChartFetcher {
    pub fn new(cache: ChartCache, git: Git) -> Self {
        Self { cache, git }
    }

    /// Make the chart described by `spec` available locally
    ///
    /// Helm charts already present at the requested version are reused;
    /// anything else wipes the chart directory first.
    pub async fn fetch(&self, spec: &ChartSpec) -> Result<PathBuf> {
        if spec.name.is_empty() {
            return Err(RepoError::MissingField {
                field: if spec.kind == ChartKind::Git { "path" } else { "chart" },
            });
        }

        let chart_path = self.cache.chart_path(spec);
        if self.cache.is_current(spec) {
            tracing::debug!(
                "Chart {}:{} already exists in {}",
                spec.name,
                spec.version,
                self.cache.chart_dir().display()
            );
            return Ok(chart_path);
        }

        match spec.kind {
            ChartKind::HelmRepo => {
                tracing::debug!("Downloading chart {}:{}...", spec.name, spec.version);
                self.cache.reset()?;
                HttpRepository::new(&spec.repo_url)?
                    .download_to(&spec.name, &spec.version, self.cache.chart_dir())
                    .await?;
            }
            ChartKind::HelmOci => {
                tracing::debug!("Pulling chart {}:{}...", spec.name, spec.version);
                self.cache.reset()?;
                OciRegistry::new(&spec.repo_url)
                    .pull_to(&spec.name, &spec.version, self.cache.chart_dir())
                    .await?;
            }
            ChartKind::Git => {
                tracing::debug!(
                    "Fetching chart {} from Git revision {}...",
                    spec.name,
                    spec.version
                );
                let vcs = self.git.clone();
                let cache = self.cache.clone();
                let spec = spec.clone();
                return tokio::task::spawn_blocking(move || {
                    let repo_path = git::checkout(&vcs, &cache, &spec.repo_url, &spec.version)?;
                    git::link_chart(&repo_path, &spec.name, &cache)
                })
                .await
                .map_err(|e| RepoError::Io(std::io::Error::other(e)))?;
            }
        }

        if !chart_path.join("Chart.yaml").is_file() {
            return Err(RepoError::ChartPathNotFound { path: chart_path });
        }
        Ok(chart_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::chart_archive;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn spec(repo_url: &str) -> ChartSpec {
        ChartSpec {
            kind: ChartKind::HelmRepo,
            repo_url: repo_url.to_string(),
            name: "karpenter".to_string(),
            version: "0.37.0".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_then_reuse() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.yaml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "entries:\n  karpenter:\n    - name: karpenter\n      version: 0.37.0\n      urls: [karpenter-0.37.0.tgz]\n",
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/karpenter-0.37.0.tgz"))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(chart_archive("karpenter", "0.37.0")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let work = tempfile::tempdir().unwrap();
        let fetcher = ChartFetcher::new(ChartCache::in_workdir(work.path()), Git::default());
        let spec = spec(&server.uri());

        let first = fetcher.fetch(&spec).await.unwrap();
        assert_eq!(first, work.path().join(".chart/karpenter"));

        // Second fetch hits the cache; the mocks verify a single download
        let second = fetcher.fetch(&spec).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_chart_name() {
        let work = tempfile::tempdir().unwrap();
        let fetcher = ChartFetcher::new(ChartCache::in_workdir(work.path()), Git::default());
        let mut spec = spec("https://charts.example.com");
        spec.name.clear();

        let err = fetcher.fetch(&spec).await.unwrap_err();
        assert!(matches!(err, RepoError::MissingField { field: "chart" }));
    }
}
