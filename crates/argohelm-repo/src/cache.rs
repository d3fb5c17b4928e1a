//! On-disk chart cache layout
//!
//! ```text
//! <workdir>/
//!   .chart/<chart>/Chart.yaml       extracted Helm chart
//!   .chart/<basename(path)> -> ...  symlink into a Git checkout
//!   .chart_repo/<repo-name>/        Git checkout
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use argohelm_core::{ChartKind, ChartSpec};

use crate::error::Result;

/// Default chart directory name under the working directory
pub const CHART_DIR: &str = ".chart";

/// Git checkout cache directory name under the working directory
pub const GIT_CACHE_DIR: &str = ".chart_repo";

/// Directory-safe name for a repository URL
///
/// `https://prometheus-community.github.io/helm-charts` becomes
/// `prometheus-community.github.io-helm-charts`; a local path such as
/// `/srv/git/charts` becomes `srv-git-charts`.
pub fn repo_name_from_url(url: &str) -> String {
    let bare = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    bare.replace('/', "-").trim_matches('-').to_string()
}

#[derive(Debug, Deserialize)]
struct ChartMetadata {
    #[serde(default)]
    version: Option<String>,
}

/// Paths of the chart and Git caches for one working directory
#[derive(Debug, Clone)]
pub struct ChartCache {
    chart_dir: PathBuf,
    git_dir: PathBuf,
}

impl ChartCache {
    /// Cache rooted at `workdir`, charts under `chart_dir`
    pub fn new(workdir: &Path, chart_dir: impl Into<PathBuf>) -> Self {
        Self {
            chart_dir: chart_dir.into(),
            git_dir: workdir.join(GIT_CACHE_DIR),
        }
    }

    /// Cache with the default `.chart` directory
    pub fn in_workdir(workdir: &Path) -> Self {
        Self::new(workdir, workdir.join(CHART_DIR))
    }

    pub fn chart_dir(&self) -> &Path {
        &self.chart_dir
    }

    /// Where the chart ends up once fetched
    ///
    /// Git charts are linked under the last component of their path.
    pub fn chart_path(&self, spec: &ChartSpec) -> PathBuf {
        match spec.kind {
            ChartKind::Git => {
                let name = Path::new(&spec.name)
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(&spec.name));
                self.chart_dir.join(name)
            }
            ChartKind::HelmRepo | ChartKind::HelmOci => self.chart_dir.join(&spec.name),
        }
    }

    /// Checkout directory for a Git repository
    pub fn git_checkout_dir(&self, repo_url: &str) -> PathBuf {
        self.git_dir.join(repo_name_from_url(repo_url))
    }

    /// Whether the cached chart already matches the requested version
    ///
    /// Git charts are never considered current: the checkout is cheap to
    /// re-link and the revision may be a moving branch.
    pub fn is_current(&self, spec: &ChartSpec) -> bool {
        if spec.kind == ChartKind::Git {
            return false;
        }

        let chart_yaml = self.chart_path(spec).join("Chart.yaml");
        let Ok(content) = std::fs::read_to_string(&chart_yaml) else {
            return false;
        };

        match serde_yaml::from_str::<ChartMetadata>(&content) {
            Ok(meta) => {
                let cached = meta.version.unwrap_or_default();
                cached.strip_prefix('v').unwrap_or(&cached) == spec.version
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable {}: {}", chart_yaml.display(), e);
                false
            }
        }
    }

    /// Empty the chart directory, creating it if needed
    pub fn reset(&self) -> Result<()> {
        if self.chart_dir.exists() {
            tracing::debug!("Removing existing chart directory at {}", self.chart_dir.display());
            std::fs::remove_dir_all(&self.chart_dir)?;
        }
        std::fs::create_dir_all(&self.chart_dir)?;
        Ok(())
    }
}
