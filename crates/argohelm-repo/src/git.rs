//! Charts living at a path inside a Git repository

use argohelm_core::Git;
use std::path::{Path, PathBuf};

use crate::cache::ChartCache;
use crate::error::{RepoError, Result};

/// Clone or reuse the checkout for `repo_url` and move it to `revision`
///
/// Returns the checkout directory.
pub fn checkout(git: &Git, cache: &ChartCache, repo_url: &str, revision: &str) -> Result<PathBuf> {
    let repo_path = cache.git_checkout_dir(repo_url);

    if repo_path.exists() {
        tracing::debug!("Using cached repository at {}", repo_path.display());
    } else {
        tracing::debug!("Cloning repository from {} to {}", repo_url, repo_path.display());
        if let Some(parent) = repo_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        git.clone_repo(repo_url, &repo_path)?;
    }

    if !revision.is_empty() {
        tracing::debug!("Checking out {} in {}", revision, repo_path.display());
        git.checkout(&repo_path, revision)?;
    }

    Ok(repo_path)
}

/// Replace the chart directory with a link to `<repo_path>/<chart_path>`
///
/// The link is named after the last component of `chart_path`.
pub fn link_chart(repo_path: &Path, chart_path: &str, cache: &ChartCache) -> Result<PathBuf> {
    cache.reset()?;

    let source = std::path::absolute(repo_path.join(chart_path))?;
    if !source.exists() {
        return Err(RepoError::ChartPathNotFound { path: source });
    }

    let link = cache.chart_dir().join(source.file_name().unwrap_or(source.as_os_str()));
    tracing::debug!("Creating symlink from {} to {}", link.display(), source.display());
    symlink_dir(&source, &link)?;

    Ok(link)
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}
