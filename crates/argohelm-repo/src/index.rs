//! Helm repository index (`index.yaml`)

use semver::{Version, VersionReq};
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{RepoError, Result};

/// Repository index
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryIndex {
    #[serde(default)]
    pub api_version: Option<String>,

    /// Charts indexed by name
    #[serde(default)]
    pub entries: HashMap<String, Vec<ChartEntry>>,
}

impl RepositoryIndex {
    /// Parse index from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| RepoError::IndexParseError {
            message: e.to_string(),
        })
    }

    /// Parse index from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let yaml = std::str::from_utf8(bytes).map_err(|e| RepoError::IndexParseError {
            message: format!("Invalid UTF-8: {}", e),
        })?;
        Self::from_yaml(yaml)
    }

    /// Get a specific version of a chart
    pub fn get_version(&self, name: &str, version: &str) -> Option<&ChartEntry> {
        self.entries
            .get(name)?
            .iter()
            .find(|e| e.version.strip_prefix('v').unwrap_or(&e.version) == version)
    }

    /// Find the highest version matching a constraint
    pub fn find_best_match(&self, name: &str, constraint: &str) -> Result<&ChartEntry> {
        let entries = self.entries.get(name).ok_or_else(|| RepoError::ChartNotFound {
            name: name.to_string(),
            repo: "index".to_string(),
        })?;

        let req = VersionReq::parse(constraint).map_err(|e| RepoError::UnsatisfiableConstraint {
            name: name.to_string(),
            constraint: constraint.to_string(),
            available: e.to_string(),
        })?;

        entries
            .iter()
            .filter(|e| e.parsed_version().is_some_and(|v| req.matches(&v)))
            .max_by(|a, b| compare_versions(a, b))
            .ok_or_else(|| RepoError::UnsatisfiableConstraint {
                name: name.to_string(),
                constraint: constraint.to_string(),
                available: entries
                    .iter()
                    .map(|e| e.version.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Pick the entry for a requested version
    ///
    /// An exact version is looked up as-is; anything that is not a plain
    /// version but parses as a constraint (`^1.2`, `>=1.0, <2`, `1.x`)
    /// selects the highest matching entry.
    pub fn resolve(&self, name: &str, version: &str, repo: &str) -> Result<&ChartEntry> {
        if let Some(entry) = self.get_version(name, version) {
            return Ok(entry);
        }

        if !self.entries.contains_key(name) {
            return Err(RepoError::ChartNotFound {
                name: name.to_string(),
                repo: repo.to_string(),
            });
        }

        if is_constraint(version) {
            tracing::debug!("Resolving {} against constraint '{}'", name, version);
            return self.find_best_match(name, version);
        }

        Err(RepoError::VersionNotFound {
            name: name.to_string(),
            version: version.to_string(),
            repo: repo.to_string(),
        })
    }
}

/// Chart entry in the index
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartEntry {
    pub name: String,

    /// Chart version (semver)
    pub version: String,

    /// URLs to download the chart archive
    #[serde(default)]
    pub urls: Vec<String>,

    /// SHA256 digest of the archive
    #[serde(default)]
    pub digest: Option<String>,
}

impl ChartEntry {
    /// Get the primary download URL
    pub fn download_url(&self) -> Option<&str> {
        self.urls.first().map(|s| s.as_str())
    }

    /// Parse version as semver
    pub fn parsed_version(&self) -> Option<Version> {
        Version::parse(self.version.strip_prefix('v').unwrap_or(&self.version)).ok()
    }
}

fn compare_versions(a: &ChartEntry, b: &ChartEntry) -> Ordering {
    match (a.parsed_version(), b.parsed_version()) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.version.cmp(&b.version),
    }
}

fn is_constraint(version: &str) -> bool {
    Version::parse(version).is_err() && VersionReq::parse(version).is_ok()
}
