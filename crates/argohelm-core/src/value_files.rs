//! Symbolic value-file references (`$name/relative/path`)

use std::path::{Path, PathBuf};

use crate::error::ResolveError;
use crate::refs::RefMapping;

/// Prefix marking a value file as relative to a named reference source
pub const REF_PREFIX: char = '$';

/// A parsed `$name/relative/path` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueFileRef<'a> {
    /// Reference source name
    pub name: &'a str,
    /// Path relative to the reference source root
    pub path: &'a str,
}

/// Why an entry is not a usable reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefShapeError {
    /// The entry does not start with `$`
    MissingPrefix,
    /// `$` is present but the name or the `/path` part is missing, or the
    /// path is not relative
    Malformed,
}

impl<'a> ValueFileRef<'a> {
    /// Split an entry into reference name and relative path
    ///
    /// Both parts must be non-empty and the path must be relative:
    /// `$values/`, `$/x.yaml` and `$values//etc/x.yaml` are malformed.
    pub fn parse(entry: &'a str) -> Result<Self, RefShapeError> {
        let rest = entry
            .strip_prefix(REF_PREFIX)
            .ok_or(RefShapeError::MissingPrefix)?;

        match rest.split_once('/') {
            Some((name, path))
                if !name.is_empty() && !path.is_empty() && !Path::new(path).has_root() =>
            {
                Ok(Self { name, path })
            }
            _ => Err(RefShapeError::Malformed),
        }
    }
}

/// Resolve every value file against the reference mapping
///
/// Output order follows declaration order, which is also the override
/// precedence `helm template` applies to `-f` files.
pub fn resolve(value_files: &[String], mapping: &RefMapping) -> Result<Vec<PathBuf>, ResolveError> {
    value_files
        .iter()
        .map(|entry| {
            let reference =
                ValueFileRef::parse(entry).map_err(|_| ResolveError::MalformedReference {
                    entry: entry.clone(),
                })?;

            let root = mapping
                .get(reference.name)
                .ok_or_else(|| ResolveError::UnmappedReference {
                    name: reference.name.to_string(),
                    entry: entry.clone(),
                })?;

            let resolved = root.join(reference.path);
            tracing::debug!("Mapped valueFile: {} -> {}", entry, resolved.display());
            Ok(resolved)
        })
        .collect()
}
