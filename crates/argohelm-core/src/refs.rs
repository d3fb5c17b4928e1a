//! Reference mapping: reference-source name -> local path

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use crate::error::ResolveError;
use crate::vcs::WorktreeLocator;

/// Reference-source name -> repository URL, in declaration order
pub type RefSources = IndexMap<String, String>;

/// Reference-source name -> local directory standing in for that source
pub type RefMapping = IndexMap<String, PathBuf>;

/// Builds the [`RefMapping`] for one render
///
/// With no explicit override, a single reference source is taken to mean
/// the project's own repository: it maps to the working-tree root
/// containing `workdir`. Several reference sources have no such default and
/// need an override.
#[derive(Debug, Clone, Default)]
pub struct RefResolver<L> {
    locator: L,
}

impl<L: WorktreeLocator> RefResolver<L> {
    pub fn new(locator: L) -> Self {
        Self { locator }
    }

    /// Produce the mapping used to resolve `$name/...` value files
    ///
    /// Override entries are taken verbatim, including names that no source
    /// declares; only referenced names are ever looked up.
    pub fn resolve(
        &self,
        ref_sources: &RefSources,
        workdir: &Path,
        overrides: &RefMapping,
    ) -> Result<RefMapping, ResolveError> {
        if ref_sources.is_empty() {
            return Ok(RefMapping::new());
        }

        if !overrides.is_empty() {
            for (name, path) in overrides {
                tracing::debug!("Ref mapping override: {} -> {}", name, path.display());
            }
            return Ok(overrides.clone());
        }

        let name = match ref_sources.keys().collect::<Vec<_>>().as_slice() {
            [only] => (*only).clone(),
            names => {
                return Err(ResolveError::AmbiguousReference {
                    names: names.iter().map(|n| n.to_string()).collect(),
                });
            }
        };

        let root = self.locator.worktree_root(workdir).map_err(|e| {
            ResolveError::NotAVersionControlledTree {
                workdir: workdir.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        tracing::debug!("Ref mapping: {} -> {}", name, root.display());
        Ok(RefMapping::from([(name, root)]))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::VcsError;
    use std::cell::Cell;

    /// Locator answering with a fixed root, counting lookups
    #[derive(Debug, Default)]
    pub(crate) struct FixedRoot {
        pub root: Option<PathBuf>,
        pub lookups: Cell<usize>,
    }

    impl FixedRoot {
        pub(crate) fn at(root: &str) -> Self {
            Self {
                root: Some(PathBuf::from(root)),
                lookups: Cell::new(0),
            }
        }

        pub(crate) fn untracked() -> Self {
            Self::default()
        }
    }

    impl WorktreeLocator for FixedRoot {
        fn worktree_root(&self, dir: &Path) -> Result<PathBuf, VcsError> {
            self.lookups.set(self.lookups.get() + 1);
            self.root.clone().ok_or_else(|| VcsError::NotTracked {
                path: dir.to_path_buf(),
            })
        }
    }

    fn sources(pairs: &[(&str, &str)]) -> RefSources {
        pairs
            .iter()
            .map(|(n, u)| (n.to_string(), u.to_string()))
            .collect()
    }

    #[test]
    fn test_no_ref_sources_ignores_override() {
        let locator = FixedRoot::at("/repo");
        let resolver = RefResolver::new(&locator);
        let overrides = RefMapping::from([("values".to_string(), PathBuf::from("/tmp"))]);

        let mapping = resolver
            .resolve(&RefSources::new(), Path::new("/work"), &overrides)
            .unwrap();

        assert!(mapping.is_empty());
        assert_eq!(locator.lookups.get(), 0);
    }

    #[test]
    fn test_single_ref_maps_to_worktree_root() {
        let locator = FixedRoot::at("/repo");
        let resolver = RefResolver::new(&locator);

        let mapping = resolver
            .resolve(
                &sources(&[("values", "https://github.com/org/values-repo")]),
                Path::new("/repo/apps/karpenter"),
                &RefMapping::new(),
            )
            .unwrap();

        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping["values"], PathBuf::from("/repo"));
        assert_eq!(locator.lookups.get(), 1);
    }

    #[test]
    fn test_override_used_verbatim() {
        let locator = FixedRoot::untracked();
        let resolver = RefResolver::new(&locator);
        let overrides = RefMapping::from([
            ("values".to_string(), PathBuf::from("/tmp/values")),
            ("unused".to_string(), PathBuf::from("/tmp/unused")),
        ]);

        let mapping = resolver
            .resolve(
                &sources(&[("values", "https://github.com/org/values-repo")]),
                Path::new("/work"),
                &overrides,
            )
            .unwrap();

        assert_eq!(mapping, overrides);
        assert_eq!(locator.lookups.get(), 0);
    }

    #[test]
    fn test_multiple_refs_without_override_are_ambiguous() {
        let locator = FixedRoot::at("/repo");
        let resolver = RefResolver::new(&locator);

        let err = resolver
            .resolve(
                &sources(&[
                    ("values", "https://github.com/org/values-repo"),
                    ("other", "https://github.com/org/other-repo"),
                ]),
                Path::new("/work"),
                &RefMapping::new(),
            )
            .unwrap_err();

        assert_eq!(
            err,
            ResolveError::AmbiguousReference {
                names: vec!["values".to_string(), "other".to_string()]
            }
        );
        let message = err.to_string();
        assert!(message.contains("Multiple ref sources"));
        assert!(message.contains("values, other"));
    }

    #[test]
    fn test_untracked_workdir() {
        let resolver = RefResolver::new(FixedRoot::untracked());

        let err = resolver
            .resolve(
                &sources(&[("values", "https://github.com/org/values-repo")]),
                Path::new("/tmp/scratch"),
                &RefMapping::new(),
            )
            .unwrap_err();

        assert!(matches!(err, ResolveError::NotAVersionControlledTree { .. }));
        assert!(err.to_string().contains("git repository"));
    }
}
