//! `helm template` argument construction

use std::path::Path;

use crate::application::Application;
use crate::error::ArgsError;
use crate::refs::{RefMapping, RefResolver};
use crate::value_files;
use crate::vcs::WorktreeLocator;

pub const RELEASE_NAME_FLAG: &str = "--release-name";
pub const SKIP_CRDS_FLAG: &str = "--skip-crds";
pub const VALUES_FLAG: &str = "-f";

/// Builds the argument list handed to `helm template`
///
/// The list is `--release-name <name>`, then `--skip-crds` when requested,
/// then one `-f <path>` pair per value file in declaration order.
#[derive(Debug, Clone)]
pub struct HelmArgs<L> {
    resolver: RefResolver<L>,
}

impl<L: WorktreeLocator> HelmArgs<L> {
    pub fn new(locator: L) -> Self {
        Self {
            resolver: RefResolver::new(locator),
        }
    }

    /// Compute the arguments for an already validated application
    ///
    /// # Panics
    ///
    /// Panics when `app` does not pass [`Application::validate`]; callers
    /// must validate first.
    pub fn build(
        &self,
        app: &Application,
        workdir: &Path,
        overrides: &RefMapping,
    ) -> Result<Vec<String>, ArgsError> {
        assert!(
            app.is_valid(),
            "HelmArgs::build called on an application that failed validation"
        );

        let release_name = match app.helm_release_name() {
            "" => app.name(),
            name => name,
        };
        let mut args = vec![RELEASE_NAME_FLAG.to_string(), release_name.to_string()];

        if app.helm_skip_crds() {
            args.push(SKIP_CRDS_FLAG.to_string());
        }

        let mapping = self
            .resolver
            .resolve(&app.all_ref_sources(), workdir, overrides)
            .map_err(ArgsError::UnresolvedReferences)?;
        let files = value_files::resolve(&app.helm_value_files(), &mapping)
            .map_err(ArgsError::UnresolvedReferences)?;

        for file in files {
            args.push(VALUES_FLAG.to_string());
            args.push(file.to_string_lossy().into_owned());
        }

        tracing::debug!("Helm args: {}", args.join(" "));
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use crate::refs::tests::FixedRoot;
    use std::path::PathBuf;

    fn app(yaml: &str) -> Application {
        let app = Application::from_yaml_str(yaml).unwrap();
        app.validate().unwrap();
        app
    }

    fn build(app: &Application, root: &FixedRoot) -> Result<Vec<String>, ArgsError> {
        HelmArgs::new(root).build(app, Path::new("/repo/apps/demo"), &RefMapping::new())
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_release_name_falls_back_to_app_name() {
        let app = app(r#"
kind: Application
metadata:
  name: demo
spec:
  source:
    repoURL: https://charts.example.com
    chart: demo
    targetRevision: 1.0.0
"#);
        let root = FixedRoot::at("/repo");
        assert_eq!(
            build(&app, &root).unwrap(),
            strings(&["--release-name", "demo"])
        );
        assert_eq!(root.lookups.get(), 0);
    }

    #[test]
    fn test_declared_release_name_wins() {
        let app = app(r#"
kind: Application
metadata:
  name: demo
spec:
  source:
    repoURL: https://charts.example.com
    chart: demo
    helm:
      releaseName: custom
      valueFiles: []
"#);
        assert_eq!(
            build(&app, &FixedRoot::at("/repo")).unwrap(),
            strings(&["--release-name", "custom"])
        );
    }

    #[test]
    fn test_skip_crds_follows_release_name() {
        let app = app(r#"
kind: Application
metadata:
  name: demo
spec:
  sources:
    - repoURL: https://charts.example.com
      chart: demo
      helm:
        skipCrds: true
        valueFiles:
          - $values/demo/values.yaml
    - repoURL: https://github.com/org/values
      ref: values
"#);
        let args = build(&app, &FixedRoot::at("/repo")).unwrap();
        assert_eq!(
            args,
            strings(&[
                "--release-name",
                "demo",
                "--skip-crds",
                "-f",
                "/repo/demo/values.yaml",
            ])
        );
        assert_eq!(args.iter().filter(|a| *a == "--skip-crds").count(), 1);
    }

    #[test]
    fn test_value_files_keep_declaration_order() {
        let app = app(r#"
kind: Application
metadata:
  name: demo
spec:
  sources:
    - repoURL: https://charts.example.com
      chart: demo
      helm:
        valueFiles:
          - $v/one.yaml
          - $v/two.yaml
    - repoURL: https://github.com/org/values
      ref: v
"#);
        let args = build(&app, &FixedRoot::at("/repo")).unwrap();
        assert_eq!(
            &args[2..],
            strings(&["-f", "/repo/one.yaml", "-f", "/repo/two.yaml"]).as_slice()
        );
    }

    #[test]
    fn test_override_mapping() {
        let app = app(r#"
kind: Application
metadata:
  name: demo
spec:
  sources:
    - repoURL: https://charts.example.com
      chart: demo
      helm:
        valueFiles: [$values/a.yaml]
    - repoURL: https://github.com/org/values
      ref: values
"#);
        let root = FixedRoot::untracked();
        let overrides = RefMapping::from([("values".to_string(), PathBuf::from("/tmp/values"))]);
        let args = HelmArgs::new(&root)
            .build(&app, Path::new("/tmp/scratch"), &overrides)
            .unwrap();

        assert_eq!(args[2..], strings(&["-f", "/tmp/values/a.yaml"]));
        assert_eq!(root.lookups.get(), 0);
    }

    #[test]
    fn test_two_refs_without_override_fail() {
        let app = app(r#"
kind: Application
metadata:
  name: demo
spec:
  sources:
    - repoURL: https://charts.example.com
      chart: demo
      helm:
        valueFiles: [$values/a.yaml, $other/b.yaml]
    - repoURL: https://github.com/org/values
      ref: values
    - repoURL: https://github.com/org/other
      ref: other
"#);
        let err = build(&app, &FixedRoot::at("/repo")).unwrap_err();
        let ArgsError::UnresolvedReferences(cause) = &err;
        assert!(matches!(cause, ResolveError::AmbiguousReference { .. }));

        let message = err.to_string();
        assert!(message.contains("values"));
        assert!(message.contains("other"));
    }

    #[test]
    fn test_partial_override_is_unmapped() {
        let app = app(r#"
kind: Application
metadata:
  name: demo
spec:
  sources:
    - repoURL: https://charts.example.com
      chart: demo
      helm:
        valueFiles: [$values/a.yaml, $other/b.yaml]
    - repoURL: https://github.com/org/values
      ref: values
    - repoURL: https://github.com/org/other
      ref: other
"#);
        let overrides = RefMapping::from([("values".to_string(), PathBuf::from("/tmp/values"))]);
        let err = HelmArgs::new(FixedRoot::untracked())
            .build(&app, Path::new("/work"), &overrides)
            .unwrap_err();

        assert_eq!(
            err,
            ArgsError::UnresolvedReferences(ResolveError::UnmappedReference {
                name: "other".to_string(),
                entry: "$other/b.yaml".to_string(),
            })
        );
    }

    #[test]
    fn test_untracked_workdir_is_unresolved() {
        let app = app(r#"
kind: Application
metadata:
  name: demo
spec:
  sources:
    - repoURL: https://charts.example.com
      chart: demo
    - repoURL: https://github.com/org/values
      ref: values
"#);
        let err = build(&app, &FixedRoot::untracked()).unwrap_err();
        assert!(matches!(
            err,
            ArgsError::UnresolvedReferences(ResolveError::NotAVersionControlledTree { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "failed validation")]
    fn test_unvalidated_application_panics() {
        let app = Application::from_yaml_str("kind: Pod\nspec:\n  sources: []\n").unwrap();
        let _ = build(&app, &FixedRoot::at("/repo"));
    }
}
