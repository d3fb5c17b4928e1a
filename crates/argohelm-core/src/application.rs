//! ArgoCD Application model
//!
//! An [`Application`] is built once from a parsed YAML document and is
//! read-only afterwards. The legacy single `spec.source` mapping is lifted
//! into a one-element source list during construction, and every source is
//! classified exactly once into a [`SourceKind`]; the rest of the crate
//! branches on that tag instead of re-inspecting fields.

use indexmap::IndexSet;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::Path;

use crate::error::{CoreError, Result, StructureError, ValidationError};
use crate::refs::RefSources;
use crate::value_files::{RefShapeError, ValueFileRef};

/// Expected value of the top-level `kind` field
pub const APPLICATION_KIND: &str = "Application";

/// How a chart-bearing source locates its chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    /// `chart` from an HTTP(S) Helm repository
    HelmRepo,
    /// `chart` from an OCI registry (repo URL without an http(s) scheme)
    HelmOci,
    /// `path` inside a Git repository, with a `helm` section
    Git,
}

impl ChartKind {
    pub fn is_helm(self) -> bool {
        matches!(self, Self::HelmRepo | Self::HelmOci)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HelmRepo => "helm-repo",
            Self::HelmOci => "helm-oci",
            Self::Git => "git",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of a single source entry
///
/// | Shape     | Required           | Forbidden              |
/// |-----------|--------------------|------------------------|
/// | HelmRepo  | `chart`            | `path`, `ref`          |
/// | HelmOci   | `chart`, non-HTTP `repoURL` | `path`, `ref` |
/// | Git       | `path`, `helm`     | `chart`, `ref`         |
/// | Reference | `ref`              | `chart`, `path`, `helm`|
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Chart(ChartKind),
    Reference,
    Invalid,
}

/// Helm settings carried by the chart-bearing source
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HelmConfig {
    /// Release name; the Application name is used when absent
    pub release_name: Option<String>,

    /// Pass `--skip-crds` to the templating engine
    pub skip_crds: bool,

    /// Value files, later entries overriding earlier ones
    pub value_files: Vec<String>,
}

/// One entry of `spec.sources`
///
/// A key that is present with a null value still counts as present for
/// classification; its value reads as an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    repo_url: Option<String>,
    chart: Option<String>,
    path: Option<String>,
    target_revision: Option<String>,
    ref_name: Option<String>,
    helm: Option<HelmConfig>,
    kind: SourceKind,
}

impl Source {
    fn parse(index: usize, map: &Mapping) -> std::result::Result<Self, StructureError> {
        let field = |key: &str| map.get(key).map(scalar_string);

        let helm = match map.get("helm") {
            None => None,
            Some(Value::Null) => Some(HelmConfig::default()),
            Some(value @ Value::Mapping(_)) => Some(
                serde_yaml::from_value::<HelmConfig>(value.clone()).map_err(|e| {
                    StructureError::InvalidHelmConfig {
                        index,
                        message: e.to_string(),
                    }
                })?,
            ),
            Some(_) => {
                return Err(StructureError::InvalidHelmConfig {
                    index,
                    message: "must be a mapping".to_string(),
                });
            }
        };

        let mut source = Self {
            repo_url: field("repoURL"),
            chart: field("chart"),
            path: field("path"),
            target_revision: field("targetRevision"),
            ref_name: field("ref"),
            helm,
            kind: SourceKind::Invalid,
        };
        source.kind = source.classify();
        Ok(source)
    }

    fn classify(&self) -> SourceKind {
        let has_chart = self.chart.is_some();
        let has_path = self.path.is_some();
        let has_ref = self.ref_name.is_some();
        let has_helm = self.helm.is_some();

        if has_chart && !has_path && !has_ref {
            let url = self.repo_url.as_deref().unwrap_or_default();
            if url.starts_with("http://") || url.starts_with("https://") {
                SourceKind::Chart(ChartKind::HelmRepo)
            } else {
                SourceKind::Chart(ChartKind::HelmOci)
            }
        } else if has_path && has_helm && !has_chart && !has_ref {
            SourceKind::Chart(ChartKind::Git)
        } else if has_ref && !has_chart && !has_path && !has_helm {
            SourceKind::Reference
        } else {
            SourceKind::Invalid
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn chart_kind(&self) -> Option<ChartKind> {
        match self.kind {
            SourceKind::Chart(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn repo_url(&self) -> Option<&str> {
        self.repo_url.as_deref()
    }

    pub fn chart(&self) -> Option<&str> {
        self.chart.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn target_revision(&self) -> Option<&str> {
        self.target_revision.as_deref()
    }

    pub fn ref_name(&self) -> Option<&str> {
        self.ref_name.as_deref()
    }

    pub fn helm(&self) -> Option<&HelmConfig> {
        self.helm.as_ref()
    }
}

/// What the chart fetcher needs to know about the chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    /// Helm repository, OCI registry or Git URL
    pub repo_url: String,
    /// Chart name for Helm charts, path inside the repository for Git
    pub name: String,
    /// Chart version for Helm charts, Git revision otherwise
    pub version: String,
}

/// A parsed ArgoCD Application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    kind: String,
    name: Option<String>,
    namespace: Option<String>,
    sources: Vec<Source>,
}

type Check = fn(&Application) -> std::result::Result<(), ValidationError>;

/// Validation rules, in reporting priority order
const CHECKS: [Check; 5] = [
    Application::check_kind,
    Application::check_duplicate_refs,
    Application::check_source_shapes,
    Application::check_single_chart,
    Application::check_value_file_refs,
];

impl Application {
    /// Build an Application from a parsed document
    pub fn parse(document: &Value) -> std::result::Result<Self, StructureError> {
        let root = document.as_mapping().ok_or(StructureError::NotAMapping)?;

        let metadata = root.get("metadata").and_then(Value::as_mapping);
        let meta = |key: &str| metadata.and_then(|m| m.get(key)).map(scalar_string);

        let spec = root
            .get("spec")
            .and_then(Value::as_mapping)
            .ok_or(StructureError::MissingSources)?;

        let sources = match (spec.get("sources"), spec.get("source")) {
            (Some(Value::Sequence(entries)), _) => entries
                .iter()
                .enumerate()
                .map(|(index, entry)| {
                    let map = entry
                        .as_mapping()
                        .ok_or(StructureError::SourceEntryNotAMapping { index })?;
                    Source::parse(index, map)
                })
                .collect::<std::result::Result<Vec<_>, _>>()?,
            (Some(_), _) => return Err(StructureError::SourcesNotASequence),
            (None, Some(Value::Mapping(map))) => vec![Source::parse(0, map)?],
            (None, Some(_)) => return Err(StructureError::SourceNotAMapping),
            (None, None) => return Err(StructureError::MissingSources),
        };

        Ok(Self {
            kind: root.get("kind").map(scalar_string).unwrap_or_default(),
            name: meta("name"),
            namespace: meta("namespace"),
            sources,
        })
    }

    /// Parse an Application from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let document: Value =
            serde_yaml::from_str(content).map_err(|e| CoreError::InvalidYaml {
                message: e.to_string(),
            })?;
        Ok(Self::parse(&document)?)
    }

    /// Read and parse an Application file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Value = serde_yaml::from_str(&content).map_err(|e| CoreError::Yaml {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!("Loaded application from {}", path.display());
        Ok(Self::parse(&document)?)
    }

    /// Check semantic consistency, reporting only the first violation
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        CHECKS.iter().try_for_each(|check| check(self))
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    fn check_kind(&self) -> std::result::Result<(), ValidationError> {
        if self.kind == APPLICATION_KIND {
            Ok(())
        } else {
            Err(ValidationError::InvalidKind {
                found: self.kind.clone(),
            })
        }
    }

    fn check_duplicate_refs(&self) -> std::result::Result<(), ValidationError> {
        let mut seen = IndexSet::new();
        let mut duplicates = IndexSet::new();
        for name in self.sources.iter().filter_map(Source::ref_name) {
            if !seen.insert(name) {
                duplicates.insert(name);
            }
        }

        if duplicates.is_empty() {
            return Ok(());
        }
        duplicates.sort_unstable();
        Err(ValidationError::DuplicateRefs {
            names: duplicates.into_iter().map(str::to_string).collect(),
        })
    }

    fn check_source_shapes(&self) -> std::result::Result<(), ValidationError> {
        match self
            .sources
            .iter()
            .position(|s| s.kind == SourceKind::Invalid)
        {
            Some(index) => Err(ValidationError::InvalidSource { index }),
            None => Ok(()),
        }
    }

    fn check_single_chart(&self) -> std::result::Result<(), ValidationError> {
        let indices: Vec<usize> = self
            .sources
            .iter()
            .enumerate()
            .filter(|(_, s)| s.chart_kind().is_some())
            .map(|(i, _)| i)
            .collect();

        match indices.len() {
            0 => Err(ValidationError::NoChartSource),
            1 => Ok(()),
            _ => Err(ValidationError::MultipleChartSources { indices }),
        }
    }

    fn check_value_file_refs(&self) -> std::result::Result<(), ValidationError> {
        let refs = self.all_ref_sources();
        let value_files = self.helm_value_files();
        if refs.is_empty() || value_files.is_empty() {
            return Ok(());
        }

        for entry in value_files {
            match ValueFileRef::parse(&entry) {
                Ok(r) if refs.contains_key(r.name) => {}
                Ok(r) => {
                    return Err(ValidationError::UndefinedRef {
                        name: r.name.to_string(),
                        available: refs.keys().cloned().collect(),
                        entry,
                    });
                }
                Err(RefShapeError::MissingPrefix) => {
                    return Err(ValidationError::MissingRefPrefix { entry });
                }
                Err(RefShapeError::Malformed) => {
                    return Err(ValidationError::MalformedRef { entry });
                }
            }
        }
        Ok(())
    }

    /// The `kind` field as declared
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// `metadata.name`, or empty when absent
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// `metadata.namespace`, or empty when absent
    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or_default()
    }

    /// Normalized source list
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    fn reference_sources(&self) -> impl Iterator<Item = &Source> {
        self.sources
            .iter()
            .filter(|s| s.kind == SourceKind::Reference)
    }

    fn has_chart_kind(&self, kind: ChartKind) -> bool {
        self.sources.iter().any(|s| s.chart_kind() == Some(kind))
    }

    /// Any source is a Helm repository chart (OCI included)
    pub fn is_helm_repo(&self) -> bool {
        self.sources
            .iter()
            .any(|s| s.chart_kind().is_some_and(ChartKind::is_helm))
    }

    pub fn is_helm_oci(&self) -> bool {
        self.has_chart_kind(ChartKind::HelmOci)
    }

    pub fn is_helm_git(&self) -> bool {
        self.has_chart_kind(ChartKind::Git)
    }

    /// The unique chart-bearing source
    ///
    /// `None` when there is no chart source or more than one.
    pub fn chart_source(&self) -> Option<&Source> {
        let mut charts = self.sources.iter().filter(|s| s.chart_kind().is_some());
        match (charts.next(), charts.next()) {
            (Some(source), None) => Some(source),
            _ => None,
        }
    }

    /// Fetch coordinates for the chart source
    pub fn chart_spec(&self) -> Option<ChartSpec> {
        let source = self.chart_source()?;
        let kind = source.chart_kind()?;
        let revision = source.target_revision().unwrap_or_default();

        let (name, version) = if kind.is_helm() {
            (
                source.chart().unwrap_or_default(),
                revision.strip_prefix('v').unwrap_or(revision),
            )
        } else {
            (source.path().unwrap_or_default(), revision)
        };

        Some(ChartSpec {
            kind,
            repo_url: source.repo_url().unwrap_or_default().to_string(),
            name: name.to_string(),
            version: version.to_string(),
        })
    }

    /// Helm settings of the chart source
    pub fn helm_config(&self) -> Option<&HelmConfig> {
        self.chart_source().and_then(Source::helm)
    }

    pub fn has_helm_config(&self) -> bool {
        self.helm_config().is_some()
    }

    /// Declared release name, or empty when none is set
    pub fn helm_release_name(&self) -> &str {
        self.helm_config()
            .and_then(|h| h.release_name.as_deref())
            .unwrap_or_default()
    }

    pub fn helm_skip_crds(&self) -> bool {
        self.helm_config().is_some_and(|h| h.skip_crds)
    }

    /// Declared value files, in order
    pub fn helm_value_files(&self) -> Vec<String> {
        self.helm_config()
            .map(|h| h.value_files.clone())
            .unwrap_or_default()
    }

    /// Reference name -> repository URL for every reference source
    ///
    /// Entries with an empty name or URL are skipped; validation reports
    /// any value file that relied on them.
    pub fn all_ref_sources(&self) -> RefSources {
        self.reference_sources()
            .filter_map(|s| match (s.ref_name(), s.repo_url()) {
                (Some(name), Some(url)) if !name.is_empty() && !url.is_empty() => {
                    Some((name.to_string(), url.to_string()))
                }
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chart_type = if self.is_helm_oci() {
            ChartKind::HelmOci.as_str()
        } else if self.is_helm_repo() {
            ChartKind::HelmRepo.as_str()
        } else if self.is_helm_git() {
            ChartKind::Git.as_str()
        } else {
            "unknown"
        };

        write!(
            f,
            "Application(name={:?}, type={}, has_helm_config={})",
            self.name(),
            chart_type,
            self.has_helm_config()
        )
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(yaml: &str) -> Application {
        Application::from_yaml_str(yaml).unwrap()
    }

    fn structure_error(yaml: &str) -> StructureError {
        match Application::from_yaml_str(yaml).unwrap_err() {
            CoreError::Structure(e) => e,
            other => panic!("expected a structure error, got {other:?}"),
        }
    }

    const HELM_REPO: &str = r#"
apiVersion: argoproj.io/v1alpha1
kind: Application
metadata:
  name: karpenter
  namespace: argocd
spec:
  sources:
    - repoURL: https://charts.karpenter.sh
      chart: karpenter
      targetRevision: v0.37.0
      helm:
        releaseName: karpenter-release
        skipCrds: true
        valueFiles:
          - $values/apps/karpenter/values.yaml
    - repoURL: https://github.com/org/values-repo
      targetRevision: main
      ref: values
"#;

    #[test]
    fn test_parse_helm_repo_application() {
        let app = app(HELM_REPO);

        assert_eq!(app.kind(), "Application");
        assert_eq!(app.name(), "karpenter");
        assert_eq!(app.namespace(), "argocd");
        assert_eq!(app.sources().len(), 2);
        assert_eq!(
            app.sources()[0].kind(),
            SourceKind::Chart(ChartKind::HelmRepo)
        );
        assert_eq!(app.sources()[1].kind(), SourceKind::Reference);
        assert!(app.is_helm_repo());
        assert!(!app.is_helm_oci());
        assert!(!app.is_helm_git());
        assert!(app.validate().is_ok());
    }

    #[test]
    fn test_helm_accessors() {
        let app = app(HELM_REPO);

        assert_eq!(app.helm_release_name(), "karpenter-release");
        assert!(app.helm_skip_crds());
        assert_eq!(
            app.helm_value_files(),
            vec!["$values/apps/karpenter/values.yaml".to_string()]
        );
        assert!(app.has_helm_config());

        let refs = app.all_ref_sources();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs["values"], "https://github.com/org/values-repo");
    }

    #[test]
    fn test_chart_spec_strips_leading_v_for_helm() {
        let spec = app(HELM_REPO).chart_spec().unwrap();
        assert_eq!(
            spec,
            ChartSpec {
                kind: ChartKind::HelmRepo,
                repo_url: "https://charts.karpenter.sh".to_string(),
                name: "karpenter".to_string(),
                version: "0.37.0".to_string(),
            }
        );
    }

    #[test]
    fn test_oci_source() {
        let app = app(r#"
kind: Application
metadata:
  name: cert-manager
spec:
  source:
    repoURL: quay.io/jetstack/charts
    chart: cert-manager
    targetRevision: 1.14.4
"#);

        assert_eq!(app.sources().len(), 1);
        assert!(app.is_helm_oci());
        assert!(app.is_helm_repo());
        assert!(!app.has_helm_config());
        assert_eq!(app.helm_release_name(), "");
        assert!(!app.helm_skip_crds());
        assert!(app.helm_value_files().is_empty());
        assert_eq!(app.chart_spec().unwrap().version, "1.14.4");
        assert!(app.validate().is_ok());
    }

    #[test]
    fn test_missing_repo_url_counts_as_oci() {
        let app = app(r#"
kind: Application
spec:
  sources:
    - chart: nginx
"#);
        assert_eq!(app.sources()[0].kind(), SourceKind::Chart(ChartKind::HelmOci));
    }

    #[test]
    fn test_git_source_keeps_revision() {
        let app = app(r#"
kind: Application
metadata:
  name: local
spec:
  source:
    repoURL: https://github.com/org/charts
    path: charts/local
    targetRevision: v2.0.0
    helm: {}
"#);

        assert!(app.is_helm_git());
        assert!(!app.is_helm_repo());
        assert!(app.has_helm_config());
        let spec = app.chart_spec().unwrap();
        assert_eq!(spec.kind, ChartKind::Git);
        assert_eq!(spec.name, "charts/local");
        assert_eq!(spec.version, "v2.0.0");
    }

    #[test]
    fn test_null_helm_counts_as_present() {
        let app = app(r#"
kind: Application
spec:
  sources:
    - repoURL: https://github.com/org/charts
      path: charts/local
      helm:
"#);
        assert_eq!(app.sources()[0].kind(), SourceKind::Chart(ChartKind::Git));
        assert_eq!(app.helm_config(), Some(&HelmConfig::default()));
    }

    #[test]
    fn test_sources_takes_precedence_over_source() {
        let app = app(r#"
kind: Application
spec:
  sources:
    - chart: a
      repoURL: https://a.example.com
  source:
    chart: b
    repoURL: https://b.example.com
"#);
        assert_eq!(app.sources().len(), 1);
        assert_eq!(app.sources()[0].chart(), Some("a"));
    }

    #[test]
    fn test_structure_errors() {
        assert_eq!(structure_error("- a\n- b\n"), StructureError::NotAMapping);
        assert_eq!(structure_error(""), StructureError::NotAMapping);
        assert_eq!(
            structure_error("kind: Application\n"),
            StructureError::MissingSources
        );
        assert_eq!(
            structure_error("kind: Application\nspec:\n  project: default\n"),
            StructureError::MissingSources
        );
        assert_eq!(
            structure_error("kind: Application\nspec:\n  sources: nope\n"),
            StructureError::SourcesNotASequence
        );
        assert_eq!(
            structure_error("kind: Application\nspec:\n  source: [a]\n"),
            StructureError::SourceNotAMapping
        );
        assert_eq!(
            structure_error("kind: Application\nspec:\n  sources: [chart]\n"),
            StructureError::SourceEntryNotAMapping { index: 0 }
        );
        assert!(matches!(
            structure_error("kind: Application\nspec:\n  sources:\n    - chart: a\n      helm: [x]\n"),
            StructureError::InvalidHelmConfig { index: 0, .. }
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Application::from_yaml_str("kind: [unclosed").unwrap_err();
        assert!(matches!(err, CoreError::InvalidYaml { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("application.yaml");
        std::fs::write(&path, HELM_REPO).unwrap();

        let app = Application::load(&path).unwrap();
        assert_eq!(app.name(), "karpenter");

        let err = Application::load(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, CoreError::Read { .. }));
    }

    #[test]
    fn test_validate_wrong_kind() {
        let app = app(r#"
kind: ApplicationSet
spec:
  sources:
    - chart: a
      repoURL: https://a.example.com
"#);
        assert_eq!(
            app.validate(),
            Err(ValidationError::InvalidKind {
                found: "ApplicationSet".to_string()
            })
        );
    }

    #[test]
    fn test_validate_kind_checked_first() {
        // Also has duplicate refs and no chart; kind wins
        let app = app(r#"
kind: Deployment
spec:
  sources:
    - ref: values
      repoURL: https://a
    - ref: values
      repoURL: https://b
"#);
        assert!(matches!(
            app.validate(),
            Err(ValidationError::InvalidKind { .. })
        ));
    }

    #[test]
    fn test_validate_duplicate_refs() {
        let app = app(r#"
kind: Application
spec:
  sources:
    - chart: a
      repoURL: https://a.example.com
    - ref: values
      repoURL: https://github.com/org/one
    - ref: values
      repoURL: https://github.com/org/two
"#);
        let err = app.validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateRefs {
                names: vec!["values".to_string()]
            }
        );
        insta::assert_snapshot!(err.to_string(), @"Duplicate ref sources found: values");
    }

    #[test]
    fn test_duplicate_refs_include_invalid_ref_sources() {
        // The first `values` source also carries `helm`, so its shape is invalid
        let app = app(r#"
kind: Application
spec:
  sources:
    - chart: a
      repoURL: https://a.example.com
    - ref: values
      repoURL: https://github.com/org/one
      helm: {}
    - ref: values
      repoURL: https://github.com/org/two
"#);
        assert_eq!(
            app.validate(),
            Err(ValidationError::DuplicateRefs {
                names: vec!["values".to_string()]
            })
        );
    }

    #[test]
    fn test_validate_invalid_source_shape() {
        let app = app(r#"
kind: Application
spec:
  sources:
    - chart: a
      repoURL: https://a.example.com
    - repoURL: https://github.com/org/plain
      path: manifests
"#);
        assert_eq!(
            app.validate(),
            Err(ValidationError::InvalidSource { index: 1 })
        );
    }

    #[test]
    fn test_ref_with_helm_is_invalid() {
        let app = app(r#"
kind: Application
spec:
  sources:
    - chart: a
      repoURL: https://a.example.com
    - ref: values
      repoURL: https://github.com/org/values
      helm: {}
"#);
        assert_eq!(app.sources()[1].kind(), SourceKind::Invalid);
        assert_eq!(
            app.validate(),
            Err(ValidationError::InvalidSource { index: 1 })
        );
    }

    #[test]
    fn test_validate_absolute_value_file_path() {
        let app = app(r#"
kind: Application
spec:
  sources:
    - chart: a
      repoURL: https://a.example.com
      helm:
        valueFiles: [$values//etc/passwd]
    - ref: values
      repoURL: https://github.com/org/values
"#);
        assert_eq!(
            app.validate(),
            Err(ValidationError::MalformedRef {
                entry: "$values//etc/passwd".to_string()
            })
        );
    }

    #[test]
    fn test_validate_no_chart_source() {
        let app = app(r#"
kind: Application
spec:
  sources:
    - ref: values
      repoURL: https://github.com/org/values
"#);
        assert_eq!(app.validate(), Err(ValidationError::NoChartSource));
        assert!(app.chart_source().is_none());
        assert!(app.chart_spec().is_none());
    }

    #[test]
    fn test_validate_multiple_chart_sources() {
        let app = app(r#"
kind: Application
spec:
  sources:
    - chart: a
      repoURL: https://a.example.com
    - ref: values
      repoURL: https://github.com/org/values
    - chart: b
      repoURL: https://b.example.com
"#);
        let err = app.validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::MultipleChartSources {
                indices: vec![0, 2]
            }
        );
        assert!(err.to_string().contains("[0, 2]"));
        assert!(app.chart_source().is_none());
    }

    #[test]
    fn test_validate_undefined_ref() {
        let app = app(r#"
kind: Application
spec:
  sources:
    - chart: a
      repoURL: https://a.example.com
      helm:
        valueFiles:
          - $other/x.yaml
    - ref: values
      repoURL: https://github.com/org/values
"#);
        let err = app.validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::UndefinedRef {
                entry: "$other/x.yaml".to_string(),
                name: "other".to_string(),
                available: vec!["values".to_string()],
            }
        );
        assert!(err.to_string().contains("undefined ref 'other'"));
    }

    #[test]
    fn test_validate_missing_ref_prefix() {
        let app = app(r#"
kind: Application
spec:
  sources:
    - chart: a
      repoURL: https://a.example.com
      helm:
        valueFiles:
          - $values/ok.yaml
          - values.yaml
    - ref: values
      repoURL: https://github.com/org/values
"#);
        assert_eq!(
            app.validate(),
            Err(ValidationError::MissingRefPrefix {
                entry: "values.yaml".to_string()
            })
        );
    }

    #[test]
    fn test_validate_malformed_ref() {
        let app = app(r#"
kind: Application
spec:
  sources:
    - chart: a
      repoURL: https://a.example.com
      helm:
        valueFiles: [$values]
    - ref: values
      repoURL: https://github.com/org/values
"#);
        assert_eq!(
            app.validate(),
            Err(ValidationError::MalformedRef {
                entry: "$values".to_string()
            })
        );
    }

    #[test]
    fn test_value_files_unchecked_without_refs() {
        let app = app(r#"
kind: Application
spec:
  sources:
    - chart: a
      repoURL: https://a.example.com
      helm:
        valueFiles: [values.yaml]
"#);
        assert!(app.validate().is_ok());
    }

    #[test]
    fn test_validate_is_idempotent() {
        let valid = app(HELM_REPO);
        assert_eq!(valid.validate(), valid.validate());

        let invalid = app("kind: Application\nspec:\n  sources: []\n");
        let first = invalid.validate();
        assert_eq!(first, Err(ValidationError::NoChartSource));
        assert_eq!(invalid.validate(), first);
    }

    #[test]
    fn test_all_ref_sources_skips_incomplete_entries() {
        let app = app(r#"
kind: Application
spec:
  sources:
    - chart: a
      repoURL: https://a.example.com
    - ref: values
    - ref: other
      repoURL: https://github.com/org/other
    - ref:
      repoURL: https://github.com/org/anonymous
"#);
        let refs = app.all_ref_sources();
        assert_eq!(refs.keys().collect::<Vec<_>>(), vec!["other"]);
    }

    #[test]
    fn test_value_files_are_a_copy() {
        let app = app(HELM_REPO);
        let mut files = app.helm_value_files();
        files.push("$values/extra.yaml".to_string());
        assert_eq!(app.helm_value_files().len(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            app(HELM_REPO).to_string(),
            r#"Application(name="karpenter", type=helm-repo, has_helm_config=true)"#
        );

        let unknown = app("kind: Application\nspec:\n  sources: []\n");
        assert_eq!(
            unknown.to_string(),
            r#"Application(name="", type=unknown, has_helm_config=false)"#
        );
    }
}
