//! CLI commands

pub mod diff;
pub mod render;
pub mod validate;

use argohelm_core::{
    Application, ChartSpec, CoreError, Git, HelmArgs, RefMapping, ValidationError,
};
use argohelm_engine::{Helm, Renderer, write_manifest};
use argohelm_repo::{ChartCache, ChartFetcher};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Settings shared by every command, resolved from the command line
#[derive(Debug, Clone)]
pub struct Context {
    /// Absolute working directory
    pub workdir: PathBuf,
    /// Application file name, relative to `workdir`
    pub application: String,
    pub chart_dir: PathBuf,
    /// Explicit `--ref-map` entries
    pub ref_map: RefMapping,
    pub secrets: bool,
    /// Passed through to `helm template` after the computed arguments
    pub helm_args: Vec<String>,
    pub helm: Helm,
    pub git: Git,
}

impl Context {
    pub fn application_path(&self) -> PathBuf {
        self.workdir.join(&self.application)
    }

    pub fn chart_cache(&self) -> ChartCache {
        ChartCache::new(&self.workdir, &self.chart_dir)
    }

    fn renderer(&self) -> Renderer {
        Renderer::new(self.helm.clone()).decode_secrets(self.secrets)
    }
}

/// Load an application file and validate it
pub fn load_application(path: &Path) -> Result<Application> {
    tracing::debug!("Loading {}...", path.display());
    let app = Application::load(path)?;
    app.validate().map_err(CoreError::from)?;
    Ok(app)
}

/// Fetch coordinates of a validated application's chart
pub fn chart_spec(app: &Application) -> Result<ChartSpec> {
    let spec = app
        .chart_spec()
        .ok_or(CoreError::from(ValidationError::NoChartSource))?;

    tracing::debug!("Chart: {}", spec.name);
    tracing::debug!("Repository: {}", spec.repo_url);
    tracing::debug!("Version: {}", spec.version);
    tracing::debug!("Chart type: {}", spec.kind);
    Ok(spec)
}

/// Compute the full `helm template` argument list
pub fn helm_args(ctx: &Context, app: &Application, overrides: &RefMapping) -> Result<Vec<String>> {
    let mut args = HelmArgs::new(&ctx.git).build(app, &ctx.workdir, overrides)?;
    args.extend(ctx.helm_args.iter().cloned());
    Ok(args)
}

/// A rendered manifest and where it was written
#[derive(Debug)]
pub struct Rendered {
    pub path: PathBuf,
    pub manifest: String,
}

/// Load, fetch, template and write the manifest for one application file
pub async fn render_manifests(
    ctx: &Context,
    application_path: &Path,
    output_dir: &Path,
    overrides: &RefMapping,
) -> Result<Rendered> {
    let app = load_application(application_path)?;
    let spec = chart_spec(&app)?;

    let chart_path = ChartFetcher::new(ctx.chart_cache(), ctx.git.clone())
        .fetch(&spec)
        .await?;

    let args = helm_args(ctx, &app, overrides)?;

    tracing::debug!("Running helm template...");
    let manifest = ctx.renderer().render(&chart_path, &args)?;

    let path = write_manifest(output_dir, &manifest, ctx.secrets)?;
    tracing::debug!("Output written to {}", path.display());

    Ok(Rendered { path, manifest })
}
