//! Render command - template the application's chart into the workdir

use std::io::Write;

use super::{Context, render_manifests};
use crate::error::{CliError, Result};

pub async fn run(ctx: &Context) -> Result<()> {
    tracing::debug!("Working directory: {}", ctx.workdir.display());
    for (name, path) in &ctx.ref_map {
        tracing::debug!("Ref map parameter: {} -> {}", name, path.display());
    }

    let rendered = render_manifests(ctx, &ctx.application_path(), &ctx.workdir, &ctx.ref_map).await?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(rendered.manifest.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| CliError::io("Failed to write manifest to stdout", e))?;

    Ok(())
}
