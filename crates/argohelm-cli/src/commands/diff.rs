//! Diff command - compare the render of a committed revision with the
//! working tree
//!
//! The committed application file and the value files it uses are
//! extracted into `<workdir>/.diff/`, mirroring their location in the
//! working tree. Both sides are rendered, then shown with
//! `git diff --no-index`.

use argohelm_core::{Application, ArgsError, RefMapping, RefResolver, value_files};
use argohelm_engine::sort_yaml_file;
use console::style;
use std::path::{Path, PathBuf};

use super::{Context, load_application, render_manifests};
use crate::error::{CliError, Result};

/// Scratch directory for the committed side, under the workdir
pub const DIFF_DIR: &str = ".diff";

pub async fn run(ctx: &Context, git_ref: &str, sort: bool) -> Result<()> {
    let root = ctx.git.toplevel(&ctx.workdir).map_err(|_| {
        CliError::other_with_help(
            "Working directory is not part of a git repository",
            "diff compares against git history; run it inside a checkout",
        )
    })?;
    let root = canonical(&root);
    tracing::debug!("Verified workdir is in a git repository ({})", root.display());

    let application = ctx.application_path();
    let app_file = relative_to(&root, &application).ok_or_else(|| {
        CliError::validation(format!(
            "{} is outside the git working tree {}",
            application.display(),
            root.display()
        ))
    })?;

    // Change detection looks at the current application's files
    let current = load_application(&application)?;
    let mut tracked = vec![app_file.clone()];
    tracked.extend(in_tree_value_files(ctx, &current, &root)?);

    let changed = ctx.git.changed_files(&root, git_ref, &tracked)?;
    if changed.is_empty() {
        return Err(CliError::validation(format!(
            "No changes detected in {} or its value files (against {})",
            ctx.application, git_ref
        )));
    }
    tracing::debug!("Detected changes in {}", changed.join(", "));

    let diff_dir = ctx.workdir.join(DIFF_DIR);
    if diff_dir.exists() {
        tracing::debug!("Removing existing .diff directory at {}", diff_dir.display());
        std::fs::remove_dir_all(&diff_dir)
            .map_err(|e| CliError::io(format!("Failed to remove {}", diff_dir.display()), e))?;
    }
    std::fs::create_dir_all(&diff_dir)
        .map_err(|e| CliError::io(format!("Failed to create {}", diff_dir.display()), e))?;

    // Committed side: the application first, then whatever it references
    let old_application = extract(ctx, &root, git_ref, &app_file, &diff_dir)?;
    let committed = load_application(&old_application)?;
    for file in in_tree_value_files(ctx, &committed, &root)? {
        extract(ctx, &root, git_ref, &file, &diff_dir)?;
    }
    let old_overrides = mirror_mapping(ctx, &committed, &root, &diff_dir)?;

    eprintln!(
        "{} Rendering manifests from {} ({})...",
        style("→").blue(),
        ctx.application,
        git_ref
    );
    let old = render_manifests(ctx, &old_application, &diff_dir, &old_overrides).await?;

    eprintln!("{} Rendering manifests from current files...", style("→").blue());
    let new = render_manifests(ctx, &application, &ctx.workdir, &ctx.ref_map).await?;

    if sort {
        tracing::debug!("Sorting YAML keys in manifest files before diff...");
        sort_yaml_file(&old.path)?;
        sort_yaml_file(&new.path)?;
    }

    tracing::debug!("Diff complete (comparing against {}). Showing diff...", git_ref);
    let status = ctx.git.diff_no_index(&old.path, &new.path)?;

    // 0: identical, 1: differences shown
    match status.code() {
        Some(0 | 1) => Ok(()),
        code => Err(CliError::Other {
            message: format!(
                "git diff exited with {}",
                code.map_or_else(|| "a signal".to_string(), |c| c.to_string())
            ),
            help: None,
        }),
    }
}

/// The reference mapping for `app`, with explicit overrides applied
fn mapping_for(ctx: &Context, app: &Application) -> Result<RefMapping> {
    let mapping = RefResolver::new(&ctx.git)
        .resolve(&app.all_ref_sources(), &ctx.workdir, &ctx.ref_map)
        .map_err(ArgsError::UnresolvedReferences)?;
    Ok(mapping)
}

/// Value files of `app` living inside the working tree, relative to `root`
fn in_tree_value_files(ctx: &Context, app: &Application, root: &Path) -> Result<Vec<PathBuf>> {
    let mapping = mapping_for(ctx, app)?;
    let files = value_files::resolve(&app.helm_value_files(), &mapping)
        .map_err(ArgsError::UnresolvedReferences)?;

    let mut relative: Vec<PathBuf> = Vec::new();
    for file in files {
        match relative_to(root, &file) {
            Some(rel) if !relative.contains(&rel) => relative.push(rel),
            Some(_) => {}
            None => tracing::debug!("{} is outside the working tree", file.display()),
        }
    }
    Ok(relative)
}

/// Mapping for the committed side: in-tree entries point into the mirror
fn mirror_mapping(
    ctx: &Context,
    app: &Application,
    root: &Path,
    diff_dir: &Path,
) -> Result<RefMapping> {
    Ok(mapping_for(ctx, app)?
        .into_iter()
        .map(|(name, path)| {
            let mirrored = match relative_to(root, &path) {
                Some(rel) if rel.as_os_str().is_empty() => diff_dir.to_path_buf(),
                Some(rel) => diff_dir.join(rel),
                None => path,
            };
            tracing::debug!("Ref mapping for {}: {} -> {}", DIFF_DIR, name, mirrored.display());
            (name, mirrored)
        })
        .collect())
}

/// Write `file` as of `git_ref` into the mirror, returning its new path
fn extract(
    ctx: &Context,
    root: &Path,
    git_ref: &str,
    file: &Path,
    diff_dir: &Path,
) -> Result<PathBuf> {
    tracing::debug!("Extracting {} from git {}...", file.display(), git_ref);
    let content = ctx.git.show_file(root, git_ref, file).map_err(|e| {
        CliError::Other {
            message: format!("Could not extract {} from git: {}", file.display(), e),
            help: Some(format!("is {} committed at {}?", file.display(), git_ref)),
        }
    })?;

    let dest = diff_dir.join(file);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CliError::io(format!("Failed to create {}", parent.display()), e))?;
    }
    std::fs::write(&dest, content)
        .map_err(|e| CliError::io(format!("Failed to write {}", dest.display()), e))?;
    Ok(dest)
}

/// Absolute, symlink-free form of `path` when it exists
fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// `path` relative to `root`, if it lies inside it
fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    canonical(path).strip_prefix(root).ok().map(Path::to_path_buf)
}
