//! Git working-tree queries and repository operations
//!
//! Everything shells out to the `git` binary. The reference resolver only
//! needs [`WorktreeLocator`]; the chart fetcher and diff mode use the rest of
//! [`Git`].

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::error::VcsError;

/// Finds the root of the working tree enclosing a directory
pub trait WorktreeLocator {
    /// Return the working-tree root containing `dir`
    ///
    /// Fails with [`VcsError::NotTracked`] when `dir` is not under version
    /// control.
    fn worktree_root(&self, dir: &Path) -> Result<PathBuf, VcsError>;
}

impl<T: WorktreeLocator + ?Sized> WorktreeLocator for &T {
    fn worktree_root(&self, dir: &Path) -> Result<PathBuf, VcsError> {
        (**self).worktree_root(dir)
    }
}

/// Thin wrapper over the `git` command line
#[derive(Debug, Clone)]
pub struct Git {
    program: PathBuf,
}

impl Default for Git {
    fn default() -> Self {
        Self::new("git")
    }
}

impl Git {
    /// Use a specific git executable
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-C").arg(dir);
        cmd
    }

    fn describe(&self, dir: &Path, args: &[&str]) -> String {
        format!(
            "{} -C {} {}",
            self.program.display(),
            dir.display(),
            args.join(" ")
        )
    }

    /// Run a git subcommand in `dir` and capture stdout
    fn output(&self, dir: &Path, args: &[&str]) -> Result<Vec<u8>, VcsError> {
        let command = self.describe(dir, args);
        tracing::debug!("Running: {}", command);

        let output = self
            .command(dir)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| VcsError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(VcsError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }

    /// Root of the working tree containing `dir`
    pub fn toplevel(&self, dir: &Path) -> Result<PathBuf, VcsError> {
        match self.output(dir, &["rev-parse", "--show-toplevel"]) {
            Ok(stdout) => {
                let root = PathBuf::from(String::from_utf8_lossy(&stdout).trim());
                tracing::debug!("Git root: {}", root.display());
                Ok(root)
            }
            Err(VcsError::CommandFailed { .. }) => Err(VcsError::NotTracked {
                path: dir.to_path_buf(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Clone `url` into `dest`; the parent of `dest` must exist
    pub fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), VcsError> {
        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        self.output(parent, &["clone", "--", url, name.as_ref()])?;
        Ok(())
    }

    /// Check out a branch, tag or commit
    ///
    /// When the revision is unknown locally, fetches `origin` once and
    /// retries.
    pub fn checkout(&self, repo: &Path, revision: &str) -> Result<(), VcsError> {
        if self.output(repo, &["checkout", revision]).is_ok() {
            return Ok(());
        }

        tracing::debug!(
            "Revision {} not found locally, fetching from origin...",
            revision
        );
        self.output(repo, &["fetch", "origin"])?;
        self.output(repo, &["checkout", revision])?;
        Ok(())
    }

    /// Contents of `path` (relative to the working-tree root) at `git_ref`
    pub fn show_file(&self, root: &Path, git_ref: &str, path: &Path) -> Result<Vec<u8>, VcsError> {
        let spec = format!("{}:{}", git_ref, to_git_path(path));
        self.output(root, &["show", &spec])
    }

    /// Which of `paths` differ between `git_ref` and the working tree
    ///
    /// Staged and unstaged changes both count.
    pub fn changed_files(
        &self,
        root: &Path,
        git_ref: &str,
        paths: &[PathBuf],
    ) -> Result<Vec<String>, VcsError> {
        let pathspecs: Vec<String> = paths.iter().map(|p| to_git_path(p)).collect();
        let mut args = vec!["diff", "--name-only", git_ref, "--"];
        args.extend(pathspecs.iter().map(String::as_str));

        let stdout = self.output(root, &args)?;
        Ok(String::from_utf8_lossy(&stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Show a diff of two files on the terminal
    ///
    /// `git diff --no-index` exits 1 when the files differ, so the status is
    /// returned rather than treated as a failure.
    pub fn diff_no_index(&self, old: &Path, new: &Path) -> Result<ExitStatus, VcsError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["diff", "--no-index", "--"]).arg(old).arg(new);
        let command = format!(
            "{} diff --no-index -- {} {}",
            self.program.display(),
            old.display(),
            new.display()
        );
        tracing::debug!("Running: {}", command);

        cmd.status().map_err(|source| VcsError::Spawn { command, source })
    }
}

impl WorktreeLocator for Git {
    fn worktree_root(&self, dir: &Path) -> Result<PathBuf, VcsError> {
        self.toplevel(dir)
    }
}

/// Render a relative path with `/` separators, as git pathspecs expect
fn to_git_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
