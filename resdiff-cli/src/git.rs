//! Git repository access through the `git` executable.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use resdiff_core::FileStatus;

/// A file changed between two revisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub status: FileStatus,
    pub path: String,
}

/// A git working tree.
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    /// Open the repository containing `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Repository path does not exist: {}", path.display());
        }
        let output = git_in(path, &["rev-parse", "--show-toplevel"])?;
        if !output.status.success() {
            bail!("{} is not inside a git repository", path.display());
        }
        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Self {
            root: PathBuf::from(root),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run a git command and return its raw stdout, failing on a non-zero
    /// exit.
    fn run_bytes(&self, args: &[&str]) -> Result<Vec<u8>> {
        let output = git_in(&self.root, args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git {} failed: {}", args.join(" "), stderr.trim());
        }
        Ok(output.stdout)
    }

    /// Run a git command and return its trimmed stdout.
    fn run(&self, args: &[&str]) -> Result<String> {
        let stdout = self.run_bytes(args)?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    /// Resolve a revision to a commit hash.
    pub fn rev_parse(&self, rev: &str) -> Result<String> {
        self.run(&["rev-parse", "--verify", &format!("{}^{{commit}}", rev)])
    }

    /// Files added, deleted or modified between `base` and `head`.
    ///
    /// Renames are reported as a deletion plus an addition; other statuses
    /// (type changes, copies) are skipped. Paths are read NUL-terminated so
    /// git never quotes them.
    pub fn changed_files(&self, base: &str, head: &str) -> Result<Vec<ChangedFile>> {
        let stdout =
            self.run_bytes(&["diff", "--name-status", "--no-renames", "-z", base, head])?;
        Ok(parse_name_status(&stdout))
    }

    /// File content at a revision.
    pub fn show(&self, rev: &str, path: &str) -> Result<Vec<u8>> {
        self.run_bytes(&["show", &format!("{}:{}", rev, path)])
            .with_context(|| format!("Failed to read {} at {}", path, rev))
    }

    /// Fetch a branch from `origin`.
    pub fn fetch(&self, branch: &str) -> Result<()> {
        self.run(&["fetch", "origin", branch]).map(|_| ())
    }

    /// Latest commit of a branch, preferring `origin/<branch>` over the
    /// local branch.
    pub fn latest_commit(&self, branch: &str) -> Result<String> {
        match self.rev_parse(&format!("origin/{}", branch)) {
            Ok(commit) => Ok(commit),
            Err(e) => {
                tracing::debug!(branch, error = %e, "no remote-tracking branch, using local");
                self.rev_parse(branch)
                    .with_context(|| format!("Unknown branch '{}'", branch))
            }
        }
    }

    pub fn merge_base(&self, a: &str, b: &str) -> Result<String> {
        self.run(&["merge-base", a, b])
            .with_context(|| format!("No common ancestor of {} and {}", a, b))
    }
}

fn git_in(dir: &Path, args: &[&str]) -> Result<std::process::Output> {
    Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .context("Failed to run git")
}

/// Parse `git diff --name-status -z` output: NUL-separated status and path
/// fields.
fn parse_name_status(stdout: &[u8]) -> Vec<ChangedFile> {
    let mut fields = stdout.split(|&b| b == 0).filter(|f| !f.is_empty());
    let mut files = Vec::new();
    while let (Some(status), Some(path)) = (fields.next(), fields.next()) {
        let Ok(path) = std::str::from_utf8(path) else {
            tracing::warn!(path = %String::from_utf8_lossy(path), "skipping non UTF-8 path");
            continue;
        };
        let status = match status {
            b"A" => FileStatus::Added,
            b"D" => FileStatus::Deleted,
            b"M" => FileStatus::Modified,
            other => {
                tracing::debug!(status = %String::from_utf8_lossy(other), path, "skipping change");
                continue;
            }
        };
        files.push(ChangedFile {
            status,
            path: path.to_string(),
        });
    }
    files
}
