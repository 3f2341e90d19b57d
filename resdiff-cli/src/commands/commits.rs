//! Commits command - diff every changed module between two commits.

use anyhow::Result;
use resdiff_core::{DiffError, FileStatus, ModuleFailure, ModuleSource};

use super::{into_run, DiffRun, Session};
use crate::git::{ChangedFile, GitRepo};

/// Modules read from a repository, and those whose content could not be
/// read.
#[derive(Debug, Default)]
pub struct CollectedSources {
    pub sources: Vec<ModuleSource>,
    pub unreadable: Vec<ModuleFailure>,
}

/// Read both revisions of each changed file with a configured extension.
///
/// A revision that cannot be read fails only its own module.
pub fn collect_sources(
    session: &Session,
    repo: &GitRepo,
    base: &str,
    head: &str,
) -> Result<CollectedSources> {
    let changed: Vec<ChangedFile> = repo
        .changed_files(base, head)?
        .into_iter()
        .filter(|file| session.config().matches_extension(&file.path))
        .collect();
    tracing::debug!(files = changed.len(), base, head, "changed modules");

    let mut collected = CollectedSources::default();
    for file in changed {
        let module_name = session.module_name(&file.path);
        let read = |rev: &str| {
            repo.show(rev, &file.path)
                .map_err(|e| DiffError::SourceUnavailable {
                    module: module_name.clone(),
                    revision: rev.to_string(),
                    reason: format!("{:#}", e),
                })
        };

        let old = match file.status {
            FileStatus::Added => Ok(None),
            _ => read(base).map(Some),
        };
        let new = match file.status {
            FileStatus::Deleted => Ok(None),
            _ => read(head).map(Some),
        };

        match (old, new) {
            (Ok(old), Ok(new)) => {
                let mut source = ModuleSource::new(module_name, &file.path);
                source.old = old;
                source.new = new;
                collected.sources.push(source);
            }
            (Err(error), _) | (_, Err(error)) => {
                tracing::warn!(path = %file.path, error = %error, "module source unreadable");
                collected.unreadable.push(ModuleFailure {
                    module_name,
                    path: file.path.into(),
                    error,
                });
            }
        }
    }
    Ok(collected)
}

pub fn run(
    session: &Session,
    repo: &GitRepo,
    base: &str,
    head: &str,
) -> Result<(DiffRun, Vec<ModuleFailure>)> {
    let base_commit = repo.rev_parse(base)?;
    let head_commit = repo.rev_parse(head)?;

    let collected = collect_sources(session, repo, &base_commit, &head_commit)?;
    let outcome = session
        .diff(&collected.sources)
        .with_failures(collected.unreadable);
    Ok(into_run(base, head, outcome))
}
