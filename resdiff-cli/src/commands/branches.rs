//! Branches command - pull-request style diff of a branch against its target.
//!
//! The head is the latest commit of `from` and the base is the merge-base of
//! `from` and `to`, so only changes made on `from` are reported.

use anyhow::Result;
use resdiff_core::ModuleFailure;

use super::commits::collect_sources;
use super::{into_run, DiffRun, Session};
use crate::git::GitRepo;

pub fn run(
    session: &Session,
    repo: &GitRepo,
    from: &str,
    to: &str,
    fetch: bool,
) -> Result<(DiffRun, Vec<ModuleFailure>)> {
    if fetch {
        for branch in [from, to] {
            if let Err(e) = repo.fetch(branch) {
                tracing::warn!(branch, error = %e, "fetch failed, using local refs");
            }
        }
    }

    let head = repo.latest_commit(from)?;
    let target = repo.latest_commit(to)?;
    let base = repo.merge_base(&target, &head)?;
    tracing::info!(%base, %head, "comparing {} against {}", from, to);

    let collected = collect_sources(session, repo, &base, &head)?;
    let outcome = session
        .diff(&collected.sources)
        .with_failures(collected.unreadable);
    Ok(into_run(to, from, outcome))
}
