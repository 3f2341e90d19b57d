//! Files command - diff two source files on disk.

use std::path::Path;

use anyhow::{Context, Result};
use resdiff_core::{module_name_from_path, ModuleFailure, ModuleSource};

use super::{into_run, DiffRun, Session};

/// Build the module source for an `old`/`new` file pair.
pub fn module_source(old: &Path, new: &Path, module_name: Option<&str>) -> Result<ModuleSource> {
    let old_source =
        std::fs::read(old).with_context(|| format!("Failed to read {}", old.display()))?;
    let new_source =
        std::fs::read(new).with_context(|| format!("Failed to read {}", new.display()))?;

    let name = module_name
        .map(str::to_string)
        .unwrap_or_else(|| module_name_from_path(new));

    Ok(ModuleSource::new(name, new)
        .with_old(old_source)
        .with_new(new_source))
}

pub fn run(
    session: &Session,
    old: &Path,
    new: &Path,
    module_name: Option<&str>,
) -> Result<(DiffRun, Vec<ModuleFailure>)> {
    let source = module_source(old, new, module_name)?;
    let outcome = session.diff(std::slice::from_ref(&source));
    Ok(into_run(
        old.display().to_string(),
        new.display().to_string(),
        outcome,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use resdiff_core::FileStatus;

    #[test]
    fn test_module_source_names_from_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.res");
        let new = dir.path().join("user_profile.res");
        std::fs::write(&old, "let a = 1").unwrap();
        std::fs::write(&new, "let a = 2").unwrap();

        let source = module_source(&old, &new, None).unwrap();
        assert_eq!(source.module_name, "UserProfile");
        assert_eq!(source.status().unwrap(), FileStatus::Modified);
        assert_eq!(source.old.as_deref(), Some(&b"let a = 1"[..]));

        let named = module_source(&old, &new, Some("Custom")).unwrap();
        assert_eq!(named.module_name, "Custom");
    }

    #[test]
    fn test_module_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = module_source(&dir.path().join("a.res"), &dir.path().join("b.res"), None)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
