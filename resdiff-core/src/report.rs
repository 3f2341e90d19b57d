//! Module-level change reports.

use std::path::Path;

use serde::Serialize;

use crate::differ::{diff_declarations, ChangeEntry, ChangeType, KindDiff};
use crate::extractor::ModuleDeclarations;
use crate::grammar::DeclarationKind;

/// Added, modified and deleted declarations of one module.
///
/// Every list is sorted by declaration name. Serializes to the interchange
/// object (`moduleName`, `addedFunctions`, ... `deletedExternals`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleChangeReport {
    pub module_name: String,

    pub added_functions: Vec<ChangeEntry>,
    pub modified_functions: Vec<ChangeEntry>,
    pub deleted_functions: Vec<ChangeEntry>,

    pub added_types: Vec<ChangeEntry>,
    pub modified_types: Vec<ChangeEntry>,
    pub deleted_types: Vec<ChangeEntry>,

    pub added_externals: Vec<ChangeEntry>,
    pub modified_externals: Vec<ChangeEntry>,
    pub deleted_externals: Vec<ChangeEntry>,
}

impl ModuleChangeReport {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            ..Default::default()
        }
    }

    /// Store the diff of one declaration kind.
    pub fn set_kind(&mut self, kind: DeclarationKind, diff: KindDiff) {
        let (added, modified, deleted) = match kind {
            DeclarationKind::Function => (
                &mut self.added_functions,
                &mut self.modified_functions,
                &mut self.deleted_functions,
            ),
            DeclarationKind::Type => (
                &mut self.added_types,
                &mut self.modified_types,
                &mut self.deleted_types,
            ),
            DeclarationKind::External => (
                &mut self.added_externals,
                &mut self.modified_externals,
                &mut self.deleted_externals,
            ),
        };
        *added = diff.added;
        *modified = diff.modified;
        *deleted = diff.deleted;
    }

    /// Entries of one kind and change type.
    pub fn entries(&self, kind: DeclarationKind, change_type: ChangeType) -> &[ChangeEntry] {
        match (kind, change_type) {
            (DeclarationKind::Function, ChangeType::Added) => &self.added_functions,
            (DeclarationKind::Function, ChangeType::Modified) => &self.modified_functions,
            (DeclarationKind::Function, ChangeType::Deleted) => &self.deleted_functions,
            (DeclarationKind::Type, ChangeType::Added) => &self.added_types,
            (DeclarationKind::Type, ChangeType::Modified) => &self.modified_types,
            (DeclarationKind::Type, ChangeType::Deleted) => &self.deleted_types,
            (DeclarationKind::External, ChangeType::Added) => &self.added_externals,
            (DeclarationKind::External, ChangeType::Modified) => &self.modified_externals,
            (DeclarationKind::External, ChangeType::Deleted) => &self.deleted_externals,
        }
    }

    /// Total number of entries across all nine lists.
    pub fn change_count(&self) -> usize {
        DeclarationKind::ALL
            .iter()
            .flat_map(|kind| {
                [ChangeType::Added, ChangeType::Modified, ChangeType::Deleted]
                    .into_iter()
                    .map(move |change_type| self.entries(*kind, change_type).len())
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }

    pub fn summary(&self) -> ChangeSummary {
        let counts = |kind| KindCounts {
            added: self.entries(kind, ChangeType::Added).len(),
            modified: self.entries(kind, ChangeType::Modified).len(),
            deleted: self.entries(kind, ChangeType::Deleted).len(),
        };
        ChangeSummary {
            functions: counts(DeclarationKind::Function),
            types: counts(DeclarationKind::Type),
            externals: counts(DeclarationKind::External),
        }
    }
}

/// Diff two declaration sets into one report.
pub fn assemble_report(
    module_name: impl Into<String>,
    before: &ModuleDeclarations,
    after: &ModuleDeclarations,
) -> ModuleChangeReport {
    let mut report = ModuleChangeReport::new(module_name);
    for kind in DeclarationKind::ALL {
        report.set_kind(kind, diff_declarations(before.get(kind), after.get(kind)));
    }
    report
}

/// Change counts for one declaration kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
}

impl KindCounts {
    pub fn total(&self) -> usize {
        self.added + self.modified + self.deleted
    }
}

/// Summary statistics for a report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub functions: KindCounts,
    pub types: KindCounts,
    pub externals: KindCounts,
}

impl ChangeSummary {
    pub fn get(&self, kind: DeclarationKind) -> KindCounts {
        match kind {
            DeclarationKind::Function => self.functions,
            DeclarationKind::Type => self.types,
            DeclarationKind::External => self.externals,
        }
    }

    /// Accumulate another summary into this one.
    pub fn merge(&mut self, other: &ChangeSummary) {
        for (mine, theirs) in [
            (&mut self.functions, other.functions),
            (&mut self.types, other.types),
            (&mut self.externals, other.externals),
        ] {
            mine.added += theirs.added;
            mine.modified += theirs.modified;
            mine.deleted += theirs.deleted;
        }
    }

    /// Generate human-readable summary string.
    pub fn text(&self) -> String {
        let mut parts = Vec::new();

        for kind in DeclarationKind::ALL {
            let counts = self.get(kind);
            if counts.total() == 0 {
                continue;
            }
            let mut kind_parts = Vec::new();
            if counts.added > 0 {
                kind_parts.push(format!("{} added", counts.added));
            }
            if counts.modified > 0 {
                kind_parts.push(format!("{} modified", counts.modified));
            }
            if counts.deleted > 0 {
                kind_parts.push(format!("{} deleted", counts.deleted));
            }
            parts.push(format!("{}: {}", kind.plural(), kind_parts.join(", ")));
        }

        if parts.is_empty() {
            "No changes".to_string()
        } else {
            parts.join("; ")
        }
    }
}

/// Derive a module name from a file path.
///
/// The file stem is split on `-` and `_` and each segment is capitalised:
/// `src/user_profile.res` becomes `UserProfile`.
pub fn module_name_from_path(path: impl AsRef<Path>) -> String {
    let stem = path
        .as_ref()
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    stem.split(['-', '_'])
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
