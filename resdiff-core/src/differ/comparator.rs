//! Set reconciliation of two declaration indexes.

use crate::differ::changes::ChangeEntry;
use crate::extractor::DeclarationMap;

/// Changes for one declaration kind.
///
/// Each list is sorted by declaration name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KindDiff {
    pub added: Vec<ChangeEntry>,
    pub deleted: Vec<ChangeEntry>,
    pub modified: Vec<ChangeEntry>,
}

impl KindDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.deleted.len() + self.modified.len()
    }
}

/// Diff the before/after indexes of one declaration kind.
///
/// Names only in `after` are added, names only in `before` are deleted, and
/// common names whose signatures differ are modified. Unchanged common names
/// produce nothing.
pub fn diff_declarations(before: &DeclarationMap, after: &DeclarationMap) -> KindDiff {
    let mut diff = KindDiff::default();

    // BTreeMap iteration is ordered by name, so every list comes out sorted.
    for (name, decl) in after {
        if !before.contains_key(name) {
            diff.added.push(ChangeEntry::added(name, &decl.source_text));
        }
    }

    for (name, old) in before {
        match after.get(name) {
            None => diff.deleted.push(ChangeEntry::deleted(name, &old.source_text)),
            Some(new) if new.signature != old.signature => diff.modified.push(
                ChangeEntry::modified(name, &old.source_text, &new.source_text),
            ),
            Some(_) => {}
        }
    }

    diff
}
