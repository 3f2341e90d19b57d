//! Change entries produced by the set differ.

use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

/// Type of change detected for a declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Added,
    Deleted,
    Modified,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Deleted => "deleted",
            ChangeType::Modified => "modified",
        }
    }

    /// Single-character marker used by the compact renderers.
    pub fn sigil(&self) -> char {
        match self {
            ChangeType::Added => '+',
            ChangeType::Deleted => '-',
            ChangeType::Modified => '~',
        }
    }
}

/// A single added, deleted or modified declaration.
///
/// `old_text` is present for deleted and modified entries, `new_text` for
/// added and modified ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEntry {
    /// Type of change.
    pub change_type: ChangeType,

    /// Declaration name.
    pub name: String,

    /// Source text in the old revision.
    pub old_text: Option<String>,

    /// Source text in the new revision.
    pub new_text: Option<String>,
}

impl ChangeEntry {
    pub fn added(name: impl Into<String>, new_text: impl Into<String>) -> Self {
        Self {
            change_type: ChangeType::Added,
            name: name.into(),
            old_text: None,
            new_text: Some(new_text.into()),
        }
    }

    pub fn deleted(name: impl Into<String>, old_text: impl Into<String>) -> Self {
        Self {
            change_type: ChangeType::Deleted,
            name: name.into(),
            old_text: Some(old_text.into()),
            new_text: None,
        }
    }

    pub fn modified(
        name: impl Into<String>,
        old_text: impl Into<String>,
        new_text: impl Into<String>,
    ) -> Self {
        Self {
            change_type: ChangeType::Modified,
            name: name.into(),
            old_text: Some(old_text.into()),
            new_text: Some(new_text.into()),
        }
    }
}

/// Interchange shape: `[name, text]` for added/deleted entries and
/// `[name, oldText, newText]` for modified ones.
impl Serialize for ChangeEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let texts: Vec<&str> = match self.change_type {
            ChangeType::Added => vec![self.new_text.as_deref().unwrap_or_default()],
            ChangeType::Deleted => vec![self.old_text.as_deref().unwrap_or_default()],
            ChangeType::Modified => vec![
                self.old_text.as_deref().unwrap_or_default(),
                self.new_text.as_deref().unwrap_or_default(),
            ],
        };

        let mut tuple = serializer.serialize_tuple(1 + texts.len())?;
        tuple.serialize_element(&self.name)?;
        for text in texts {
            tuple.serialize_element(text)?;
        }
        tuple.end()
    }
}
