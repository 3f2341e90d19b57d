//! MU sigil format.
//!
//! One line per change: the change marker (`+` added, `-` deleted,
//! `~` modified), then the declaration sigil and name.
//! - `!` - Module
//! - `$` - Function
//! - `@` - Type
//! - `&` - External
//! - `::` - Section marker

use colored::Colorize;
use resdiff_core::{ChangeType, DeclarationKind};

/// Sigil types for MU format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sigil {
    Module,
    Function,
    Type,
    External,
    Section,
}

impl Sigil {
    /// Get the sigil character(s)
    pub fn char(&self) -> &'static str {
        match self {
            Sigil::Module => "!",
            Sigil::Function => "$",
            Sigil::Type => "@",
            Sigil::External => "&",
            Sigil::Section => "::",
        }
    }

    pub fn for_kind(kind: DeclarationKind) -> Self {
        match kind {
            DeclarationKind::Function => Sigil::Function,
            DeclarationKind::Type => Sigil::Type,
            DeclarationKind::External => Sigil::External,
        }
    }

    /// Format a sigil with optional color
    pub fn format(&self, use_colors: bool) -> String {
        let s = self.char();
        if !use_colors {
            return s.to_string();
        }
        match self {
            Sigil::Module => s.bright_blue().to_string(),
            Sigil::Function => s.bright_green().to_string(),
            Sigil::Type => s.bright_yellow().to_string(),
            Sigil::External => s.bright_magenta().to_string(),
            Sigil::Section => s.dimmed().to_string(),
        }
    }
}

/// Change marker with optional color.
pub fn change_marker(change_type: ChangeType, use_colors: bool) -> String {
    let marker = change_type.sigil().to_string();
    if !use_colors {
        return marker;
    }
    match change_type {
        ChangeType::Added => marker.green().to_string(),
        ChangeType::Deleted => marker.red().to_string(),
        ChangeType::Modified => marker.yellow().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigils_without_color() {
        assert_eq!(Sigil::for_kind(DeclarationKind::Function).format(false), "$");
        assert_eq!(Sigil::for_kind(DeclarationKind::Type).format(false), "@");
        assert_eq!(Sigil::for_kind(DeclarationKind::External).format(false), "&");
        assert_eq!(change_marker(ChangeType::Deleted, false), "-");
    }
}
