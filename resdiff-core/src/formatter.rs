//! Source pre-normalization through an external formatter.
//!
//! Formatting both revisions before parsing keeps pure layout changes out of
//! the parse trees. It is strictly best effort: when the formatter is missing
//! or fails, the original bytes are diffed instead.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use crate::error::FormatError;

/// Rewrites a source file in place.
pub trait Formatter: Send + Sync {
    fn format_file(&self, path: &Path) -> Result<(), FormatError>;
}

/// Runs `program args... <path>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandFormatter {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandFormatter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a whitespace separated command line such as
    /// `npx rescript format`. Returns `None` for an empty command.
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    /// `npx rescript format`
    pub fn rescript() -> Self {
        Self::new("npx", vec!["rescript".to_string(), "format".to_string()])
    }
}

impl Default for CommandFormatter {
    fn default() -> Self {
        Self::rescript()
    }
}

impl Formatter for CommandFormatter {
    fn format_file(&self, path: &Path) -> Result<(), FormatError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .output()
            .map_err(|source| FormatError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(FormatError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Format `source` through a scratch file and return the result.
///
/// `extension` names the scratch file's extension (without the dot) since
/// formatters usually pick the language from it. Any failure is logged and
/// the input is returned unchanged.
pub fn normalize_source(source: &[u8], extension: &str, formatter: &dyn Formatter) -> Vec<u8> {
    match try_normalize(source, extension, formatter) {
        Ok(formatted) => formatted,
        Err(e) => {
            tracing::warn!(error = %e, "formatter failed, diffing unformatted source");
            source.to_vec()
        }
    }
}

fn try_normalize(
    source: &[u8],
    extension: &str,
    formatter: &dyn Formatter,
) -> Result<Vec<u8>, FormatError> {
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let mut file = tempfile::Builder::new()
        .prefix("resdiff-")
        .suffix(&suffix)
        .tempfile()?;
    file.write_all(source)?;
    file.flush()?;

    formatter.format_file(file.path())?;

    // Read back by path: formatters may replace the file rather than write it.
    Ok(std::fs::read(file.path())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Upper-cases the file in place.
    struct UpperCase {
        calls: AtomicUsize,
    }

    impl Formatter for UpperCase {
        fn format_file(&self, path: &Path) -> Result<(), FormatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(path.extension().and_then(|e| e.to_str()), Some("res"));
            let text = std::fs::read_to_string(path)?;
            std::fs::write(path, text.to_uppercase())?;
            Ok(())
        }
    }

    struct Broken;

    impl Formatter for Broken {
        fn format_file(&self, _path: &Path) -> Result<(), FormatError> {
            Err(FormatError::Failed {
                program: "broken".to_string(),
                status: "exit status: 1".to_string(),
                stderr: String::new(),
            })
        }
    }

    #[test]
    fn test_normalize_applies_formatter() {
        let formatter = UpperCase {
            calls: AtomicUsize::new(0),
        };
        let out = normalize_source(b"let x = 1", "res", &formatter);
        assert_eq!(out, b"LET X = 1");
        assert_eq!(formatter.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_normalize_accepts_dotted_extension() {
        let formatter = UpperCase {
            calls: AtomicUsize::new(0),
        };
        assert_eq!(normalize_source(b"a", ".res", &formatter), b"A");
    }

    #[test]
    fn test_normalize_failure_returns_input() {
        let out = normalize_source(b"let x = 1", "res", &Broken);
        assert_eq!(out, b"let x = 1");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let formatter = CommandFormatter::new("resdiff-no-such-formatter", vec![]);
        let err = formatter.format_file(Path::new("x.res")).unwrap_err();
        assert!(matches!(err, FormatError::Spawn { .. }));
        assert_eq!(normalize_source(b"abc", "res", &formatter), b"abc");
    }

    #[test]
    fn test_from_command_line() {
        assert_eq!(
            CommandFormatter::from_command_line("npx rescript format"),
            Some(CommandFormatter::rescript())
        );
        assert_eq!(CommandFormatter::from_command_line("   "), None);
    }
}
