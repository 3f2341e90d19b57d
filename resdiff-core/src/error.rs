//! Error types for resdiff-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for resdiff-core operations.
pub type Result<T> = std::result::Result<T, DiffError>;

/// Errors that abort the diff of a single module.
///
/// Declarations whose name cannot be resolved and formatter failures are not
/// represented here: the former are skipped during extraction and the latter
/// are reported as [`FormatError`] and then ignored.
#[derive(Error, Debug)]
pub enum DiffError {
    /// The grammar shared library could not be opened or its language
    /// function could not be resolved.
    #[error("Failed to load grammar from {path}: {message}")]
    GrammarLoad {
        /// Path of the shared library.
        path: PathBuf,
        /// Description of the loading error.
        message: String,
    },

    /// The grammar was built for an incompatible tree-sitter ABI.
    #[error("Incompatible grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    /// Source could not be parsed into a syntax tree.
    #[error("Failed to parse {module}: {reason}")]
    Parse {
        /// Module whose source failed to parse.
        module: String,
        /// Description of the failure.
        reason: String,
    },

    /// Neither the old nor the new revision of a module was supplied.
    #[error("Module {0} has neither an old nor a new revision")]
    MissingRevisions(String),

    /// A revision of a module could not be read from its source.
    #[error("Failed to read {module} at {revision}: {reason}")]
    SourceUnavailable {
        module: String,
        revision: String,
        reason: String,
    },
}

/// Errors from the pre-normalization formatter.
///
/// These never abort a diff; the pipeline logs them and continues with the
/// unformatted source.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The formatter process could not be started.
    #[error("Failed to run formatter `{program}`: {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The formatter exited unsuccessfully.
    #[error("Formatter `{program}` exited with {status}: {stderr}")]
    Failed {
        /// Program that was invoked.
        program: String,
        /// Exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// Scratch file handling failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
