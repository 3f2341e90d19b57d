//! resdiff core - Semantic diffing of ReScript modules.
//!
//! Compares two revisions of a source file at the level of top-level
//! declarations rather than lines. Each revision is parsed with tree-sitter,
//! its functions, types and externals are indexed by name, and every
//! declaration is reduced to a structural signature that ignores whitespace,
//! punctuation and comments. Diffing the two indexes yields what was added,
//! deleted or modified.
//!
//! # Features
//!
//! - **Formatting-insensitive**: reindenting or commenting code is not a change
//! - **Grammar as data**: declaration forms are configurable rules
//! - **Runtime grammars**: load any compiled tree-sitter grammar
//! - **Parallel batches**: diff many modules concurrently using Rayon
//!
//! # Usage
//!
//! ```rust,ignore
//! use resdiff_core::{DiffEngine, GrammarLibrary, ModuleSource};
//!
//! let grammar = GrammarLibrary::load_default("librescript.so")?;
//! let engine = DiffEngine::new(grammar.language().clone());
//!
//! let source = ModuleSource::new("Math", "src/Math.res")
//!     .with_old("let add = (a, b) => a + b")
//!     .with_new("let add = (a, b) => a + b + 1");
//! let report = engine.diff_module(&source)?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

pub mod differ;
pub mod error;
pub mod extractor;
pub mod formatter;
pub mod grammar;
pub mod language;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod signature;
pub mod syntax;

pub use differ::{ChangeEntry, ChangeType};
pub use error::{DiffError, FormatError, Result};
pub use extractor::{extract_declarations, Declaration, ModuleDeclarations};
pub use formatter::{normalize_source, CommandFormatter, Formatter};
pub use grammar::{DeclarationGrammar, DeclarationKind, DeclarationRule};
pub use language::GrammarLibrary;
pub use pipeline::{BatchOutcome, DiffEngine, FileStatus, ModuleFailure, ModuleSource};
pub use report::{assemble_report, module_name_from_path, ChangeSummary, ModuleChangeReport};
pub use signature::{canonicalize, Signature};
pub use syntax::{SyntaxNode, TsNode};
