//! Per-module diff driver and parallel batch processing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tree_sitter::Language;

use crate::error::{DiffError, Result};
use crate::extractor::{extract_declarations, ModuleDeclarations};
use crate::formatter::{normalize_source, Formatter};
use crate::grammar::DeclarationGrammar;
use crate::parser::SourceParser;
use crate::report::{assemble_report, ChangeSummary, ModuleChangeReport};
use crate::syntax::TsNode;

/// Extension given to formatter scratch files when the module path has none.
pub const DEFAULT_EXTENSION: &str = "res";

/// Whether a module was added, deleted or modified between revisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileStatus {
    Added,
    Deleted,
    Modified,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Deleted => "deleted",
            FileStatus::Modified => "modified",
        }
    }
}

/// Both revisions of one module's source.
///
/// A missing `old` means the module was added, a missing `new` that it was
/// deleted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleSource {
    pub module_name: String,
    pub path: PathBuf,
    pub old: Option<Vec<u8>>,
    pub new: Option<Vec<u8>>,
}

impl ModuleSource {
    pub fn new(module_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            module_name: module_name.into(),
            path: path.into(),
            old: None,
            new: None,
        }
    }

    pub fn with_old(mut self, source: impl Into<Vec<u8>>) -> Self {
        self.old = Some(source.into());
        self
    }

    pub fn with_new(mut self, source: impl Into<Vec<u8>>) -> Self {
        self.new = Some(source.into());
        self
    }

    pub fn status(&self) -> Result<FileStatus> {
        match (&self.old, &self.new) {
            (Some(_), Some(_)) => Ok(FileStatus::Modified),
            (None, Some(_)) => Ok(FileStatus::Added),
            (Some(_), None) => Ok(FileStatus::Deleted),
            (None, None) => Err(DiffError::MissingRevisions(self.module_name.clone())),
        }
    }
}

/// A module whose diff failed.
#[derive(Debug)]
pub struct ModuleFailure {
    pub module_name: String,
    pub path: PathBuf,
    pub error: DiffError,
}

/// Result of diffing a batch of modules.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Reports of all modules that diffed cleanly, sorted by module name.
    pub reports: Vec<ModuleChangeReport>,
    /// Modules that failed, sorted by module name.
    pub failures: Vec<ModuleFailure>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Add failures recorded before diffing, sorted in with the others.
    pub fn with_failures(mut self, failures: Vec<ModuleFailure>) -> Self {
        self.failures.extend(failures);
        self.failures.sort_by(|a, b| {
            a.module_name
                .cmp(&b.module_name)
                .then_with(|| a.path.cmp(&b.path))
        });
        self
    }

    /// Combined change counts of all reports.
    pub fn summary(&self) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        for report in &self.reports {
            summary.merge(&report.summary());
        }
        summary
    }
}

/// Diffs modules with one grammar.
///
/// The engine is shared read-only between worker threads; every parse gets
/// its own [`SourceParser`].
#[derive(Clone)]
pub struct DiffEngine {
    language: Language,
    grammar: DeclarationGrammar,
    formatter: Option<Arc<dyn Formatter>>,
    strict: bool,
}

impl DiffEngine {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            grammar: DeclarationGrammar::default(),
            formatter: None,
            strict: false,
        }
    }

    pub fn with_grammar(mut self, grammar: DeclarationGrammar) -> Self {
        self.grammar = grammar;
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn grammar(&self) -> &DeclarationGrammar {
        &self.grammar
    }

    /// Diff the two revisions of one module.
    pub fn diff_module(&self, source: &ModuleSource) -> Result<ModuleChangeReport> {
        let status = source.status()?;
        let name = source.module_name.as_str();

        let before = self.declarations(name, &source.path, source.old.as_deref())?;
        let after = self.declarations(name, &source.path, source.new.as_deref())?;
        let report = assemble_report(name, &before, &after);

        tracing::debug!(
            module = name,
            status = status.as_str(),
            before = before.len(),
            after = after.len(),
            summary = %report.summary().text(),
            "diffed module"
        );
        Ok(report)
    }

    /// Diff modules in parallel.
    ///
    /// `threads` sizes a dedicated pool; `None` or `Some(0)` uses the global
    /// rayon pool. A failing module is reported in
    /// [`BatchOutcome::failures`] and never affects the others.
    pub fn diff_modules(&self, sources: &[ModuleSource], threads: Option<usize>) -> BatchOutcome {
        let pool = match threads {
            Some(n) if n > 0 => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => Some(pool),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to build thread pool, using global pool");
                    None
                }
            },
            _ => None,
        };

        let diff_all = || {
            sources
                .par_iter()
                .map(|source| (source, self.diff_module(source)))
                .collect::<Vec<_>>()
        };

        let mut results = match pool {
            Some(pool) => pool.install(diff_all),
            None => diff_all(),
        };
        results.sort_by(|(a, _), (b, _)| {
            a.module_name
                .cmp(&b.module_name)
                .then_with(|| a.path.cmp(&b.path))
        });

        let mut outcome = BatchOutcome::default();
        for (source, result) in results {
            match result {
                Ok(report) => outcome.reports.push(report),
                Err(error) => {
                    tracing::warn!(
                        module = %source.module_name,
                        path = %source.path.display(),
                        error = %error,
                        "module diff failed"
                    );
                    outcome.failures.push(ModuleFailure {
                        module_name: source.module_name.clone(),
                        path: source.path.clone(),
                        error,
                    });
                }
            }
        }
        outcome
    }

    fn declarations(
        &self,
        module: &str,
        path: &Path,
        revision: Option<&[u8]>,
    ) -> Result<ModuleDeclarations> {
        let Some(raw) = revision else {
            return Ok(ModuleDeclarations::new());
        };

        let formatted;
        let source = match &self.formatter {
            Some(formatter) => {
                let extension = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or(DEFAULT_EXTENSION);
                formatted = normalize_source(raw, extension, formatter.as_ref());
                formatted.as_slice()
            }
            None => raw,
        };

        let mut parser = SourceParser::new(&self.language)?.strict(self.strict);
        let tree = parser.parse(module, source)?;
        let root = TsNode::root(&tree, source, self.grammar.comment_kinds());
        Ok(extract_declarations(&root, &self.grammar))
    }
}

impl std::fmt::Debug for DiffEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffEngine")
            .field("grammar", &self.grammar)
            .field("formatter", &self.formatter.is_some())
            .field("strict", &self.strict)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::ChangeEntry;
    use crate::error::FormatError;
    use crate::grammar::{DeclarationKind, DeclarationRule};

    fn rust_engine() -> DiffEngine {
        let grammar = DeclarationGrammar::new(vec![
            DeclarationRule::new("function_item", DeclarationKind::Function, None, "identifier"),
            DeclarationRule::new("struct_item", DeclarationKind::Type, None, "type_identifier"),
            DeclarationRule::new("const_item", DeclarationKind::External, None, "identifier"),
        ]);
        DiffEngine::new(tree_sitter_rust::LANGUAGE.into()).with_grammar(grammar)
    }

    #[test]
    fn test_status() {
        let source = ModuleSource::new("M", "m.rs");
        assert!(matches!(source.status(), Err(DiffError::MissingRevisions(_))));
        assert_eq!(
            source.clone().with_new("x").status().unwrap(),
            FileStatus::Added
        );
        assert_eq!(
            source.clone().with_old("x").status().unwrap(),
            FileStatus::Deleted
        );
        assert_eq!(
            source.with_old("x").with_new("y").status().unwrap(),
            FileStatus::Modified
        );
    }

    #[test]
    fn test_diff_module_modified_function() {
        let source = ModuleSource::new("Math", "math.rs")
            .with_old("fn add(a: i32, b: i32) -> i32 { a + b }")
            .with_new("fn add(a: i32, b: i32) -> i32 { a + b + 1 }");
        let report = rust_engine().diff_module(&source).unwrap();

        assert_eq!(
            report.modified_functions,
            vec![ChangeEntry::modified(
                "add",
                "fn add(a: i32, b: i32) -> i32 { a + b }",
                "fn add(a: i32, b: i32) -> i32 { a + b + 1 }"
            )]
        );
        assert_eq!(report.change_count(), 1);
    }

    #[test]
    fn test_diff_module_ignores_layout_and_comments() {
        let source = ModuleSource::new("Math", "math.rs")
            .with_old("fn add(a: i32, b: i32) -> i32 { a + b }")
            .with_new("// adds\nfn add(a:i32,b:i32)->i32{\n    /* sum */ a+b\n}\n");
        assert!(rust_engine().diff_module(&source).unwrap().is_empty());
    }

    #[test]
    fn test_added_file_reports_only_additions() {
        let source = ModuleSource::new("Shapes", "shapes.rs")
            .with_new("struct Point { x: i32 }\nconst ORIGIN: i32 = 0;\nfn area() {}");
        let report = rust_engine().diff_module(&source).unwrap();

        assert_eq!(report.added_functions.len(), 1);
        assert_eq!(report.added_types.len(), 1);
        assert_eq!(report.added_externals.len(), 1);
        assert_eq!(report.change_count(), 3);
    }

    #[test]
    fn test_deleted_file_reports_only_deletions() {
        let source = ModuleSource::new("Shapes", "shapes.rs").with_old("struct Point { x: i32 }");
        let report = rust_engine().diff_module(&source).unwrap();
        assert_eq!(
            report.deleted_types,
            vec![ChangeEntry::deleted("Point", "struct Point { x: i32 }")]
        );
        assert_eq!(report.change_count(), 1);
    }

    #[test]
    fn test_strict_engine_rejects_broken_source() {
        let source = ModuleSource::new("Broken", "broken.rs")
            .with_old("fn ok() {}")
            .with_new("fn ok( {");
        let engine = rust_engine().with_strict(true);
        assert!(matches!(
            engine.diff_module(&source),
            Err(DiffError::Parse { .. })
        ));
    }

    #[test]
    fn test_formatter_runs_on_each_revision() {
        struct Rename;
        impl Formatter for Rename {
            fn format_file(&self, path: &Path) -> std::result::Result<(), FormatError> {
                let text = std::fs::read_to_string(path)?;
                std::fs::write(path, text.replace("old_name", "new_name"))?;
                Ok(())
            }
        }

        let source = ModuleSource::new("M", "m.rs")
            .with_old("fn old_name() {}")
            .with_new("fn new_name() {}");
        let engine = rust_engine().with_formatter(Arc::new(Rename));
        assert!(engine.diff_module(&source).unwrap().is_empty());
    }

    #[test]
    fn test_batch_isolates_failures_and_sorts() {
        let sources = vec![
            ModuleSource::new("Zeta", "zeta.rs").with_new("fn z() {}"),
            ModuleSource::new("Empty", "empty.rs"),
            ModuleSource::new("Alpha", "alpha.rs")
                .with_old("fn a() {}")
                .with_new("fn a() { 1; }"),
        ];
        let outcome = rust_engine().diff_modules(&sources, Some(2));

        let names: Vec<&str> = outcome
            .reports
            .iter()
            .map(|r| r.module_name.as_str())
            .collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].module_name, "Empty");
        assert!(!outcome.is_success());

        let summary = outcome.summary();
        assert_eq!(summary.functions.added, 1);
        assert_eq!(summary.functions.modified, 1);
    }

    #[test]
    fn test_with_failures_merges_sorted() {
        let sources = vec![
            ModuleSource::new("Zeta", "zeta.rs"),
            ModuleSource::new("Alpha", "alpha.rs").with_new("fn a() {}"),
        ];
        let unread = ModuleFailure {
            module_name: "Beta".to_string(),
            path: PathBuf::from("beta.rs"),
            error: DiffError::SourceUnavailable {
                module: "Beta".to_string(),
                revision: "HEAD".to_string(),
                reason: "missing".to_string(),
            },
        };
        let outcome = rust_engine()
            .diff_modules(&sources, None)
            .with_failures(vec![unread]);

        assert_eq!(outcome.reports.len(), 1);
        let failed: Vec<&str> = outcome
            .failures
            .iter()
            .map(|f| f.module_name.as_str())
            .collect();
        assert_eq!(failed, vec!["Beta", "Zeta"]);
    }

    #[test]
    fn test_batch_on_global_pool() {
        let sources: Vec<ModuleSource> = (0..8)
            .map(|i| {
                ModuleSource::new(format!("M{}", i), format!("m{}.rs", i))
                    .with_old(format!("fn f{}() {{}}", i))
                    .with_new(format!("fn f{}() {{}}", i))
            })
            .collect();
        let outcome = rust_engine().diff_modules(&sources, None);
        assert!(outcome.is_success());
        assert_eq!(outcome.reports.len(), 8);
        assert!(outcome.reports.iter().all(ModuleChangeReport::is_empty));
    }
}
