//! Command implementations for the resdiff CLI.
//!
//! Every command gathers [`ModuleSource`]s, diffs them through a shared
//! [`Session`] and hands the outcome to [`finish`].

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use resdiff_core::{
    module_name_from_path, BatchOutcome, ChangeEntry, ChangeType, CommandFormatter,
    DeclarationGrammar, DeclarationKind, DiffEngine, GrammarLibrary, ModuleChangeReport,
    ModuleFailure, ModuleSource,
};
use serde::Serialize;

use crate::config::{ModuleNaming, ResdiffConfig};
use crate::output::{change_marker, JsonOutput, Output, OutputConfig, Sigil, TableDisplay};

pub mod branches;
pub mod commits;
pub mod files;

/// Flags shared by all diff commands.
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    pub grammar: Option<PathBuf>,
    pub symbol: Option<String>,
    pub no_format: bool,
    pub strict: bool,
    pub threads: Option<usize>,
    pub output_file: Option<PathBuf>,
}

/// A loaded grammar, the engine built on it and the effective settings.
pub struct Session {
    // Declared before the library so the engine's language handle is
    // dropped while the library is still mapped.
    engine: DiffEngine,
    _library: Option<GrammarLibrary>,
    config: ResdiffConfig,
    threads: Option<usize>,
}

impl Session {
    /// Load the grammar and build the engine. Flags override `config`.
    pub fn open(options: &DiffOptions, config: ResdiffConfig) -> Result<Self> {
        let library_path = options
            .grammar
            .clone()
            .or_else(|| config.grammar.library.clone())
            .context(
                "No grammar library configured. Pass --grammar, set RESDIFF_GRAMMAR \
                 or set [grammar].library in .resdiff.toml",
            )?;
        let symbol = options
            .symbol
            .clone()
            .or_else(|| config.grammar.symbol.clone())
            .unwrap_or_else(|| GrammarLibrary::default_symbol(&library_path));

        let library = GrammarLibrary::load(&library_path, &symbol)?;
        let engine = DiffEngine::new(library.language().clone());
        let mut session = Self::new(engine, options, config)?;
        session._library = Some(library);
        Ok(session)
    }

    /// Configure `engine` from `config` and `options`.
    ///
    /// For engines whose language is linked into the binary rather than
    /// loaded from a library.
    pub fn new(engine: DiffEngine, options: &DiffOptions, config: ResdiffConfig) -> Result<Self> {
        let mut rules = match &config.grammar.rules {
            Some(rules) => DeclarationGrammar::new(rules.clone()),
            None => DeclarationGrammar::rescript(),
        };
        if let Some(kinds) = &config.grammar.comment_kinds {
            rules = rules.with_comment_kinds(kinds.clone());
        }
        let mut engine = engine
            .with_grammar(rules)
            .with_strict(options.strict || config.grammar.strict);
        tracing::debug!(
            rules = engine.grammar().rules().len(),
            comment_kinds = ?engine.grammar().comment_kinds(),
            "declaration grammar ready"
        );

        if !options.no_format && config.formatter.enabled {
            let formatter = match &config.formatter.command {
                Some(command) => CommandFormatter::from_command_line(command)
                    .with_context(|| format!("Invalid formatter command '{}'", command))?,
                None => CommandFormatter::rescript(),
            };
            tracing::debug!(program = %formatter.program, "formatter enabled");
            engine = engine.with_formatter(Arc::new(formatter));
        }

        let threads = options.threads.or(config.diff.threads);
        Ok(Self {
            engine,
            _library: None,
            config,
            threads,
        })
    }

    pub fn config(&self) -> &ResdiffConfig {
        &self.config
    }

    /// Report name of a repository file.
    pub fn module_name(&self, path: &str) -> String {
        match self.config.diff.module_names {
            ModuleNaming::Module => module_name_from_path(path),
            ModuleNaming::Path => path.to_string(),
        }
    }

    pub fn diff(&self, sources: &[ModuleSource]) -> BatchOutcome {
        tracing::info!(modules = sources.len(), "diffing modules");
        self.engine.diff_modules(sources, self.threads)
    }
}

/// Reports of one run, labelled with what was compared.
///
/// Serializes as the bare report array.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct DiffRun {
    pub reports: Vec<ModuleChangeReport>,
    #[serde(skip)]
    pub base: String,
    #[serde(skip)]
    pub head: String,
}

const CHANGE_ORDER: [ChangeType; 3] = [
    ChangeType::Added,
    ChangeType::Modified,
    ChangeType::Deleted,
];

impl DiffRun {
    pub fn new(
        base: impl Into<String>,
        head: impl Into<String>,
        reports: Vec<ModuleChangeReport>,
    ) -> Self {
        Self {
            reports,
            base: base.into(),
            head: head.into(),
        }
    }

    fn change_count(&self) -> usize {
        self.reports.iter().map(ModuleChangeReport::change_count).sum()
    }

    /// Entries of a report in display order.
    fn entries(
        report: &ModuleChangeReport,
    ) -> impl Iterator<Item = (DeclarationKind, &ChangeEntry)> {
        CHANGE_ORDER.into_iter().flat_map(move |change_type| {
            DeclarationKind::ALL.into_iter().flat_map(move |kind| {
                report
                    .entries(kind, change_type)
                    .iter()
                    .map(move |entry| (kind, entry))
            })
        })
    }
}

impl TableDisplay for DiffRun {
    fn to_table(&self, config: &OutputConfig) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} {} -> {}\n",
            "DIFF:".cyan().bold(),
            self.base.yellow(),
            self.head.green()
        ));
        output.push_str(&format!(
            "Found {} changes in {} modules\n\n",
            self.change_count().to_string().cyan(),
            self.reports.len()
        ));

        if self.change_count() == 0 {
            output.push_str(&format!("{}\n", "No semantic changes detected.".dimmed()));
            return output;
        }

        for report in self.reports.iter().filter(|r| !r.is_empty()) {
            output.push_str(&format!(
                "{} {}\n",
                report.module_name.bold(),
                format!("({})", report.summary().text()).dimmed()
            ));
            for (kind, entry) in Self::entries(report) {
                let name = match entry.change_type {
                    ChangeType::Added => entry.name.green(),
                    ChangeType::Modified => entry.name.yellow(),
                    ChangeType::Deleted => entry.name.red(),
                };
                output.push_str(&format!(
                    "  {} {} {}\n",
                    change_marker(entry.change_type, config.use_colors()),
                    name,
                    format!("[{}]", kind.as_str()).dimmed()
                ));
            }
            output.push('\n');
        }

        let unchanged = self.reports.iter().filter(|r| r.is_empty()).count();
        if unchanged > 0 {
            output.push_str(&format!(
                "{}\n",
                format!("{} modules without declaration changes", unchanged).dimmed()
            ));
        }

        output
    }

    fn to_mu(&self, config: &OutputConfig) -> String {
        let colors = config.use_colors();
        let mut output = String::new();

        output.push_str(&format!(
            "{} diff {}..{}\n",
            Sigil::Section.format(colors),
            self.base,
            self.head
        ));
        output.push_str(&format!("# modules: {}\n", self.reports.len()));
        output.push_str(&format!("# changes: {}\n", self.change_count()));

        for report in self.reports.iter().filter(|r| !r.is_empty()) {
            output.push_str(&format!(
                "\n{} {}\n",
                Sigil::Module.format(colors),
                report.module_name
            ));
            for (kind, entry) in Self::entries(report) {
                output.push_str(&format!(
                    "  {} {} {}\n",
                    change_marker(entry.change_type, colors),
                    Sigil::for_kind(kind).format(colors),
                    entry.name
                ));
            }
        }

        output
    }
}

/// Render the outcome, write the optional JSON file and report failures.
///
/// Returns whether every module diffed cleanly.
pub fn finish(
    run: DiffRun,
    failures: &[ModuleFailure],
    options: &DiffOptions,
    output: OutputConfig,
) -> Result<bool> {
    if let Some(path) = &options.output_file {
        JsonOutput::write_file(&run.reports, path)?;
        tracing::info!(path = %path.display(), "wrote report");
    }

    Output::new(run, output).render()?;

    for failure in failures {
        eprintln!(
            "{} {} ({}): {}",
            "ERROR:".red().bold(),
            failure.module_name,
            failure.path.display(),
            failure.error
        );
    }

    Ok(failures.is_empty())
}

/// Split a batch outcome into a labelled run and its failures.
pub fn into_run(
    base: impl Into<String>,
    head: impl Into<String>,
    outcome: BatchOutcome,
) -> (DiffRun, Vec<ModuleFailure>) {
    (DiffRun::new(base, head, outcome.reports), outcome.failures)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use resdiff_core::DiffError;

    fn sample_run() -> DiffRun {
        let mut math = ModuleChangeReport::new("Math");
        math.modified_functions.push(ChangeEntry::modified(
            "add",
            "let add = (a, b) => a + b",
            "let add = (a, b) => a + b + 1",
        ));
        math.added_types
            .push(ChangeEntry::added("user", "type user = {name: string}"));
        let quiet = ModuleChangeReport::new("Quiet");
        DiffRun::new("main", "feature", vec![math, quiet])
    }

    fn plain(format: OutputFormat) -> OutputConfig {
        OutputConfig {
            format,
            no_color: true,
            compact: false,
        }
    }

    #[test]
    fn test_json_is_report_array() {
        let run = sample_run();
        let json: serde_json::Value =
            serde_json::from_str(&run.render(&plain(OutputFormat::Json))).unwrap();
        let array = json.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["moduleName"], "Math");
        assert_eq!(array[0]["addedTypes"][0][0], "user");
        assert_eq!(array[1]["moduleName"], "Quiet");
    }

    #[test]
    fn test_mu_output() {
        colored::control::set_override(false);
        let mu = sample_run().to_mu(&plain(OutputFormat::Mu));
        assert!(mu.starts_with(":: diff main..feature\n"));
        assert!(mu.contains("# changes: 2"));
        assert!(mu.contains("! Math\n  + @ user\n  ~ $ add\n"));
        assert!(!mu.contains("Quiet"));
    }

    #[test]
    fn test_table_output() {
        colored::control::set_override(false);
        let table = sample_run().to_table(&plain(OutputFormat::Table));
        assert!(table.contains("Found 2 changes in 2 modules"));
        assert!(table.contains("Math (functions: 1 modified; types: 1 added)"));
        assert!(table.contains("  + user [type]"));
        assert!(table.contains("  ~ add [function]"));
        assert!(table.contains("1 modules without declaration changes"));
    }

    #[test]
    fn test_table_without_changes() {
        colored::control::set_override(false);
        let run = DiffRun::new("a", "b", vec![ModuleChangeReport::new("Same")]);
        assert!(run
            .to_table(&plain(OutputFormat::Table))
            .contains("No semantic changes detected."));
    }

    #[test]
    fn test_session_applies_config_and_flags() {
        let session =
            testing::rust_session("\n[diff]\nthreads = 3\nmodule_names = \"path\"\n");
        assert_eq!(session.threads, Some(3));
        assert_eq!(session.module_name("src/user_profile.rs"), "src/user_profile.rs");
        assert_eq!(session.engine.grammar().rules().len(), 2);

        let config: ResdiffConfig =
            toml::from_str("[grammar]\ncomment_kinds = [\"line_comment\"]\n").unwrap();
        let options = DiffOptions {
            threads: Some(1),
            no_format: true,
            ..DiffOptions::default()
        };
        let engine = DiffEngine::new(tree_sitter_rust::LANGUAGE.into());
        let session = Session::new(engine, &options, config).unwrap();
        assert_eq!(session.threads, Some(1));
        assert_eq!(session.module_name("src/user_profile.res"), "UserProfile");
        assert_eq!(
            session.engine.grammar().comment_kinds(),
            ["line_comment".to_string()]
        );
    }

    #[test]
    fn test_finish_reports_failures_and_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/report.json");
        let options = DiffOptions {
            output_file: Some(path.clone()),
            ..DiffOptions::default()
        };

        let clean = finish(sample_run(), &[], &options, plain(OutputFormat::Json)).unwrap();
        assert!(clean);
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[0]["moduleName"], "Math");
        assert_eq!(written[0]["modifiedFunctions"][0][0], "add");

        let failure = ModuleFailure {
            module_name: "Broken".to_string(),
            path: PathBuf::from("src/Broken.res"),
            error: DiffError::MissingRevisions("Broken".to_string()),
        };
        let clean = finish(sample_run(), &[failure], &options, plain(OutputFormat::Mu)).unwrap();
        assert!(!clean);
    }
}
