//! resdiff CLI - Declaration-level diffs of ReScript code.
//!
//! Reports which top-level functions, types and externals were added,
//! deleted or modified between two files, two commits, or a branch and the
//! branch it will merge into. Pure reformatting is not a change.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod git;
mod output;

use commands::{branches, commits, files, DiffOptions, Session};
use config::ResdiffConfig;
use git::GitRepo;
use output::{OutputConfig, OutputFormat};

/// Semantic diffs of ReScript modules.
#[derive(Parser)]
#[command(name = "resdiff")]
#[command(author, version)]
#[command(about = "Declaration-level diffs of ReScript modules")]
#[command(propagate_version = true)]
#[command(after_help = "Examples:
  resdiff files old/Api.res src/Api.res
  resdiff commits HEAD~3
  resdiff branches feature/login main -C ../app --format json -o report.json")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Compiled tree-sitter grammar library
    #[arg(long, global = true, env = "RESDIFF_GRAMMAR")]
    grammar: Option<PathBuf>,

    /// Language function exported by the grammar library
    #[arg(long, global = true)]
    symbol: Option<String>,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    compact: bool,

    /// Also write the JSON report array to this file
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Skip running the formatter before parsing
    #[arg(long, global = true)]
    no_format: bool,

    /// Fail modules whose source contains syntax errors
    #[arg(long, global = true)]
    strict: bool,

    /// Number of worker threads (default: all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Diff two source files
    Files {
        /// Old revision of the file
        old: PathBuf,

        /// New revision of the file
        new: PathBuf,

        /// Module name used in the report (default: derived from the new file name)
        #[arg(long)]
        module_name: Option<String>,
    },

    /// Diff all changed modules between two commits
    #[command(visible_alias = "c")]
    Commits {
        /// Base revision
        base: String,

        /// Head revision
        #[arg(default_value = "HEAD")]
        head: String,

        /// Repository path
        #[arg(short = 'C', long, default_value = ".")]
        repo: PathBuf,
    },

    /// Diff a branch against the branch it merges into
    #[command(visible_alias = "b")]
    Branches {
        /// Source branch with the changes
        from: String,

        /// Target branch
        to: String,

        /// Repository path
        #[arg(short = 'C', long, default_value = ".")]
        repo: PathBuf,

        /// Use local refs without fetching from origin
        #[arg(long)]
        no_fetch: bool,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        println!();
        return Ok(ExitCode::SUCCESS);
    };

    let repo = match &command {
        Commands::Files { .. } => None,
        Commands::Commits { repo, .. } | Commands::Branches { repo, .. } => {
            Some(GitRepo::open(repo)?)
        }
    };

    // Configuration lives at the repository root, or the working directory
    // when diffing plain files.
    let config = ResdiffConfig::load(repo.as_ref().map_or(Path::new("."), GitRepo::root));

    // Resolve output format: CLI flag > config default > Table
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or(OutputFormat::Table)
    });

    if let Some(use_color) = config.use_color() {
        colored::control::set_override(use_color);
    }
    let mut output = OutputConfig::auto_detect(format, config.use_color());
    if cli.compact {
        output = output.compact();
    }

    let options = DiffOptions {
        grammar: cli.grammar,
        symbol: cli.symbol,
        no_format: cli.no_format,
        strict: cli.strict,
        threads: cli.threads,
        output_file: cli.output,
    };

    let session = Session::open(&options, config)?;
    let (run, failures) = match (command, &repo) {
        (
            Commands::Files {
                old,
                new,
                module_name,
            },
            _,
        ) => files::run(&session, &old, &new, module_name.as_deref())?,
        (Commands::Commits { base, head, .. }, Some(repo)) => {
            commits::run(&session, repo, &base, &head)?
        }
        (
            Commands::Branches {
                from, to, no_fetch, ..
            },
            Some(repo),
        ) => branches::run(&session, repo, &from, &to, !no_fetch)?,
        (_, None) => anyhow::bail!("No repository opened"),
    };

    if commands::finish(run, &failures, &options, output)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
