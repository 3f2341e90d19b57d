//! resdiff configuration loading from `.resdiff.toml`.
//!
//! Configuration is optional. The file is looked up in the repository (or
//! working) directory; without it resdiff uses built-in defaults, and
//! command-line flags always take precedence.
//!
//! # Example Configuration
//!
//! ```toml
//! [grammar]
//! library = "grammars/librescript.so"
//! symbol = "tree_sitter_rescript"
//! extensions = ["res"]
//! strict = false
//! comment_kinds = ["comment"]
//!
//! [formatter]
//! enabled = true
//! command = "npx rescript format"
//!
//! [output]
//! format = "table"
//! color = true
//!
//! [diff]
//! threads = 4
//! module_names = "module"
//! ```

use std::path::{Path, PathBuf};

use resdiff_core::DeclarationRule;
use serde::Deserialize;

/// File name looked up in the repository root.
pub const CONFIG_FILE: &str = ".resdiff.toml";

/// Root configuration structure loaded from `.resdiff.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct ResdiffConfig {
    /// Grammar loading and declaration rules.
    #[serde(default)]
    pub grammar: GrammarConfig,

    /// Source pre-normalization.
    #[serde(default)]
    pub formatter: FormatterConfig,

    /// Output formatting preferences.
    #[serde(default)]
    pub output: OutputSettings,

    /// Batch diff settings.
    #[serde(default)]
    pub diff: DiffSettings,
}

/// Grammar configuration.
#[derive(Debug, Deserialize)]
pub struct GrammarConfig {
    /// Path of the compiled grammar shared library, relative to the
    /// configuration file.
    #[serde(default)]
    pub library: Option<PathBuf>,

    /// Language function exported by the library.
    ///
    /// Derived from the library file name when absent.
    #[serde(default)]
    pub symbol: Option<String>,

    /// File extensions diffed by the `commits` and `branches` commands.
    ///
    /// Default: `["res"]`
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Fail modules whose source contains syntax errors.
    #[serde(default)]
    pub strict: bool,

    /// Custom declaration rules replacing the built-in ReScript set.
    ///
    /// # Example
    /// ```toml
    /// [[grammar.rules]]
    /// node = "let_declaration"
    /// kind = "function"
    /// binding = "let_binding"
    /// name = "value_identifier"
    /// ```
    #[serde(default)]
    pub rules: Option<Vec<DeclarationRule>>,

    /// Node types treated as comments and ignored when comparing
    /// declarations. Other extras such as decorators still count.
    ///
    /// Default: `["comment", "line_comment", "block_comment"]`
    #[serde(default)]
    pub comment_kinds: Option<Vec<String>>,
}

fn default_extensions() -> Vec<String> {
    vec!["res".to_string()]
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            library: None,
            symbol: None,
            extensions: default_extensions(),
            strict: false,
            rules: None,
            comment_kinds: None,
        }
    }
}

/// Formatter run on each revision before parsing.
#[derive(Debug, Deserialize)]
pub struct FormatterConfig {
    /// Default: `true`
    #[serde(default = "default_formatter_enabled")]
    pub enabled: bool,

    /// Command line; the scratch file path is appended.
    ///
    /// Default: `npx rescript format`
    #[serde(default)]
    pub command: Option<String>,
}

fn default_formatter_enabled() -> bool {
    true
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: None,
        }
    }
}

/// Output formatting preferences.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Default output format: `table`, `json` or `mu`.
    #[serde(default)]
    pub format: Option<String>,

    /// Whether to use colored output.
    #[serde(default)]
    pub color: Option<bool>,
}

/// How modules read from a repository are named in reports.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModuleNaming {
    /// Derived from the file name (`user_profile.res` becomes `UserProfile`).
    #[default]
    Module,
    /// The repository-relative path.
    Path,
}

/// Batch diff settings.
#[derive(Debug, Deserialize, Default)]
pub struct DiffSettings {
    /// Worker threads; all cores when absent.
    #[serde(default)]
    pub threads: Option<usize>,

    #[serde(default)]
    pub module_names: ModuleNaming,
}

impl ResdiffConfig {
    /// Load configuration from `.resdiff.toml` in the given directory.
    ///
    /// A missing file yields defaults. Unreadable or invalid files are logged
    /// as warnings and also yield defaults.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str::<ResdiffConfig>(&content) {
                    Ok(mut config) => {
                        config.resolve_paths(root);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", CONFIG_FILE, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", CONFIG_FILE, e);
                }
            }
        }
        Self::default()
    }

    fn resolve_paths(&mut self, root: &Path) {
        if let Some(library) = &self.grammar.library {
            if library.is_relative() {
                self.grammar.library = Some(root.join(library));
            }
        }
    }

    /// Get the default output format, if configured.
    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    /// Returns the configured value, or `None` to use auto-detection.
    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }

    /// Whether `path` has one of the configured extensions.
    pub fn matches_extension(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.grammar
                    .extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resdiff_core::DeclarationKind;

    #[test]
    fn test_default_config() {
        let config = ResdiffConfig::default();
        assert!(config.grammar.library.is_none());
        assert_eq!(config.grammar.extensions, vec!["res"]);
        assert!(!config.grammar.strict);
        assert!(config.grammar.comment_kinds.is_none());
        assert!(config.formatter.enabled);
        assert!(config.output.format.is_none());
        assert_eq!(config.diff.module_names, ModuleNaming::Module);
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[grammar]
library = "/opt/grammars/librescript.so"
symbol = "tree_sitter_rescript"
extensions = ["res", "resi"]
strict = true
comment_kinds = ["comment"]

[[grammar.rules]]
node = "let_declaration"
kind = "function"
binding = "let_binding"
name = "value_identifier"

[[grammar.rules]]
node = "external_declaration"
kind = "external"
name = "value_identifier"

[formatter]
enabled = false
command = "rescript format"

[output]
format = "json"
color = false

[diff]
threads = 4
module_names = "path"
"#;
        let config: ResdiffConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(
            config.grammar.library,
            Some(PathBuf::from("/opt/grammars/librescript.so"))
        );
        assert_eq!(config.grammar.extensions, vec!["res", "resi"]);
        assert!(config.grammar.strict);
        assert_eq!(config.grammar.comment_kinds, Some(vec!["comment".to_string()]));

        let rules = config.grammar.rules.as_ref().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].binding.as_deref(), Some("let_binding"));
        assert_eq!(rules[1].kind, DeclarationKind::External);
        assert_eq!(rules[1].binding, None);

        assert!(!config.formatter.enabled);
        assert_eq!(config.formatter.command.as_deref(), Some("rescript format"));
        assert_eq!(config.default_format(), Some("json"));
        assert_eq!(config.use_color(), Some(false));
        assert_eq!(config.diff.threads, Some(4));
        assert_eq!(config.diff.module_names, ModuleNaming::Path);
    }

    #[test]
    fn test_matches_extension() {
        let config = ResdiffConfig::default();
        assert!(config.matches_extension("src/Button.res"));
        assert!(config.matches_extension("src/Button.RES"));
        assert!(!config.matches_extension("src/Button.resi"));
        assert!(!config.matches_extension("src/Button.res.js"));
        assert!(!config.matches_extension("Makefile"));
    }

    #[test]
    fn test_load_resolves_relative_library() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[grammar]\nlibrary = \"grammars/librescript.so\"\n",
        )
        .unwrap();

        let config = ResdiffConfig::load(dir.path());
        assert_eq!(
            config.grammar.library,
            Some(dir.path().join("grammars/librescript.so"))
        );
    }

    #[test]
    fn test_load_invalid_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[grammar\nbroken").unwrap();

        let config = ResdiffConfig::load(dir.path());
        assert!(config.grammar.library.is_none());
        assert!(config.formatter.enabled);
    }
}
