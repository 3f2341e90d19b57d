//! Runtime loading of compiled tree-sitter grammars.

use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use tree_sitter::Language;
use tree_sitter_language::LanguageFn;

use crate::error::{DiffError, Result};

/// Symbol exported by the ReScript grammar.
pub const DEFAULT_SYMBOL: &str = "tree_sitter_rescript";

type RawLanguageFn = unsafe extern "C" fn() -> *const ();

/// A grammar loaded from a shared library.
///
/// The library stays mapped for as long as this value lives, so the
/// [`Language`] it hands out must not outlive it.
pub struct GrammarLibrary {
    language: Language,
    path: PathBuf,
    _library: Library,
}

impl GrammarLibrary {
    /// Open `path` and resolve the language function `symbol`.
    pub fn load(path: impl AsRef<Path>, symbol: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let load_error = |message: String| DiffError::GrammarLoad {
            path: path.clone(),
            message,
        };

        // SAFETY: grammar libraries only run their static initializers on load.
        let library = unsafe { Library::new(&path) }.map_err(|e| load_error(e.to_string()))?;

        let language = {
            // SAFETY: tree-sitter grammars export `const TSLanguage *tree_sitter_<name>(void)`.
            let func: Symbol<RawLanguageFn> = unsafe { library.get(symbol.as_bytes()) }
                .map_err(|e| load_error(format!("symbol `{}`: {}", symbol, e)))?;
            let language_fn = unsafe { LanguageFn::from_raw(*func) };
            Language::new(language_fn)
        };

        tracing::debug!(
            path = %path.display(),
            symbol,
            abi = language.version(),
            "loaded grammar"
        );

        Ok(Self {
            language,
            path,
            _library: library,
        })
    }

    /// Load with the symbol derived from the file name.
    pub fn load_default(path: impl AsRef<Path>) -> Result<Self> {
        let symbol = Self::default_symbol(path.as_ref());
        Self::load(path, &symbol)
    }

    /// Derive `tree_sitter_<name>` from a library file name.
    ///
    /// `librescript.so`, `rescript.dylib` and `tree-sitter-rescript.so` all
    /// map to `tree_sitter_rescript`. Unrecognisable names fall back to
    /// [`DEFAULT_SYMBOL`].
    pub fn default_symbol(path: &Path) -> String {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return DEFAULT_SYMBOL.to_string();
        };

        let name = stem.strip_prefix("lib").unwrap_or(stem);
        let name = name
            .strip_prefix("tree-sitter-")
            .or_else(|| name.strip_prefix("tree_sitter_"))
            .unwrap_or(name);

        if name.is_empty() {
            DEFAULT_SYMBOL.to_string()
        } else {
            format!("tree_sitter_{}", name.replace('-', "_"))
        }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for GrammarLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrammarLibrary")
            .field("path", &self.path)
            .field("abi", &self.language.version())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_symbol() {
        let cases = [
            ("librescript.so", "tree_sitter_rescript"),
            ("/opt/grammars/rescript.dylib", "tree_sitter_rescript"),
            ("tree-sitter-rescript.so", "tree_sitter_rescript"),
            ("libtree-sitter-rescript.so", "tree_sitter_rescript"),
            ("libocaml-interface.so", "tree_sitter_ocaml_interface"),
        ];
        for (file, expected) in cases {
            assert_eq!(GrammarLibrary::default_symbol(Path::new(file)), expected);
        }
        assert_eq!(GrammarLibrary::default_symbol(Path::new("lib.so")), DEFAULT_SYMBOL);
    }

    #[test]
    fn test_load_missing_library_fails() {
        let err = GrammarLibrary::load("/nonexistent/librescript.so", DEFAULT_SYMBOL).unwrap_err();
        match err {
            DiffError::GrammarLoad { path, .. } => {
                assert_eq!(path, PathBuf::from("/nonexistent/librescript.so"));
            }
            other => panic!("expected GrammarLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_load_non_library_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("librescript.so");
        std::fs::write(&path, b"not a shared object").unwrap();

        assert!(matches!(
            GrammarLibrary::load(&path, DEFAULT_SYMBOL),
            Err(DiffError::GrammarLoad { .. })
        ));
    }
}
