//! Parse context for a single source revision.

use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::{DiffError, Result};

/// Owns one tree-sitter parser.
///
/// A `SourceParser` is created per parse call and never shared, so any number
/// of modules can be parsed concurrently.
pub struct SourceParser {
    parser: Parser,
    strict: bool,
}

impl SourceParser {
    pub fn new(language: &Language) -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(language)?;
        Ok(Self {
            parser,
            strict: false,
        })
    }

    /// Reject trees containing syntax errors instead of extracting what
    /// parsed cleanly.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parse `source` for `module`.
    pub fn parse(&mut self, module: &str, source: &[u8]) -> Result<Tree> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| DiffError::Parse {
                module: module.to_string(),
                reason: "parser produced no tree".to_string(),
            })?;

        let root = tree.root_node();
        if root.has_error() {
            let position = first_error(root)
                .map(|node| {
                    let point = node.start_position();
                    format!("{}:{}", point.row + 1, point.column + 1)
                })
                .unwrap_or_else(|| "unknown position".to_string());

            if self.strict {
                return Err(DiffError::Parse {
                    module: module.to_string(),
                    reason: format!("syntax error at {}", position),
                });
            }
            tracing::debug!(module, %position, "source contains syntax errors");
        }

        Ok(tree)
    }
}

/// First ERROR or MISSING node in document order.
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rust() -> Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    #[test]
    fn test_parse_valid_source() {
        let mut parser = SourceParser::new(&rust()).unwrap();
        let tree = parser.parse("Lib", b"fn main() {}").unwrap();
        assert_eq!(tree.root_node().kind(), "source_file");
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn test_lenient_parse_keeps_broken_tree() {
        let mut parser = SourceParser::new(&rust()).unwrap();
        let tree = parser.parse("Lib", b"fn main( {").unwrap();
        assert!(tree.root_node().has_error());
    }

    #[test]
    fn test_strict_parse_rejects_syntax_errors() {
        let mut parser = SourceParser::new(&rust()).unwrap().strict(true);
        let err = parser.parse("Lib", b"fn ok() {}\nfn main( {").unwrap_err();
        match err {
            DiffError::Parse { module, reason } => {
                assert_eq!(module, "Lib");
                assert!(reason.starts_with("syntax error at "), "{}", reason);
            }
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_source() {
        let mut parser = SourceParser::new(&rust()).unwrap().strict(true);
        let tree = parser.parse("Empty", b"").unwrap();
        assert_eq!(tree.root_node().named_child_count(), 0);
    }
}
