//! Declaration forms recognised by the extractor.
//!
//! A grammar is described as data: which node types are top-level
//! declarations, which [`DeclarationKind`] they belong to, and how to find the
//! identifier that names them.

use serde::{Deserialize, Serialize};

use crate::syntax::SyntaxNode;

/// Kind of a top-level declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    /// Functions and other let-bound values.
    Function,
    /// Type declarations.
    Type,
    /// Externally bound declarations.
    External,
}

impl DeclarationKind {
    /// All kinds, in report order.
    pub const ALL: [DeclarationKind; 3] = [
        DeclarationKind::Function,
        DeclarationKind::Type,
        DeclarationKind::External,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Function => "function",
            DeclarationKind::Type => "type",
            DeclarationKind::External => "external",
        }
    }

    /// Plural label used in summaries.
    pub fn plural(&self) -> &'static str {
        match self {
            DeclarationKind::Function => "functions",
            DeclarationKind::Type => "types",
            DeclarationKind::External => "externals",
        }
    }
}

/// How to recognise one declaration form and resolve its name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationRule {
    /// Node type of the declaration, e.g. `let_declaration`.
    pub node: String,

    /// Kind the declaration is indexed under.
    pub kind: DeclarationKind,

    /// Intermediate child holding the name (e.g. `let_binding`).
    /// When absent the name is a direct named child.
    #[serde(default)]
    pub binding: Option<String>,

    /// Node type of the identifier, e.g. `value_identifier`.
    pub name: String,
}

impl DeclarationRule {
    pub fn new(node: &str, kind: DeclarationKind, binding: Option<&str>, name: &str) -> Self {
        Self {
            node: node.to_string(),
            kind,
            binding: binding.map(str::to_string),
            name: name.to_string(),
        }
    }

    /// Resolve the declared name, or `None` if no identifier is found.
    ///
    /// The first match in document order wins.
    pub fn resolve_name<N: SyntaxNode>(&self, node: &N) -> Option<String> {
        for child in node.children() {
            match &self.binding {
                Some(binding) if child.kind() == binding => {
                    let found = child
                        .children()
                        .into_iter()
                        .find(|g| g.is_named() && g.kind() == self.name);
                    if let Some(ident) = found {
                        return Some(ident.text().into_owned());
                    }
                }
                None if child.is_named() && child.kind() == self.name => {
                    return Some(child.text().into_owned());
                }
                _ => {}
            }
        }
        None
    }
}

/// Node types treated as comments unless a grammar says otherwise.
pub const DEFAULT_COMMENT_KINDS: [&str; 3] = ["comment", "line_comment", "block_comment"];

/// Set of declaration rules for one language.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclarationGrammar {
    rules: Vec<DeclarationRule>,
    comment_kinds: Vec<String>,
}

impl DeclarationGrammar {
    /// Build a grammar from custom rules. Later rules for the same node type
    /// are ignored.
    pub fn new(rules: Vec<DeclarationRule>) -> Self {
        Self {
            rules,
            comment_kinds: DEFAULT_COMMENT_KINDS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Replace the node types treated as comments.
    ///
    /// Only extras of these types are left out of signatures; other extras
    /// (decorators, for instance) are compared like any named node.
    pub fn with_comment_kinds(mut self, kinds: Vec<String>) -> Self {
        self.comment_kinds = kinds;
        self
    }

    pub fn comment_kinds(&self) -> &[String] {
        &self.comment_kinds
    }

    /// Declaration forms of the ReScript tree-sitter grammar.
    pub fn rescript() -> Self {
        Self::new(vec![
            DeclarationRule::new(
                "let_declaration",
                DeclarationKind::Function,
                Some("let_binding"),
                "value_identifier",
            ),
            DeclarationRule::new(
                "type_declaration",
                DeclarationKind::Type,
                Some("type_binding"),
                "type_identifier",
            ),
            DeclarationRule::new(
                "external_declaration",
                DeclarationKind::External,
                None,
                "value_identifier",
            ),
        ])
    }

    /// Rule matching a node type, if any.
    pub fn rule_for(&self, node_kind: &str) -> Option<&DeclarationRule> {
        self.rules.iter().find(|rule| rule.node == node_kind)
    }

    pub fn rules(&self) -> &[DeclarationRule] {
        &self.rules
    }
}

impl Default for DeclarationGrammar {
    fn default() -> Self {
        Self::rescript()
    }
}
