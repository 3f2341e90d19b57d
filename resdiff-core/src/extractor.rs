//! Top-level declaration extraction.
//!
//! Walks a syntax tree depth-first and indexes every outermost declaration by
//! name. A matched declaration is not descended into, so bindings local to a
//! function body never show up in the index.

use std::collections::BTreeMap;

use crate::grammar::{DeclarationGrammar, DeclarationKind};
use crate::signature::{canonicalize, Signature};
use crate::syntax::{named_children, SyntaxNode};

/// One extracted top-level declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub signature: Signature,
    /// Verbatim source text of the declaration.
    pub source_text: String,
}

/// Declarations of one kind, indexed by name.
pub type DeclarationMap = BTreeMap<String, Declaration>;

/// All declarations extracted from one tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleDeclarations {
    pub functions: DeclarationMap,
    pub types: DeclarationMap,
    pub externals: DeclarationMap,
}

impl ModuleDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: DeclarationKind) -> &DeclarationMap {
        match kind {
            DeclarationKind::Function => &self.functions,
            DeclarationKind::Type => &self.types,
            DeclarationKind::External => &self.externals,
        }
    }

    fn get_mut(&mut self, kind: DeclarationKind) -> &mut DeclarationMap {
        match kind {
            DeclarationKind::Function => &mut self.functions,
            DeclarationKind::Type => &mut self.types,
            DeclarationKind::External => &mut self.externals,
        }
    }

    /// Record a declaration. A previous declaration with the same name and
    /// kind is replaced.
    pub fn insert(&mut self, declaration: Declaration) -> Option<Declaration> {
        self.get_mut(declaration.kind)
            .insert(declaration.name.clone(), declaration)
    }

    /// Total number of declarations across all kinds.
    pub fn len(&self) -> usize {
        self.functions.len() + self.types.len() + self.externals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extract all outermost declarations below `root`.
pub fn extract_declarations<N: SyntaxNode>(
    root: &N,
    grammar: &DeclarationGrammar,
) -> ModuleDeclarations {
    let mut declarations = ModuleDeclarations::new();
    let mut stack = vec![root.clone()];

    while let Some(node) = stack.pop() {
        let Some(rule) = grammar.rule_for(node.kind()) else {
            // Push in reverse so children are visited in document order.
            stack.extend(named_children(&node).into_iter().rev());
            continue;
        };

        let Some(name) = rule.resolve_name(&node) else {
            tracing::trace!(node = node.kind(), "declaration without resolvable name skipped");
            continue;
        };

        let signature = canonicalize(&node);
        tracing::trace!(
            name = %name,
            kind = rule.kind.as_str(),
            nodes = signature.node_count(),
            "declaration"
        );

        let declaration = Declaration {
            signature,
            source_text: node.text().into_owned(),
            kind: rule.kind,
            name,
        };

        if let Some(previous) = declarations.insert(declaration) {
            tracing::warn!(
                name = %previous.name,
                kind = previous.kind.as_str(),
                "duplicate declaration name, keeping the later definition"
            );
        }
    }

    declarations
}
