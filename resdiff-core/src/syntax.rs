//! Syntax tree capability interface.
//!
//! The diff engine never touches a concrete parser's node type. Everything it
//! needs from a tree is captured by [`SyntaxNode`]; [`TsNode`] adapts
//! tree-sitter nodes to it.

use std::borrow::Cow;

use tree_sitter::{Node, Tree};

/// Read-only view of one node of a syntax tree.
///
/// Implementations must be cheap to clone (a handle, not a subtree copy).
pub trait SyntaxNode: Clone {
    /// Grammar type tag, e.g. `let_declaration`.
    fn kind(&self) -> &str;

    /// Whether the grammar considers this node semantically meaningful.
    ///
    /// Punctuation, keywords and comments are not named.
    fn is_named(&self) -> bool;

    /// All children in document order, named and anonymous.
    fn children(&self) -> Vec<Self>;

    /// Raw source text spanned by the node.
    fn text(&self) -> Cow<'_, str>;
}

/// Named children of a node, in document order.
pub fn named_children<N: SyntaxNode>(node: &N) -> Vec<N> {
    node.children()
        .into_iter()
        .filter(|child| child.is_named())
        .collect()
}

/// A tree-sitter node paired with the source it was parsed from.
///
/// `comment_kinds` lists the extras that are not named for the purposes of
/// diffing. Any other extra keeps the grammar's own named flag.
#[derive(Clone, Copy, Debug)]
pub struct TsNode<'tree> {
    node: Node<'tree>,
    source: &'tree [u8],
    comment_kinds: &'tree [String],
}

impl<'tree> TsNode<'tree> {
    pub fn new(node: Node<'tree>, source: &'tree [u8], comment_kinds: &'tree [String]) -> Self {
        Self {
            node,
            source,
            comment_kinds,
        }
    }

    /// Root node of a parsed tree.
    pub fn root(tree: &'tree Tree, source: &'tree [u8], comment_kinds: &'tree [String]) -> Self {
        Self::new(tree.root_node(), source, comment_kinds)
    }

    fn is_comment(&self) -> bool {
        self.node.is_extra() && self.comment_kinds.iter().any(|k| k == self.node.kind())
    }
}

impl SyntaxNode for TsNode<'_> {
    fn kind(&self) -> &str {
        self.node.kind()
    }

    fn is_named(&self) -> bool {
        self.node.is_named() && !self.is_comment()
    }

    fn children(&self) -> Vec<Self> {
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .map(|child| TsNode::new(child, self.source, self.comment_kinds))
            .collect()
    }

    fn text(&self) -> Cow<'_, str> {
        match self.source.get(self.node.byte_range()) {
            Some(bytes) => String::from_utf8_lossy(bytes),
            None => Cow::Borrowed(""),
        }
    }
}
