//! Structural signatures of syntax subtrees.
//!
//! A signature keeps only named nodes, so punctuation, keywords, comments and
//! whitespace never influence equality, while any change to a named node's
//! type, leaf text or order does.

use crate::syntax::{named_children, SyntaxNode};

/// Canonical structural form of a subtree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Signature {
    /// Node without named children: its type and raw text.
    Leaf { kind: String, text: String },
    /// Node with named children: its type and the children's signatures.
    Node { kind: String, children: Vec<Signature> },
}

impl Signature {
    pub fn kind(&self) -> &str {
        match self {
            Signature::Leaf { kind, .. } | Signature::Node { kind, .. } => kind,
        }
    }

    /// Number of signature nodes, including this one.
    pub fn node_count(&self) -> usize {
        match self {
            Signature::Leaf { .. } => 1,
            Signature::Node { children, .. } => {
                1 + children.iter().map(Signature::node_count).sum::<usize>()
            }
        }
    }
}

/// Compute the signature of a node.
pub fn canonicalize<N: SyntaxNode>(node: &N) -> Signature {
    let named = named_children(node);
    if named.is_empty() {
        return Signature::Leaf {
            kind: node.kind().to_string(),
            text: node.text().into_owned(),
        };
    }
    Signature::Node {
        kind: node.kind().to_string(),
        children: named.iter().map(|child| canonicalize(child)).collect(),
    }
}
