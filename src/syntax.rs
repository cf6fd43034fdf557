use anyhow::{anyhow, Context, Result};
use tree_sitter::{Node, Parser, Tree};

use crate::profile::LanguageProfile;
use crate::source::Position;

/// The parts of a concrete syntax tree node the chunker looks at.
///
/// Implemented for tree-sitter nodes and for [`TreeNode`], so a tree produced
/// by any other parser can be chunked by converting it first.
pub trait SyntaxNode: Sized {
    fn type_tag(&self) -> &str;
    fn start_pos(&self) -> Position;
    fn end_pos(&self) -> Position;
    /// Children in source order.
    fn child_nodes(&self) -> Vec<Self>;
}

impl<'tree> SyntaxNode for Node<'tree> {
    fn type_tag(&self) -> &str {
        self.kind()
    }

    fn start_pos(&self) -> Position {
        let p = self.start_position();
        Position::new(p.row, p.column)
    }

    fn end_pos(&self) -> Position {
        let p = self.end_position();
        Position::new(p.row, p.column)
    }

    fn child_nodes(&self) -> Vec<Self> {
        let mut cursor = self.walk();
        self.children(&mut cursor).collect()
    }
}

/// Owned syntax node for trees that don't come from tree-sitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub kind: String,
    pub start: Position,
    pub end: Position,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(kind: &str, start: Position, end: Position) -> Self {
        Self {
            kind: kind.to_string(),
            start,
            end,
            children: vec![],
        }
    }

    /// Inner node spanning its first to last child.
    ///
    /// An empty child list gives an empty span at the origin.
    pub fn branch(kind: &str, children: Vec<TreeNode>) -> Self {
        let start = children.first().map(|c| c.start).unwrap_or_default();
        let end = children.last().map(|c| c.end).unwrap_or_default();
        Self {
            kind: kind.to_string(),
            start,
            end,
            children,
        }
    }

    /// Deep copy of any other syntax node.
    pub fn from_node<N: SyntaxNode>(node: &N) -> Self {
        Self {
            kind: node.type_tag().to_string(),
            start: node.start_pos(),
            end: node.end_pos(),
            children: node.child_nodes().iter().map(TreeNode::from_node).collect(),
        }
    }
}

impl<'a> SyntaxNode for &'a TreeNode {
    fn type_tag(&self) -> &str {
        &self.kind
    }

    fn start_pos(&self) -> Position {
        self.start
    }

    fn end_pos(&self) -> Position {
        self.end
    }

    fn child_nodes(&self) -> Vec<Self> {
        let node: &'a TreeNode = *self;
        node.children.iter().collect()
    }
}

/// Parse `source_text` with the profile's tree-sitter grammar.
pub fn parse_source(source_text: &str, profile: &LanguageProfile) -> Result<Tree> {
    let language = profile.grammar();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .with_context(|| format!("Failed to set tree-sitter language for {}", profile.name))?;
    parser
        .parse(source_text, None)
        .ok_or_else(|| anyhow!("Failed to parse {} source", profile.name))
}
