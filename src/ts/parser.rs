use crate::ts::errors::TreeSitterError;
use ast_grep_language::{LanguageExt, SupportLang};
use serde::Serialize;
use std::fmt;
use tree_sitter::{Node, Parser, Tree};

/// Tree-sitter parser wrapper for TSX/JSX component sources.
pub struct TsxParser {
    parser: Parser,
}

impl TsxParser {
    /// Create a parser bound to the TSX grammar.
    pub fn new() -> Result<Self, TreeSitterError> {
        let mut parser = Parser::new();
        // The TSX grammar is a superset of JSX, so plain .jsx sources parse too.
        let ts_lang = SupportLang::Tsx.get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| TreeSitterError::LanguageSet)?;

        Ok(Self { parser })
    }

    /// Parse source code into a tree-sitter Tree.
    pub fn parse(&mut self, source: &str) -> Result<Tree, TreeSitterError> {
        self.parser
            .parse(source, None)
            .ok_or(TreeSitterError::ParseFailed)
    }

    /// Parse source code into an owned [`SyntaxTree`].
    pub fn parse_source(&mut self, source: impl Into<String>) -> Result<SyntaxTree, TreeSitterError> {
        let source = source.into();
        let tree = self.parse(&source)?;
        Ok(SyntaxTree { source, tree })
    }
}

/// A parsed component file: the immutable source text plus its concrete syntax tree.
///
/// The tree is never edited in place. Everything that wants to change the file
/// records byte offsets into [`SyntaxTree::source`] and lets the generator splice.
pub struct SyntaxTree {
    source: String,
    tree: Tree,
}

impl SyntaxTree {
    /// The exact text the tree was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Get the root node of the tree.
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Check if the tree contains any ERROR or MISSING nodes.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Parse diagnostics: every ERROR or MISSING node in pre-order.
    pub fn error_nodes(&self) -> Vec<ErrorNode> {
        let mut errors = Vec::new();
        collect_error_nodes(self.tree.root_node(), &mut errors);
        errors
    }

    /// Extract text for a node's byte range.
    pub fn node_text(&self, node: Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }

    /// Find the node a detached [`NodeSpan`] was taken from.
    ///
    /// Returns `None` when no node of the same kind covers exactly that range.
    pub fn resolve(&self, span: &NodeSpan) -> Option<Node<'_>> {
        if span.byte_start > span.byte_end || span.byte_end > self.source.len() {
            return None;
        }
        let mut node = self
            .tree
            .root_node()
            .descendant_for_byte_range(span.byte_start, span.byte_end)?;
        loop {
            if node.start_byte() != span.byte_start || node.end_byte() != span.byte_end {
                return None;
            }
            if node.kind() == span.kind {
                return Some(node);
            }
            node = node.parent()?;
        }
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("len", &self.source.len())
            .field("root", &self.tree.root_node().kind())
            .field("has_errors", &self.has_errors())
            .finish()
    }
}

/// A detached reference to a node of the original tree: its kind and byte range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NodeSpan {
    pub kind: String,
    pub byte_start: usize,
    pub byte_end: usize,
}

impl NodeSpan {
    pub fn new(kind: impl Into<String>, byte_start: usize, byte_end: usize) -> Self {
        Self {
            kind: kind.into(),
            byte_start,
            byte_end,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.byte_start == self.byte_end
    }
}

impl From<Node<'_>> for NodeSpan {
    fn from(node: Node<'_>) -> Self {
        Self {
            kind: node.kind().to_string(),
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
        }
    }
}

impl fmt::Display for NodeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}..{}", self.kind, self.byte_start, self.byte_end)
    }
}

/// Information about an ERROR node in the parse tree.
#[derive(Debug, Clone)]
pub struct ErrorNode {
    pub byte_start: usize,
    pub byte_end: usize,
    pub start_point: tree_sitter::Point,
    pub end_point: tree_sitter::Point,
    pub missing: bool,
}

fn collect_error_nodes(node: Node<'_>, errors: &mut Vec<ErrorNode>) {
    if node.is_error() || node.is_missing() {
        errors.push(ErrorNode {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            start_point: node.start_position(),
            end_point: node.end_position(),
            missing: node.is_missing(),
        });
    }

    // Subtrees without errors are skipped entirely.
    if !node.has_error() {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_nodes(child, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_component() {
        let mut parser = TsxParser::new().unwrap();
        let tree = parser
            .parse_source("export default function App() { return <div className=\"app\" />; }")
            .unwrap();

        assert!(!tree.has_errors());
        assert_eq!(tree.root_node().kind(), "program");
    }

    #[test]
    fn parse_invalid_component() {
        let mut parser = TsxParser::new().unwrap();
        let tree = parser
            .parse_source("function App() { return <div>; }")
            .unwrap();

        assert!(tree.has_errors());
        assert!(!tree.error_nodes().is_empty());
    }

    #[test]
    fn resolve_span_round_trips() {
        let mut parser = TsxParser::new().unwrap();
        let tree = parser
            .parse_source("const x = <section><p>hi</p></section>;")
            .unwrap();

        let start = tree.source().find("<p>").unwrap();
        let end = tree.source().find("</section>").unwrap();
        let span = NodeSpan::new("jsx_element", start, end);

        let node = tree.resolve(&span).unwrap();
        assert_eq!(tree.node_text(node), "<p>hi</p>");
        assert_eq!(NodeSpan::from(node), span);
    }

    #[test]
    fn resolve_rejects_wrong_kind_or_range() {
        let mut parser = TsxParser::new().unwrap();
        let tree = parser.parse_source("const x = <p>hi</p>;").unwrap();

        let start = tree.source().find("<p>").unwrap();
        assert!(tree
            .resolve(&NodeSpan::new("jsx_element", start, start + 3))
            .is_none());
        assert!(tree
            .resolve(&NodeSpan::new("class_declaration", start, start + 9))
            .is_none());
        assert!(tree.resolve(&NodeSpan::new("jsx_element", 0, 999)).is_none());
    }
}
