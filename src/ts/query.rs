use crate::ts::errors::TreeSitterError;
use crate::ts::parser::{NodeSpan, SyntaxTree};
use ast_grep_language::{LanguageExt, SupportLang};
use tree_sitter::{Query, QueryCursor, StreamingIterator};

/// One named capture of a query match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub name: String,
    pub span: NodeSpan,
    pub text: String,
}

/// A query match: its captures plus the range they cover together.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub byte_start: usize,
    pub byte_end: usize,
    pub captures: Vec<Capture>,
}

impl QueryMatch {
    pub fn capture(&self, name: &str) -> Option<&Capture> {
        self.captures.iter().find(|c| c.name == name)
    }

    /// Text of a capture, or `""` when the match did not bind it.
    pub fn text(&self, name: &str) -> &str {
        self.capture(name).map_or("", |c| c.text.as_str())
    }
}

/// A compiled S-expression query over the TSX grammar.
///
/// ```text
/// (function_declaration
///   name: (identifier) @name
///   body: (statement_block) @body)
/// ```
pub struct QueryEngine {
    query: Query,
}

impl QueryEngine {
    pub fn new(source: &str) -> Result<Self, TreeSitterError> {
        let query = Query::new(&SupportLang::Tsx.get_ts_language(), source)
            .map_err(|e| TreeSitterError::InvalidQuery {
                message: e.to_string(),
            })?;
        Ok(Self { query })
    }

    /// Every match in `tree`, outermost first for matches starting together.
    pub fn find_all(&self, tree: &SyntaxTree) -> Vec<QueryMatch> {
        let names = self.query.capture_names();
        let mut cursor = QueryCursor::new();
        let mut raw = cursor.matches(&self.query, tree.root_node(), tree.source().as_bytes());

        let mut found = Vec::new();
        while let Some(m) = raw.next() {
            let captures: Vec<Capture> = m
                .captures
                .iter()
                .map(|c| Capture {
                    name: names[c.index as usize].to_string(),
                    span: NodeSpan::from(c.node),
                    text: tree.node_text(c.node).to_string(),
                })
                .collect();
            let Some(byte_start) = captures.iter().map(|c| c.span.byte_start).min() else {
                continue;
            };
            let byte_end = captures.iter().map(|c| c.span.byte_end).max().unwrap_or(byte_start);
            found.push(QueryMatch {
                byte_start,
                byte_end,
                captures,
            });
        }

        found.sort_by_key(|m| (m.byte_start, std::cmp::Reverse(m.byte_end)));
        found
    }
}
