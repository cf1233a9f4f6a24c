//! Validation module for ensuring generated code stays parseable.
//!
//! This module provides:
//! - Parse validation (tree-sitter ERROR/MISSING node detection)
//! - Edit screening: apply one edit virtually and check for new errors
//! - Snippet validation for caller-supplied statements and markup
//!
//! # Hard Rules (Never Violate)
//!
//! 1. **Parse validation**: After editing, re-parse with tree-sitter.
//!    If the output has more error nodes than the input, do not emit it.
//! 2. **Screen before splice**: An edit that breaks syntax on its own is
//!    dropped before it can interact with other edits.

use crate::pool;
use crate::ts::{SyntaxTree, TreeSitterError};
use serde::Serialize;
use thiserror::Error;

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("parse error introduced: found {count} new ERROR nodes")]
    ParseErrorIntroduced {
        count: usize,
        errors: Vec<ErrorLocation>,
    },

    #[error("invalid {category} snippet: {context}")]
    InvalidSnippet {
        category: SnippetCategory,
        context: String,
    },

    #[error("edit range {byte_start}..{byte_end} is outside a source of {len} bytes")]
    OutOfBounds {
        byte_start: usize,
        byte_end: usize,
        len: usize,
    },

    #[error("tree-sitter error: {0}")]
    TreeSitter(#[from] TreeSitterError),
}

/// Location of an error node in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorLocation {
    pub byte_start: usize,
    pub byte_end: usize,
    pub line: usize,
    pub column: usize,
    pub context: String,
}

/// Category of code snippet for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SnippetCategory {
    /// One or more statements inside a function body
    Statement,
    /// An expression
    Expression,
    /// Markup usable as element children
    Markup,
}

impl std::fmt::Display for SnippetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SnippetCategory::Statement => "statement",
            SnippetCategory::Expression => "expression",
            SnippetCategory::Markup => "markup",
        };
        f.write_str(name)
    }
}

/// Validate that source has no parse errors.
pub fn validate(source: &str) -> Result<(), ValidationError> {
    let errors = collect_errors(&pool::parse(source)?);

    if !errors.is_empty() {
        return Err(ValidationError::ParseErrorIntroduced {
            count: errors.len(),
            errors,
        });
    }

    Ok(())
}

/// Compare two sources and check whether the edited one is worse.
///
/// Byte positions shift under editing, so errors are compared by count: the
/// edited source may keep errors the original already had, never add more.
pub fn validate_output(original: &str, edited: &str) -> Result<(), ValidationError> {
    let before = collect_errors(&pool::parse(original)?);
    let after = collect_errors(&pool::parse(edited)?);

    if after.len() > before.len() {
        let new_errors: Vec<_> = after
            .into_iter()
            .filter(|e| !before.contains(e))
            .collect();
        return Err(ValidationError::ParseErrorIntroduced {
            count: new_errors.len().max(1),
            errors: new_errors,
        });
    }

    Ok(())
}

/// Apply one byte-span edit virtually and check it doesn't introduce syntax errors.
pub fn validate_edit(
    source: &str,
    byte_start: usize,
    byte_end: usize,
    new_text: &str,
) -> Result<(), ValidationError> {
    if byte_start > byte_end
        || byte_end > source.len()
        || !source.is_char_boundary(byte_start)
        || !source.is_char_boundary(byte_end)
    {
        return Err(ValidationError::OutOfBounds {
            byte_start,
            byte_end,
            len: source.len(),
        });
    }

    let mut edited =
        String::with_capacity(source.len() + new_text.len() - (byte_end - byte_start));
    edited.push_str(&source[..byte_start]);
    edited.push_str(new_text);
    edited.push_str(&source[byte_end..]);

    validate_output(source, &edited)
}

/// Check if a code snippet is valid as a specific syntactic category.
pub fn validate_snippet(snippet: &str, category: SnippetCategory) -> Result<(), ValidationError> {
    let wrapped = match category {
        SnippetCategory::Statement => format!("function __wrapper__() {{\n{snippet}\n}}"),
        SnippetCategory::Expression => format!("const __wrapper__ = (\n{snippet}\n);"),
        SnippetCategory::Markup => format!("const __wrapper__ = (\n<>\n{snippet}\n</>\n);"),
    };

    validate(&wrapped).map_err(|_| ValidationError::InvalidSnippet {
        category,
        context: snippet.chars().take(60).collect::<String>().replace('\n', "\\n"),
    })
}

/// Collect all error nodes from a syntax tree with line/column context.
pub fn collect_errors(tree: &SyntaxTree) -> Vec<ErrorLocation> {
    let source = tree.source();
    tree.error_nodes()
        .into_iter()
        .map(|node| {
            // Extract context (up to 20 bytes either side of the error)
            let context_start = floor_char_boundary(source, node.byte_start.saturating_sub(20));
            let context_end = floor_char_boundary(source, (node.byte_end + 20).min(source.len()));
            let context = source
                .get(context_start..context_end)
                .unwrap_or("")
                .replace('\n', "\\n");

            ErrorLocation {
                byte_start: node.byte_start,
                byte_end: node.byte_end,
                line: node.start_point.row + 1,
                column: node.start_point.column + 1,
                context,
            }
        })
        .collect()
}

fn floor_char_boundary(source: &str, mut index: usize) -> usize {
    while index > 0 && !source.is_char_boundary(index) {
        index -= 1;
    }
    index
}
