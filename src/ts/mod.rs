//! Tree-sitter integration for structural TSX/JSX component queries.
//!
//! This module owns the Source Parser and the Node Query Layer: a parsed
//! [`SyntaxTree`] with byte-accurate node ranges, detached [`NodeSpan`]
//! handles, S-expression queries, and semantic lookups (first element with a
//! tag, function by name, import statements).

pub mod errors;
pub mod locator;
pub mod parser;
pub mod query;

pub use errors::TreeSitterError;
pub use locator::{ElementLocator, FunctionMatch, NodeQuery};
pub use parser::{ErrorNode, NodeSpan, SyntaxTree, TsxParser};
pub use query::{Capture, QueryEngine, QueryMatch};
