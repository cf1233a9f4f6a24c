//! One TSX parser per thread.
//!
//! A generation run parses the input once and each candidate output again, so
//! the parser is created lazily and kept for the life of the thread.

use crate::ts::{SyntaxTree, TreeSitterError, TsxParser};
use std::cell::RefCell;

thread_local! {
    static TSX_PARSER: RefCell<Option<TsxParser>> = const { RefCell::new(None) };
}

/// Run `f` with this thread's parser, creating it on first use.
pub fn with_parser<F, R>(f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&mut TsxParser) -> R,
{
    TSX_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        let parser = match slot.take() {
            Some(parser) => parser,
            None => TsxParser::new()?,
        };
        Ok(f(slot.insert(parser)))
    })
}

/// Parse `source` with the pooled parser.
///
/// ```no_run
/// let tree = tsx_patcher::pool::parse("const x = <div />;").unwrap();
/// assert!(!tree.has_errors());
/// ```
pub fn parse(source: &str) -> Result<SyntaxTree, TreeSitterError> {
    with_parser(|parser| parser.parse_source(source))?
}
