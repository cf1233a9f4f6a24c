//! Compiled ast-grep patterns, kept per thread.
//!
//! A pattern is compiled once per thread and dialect, so running one pattern
//! over every file of a directory parses it once.

use ast_grep_core::{Pattern, PatternError};
use ast_grep_language::SupportLang;
use std::cell::RefCell;
use std::collections::HashMap;

/// Past this many entries the cache starts over.
const CAPACITY: usize = 256;

thread_local! {
    static PATTERNS: RefCell<HashMap<(String, String), Pattern>> = RefCell::new(HashMap::new());
}

/// The compiled form of `pattern` in `lang`. Patterns that fail to compile are
/// not cached.
pub fn get_or_compile_pattern(pattern: &str, lang: SupportLang) -> Result<Pattern, PatternError> {
    let key = (format!("{lang:?}"), pattern.to_string());

    PATTERNS.with(|patterns| {
        let mut patterns = patterns.borrow_mut();
        if let Some(compiled) = patterns.get(&key) {
            return Ok(compiled.clone());
        }
        let compiled = Pattern::try_new(pattern, lang)?;
        if patterns.len() >= CAPACITY {
            patterns.clear();
        }
        patterns.insert(key, compiled.clone());
        Ok(compiled)
    })
}

pub fn clear_cache() {
    PATTERNS.with(|patterns| patterns.borrow_mut().clear());
}

/// Number of compiled patterns held by this thread.
pub fn cache_size() -> usize {
    PATTERNS.with(|patterns| patterns.borrow().len())
}
