//! ast-grep integration for pattern-based TSX code matching.
//!
//! Lookups that read better as code than as S-expressions, such as
//! "every `const [a, setA] = useX(...)`", go through ast-grep's
//! metavariable syntax ($NAME, $$$ARGS).

pub mod errors;
pub mod lang;
pub mod matcher;

pub use errors::AstGrepError;
pub use lang::{is_component_source, tsx, SupportLang, SOURCE_EXTENSIONS};
pub use matcher::{PatternMatch, PatternMatcher};
