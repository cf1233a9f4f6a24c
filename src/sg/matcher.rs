use crate::cache;
use crate::sg::errors::AstGrepError;
use crate::sg::lang::tsx;
use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_core::{AstGrep, NodeMatch};
use ast_grep_language::SupportLang;
use std::collections::BTreeMap;

/// One pattern hit and the text bound to each metavariable.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    pub byte_start: usize,
    pub byte_end: usize,
    pub text: String,
    /// `STATE` -> `count` for a `$STATE` binding; variadic bindings joined as written.
    pub captures: BTreeMap<String, String>,
}

impl PatternMatch {
    pub fn capture(&self, name: &str) -> Option<&str> {
        self.captures.get(name).map(String::as_str)
    }
}

/// Code-shaped lookups over one component source.
///
/// ```text
/// const [$STATE, $SETTER] = useState($INIT)
/// useEffect($$$ARGS)
/// ```
pub struct PatternMatcher {
    source: String,
    sg: AstGrep<StrDoc<SupportLang>>,
}

impl PatternMatcher {
    pub fn new(source: &str) -> Self {
        let sg = AstGrep::new(source, tsx());
        Self {
            source: source.to_string(),
            sg,
        }
    }

    /// Every hit of `pattern`, in document order.
    pub fn find_all(&self, pattern: &str) -> Result<Vec<PatternMatch>, AstGrepError> {
        let pat = cache::get_or_compile_pattern(pattern, tsx()).map_err(|e| {
            AstGrepError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(self
            .sg
            .root()
            .find_all(&pat)
            .map(|m| self.to_match(m))
            .collect())
    }

    fn to_match(&self, m: NodeMatch<StrDoc<SupportLang>>) -> PatternMatch {
        let range = m.get_node().range();
        let text = self.source[range.clone()].to_string();
        let captures: std::collections::HashMap<String, String> = m.get_env().clone().into();

        PatternMatch {
            byte_start: range.start,
            byte_end: range.end,
            text,
            captures: captures.into_iter().collect(),
        }
    }
}
