use crate::imports::ImportConflict;
use serde::Serialize;
use thiserror::Error;

/// A problem met while generating; most are per-request and non-fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationError {
    #[error("parse failure: {message}")]
    ParseFailure { message: String },

    #[error("import conflict: {0}")]
    ImportConflict(ImportConflict),

    #[error("target not found for {request}: {target}{}", suggestion_hint(.suggestion))]
    TargetNotFound {
        request: String,
        target: String,
        suggestion: Option<String>,
    },

    #[error("text not found: {search:?}")]
    TextNotFound { search: String },

    #[error("range conflict: {request} overlaps {other} at bytes {byte_start}..{byte_end}")]
    RangeConflict {
        request: String,
        other: String,
        byte_start: usize,
        byte_end: usize,
    },

    #[error("duplicate declaration: '{name}' is already declared in {component}")]
    DuplicateDeclaration { name: String, component: String },

    #[error("invalid edit for {request}: {message}")]
    InvalidEdit { request: String, message: String },

    #[error("generated code has {count} new syntax error(s)")]
    SyntaxRegression { count: usize },
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(tag) => format!(" (did you mean <{tag}>?)"),
        None => String::new(),
    }
}

impl GenerationError {
    /// Errors that leave the session without output.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GenerationError::ParseFailure { .. } | GenerationError::SyntaxRegression { .. }
        )
    }
}

/// Outcome of one `generate` call.
///
/// `success` means no fatal failure occurred; skipped requests are still listed
/// in `errors` and should be inspected even when `success` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub success: bool,
    pub code: Option<String>,
    pub errors: Vec<GenerationError>,
}

impl GenerationResult {
    pub(crate) fn emitted(code: String, errors: Vec<GenerationError>) -> Self {
        Self {
            success: true,
            code: Some(code),
            errors,
        }
    }

    pub(crate) fn failed(errors: Vec<GenerationError>) -> Self {
        Self {
            success: false,
            code: None,
            errors,
        }
    }

    /// Succeeded with every request applied.
    pub fn is_clean(&self) -> bool {
        self.success && self.errors.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_include_suggestions() {
        let error = GenerationError::TargetNotFound {
            request: "wrap <Buton> in <Guard>".into(),
            target: "<Buton>".into(),
            suggestion: Some("Button".into()),
        };
        assert_eq!(
            error.to_string(),
            "target not found for wrap <Buton> in <Guard>: <Buton> (did you mean <Button>?)"
        );
    }

    #[test]
    fn serializes_with_kind_tag() {
        let result = GenerationResult::failed(vec![GenerationError::TextNotFound {
            search: "btn-old".into(),
        }]);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["success"], false);
        assert!(json["code"].is_null());
        assert_eq!(json["errors"][0]["kind"], "text_not_found");
        assert_eq!(json["errors"][0]["search"], "btn-old");
    }

    #[test]
    fn clean_requires_no_errors() {
        assert!(GenerationResult::emitted("x".into(), vec![]).is_clean());
        assert!(!GenerationResult::emitted(
            "x".into(),
            vec![GenerationError::TextNotFound { search: "y".into() }]
        )
        .is_clean());
    }
}
