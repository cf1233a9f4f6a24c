//! Textual patch fallback.
//!
//! Plain substring replacement over already-generated code, for changes the
//! structural requests cannot express. No syntax awareness: every occurrence
//! is replaced, including ones inside strings or comments.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextPatchError {
    #[error("text not found: {search:?}")]
    TextNotFound { search: String },
}

/// Result of a successful substring replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPatch {
    pub text: String,
    /// Number of non-overlapping occurrences replaced.
    pub occurrences: usize,
}

/// Replace every non-overlapping occurrence of `search` in `text`, scanning left to right.
///
/// An empty `search` never matches.
pub fn replace_all(text: &str, search: &str, replacement: &str) -> Result<TextPatch, TextPatchError> {
    let occurrences = if search.is_empty() {
        0
    } else {
        text.matches(search).count()
    };

    if occurrences == 0 {
        return Err(TextPatchError::TextNotFound {
            search: search.to_string(),
        });
    }

    Ok(TextPatch {
        text: text.replace(search, replacement),
        occurrences,
    })
}
