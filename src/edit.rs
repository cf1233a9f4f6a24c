use std::cmp::Ordering;
use std::ops::Range;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// A byte range of the original source and the text that replaces it.
///
/// Every structural request is planned as a handful of these. An empty range is
/// an insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until applied"]
pub struct Edit {
    pub byte_start: usize,
    pub byte_end: usize,
    pub new_text: String,
    /// What the range must hold when the edit is applied.
    pub expected_before: EditVerification,
    /// Tie-break for insertions at the same offset: lower order lands first in the text.
    pub order: i64,
}

/// Expected contents of an edit's range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    ExactMatch(String),
    /// xxh3 of the text, used for long ranges such as a deleted subtree.
    Hash(u64),
}

impl EditVerification {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Keeps short text verbatim and hashes anything over 1 KiB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("before-text verification failed at bytes {byte_start}..{byte_end}")]
    BeforeTextMismatch {
        byte_start: usize,
        byte_end: usize,
        expected: String,
        found: String,
    },

    #[error("invalid byte range [{byte_start}, {byte_end}) in source of length {len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        len: usize,
    },

    #[error("byte offset {offset} is not on a UTF-8 character boundary")]
    NotCharBoundary { offset: usize },

    #[error("edits overlap: [{first_start}, {first_end}) and [{second_start}, {second_end})")]
    Overlap {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },
}

impl Edit {
    /// Create a replacement edit, verifying the span currently holds `expected_before`.
    pub fn new(
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: impl AsRef<str>,
    ) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(expected_before.as_ref()),
            order: 0,
        }
    }

    /// Create a pure insertion at `offset`.
    pub fn insert(offset: usize, new_text: impl Into<String>) -> Self {
        Self::new(offset, offset, new_text, "")
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    pub fn range(&self) -> Range<usize> {
        self.byte_start..self.byte_end
    }

    pub fn is_insertion(&self) -> bool {
        self.byte_start == self.byte_end
    }

    /// Whether this edit's replaced span intersects `other`'s.
    ///
    /// Insertions touching either end of a range do not overlap it; an
    /// insertion strictly inside a non-empty range does.
    pub fn overlaps(&self, other: &Edit) -> bool {
        match (self.is_insertion(), other.is_insertion()) {
            (true, true) => false,
            (true, false) => other.byte_start < self.byte_start && self.byte_start < other.byte_end,
            (false, true) => self.byte_start < other.byte_start && other.byte_start < self.byte_end,
            (false, false) => self.byte_start < other.byte_end && other.byte_start < self.byte_end,
        }
    }

    /// Validate the edit against the source it was computed from.
    fn validate(&self, source: &str) -> Result<(), EditError> {
        if self.byte_start > self.byte_end || self.byte_end > source.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                len: source.len(),
            });
        }

        for offset in [self.byte_start, self.byte_end] {
            if !source.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary { offset });
            }
        }

        let current = &source[self.range()];
        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                expected: format!("{:?}", self.expected_before),
                found: current.to_string(),
            });
        }

        Ok(())
    }

    /// Apply this single edit to `source`, returning the new text.
    pub fn apply_to(&self, source: &str) -> Result<String, EditError> {
        self.validate(source)?;

        let mut out =
            String::with_capacity(source.len() + self.new_text.len() - (self.byte_end - self.byte_start));
        out.push_str(&source[..self.byte_start]);
        out.push_str(&self.new_text);
        out.push_str(&source[self.byte_end..]);
        Ok(out)
    }

    /// Apply multiple edits against the same original source.
    ///
    /// Edits are sorted by byte_start descending and spliced bottom-to-top so
    /// offsets never need adjusting. At a shared offset a replacement is spliced
    /// before insertions, and insertions are spliced highest order first, which
    /// leaves them in ascending order in the output.
    pub fn apply_batch(source: &str, mut edits: Vec<Edit>) -> Result<String, EditError> {
        if edits.is_empty() {
            return Ok(source.to_string());
        }

        for edit in &edits {
            edit.validate(source)?;
        }

        edits.sort_by(splice_order);

        // Sorted descending by start, so the neighbour on the left always has the
        // smallest start seen so far.
        for window in edits.windows(2) {
            let (later, earlier) = (&window[0], &window[1]);
            if earlier.overlaps(later) {
                return Err(EditError::Overlap {
                    first_start: earlier.byte_start,
                    first_end: earlier.byte_end,
                    second_start: later.byte_start,
                    second_end: later.byte_end,
                });
            }
        }

        let mut content = source.to_string();
        for edit in &edits {
            content.replace_range(edit.range(), &edit.new_text);
        }

        Ok(content)
    }
}

fn splice_order(a: &Edit, b: &Edit) -> Ordering {
    b.byte_start
        .cmp(&a.byte_start)
        .then_with(|| a.is_insertion().cmp(&b.is_insertion()))
        .then_with(|| b.order.cmp(&a.order))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_verification_exact_match() {
        let text = "hello world";
        let verify = EditVerification::ExactMatch(text.to_string());
        assert!(verify.matches(text));
        assert!(!verify.matches("hello"));
    }

    #[test]
    fn test_edit_verification_hash() {
        let text = "hello world";
        let verify = EditVerification::Hash(xxh3_64(text.as_bytes()));
        assert!(verify.matches(text));
        assert!(!verify.matches("goodbye world"));
    }

    #[test]
    fn test_edit_verification_from_text() {
        assert!(matches!(EditVerification::from_text("small"), EditVerification::ExactMatch(_)));
        assert!(matches!(
            EditVerification::from_text(&"x".repeat(2000)),
            EditVerification::Hash(_)
        ));
    }

    #[test]
    fn test_edit_invalid_range() {
        let result = Edit::new(5, 20, "replacement", "").apply_to("hello world");
        assert!(matches!(result, Err(EditError::InvalidByteRange { .. })));

        let result = Edit::new(10, 5, "replacement", "").apply_to("hello world");
        assert!(matches!(result, Err(EditError::InvalidByteRange { .. })));
    }

    #[test]
    fn test_edit_rejects_split_character() {
        let result = Edit::insert(1, "x").apply_to("é");
        assert!(matches!(result, Err(EditError::NotCharBoundary { offset: 1 })));
    }

    #[test]
    fn test_edit_before_text_mismatch() {
        let result = Edit::new(0, 5, "HELLO", "howdy").apply_to("hello world");
        assert!(matches!(result, Err(EditError::BeforeTextMismatch { .. })));
    }

    #[test]
    fn test_single_edit() {
        let out = Edit::new(0, 5, "howdy", "hello").apply_to("hello world").unwrap();
        assert_eq!(out, "howdy world");
    }

    #[test]
    fn test_batch_edits() {
        let source = "line1\nline2\nline3\n";
        let edits = vec![
            Edit::new(0, 5, "LINE1", "line1"),
            Edit::new(12, 17, "LINE3", "line3"),
            Edit::new(6, 11, "LINE2", "line2"),
        ];

        let out = Edit::apply_batch(source, edits).unwrap();
        assert_eq!(out, "LINE1\nLINE2\nLINE3\n");
    }

    #[test]
    fn test_batch_insertions_follow_order() {
        let source = "<p>x</p>";
        let edits = vec![
            Edit::insert(0, "<B>").with_order(2),
            Edit::insert(0, "<A>").with_order(1),
            Edit::insert(8, "</A>").with_order(-1),
            Edit::insert(8, "</B>").with_order(-2),
        ];

        let out = Edit::apply_batch(source, edits).unwrap();
        assert_eq!(out, "<A><B><p>x</p></B></A>");
    }

    #[test]
    fn test_batch_insertion_before_replacement_at_same_offset() {
        let out = Edit::apply_batch(
            "abc",
            vec![Edit::new(0, 1, "A", "a"), Edit::insert(0, ">")],
        )
        .unwrap();
        assert_eq!(out, ">Abc");
    }

    #[test]
    fn test_batch_overlap_rejected() {
        let source = "hello world";
        let result = Edit::apply_batch(
            source,
            vec![Edit::new(0, 7, "x", "hello w"), Edit::new(5, 11, "y", " world")],
        );
        assert!(matches!(result, Err(EditError::Overlap { .. })));

        let result = Edit::apply_batch(
            source,
            vec![Edit::new(0, 11, "", source), Edit::insert(3, "!")],
        );
        assert!(matches!(result, Err(EditError::Overlap { .. })));
    }

    #[test]
    fn test_insertions_at_range_edges_do_not_overlap() {
        let range = Edit::new(2, 6, "", "llo ");
        assert!(!Edit::insert(2, "x").overlaps(&range));
        assert!(!Edit::insert(6, "x").overlaps(&range));
        assert!(Edit::insert(4, "x").overlaps(&range));
        assert!(range.overlaps(&Edit::new(5, 8, "", "")));
    }
}
