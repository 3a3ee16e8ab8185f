//! Content rules for comments.
//!
//! Content is trimmed before it is checked and stored, so the length limit applies to
//! the trimmed text. Length is counted in characters, not bytes.

/// Maximum comment length, in characters, after trimming.
pub const MAX_COMMENT_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("Comment content is required")]
    Empty,

    #[error("Comment content must be at most {max} characters (got {len})")]
    TooLong { len: usize, max: usize },
}

/// Trim `raw` and check it against the comment rules, returning the text to store.
pub fn normalize_content(raw: &str) -> Result<String, ContentError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ContentError::Empty);
    }

    let len = trimmed.chars().count();
    if len > MAX_COMMENT_CHARS {
        return Err(ContentError::TooLong {
            len,
            max: MAX_COMMENT_CHARS,
        });
    }

    Ok(trimmed.to_string())
}

/// Cheap client-side check mirroring the server's emptiness rule.
pub fn is_blank(raw: &str) -> bool {
    raw.trim().is_empty()
}
