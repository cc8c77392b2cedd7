//! Input-shape validation shared by every write path

use crate::ids::NodeId;
use crate::relationship::RelationshipType;

/// Maximum title length in characters (after trimming)
pub const MAX_TITLE_CHARS: usize = 200;

/// Maximum description length in characters (after trimming)
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Bad input shape. Reported before any side effect.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Title empty after trimming
    #[error("title must not be empty")]
    EmptyTitle,

    /// Title over the character limit
    #[error("title is {len} characters, limit is {max}")]
    TitleTooLong { len: usize, max: usize },

    /// Description over the character limit
    #[error("description is {len} characters, limit is {max}")]
    DescriptionTooLong { len: usize, max: usize },

    /// Category string outside the closed set
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// Relationship type string outside the closed set
    #[error("unknown relationship type: {0}")]
    UnknownRelationshipType(String),

    /// Discussion id missing
    #[error("discussion id is required")]
    MissingDiscussion,

    /// Author id missing
    #[error("author id is required")]
    MissingAuthor,

    /// Too many relationships in one submission
    #[error("{count} relationships requested, at most {max} allowed per node")]
    TooManyRelationships { count: usize, max: usize },

    /// Too many root issues in one batch
    #[error("{count} root issues requested, at most {max} allowed per batch")]
    TooManyRootIssues { count: usize, max: usize },

    /// Empty batch
    #[error("batch must contain at least one item")]
    EmptyBatch,

    /// Manual edge used an AI-only type
    #[error("relationship type {0} may only come from suggestions")]
    SuggestionOnlyType(RelationshipType),

    /// Edge from a node to itself
    #[error("node {0} cannot relate to itself")]
    SelfLoop(NodeId),

    /// Same target and type twice in one batch
    #[error("duplicate relationship {relationship_type} to {target_id}")]
    DuplicateRelationship {
        target_id: NodeId,
        relationship_type: RelationshipType,
    },

    /// Parent node does not exist
    #[error("parent node {0} not found")]
    ParentNotFound(NodeId),

    /// Parent node lives in another discussion
    #[error("parent node {0} belongs to another discussion")]
    ParentInOtherDiscussion(NodeId),

    /// Explicit position with NaN or infinite coordinates
    #[error("position must have finite coordinates")]
    NonFinitePosition,

    /// Two titles in the same batch are near-identical
    #[error("batch contains near-identical titles: {first:?} and {second:?}")]
    DuplicateInBatch { first: String, second: String },
}

/// Trim and check a title
///
/// # Errors
/// [`ValidationError::EmptyTitle`] or [`ValidationError::TitleTooLong`]
pub fn normalize_title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let len = title.chars().count();
    if len > MAX_TITLE_CHARS {
        return Err(ValidationError::TitleTooLong {
            len,
            max: MAX_TITLE_CHARS,
        });
    }
    Ok(title.to_string())
}

/// Trim and check a description; blank becomes `None`
///
/// # Errors
/// [`ValidationError::DescriptionTooLong`]
pub fn normalize_description(raw: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let len = text.chars().count();
    if len > MAX_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooLong {
            len,
            max: MAX_DESCRIPTION_CHARS,
        });
    }
    Ok(Some(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn title_is_trimmed() {
        assert_eq!(normalize_title("  Budget  ").unwrap(), "Budget");
    }

    #[test]
    fn blank_title_rejected() {
        assert_eq!(normalize_title(" \t\n"), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn title_limit_counts_chars_not_bytes() {
        let ok = "é".repeat(MAX_TITLE_CHARS);
        assert!(normalize_title(&ok).is_ok());

        let too_long = "x".repeat(MAX_TITLE_CHARS + 1);
        assert_eq!(
            normalize_title(&too_long),
            Err(ValidationError::TitleTooLong {
                len: MAX_TITLE_CHARS + 1,
                max: MAX_TITLE_CHARS
            })
        );
    }

    #[test]
    fn blank_description_becomes_none() {
        assert_eq!(normalize_description(Some("   ")).unwrap(), None);
        assert_eq!(normalize_description(None).unwrap(), None);
    }

    #[test]
    fn long_description_rejected() {
        let text = "d".repeat(MAX_DESCRIPTION_CHARS + 5);
        assert!(matches!(
            normalize_description(Some(&text)),
            Err(ValidationError::DescriptionTooLong { .. })
        ));
    }

    proptest! {
        #[test]
        fn normalized_titles_are_trimmed_and_bounded(raw in "\\PC{0,260}") {
            if let Ok(title) = normalize_title(&raw) {
                prop_assert_eq!(title.trim(), title.as_str());
                prop_assert!(!title.is_empty());
                prop_assert!(title.chars().count() <= MAX_TITLE_CHARS);
            }
        }
    }
}
