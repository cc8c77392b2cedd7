//! Typed, directed edges between nodes

use crate::ids::{AuthorId, DiscussionId, NodeId, RelationshipId};
use crate::validation::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relationship type (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// Source backs the target
    Supports,
    /// Source argues against the target
    Opposes,
    /// Generic association
    RelatesTo,
    /// Source is a reply to the target
    RespondsTo,
    /// Finer-grained `opposes`, AI suggestions only
    Challenges,
    /// Finer-grained `supports`, AI suggestions only
    Elaborates,
    /// Finer-grained `responds_to`, AI suggestions only
    Questions,
    /// Finer-grained `responds_to`, AI suggestions only
    Answers,
}

impl RelationshipType {
    /// Types a user can pick by hand
    pub const MANUAL: [RelationshipType; 4] = [
        RelationshipType::Supports,
        RelationshipType::Opposes,
        RelationshipType::RelatesTo,
        RelationshipType::RespondsTo,
    ];

    /// True for the synonyms only the suggestion path may emit
    #[inline]
    #[must_use]
    pub fn is_suggestion_only(&self) -> bool {
        matches!(
            self,
            RelationshipType::Challenges
                | RelationshipType::Elaborates
                | RelationshipType::Questions
                | RelationshipType::Answers
        )
    }

    /// Coarse type a suggestion-only synonym maps to
    #[inline]
    #[must_use]
    pub fn coarse(&self) -> RelationshipType {
        match self {
            RelationshipType::Challenges => RelationshipType::Opposes,
            RelationshipType::Elaborates => RelationshipType::Supports,
            RelationshipType::Questions | RelationshipType::Answers => {
                RelationshipType::RespondsTo
            }
            other => *other,
        }
    }

    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Supports => "supports",
            RelationshipType::Opposes => "opposes",
            RelationshipType::RelatesTo => "relates_to",
            RelationshipType::RespondsTo => "responds_to",
            RelationshipType::Challenges => "challenges",
            RelationshipType::Elaborates => "elaborates",
            RelationshipType::Questions => "questions",
            RelationshipType::Answers => "answers",
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationshipType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "supports" => Ok(RelationshipType::Supports),
            "opposes" => Ok(RelationshipType::Opposes),
            "relates_to" => Ok(RelationshipType::RelatesTo),
            "responds_to" => Ok(RelationshipType::RespondsTo),
            "challenges" => Ok(RelationshipType::Challenges),
            "elaborates" => Ok(RelationshipType::Elaborates),
            "questions" => Ok(RelationshipType::Questions),
            "answers" => Ok(RelationshipType::Answers),
            other => Err(ValidationError::UnknownRelationshipType(other.to_string())),
        }
    }
}

/// Where a requested edge came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipOrigin {
    /// Chosen by the author
    #[default]
    Manual,
    /// Proposed by the suggestion service
    Suggested,
}

/// A directed edge in the argumentation graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique identifier
    pub id: RelationshipId,
    /// Edge tail (the new node on creation)
    pub source_id: NodeId,
    /// Edge head (an existing node)
    pub target_id: NodeId,
    /// Edge type
    pub relationship_type: RelationshipType,
    /// Suggestion confidence in [0, 1], if suggested
    pub confidence: Option<f64>,
    /// Suggestion justification, if suggested
    pub justification: Option<String>,
    /// Owning discussion (same as both endpoints)
    pub discussion_id: DiscussionId,
    /// Creator
    pub created_by: AuthorId,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Relationship {
    /// Create an edge with a fresh id
    #[must_use]
    pub fn new(
        source_id: NodeId,
        target_id: NodeId,
        relationship_type: RelationshipType,
        discussion_id: DiscussionId,
        created_by: AuthorId,
    ) -> Self {
        Self {
            id: RelationshipId::new(),
            source_id,
            target_id,
            relationship_type,
            confidence: None,
            justification: None,
            discussion_id,
            created_by,
            created_at: Utc::now(),
        }
    }

    /// Attach suggestion metadata
    #[must_use]
    pub fn with_suggestion(mut self, confidence: Option<f64>, justification: Option<String>) -> Self {
        self.confidence = confidence.map(|c| c.clamp(0.0, 1.0));
        self.justification = justification;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_types_are_not_suggestion_only() {
        for t in RelationshipType::MANUAL {
            assert!(!t.is_suggestion_only());
            assert_eq!(t.coarse(), t);
        }
        assert!(RelationshipType::Challenges.is_suggestion_only());
        assert_eq!(RelationshipType::Challenges.coarse(), RelationshipType::Opposes);
    }

    #[test]
    fn relationship_type_parses_kebab_and_snake() {
        assert_eq!(
            "relates-to".parse::<RelationshipType>().unwrap(),
            RelationshipType::RelatesTo
        );
        assert_eq!(
            "RESPONDS_TO".parse::<RelationshipType>().unwrap(),
            RelationshipType::RespondsTo
        );
        assert!("likes".parse::<RelationshipType>().is_err());
    }

    #[test]
    fn suggestion_confidence_is_clamped() {
        let rel = Relationship::new(
            NodeId::new(),
            NodeId::new(),
            RelationshipType::Supports,
            DiscussionId::new("d"),
            AuthorId::new("a"),
        )
        .with_suggestion(Some(1.7), None);
        assert_eq!(rel.confidence, Some(1.0));
    }
}
