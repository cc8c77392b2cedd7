//! Relationship suggestions
//!
//! The suggestion service is an unreliable collaborator: it may fail, time
//! out or return junk. Whatever it returns is filtered here, and a failure is
//! never allowed to block node creation.

use crate::config::SuggestionPolicy;
use async_trait::async_trait;
use ibis_model::{Category, DiscussionId, NodeId, RelationshipType};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// A candidate edge proposed for a new contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipSuggestion {
    /// Existing node to link to
    pub target_id: NodeId,
    /// Proposed type (may be an AI-only synonym)
    pub relationship_type: RelationshipType,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Natural-language reason
    pub justification: String,
}

/// What the suggestion service is asked about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionQuery {
    /// Discussion to search for targets
    pub discussion_id: DiscussionId,
    /// Title of the new contribution
    pub title: String,
    /// Optional longer content
    pub content: Option<String>,
    /// Category of the new contribution
    pub category: Category,
    /// Maximum number of candidates wanted
    pub limit: usize,
}

/// Suggestion service failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SuggestionError {
    /// Service unreachable or timed out
    #[error("suggestion service unavailable: {0}")]
    Unavailable(String),

    /// Response could not be interpreted
    #[error("malformed suggestion response: {0}")]
    Malformed(String),
}

/// Proposes relationships for a new contribution
#[async_trait]
pub trait RelationshipSuggester: Send + Sync {
    /// Up to `query.limit` candidates
    async fn suggest(
        &self,
        query: &SuggestionQuery,
    ) -> Result<Vec<RelationshipSuggestion>, SuggestionError>;
}

/// Keep the best `max` suggestions at or above the confidence floor
///
/// Confidences are clamped to [0, 1] and NaN is dropped. Ties keep service
/// order. Only the strongest suggestion per target survives.
#[must_use]
pub fn select_suggestions(
    suggestions: Vec<RelationshipSuggestion>,
    policy: &SuggestionPolicy,
    max: usize,
) -> Vec<RelationshipSuggestion> {
    let mut kept: Vec<RelationshipSuggestion> = suggestions
        .into_iter()
        .filter(|s| !s.confidence.is_nan())
        .map(|mut s| {
            s.confidence = s.confidence.clamp(0.0, 1.0);
            s
        })
        .filter(|s| s.confidence >= policy.min_confidence)
        .collect();

    kept.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(Ordering::Equal));

    let mut targets = HashSet::new();
    kept.retain(|s| targets.insert(s.target_id));
    kept.truncate(max);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(target: NodeId, confidence: f64) -> RelationshipSuggestion {
        RelationshipSuggestion {
            target_id: target,
            relationship_type: RelationshipType::Supports,
            confidence,
            justification: String::new(),
        }
    }

    #[test]
    fn filters_sorts_and_caps() {
        let ids: Vec<NodeId> = (0..5).map(|_| NodeId::new()).collect();
        let raw = vec![
            suggestion(ids[0], 0.55),
            suggestion(ids[1], 0.2),
            suggestion(ids[2], 0.9),
            suggestion(ids[3], 0.7),
            suggestion(ids[4], 0.6),
        ];

        let selected = select_suggestions(raw, &SuggestionPolicy::default(), 3);
        let targets: Vec<NodeId> = selected.iter().map(|s| s.target_id).collect();
        assert_eq!(targets, vec![ids[2], ids[3], ids[4]]);
    }

    #[test]
    fn clamps_and_drops_nan() {
        let a = NodeId::new();
        let b = NodeId::new();
        let selected = select_suggestions(
            vec![suggestion(a, 1.4), suggestion(b, f64::NAN)],
            &SuggestionPolicy::default(),
            3,
        );
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].confidence, 1.0);
    }

    #[test]
    fn keeps_best_per_target() {
        let a = NodeId::new();
        let mut weaker = suggestion(a, 0.6);
        weaker.relationship_type = RelationshipType::Opposes;
        let selected = select_suggestions(
            vec![weaker, suggestion(a, 0.95)],
            &SuggestionPolicy::default(),
            3,
        );
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].relationship_type, RelationshipType::Supports);
    }
}
