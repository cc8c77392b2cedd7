//! Relationship builder
//!
//! Turns requested edges into [`Relationship`] rows and writes them through a
//! single all-or-nothing gateway batch. The builder never retries and never
//! inserts a partial batch; undoing the source node is the orchestrator's job.

use crate::gateway::{GatewayError, NodeRepository};
use crate::suggestion::RelationshipSuggestion;
use ibis_model::{
    AuthorId, DiscussionId, NodeId, Relationship, RelationshipId, RelationshipOrigin,
    RelationshipType, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// One edge to create from a new node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRequest {
    /// Existing node the edge points at
    pub target_id: NodeId,
    /// Edge type
    pub relationship_type: RelationshipType,
    /// Manual pick or suggestion
    pub origin: RelationshipOrigin,
    /// Suggestion confidence
    pub confidence: Option<f64>,
    /// Suggestion justification
    pub justification: Option<String>,
}

impl RelationshipRequest {
    /// Edge chosen by the author
    #[must_use]
    pub fn manual(target_id: NodeId, relationship_type: RelationshipType) -> Self {
        Self {
            target_id,
            relationship_type,
            origin: RelationshipOrigin::Manual,
            confidence: None,
            justification: None,
        }
    }

    /// Edge accepted from the suggestion service
    #[must_use]
    pub fn suggested(suggestion: &RelationshipSuggestion) -> Self {
        Self {
            target_id: suggestion.target_id,
            relationship_type: suggestion.relationship_type,
            origin: RelationshipOrigin::Suggested,
            confidence: Some(suggestion.confidence),
            justification: Some(suggestion.justification.clone()),
        }
    }
}

/// Relationship creation failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RelationshipError {
    /// Batch shape rejected before any write
    #[error("invalid relationship batch: {0}")]
    Invalid(#[from] ValidationError),

    /// Gateway refused or failed the batch
    #[error("relationship batch failed: {0}")]
    Gateway(#[from] GatewayError),
}

/// Writes edge batches for new nodes
#[derive(Clone)]
pub struct RelationshipBuilder {
    repo: Arc<dyn NodeRepository>,
    max_per_node: usize,
}

impl std::fmt::Debug for RelationshipBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationshipBuilder")
            .field("max_per_node", &self.max_per_node)
            .finish_non_exhaustive()
    }
}

impl RelationshipBuilder {
    /// Create a builder
    #[must_use]
    pub fn new(repo: Arc<dyn NodeRepository>, max_per_node: usize) -> Self {
        Self { repo, max_per_node }
    }

    /// Shape checks that need no I/O
    ///
    /// # Errors
    /// Too many items, a self-loop, a repeated target/type pair, or an AI-only
    /// type on a manual item.
    pub fn validate_batch(
        &self,
        source_id: Option<NodeId>,
        items: &[RelationshipRequest],
    ) -> Result<(), ValidationError> {
        if items.len() > self.max_per_node {
            return Err(ValidationError::TooManyRelationships {
                count: items.len(),
                max: self.max_per_node,
            });
        }

        let mut seen = HashSet::with_capacity(items.len());
        for item in items {
            if item.origin == RelationshipOrigin::Manual && item.relationship_type.is_suggestion_only() {
                return Err(ValidationError::SuggestionOnlyType(item.relationship_type));
            }
            if source_id == Some(item.target_id) {
                return Err(ValidationError::SelfLoop(item.target_id));
            }
            if !seen.insert((item.target_id, item.relationship_type)) {
                return Err(ValidationError::DuplicateRelationship {
                    target_id: item.target_id,
                    relationship_type: item.relationship_type,
                });
            }
        }
        Ok(())
    }

    /// Create every edge from `source_id` in one batch
    ///
    /// An empty item list succeeds without touching the gateway.
    ///
    /// # Errors
    /// [`RelationshipError::Invalid`] before any write, or
    /// [`RelationshipError::Gateway`] when the batch is rejected as a unit.
    pub async fn create_batch(
        &self,
        source_id: NodeId,
        items: &[RelationshipRequest],
        discussion_id: &DiscussionId,
        author_id: &AuthorId,
    ) -> Result<Vec<Relationship>, RelationshipError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        self.validate_batch(Some(source_id), items)?;

        let relationships: Vec<Relationship> = items
            .iter()
            .map(|item| {
                let relationship = Relationship::new(
                    source_id,
                    item.target_id,
                    item.relationship_type,
                    discussion_id.clone(),
                    author_id.clone(),
                );
                match item.origin {
                    RelationshipOrigin::Suggested => {
                        relationship.with_suggestion(item.confidence, item.justification.clone())
                    }
                    RelationshipOrigin::Manual => relationship,
                }
            })
            .collect();

        self.repo
            .insert_relationships_batch(relationships.clone())
            .await?;

        tracing::debug!(
            source = %source_id,
            count = relationships.len(),
            "relationship batch stored"
        );
        Ok(relationships)
    }

    /// Delete one relationship; nothing else is touched
    ///
    /// # Errors
    /// [`RelationshipError::Gateway`] if the row is missing or the delete fails.
    pub async fn delete(&self, id: RelationshipId) -> Result<(), RelationshipError> {
        self.repo.delete_relationship(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryRepository;
    use ibis_model::{Category, Node, Point};

    async fn setup() -> (Arc<InMemoryRepository>, RelationshipBuilder, Node, Node) {
        let repo = Arc::new(InMemoryRepository::new());
        let discussion = DiscussionId::new("d");
        let author = AuthorId::new("a");
        let issue = Node::new("Issue", Category::Issue, discussion.clone(), author.clone(), Point::default());
        let position = Node::new("Position", Category::Position, discussion, author, Point::default());
        repo.insert_node(issue.clone()).await.unwrap();
        repo.insert_node(position.clone()).await.unwrap();
        let builder = RelationshipBuilder::new(repo.clone(), 3);
        (repo, builder, issue, position)
    }

    #[tokio::test]
    async fn empty_batch_is_noop() {
        let (repo, builder, issue, _) = setup().await;
        let created = builder
            .create_batch(issue.id, &[], &issue.discussion_id, &issue.created_by)
            .await
            .unwrap();
        assert!(created.is_empty());
        assert_eq!(repo.relationship_count(), 0);
    }

    #[tokio::test]
    async fn creates_suggested_edge_with_metadata() {
        let (repo, builder, issue, position) = setup().await;
        let suggestion = RelationshipSuggestion {
            target_id: issue.id,
            relationship_type: RelationshipType::Answers,
            confidence: 0.8,
            justification: "proposes an answer".to_string(),
        };

        let created = builder
            .create_batch(
                position.id,
                &[RelationshipRequest::suggested(&suggestion)],
                &position.discussion_id,
                &position.created_by,
            )
            .await
            .unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].confidence, Some(0.8));
        assert_eq!(repo.relationship_count(), 1);
    }

    #[tokio::test]
    async fn missing_target_fails_whole_batch() {
        let (repo, builder, issue, position) = setup().await;
        let items = [
            RelationshipRequest::manual(issue.id, RelationshipType::RespondsTo),
            RelationshipRequest::manual(NodeId::new(), RelationshipType::Supports),
        ];

        let result = builder
            .create_batch(position.id, &items, &position.discussion_id, &position.created_by)
            .await;

        assert!(matches!(
            result,
            Err(RelationshipError::Gateway(GatewayError::NodeNotFound(_)))
        ));
        assert_eq!(repo.relationship_count(), 0);
    }

    #[test]
    fn shape_checks() {
        let repo = Arc::new(InMemoryRepository::new());
        let builder = RelationshipBuilder::new(repo, 3);
        let source = NodeId::new();
        let target = NodeId::new();

        let too_many: Vec<_> = (0..4)
            .map(|_| RelationshipRequest::manual(NodeId::new(), RelationshipType::RelatesTo))
            .collect();
        assert_eq!(
            builder.validate_batch(Some(source), &too_many),
            Err(ValidationError::TooManyRelationships { count: 4, max: 3 })
        );

        let self_loop = [RelationshipRequest::manual(source, RelationshipType::Supports)];
        assert_eq!(
            builder.validate_batch(Some(source), &self_loop),
            Err(ValidationError::SelfLoop(source))
        );

        let ai_only = [RelationshipRequest::manual(target, RelationshipType::Challenges)];
        assert_eq!(
            builder.validate_batch(Some(source), &ai_only),
            Err(ValidationError::SuggestionOnlyType(RelationshipType::Challenges))
        );

        let repeated = [
            RelationshipRequest::manual(target, RelationshipType::Supports),
            RelationshipRequest::manual(target, RelationshipType::Supports),
        ];
        assert!(matches!(
            builder.validate_batch(Some(source), &repeated),
            Err(ValidationError::DuplicateRelationship { .. })
        ));
    }
}
