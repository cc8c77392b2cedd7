//! Caller-facing request types

use crate::relationships::RelationshipRequest;
use ibis_model::{AuthorId, Category, DiscussionId, MessageId, NodeId, Point};
use serde::{Deserialize, Serialize};

/// A new contribution to place in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateNodeRequest {
    /// Short title (trimmed, 1..=200 characters)
    pub title: String,
    /// Optional body (trimmed, up to 1000 characters)
    pub description: Option<String>,
    /// IBIS category
    pub category: Category,
    /// Discussion the node belongs to
    pub discussion_id: DiscussionId,
    /// Submitting author
    pub author_id: AuthorId,
    /// Optional parent in the same discussion; steers placement
    pub parent_id: Option<NodeId>,
    /// Chat message the node was extracted from
    pub source_message_id: Option<MessageId>,
    /// Caller-chosen point; only zone-constrained
    pub position: Option<Point>,
    /// Edges to create from the new node (at most 3)
    pub relationships: Vec<RelationshipRequest>,
}

impl CreateNodeRequest {
    /// Minimal request
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        category: Category,
        discussion_id: DiscussionId,
        author_id: AuthorId,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            category,
            discussion_id,
            author_id,
            parent_id: None,
            source_message_id: None,
            position: None,
            relationships: Vec::new(),
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With parent
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent_id: NodeId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// With originating message
    #[inline]
    #[must_use]
    pub fn with_source_message(mut self, message_id: MessageId) -> Self {
        self.source_message_id = Some(message_id);
        self
    }

    /// With explicit position
    #[inline]
    #[must_use]
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    /// Add one relationship
    #[inline]
    #[must_use]
    pub fn with_relationship(mut self, relationship: RelationshipRequest) -> Self {
        self.relationships.push(relationship);
        self
    }
}

/// Field edits for an existing node; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeUpdate {
    /// New title
    pub title: Option<String>,
    /// New description; `Some(None)` clears it
    pub description: Option<Option<String>>,
    /// New category
    pub category: Option<Category>,
    /// New position (zone-constrained)
    pub position: Option<Point>,
}

impl NodeUpdate {
    /// Empty update
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set title
    #[inline]
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set or clear description
    #[inline]
    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Set category
    #[inline]
    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Set position
    #[inline]
    #[must_use]
    pub fn position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    /// Nothing to change
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.position.is_none()
    }
}

/// One root issue in a seeding batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootIssueDraft {
    /// Issue title
    pub title: String,
    /// Optional body
    pub description: Option<String>,
    /// Chat message the issue was extracted from
    pub source_message_id: Option<MessageId>,
}

impl RootIssueDraft {
    /// Draft with a title only
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            source_message_id: None,
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Up to five root issues seeded into a discussion at once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootIssueBatch {
    /// Target discussion
    pub discussion_id: DiscussionId,
    /// Submitting author
    pub author_id: AuthorId,
    /// Issues in display order
    pub drafts: Vec<RootIssueDraft>,
}

impl RootIssueBatch {
    /// Batch from titles
    #[must_use]
    pub fn from_titles<I, S>(discussion_id: DiscussionId, author_id: AuthorId, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            discussion_id,
            author_id,
            drafts: titles.into_iter().map(RootIssueDraft::new).collect(),
        }
    }
}
