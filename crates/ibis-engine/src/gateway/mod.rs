//! Node repository gateway
//!
//! The engine's only shared mutable resource. No transaction primitive is
//! assumed: single-row node writes and one all-or-nothing relationship batch
//! are the atomic units, and multi-step atomicity is built on top by
//! compensation in the orchestrator.

mod memory;

pub use memory::InMemoryRepository;

use async_trait::async_trait;
use ibis_model::{AuthorId, DiscussionId, Node, NodeId, Relationship, RelationshipId};
use std::time::Duration;

/// Failure reported by a repository backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Node does not exist
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// Relationship does not exist
    #[error("relationship {0} not found")]
    RelationshipNotFound(RelationshipId),

    /// Row with the same id already present
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Backend refused the write (constraint, endpoint mismatch, ...)
    #[error("rejected: {0}")]
    Rejected(String),

    /// Backend unreachable or timed out
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    /// Whether a retry could plausibly succeed
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Persistence boundary for nodes and relationships
#[async_trait]
pub trait NodeRepository: Send + Sync {
    /// Insert one node row
    async fn insert_node(&self, node: Node) -> Result<NodeId, GatewayError>;

    /// Read a node by id
    async fn get_node(&self, id: NodeId) -> Result<Option<Node>, GatewayError>;

    /// Replace an existing node row
    async fn update_node(&self, node: Node) -> Result<(), GatewayError>;

    /// Delete one node row (no cascade)
    async fn delete_node(&self, id: NodeId) -> Result<(), GatewayError>;

    /// Nodes by `author` in `discussion` created within the trailing `window`,
    /// newest first
    async fn query_recent_nodes_by_author(
        &self,
        discussion_id: &DiscussionId,
        author_id: &AuthorId,
        window: Duration,
    ) -> Result<Vec<Node>, GatewayError>;

    /// Insert every relationship or none
    async fn insert_relationships_batch(
        &self,
        relationships: Vec<Relationship>,
    ) -> Result<(), GatewayError>;

    /// Delete one relationship row
    async fn delete_relationship(&self, id: RelationshipId) -> Result<(), GatewayError>;

    /// Relationships where the node is source or target
    async fn relationships_for_node(&self, id: NodeId) -> Result<Vec<Relationship>, GatewayError>;
}
