//! In-process repository
//!
//! Backs the stress binary and the test suites. Enforces the relationship
//! endpoint invariant and batch all-or-nothing semantics the way a real
//! backend would.

use super::{GatewayError, NodeRepository};
use async_trait::async_trait;
use chrono::Utc;
use ibis_model::{AuthorId, DiscussionId, Node, NodeId, Relationship, RelationshipId};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Thread-safe map-backed repository
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    nodes: RwLock<HashMap<NodeId, Node>>,
    relationships: RwLock<HashMap<RelationshipId, Relationship>>,
    /// Simulated round-trip applied to every call
    latency: Duration,
}

impl InMemoryRepository {
    /// Create an empty repository
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository that sleeps `latency` on every call
    #[inline]
    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Number of stored nodes
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.read().len()
    }

    /// Number of stored relationships
    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.relationships.read().len()
    }

    /// Snapshot of every node in a discussion, oldest first
    #[must_use]
    pub fn nodes_in(&self, discussion_id: &DiscussionId) -> Vec<Node> {
        let mut nodes: Vec<Node> = self
            .nodes
            .read()
            .values()
            .filter(|n| &n.discussion_id == discussion_id)
            .cloned()
            .collect();
        nodes.sort_by_key(|n| (n.created_at, n.id));
        nodes
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn check_endpoints(
        nodes: &HashMap<NodeId, Node>,
        relationship: &Relationship,
    ) -> Result<(), GatewayError> {
        for endpoint in [relationship.source_id, relationship.target_id] {
            let node = nodes
                .get(&endpoint)
                .ok_or(GatewayError::NodeNotFound(endpoint))?;
            if node.discussion_id != relationship.discussion_id {
                return Err(GatewayError::Rejected(format!(
                    "node {endpoint} is not in discussion {}",
                    relationship.discussion_id
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl NodeRepository for InMemoryRepository {
    async fn insert_node(&self, node: Node) -> Result<NodeId, GatewayError> {
        self.round_trip().await;
        let mut nodes = self.nodes.write();
        if nodes.contains_key(&node.id) {
            return Err(GatewayError::AlreadyExists(format!("node {}", node.id)));
        }
        let id = node.id;
        nodes.insert(id, node);
        Ok(id)
    }

    async fn get_node(&self, id: NodeId) -> Result<Option<Node>, GatewayError> {
        self.round_trip().await;
        Ok(self.nodes.read().get(&id).cloned())
    }

    async fn update_node(&self, node: Node) -> Result<(), GatewayError> {
        self.round_trip().await;
        let mut nodes = self.nodes.write();
        match nodes.get_mut(&node.id) {
            Some(slot) => {
                *slot = node;
                Ok(())
            }
            None => Err(GatewayError::NodeNotFound(node.id)),
        }
    }

    async fn delete_node(&self, id: NodeId) -> Result<(), GatewayError> {
        self.round_trip().await;
        self.nodes
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or(GatewayError::NodeNotFound(id))
    }

    async fn query_recent_nodes_by_author(
        &self,
        discussion_id: &DiscussionId,
        author_id: &AuthorId,
        window: Duration,
    ) -> Result<Vec<Node>, GatewayError> {
        self.round_trip().await;
        let cutoff = chrono::Duration::from_std(window)
            .ok()
            .and_then(|w| Utc::now().checked_sub_signed(w));

        let mut recent: Vec<Node> = self
            .nodes
            .read()
            .values()
            .filter(|n| &n.discussion_id == discussion_id && &n.created_by == author_id)
            .filter(|n| cutoff.map_or(true, |c| n.created_at >= c))
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(recent)
    }

    async fn insert_relationships_batch(
        &self,
        relationships: Vec<Relationship>,
    ) -> Result<(), GatewayError> {
        self.round_trip().await;
        let nodes = self.nodes.read();
        let mut stored = self.relationships.write();

        let mut seen = HashSet::with_capacity(relationships.len());
        for relationship in &relationships {
            if stored.contains_key(&relationship.id) || !seen.insert(relationship.id) {
                return Err(GatewayError::AlreadyExists(format!(
                    "relationship {}",
                    relationship.id
                )));
            }
            Self::check_endpoints(&nodes, relationship)?;
        }

        for relationship in relationships {
            stored.insert(relationship.id, relationship);
        }
        Ok(())
    }

    async fn delete_relationship(&self, id: RelationshipId) -> Result<(), GatewayError> {
        self.round_trip().await;
        self.relationships
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or(GatewayError::RelationshipNotFound(id))
    }

    async fn relationships_for_node(&self, id: NodeId) -> Result<Vec<Relationship>, GatewayError> {
        self.round_trip().await;
        let mut found: Vec<Relationship> = self
            .relationships
            .read()
            .values()
            .filter(|r| r.source_id == id || r.target_id == id)
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.created_at, r.id));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibis_model::{Category, Point, RelationshipType};

    fn node(discussion: &str, author: &str, title: &str) -> Node {
        Node::new(
            title,
            Category::Issue,
            DiscussionId::new(discussion),
            AuthorId::new(author),
            Point::new(425.0, 325.0),
        )
    }

    fn edge(source: &Node, target: &Node) -> Relationship {
        Relationship::new(
            source.id,
            target.id,
            RelationshipType::Supports,
            source.discussion_id.clone(),
            source.created_by.clone(),
        )
    }

    #[tokio::test]
    async fn insert_get_delete() {
        let repo = InMemoryRepository::new();
        let n = node("d", "a", "t");
        let id = repo.insert_node(n.clone()).await.unwrap();

        assert_eq!(repo.get_node(id).await.unwrap(), Some(n));
        repo.delete_node(id).await.unwrap();
        assert_eq!(repo.get_node(id).await.unwrap(), None);
        assert_eq!(
            repo.delete_node(id).await,
            Err(GatewayError::NodeNotFound(id))
        );
    }

    #[tokio::test]
    async fn duplicate_insert_rejected() {
        let repo = InMemoryRepository::new();
        let n = node("d", "a", "t");
        repo.insert_node(n.clone()).await.unwrap();
        assert!(matches!(
            repo.insert_node(n).await,
            Err(GatewayError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn recent_query_filters_author_discussion_and_window() {
        let repo = InMemoryRepository::new();
        let mine = node("d", "alice", "mine");
        let other_author = node("d", "bob", "theirs");
        let other_room = node("e", "alice", "elsewhere");
        let stale = node("d", "alice", "old").with_created_at(Utc::now() - chrono::Duration::minutes(5));
        for n in [&mine, &other_author, &other_room, &stale] {
            repo.insert_node(n.clone()).await.unwrap();
        }

        let recent = repo
            .query_recent_nodes_by_author(
                &DiscussionId::new("d"),
                &AuthorId::new("alice"),
                Duration::from_secs(30),
            )
            .await
            .unwrap();

        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, mine.id);
    }

    #[tokio::test]
    async fn batch_is_all_or_nothing() {
        let repo = InMemoryRepository::new();
        let a = node("d", "u", "a");
        let b = node("d", "u", "b");
        repo.insert_node(a.clone()).await.unwrap();
        repo.insert_node(b.clone()).await.unwrap();
        let missing = node("d", "u", "never stored");

        let result = repo
            .insert_relationships_batch(vec![edge(&a, &b), edge(&a, &missing)])
            .await;

        assert_eq!(result, Err(GatewayError::NodeNotFound(missing.id)));
        assert_eq!(repo.relationship_count(), 0);
    }

    #[tokio::test]
    async fn cross_discussion_edge_rejected() {
        let repo = InMemoryRepository::new();
        let a = node("d", "u", "a");
        let b = node("other", "u", "b");
        repo.insert_node(a.clone()).await.unwrap();
        repo.insert_node(b.clone()).await.unwrap();

        let result = repo.insert_relationships_batch(vec![edge(&a, &b)]).await;
        assert!(matches!(result, Err(GatewayError::Rejected(_))));
    }

    #[tokio::test]
    async fn relationships_for_node_and_delete() {
        let repo = InMemoryRepository::new();
        let a = node("d", "u", "a");
        let b = node("d", "u", "b");
        repo.insert_node(a.clone()).await.unwrap();
        repo.insert_node(b.clone()).await.unwrap();
        let rel = edge(&a, &b);
        repo.insert_relationships_batch(vec![rel.clone()]).await.unwrap();

        assert_eq!(repo.relationships_for_node(b.id).await.unwrap(), vec![rel.clone()]);
        repo.delete_relationship(rel.id).await.unwrap();
        assert!(repo.relationships_for_node(a.id).await.unwrap().is_empty());
    }
}
