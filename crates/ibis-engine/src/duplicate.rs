//! Near-duplicate detection
//!
//! Compares a candidate title against the author's own recent nodes in the
//! same discussion. Read-only; a failed read is returned, never swallowed.

use crate::config::DuplicatePolicy;
use crate::gateway::{GatewayError, NodeRepository};
use crate::similarity::title_similarity;
use ibis_model::{AuthorId, DiscussionId, Node};
use std::sync::Arc;

/// Existing node a candidate collides with
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch {
    /// The conflicting node
    pub node: Node,
    /// Similarity score that triggered the match
    pub similarity: f64,
}

/// Duplicate detector over a repository
#[derive(Clone)]
pub struct DuplicateDetector {
    repo: Arc<dyn NodeRepository>,
    policy: DuplicatePolicy,
}

impl std::fmt::Debug for DuplicateDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateDetector")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl DuplicateDetector {
    /// Create a detector
    #[must_use]
    pub fn new(repo: Arc<dyn NodeRepository>, policy: DuplicatePolicy) -> Self {
        Self { repo, policy }
    }

    /// Policy in use
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &DuplicatePolicy {
        &self.policy
    }

    /// Load the author's recent nodes in the discussion
    ///
    /// # Errors
    /// Propagates the gateway read failure.
    pub async fn recent(
        &self,
        discussion_id: &DiscussionId,
        author_id: &AuthorId,
    ) -> Result<Vec<Node>, GatewayError> {
        self.repo
            .query_recent_nodes_by_author(discussion_id, author_id, self.policy.window())
            .await
    }

    /// First recent node whose title is at or above the threshold
    ///
    /// # Errors
    /// Propagates the gateway read failure; callers must treat it as fatal.
    pub async fn check_duplicate(
        &self,
        candidate_title: &str,
        discussion_id: &DiscussionId,
        author_id: &AuthorId,
    ) -> Result<Option<DuplicateMatch>, GatewayError> {
        let recent = self.recent(discussion_id, author_id).await?;
        let found = self.find_in(candidate_title, &recent);
        if let Some(m) = &found {
            tracing::debug!(
                existing = %m.node.id,
                similarity = m.similarity,
                "near-duplicate title detected"
            );
        }
        Ok(found)
    }

    /// Pure comparison against an already loaded candidate list
    #[must_use]
    pub fn find_in(&self, candidate_title: &str, existing: &[Node]) -> Option<DuplicateMatch> {
        existing.iter().find_map(|node| {
            let similarity = title_similarity(candidate_title, &node.title);
            (similarity >= self.policy.threshold).then(|| DuplicateMatch {
                node: node.clone(),
                similarity,
            })
        })
    }

    /// Whether two titles would be flagged against each other
    #[inline]
    #[must_use]
    pub fn is_near_duplicate(&self, a: &str, b: &str) -> bool {
        title_similarity(a, b) >= self.policy.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryRepository;
    use ibis_model::{Category, Point};

    fn node(title: &str, author: &str) -> Node {
        Node::new(
            title,
            Category::Issue,
            DiscussionId::new("d"),
            AuthorId::new(author),
            Point::new(425.0, 325.0),
        )
    }

    async fn detector_with(nodes: Vec<Node>) -> DuplicateDetector {
        let repo = Arc::new(InMemoryRepository::new());
        for n in nodes {
            repo.insert_node(n).await.unwrap();
        }
        DuplicateDetector::new(repo, DuplicatePolicy::default())
    }

    #[tokio::test]
    async fn detects_case_and_punctuation_variant() {
        let detector = detector_with(vec![node("Budget Reform Now", "alice")]).await;
        let found = detector
            .check_duplicate("budget reform now!!", &DiscussionId::new("d"), &AuthorId::new("alice"))
            .await
            .unwrap()
            .expect("duplicate expected");
        assert_eq!(found.node.title, "Budget Reform Now");
        assert_eq!(found.similarity, 1.0);
    }

    #[tokio::test]
    async fn different_topic_passes() {
        let detector = detector_with(vec![node("Budget Reform", "alice")]).await;
        let found = detector
            .check_duplicate("Tax Policy Overhaul", &DiscussionId::new("d"), &AuthorId::new("alice"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn other_authors_are_ignored() {
        let detector = detector_with(vec![node("Budget Reform Now", "bob")]).await;
        let found = detector
            .check_duplicate("Budget Reform Now", &DiscussionId::new("d"), &AuthorId::new("alice"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn threshold_is_inclusive() {
        let repo = Arc::new(InMemoryRepository::new());
        let policy = DuplicatePolicy {
            threshold: 2.0 / 3.0,
            ..DuplicatePolicy::default()
        };
        let detector = DuplicateDetector::new(repo, policy);
        assert!(detector.is_near_duplicate("budget reform", "budget reform now"));
        assert!(!detector.is_near_duplicate("budget", "budget reform now"));
    }
}
