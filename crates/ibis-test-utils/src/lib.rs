//! Testing utilities for the IBIS graph workspace
//!
//! Switchable-failure repository, embedding and suggestion doubles, and
//! request fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use ibis_engine::{
    EmbeddingError, EmbeddingService, EngineConfig, GatewayError, GraphOrchestrator,
    InMemoryRepository, NodeRepository, RelationshipSuggester, RelationshipSuggestion, RetryPolicy,
    SuggestionError, SuggestionQuery,
};
use ibis_engine::{CreateNodeRequest, RelationshipRequest};
use ibis_model::{
    AuthorId, Category, DiscussionId, Node, NodeId, Relationship, RelationshipId, RelationshipType,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const UNLIMITED: usize = usize::MAX;
const ALWAYS: u32 = u32::MAX;

/// In-memory repository with failures that tests switch on and off
#[derive(Debug)]
pub struct FaultyRepository {
    inner: InMemoryRepository,
    insert_allowance: AtomicUsize,
    fail_relationships: AtomicBool,
    delete_failures: AtomicU32,
    reject_deletes: AtomicBool,
    fail_recent: AtomicBool,
    insert_delay_ms: AtomicU64,
    insert_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    relationship_calls: AtomicUsize,
}

impl Default for FaultyRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultyRepository {
    pub fn new() -> Self {
        Self {
            inner: InMemoryRepository::new(),
            insert_allowance: AtomicUsize::new(UNLIMITED),
            fail_relationships: AtomicBool::new(false),
            delete_failures: AtomicU32::new(0),
            reject_deletes: AtomicBool::new(false),
            fail_recent: AtomicBool::new(false),
            insert_delay_ms: AtomicU64::new(0),
            insert_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            relationship_calls: AtomicUsize::new(0),
        }
    }

    /// Backing store, for assertions
    pub fn inner(&self) -> &InMemoryRepository {
        &self.inner
    }

    /// Every node insert fails
    pub fn fail_node_inserts(&self) {
        self.insert_allowance.store(0, Ordering::SeqCst);
    }

    /// The next `n` inserts succeed, the rest fail
    pub fn fail_inserts_after(&self, n: usize) {
        self.insert_allowance.store(n, Ordering::SeqCst);
    }

    /// Relationship batches fail (or stop failing)
    pub fn fail_relationship_batches(&self, fail: bool) {
        self.fail_relationships.store(fail, Ordering::SeqCst);
    }

    /// The next `n` node deletes fail
    pub fn fail_next_deletes(&self, n: u32) {
        self.delete_failures.store(n, Ordering::SeqCst);
    }

    /// Every node delete fails
    pub fn fail_all_deletes(&self) {
        self.delete_failures.store(ALWAYS, Ordering::SeqCst);
    }

    /// Node deletes fail with a permanent (non-transient) error
    pub fn reject_deletes(&self) {
        self.reject_deletes.store(true, Ordering::SeqCst);
    }

    /// Recent-node queries fail (or stop failing)
    pub fn fail_recent_queries(&self, fail: bool) {
        self.fail_recent.store(fail, Ordering::SeqCst);
    }

    /// Sleep before every node insert
    pub fn delay_inserts(&self, delay: Duration) {
        self.insert_delay_ms
            .store(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), Ordering::SeqCst);
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn relationship_batch_calls(&self) -> usize {
        self.relationship_calls.load(Ordering::SeqCst)
    }

    fn take_insert_allowance(&self) -> bool {
        self.insert_allowance
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                UNLIMITED => Some(UNLIMITED),
                n => Some(n - 1),
            })
            .is_ok()
    }

    fn take_delete_failure(&self) -> bool {
        self.delete_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                ALWAYS => Some(ALWAYS),
                n => Some(n - 1),
            })
            .is_ok()
    }
}

#[async_trait]
impl NodeRepository for FaultyRepository {
    async fn insert_node(&self, node: Node) -> Result<NodeId, GatewayError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.insert_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if !self.take_insert_allowance() {
            return Err(GatewayError::Unavailable("injected insert failure".to_string()));
        }
        self.inner.insert_node(node).await
    }

    async fn get_node(&self, id: NodeId) -> Result<Option<Node>, GatewayError> {
        self.inner.get_node(id).await
    }

    async fn update_node(&self, node: Node) -> Result<(), GatewayError> {
        self.inner.update_node(node).await
    }

    async fn delete_node(&self, id: NodeId) -> Result<(), GatewayError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_deletes.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected("injected delete rejection".to_string()));
        }
        if self.take_delete_failure() {
            return Err(GatewayError::Unavailable("injected delete failure".to_string()));
        }
        self.inner.delete_node(id).await
    }

    async fn query_recent_nodes_by_author(
        &self,
        discussion_id: &DiscussionId,
        author_id: &AuthorId,
        window: Duration,
    ) -> Result<Vec<Node>, GatewayError> {
        if self.fail_recent.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("injected query failure".to_string()));
        }
        self.inner
            .query_recent_nodes_by_author(discussion_id, author_id, window)
            .await
    }

    async fn insert_relationships_batch(
        &self,
        relationships: Vec<Relationship>,
    ) -> Result<(), GatewayError> {
        self.relationship_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_relationships.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected("injected relationship failure".to_string()));
        }
        self.inner.insert_relationships_batch(relationships).await
    }

    async fn delete_relationship(&self, id: RelationshipId) -> Result<(), GatewayError> {
        self.inner.delete_relationship(id).await
    }

    async fn relationships_for_node(&self, id: NodeId) -> Result<Vec<Relationship>, GatewayError> {
        self.inner.relationships_for_node(id).await
    }
}

/// Embedding service that remembers what it was asked to embed
#[derive(Debug, Default)]
pub struct RecordingEmbedder {
    embedded: Mutex<Vec<NodeId>>,
}

impl RecordingEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn embedded(&self) -> Vec<NodeId> {
        self.embedded.lock().clone()
    }
}

#[async_trait]
impl EmbeddingService for RecordingEmbedder {
    async fn embed(&self, node_id: NodeId) -> Result<(), EmbeddingError> {
        self.embedded.lock().push(node_id);
        Ok(())
    }
}

/// Embedding service that never succeeds
#[derive(Debug, Default)]
pub struct FailingEmbedder {
    attempts: AtomicUsize,
}

impl FailingEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingService for FailingEmbedder {
    async fn embed(&self, _node_id: NodeId) -> Result<(), EmbeddingError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(EmbeddingError::Unavailable("embedding backend down".to_string()))
    }
}

/// Suggestion service returning a fixed list
#[derive(Debug, Default)]
pub struct StaticSuggester {
    suggestions: Vec<RelationshipSuggestion>,
    calls: AtomicUsize,
}

impl StaticSuggester {
    pub fn new(suggestions: Vec<RelationshipSuggestion>) -> Self {
        Self {
            suggestions,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelationshipSuggester for StaticSuggester {
    async fn suggest(
        &self,
        query: &SuggestionQuery,
    ) -> Result<Vec<RelationshipSuggestion>, SuggestionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.suggestions.iter().take(query.limit).cloned().collect())
    }
}

/// Suggestion service that always fails
#[derive(Debug, Default)]
pub struct FailingSuggester;

#[async_trait]
impl RelationshipSuggester for FailingSuggester {
    async fn suggest(
        &self,
        _query: &SuggestionQuery,
    ) -> Result<Vec<RelationshipSuggestion>, SuggestionError> {
        Err(SuggestionError::Unavailable("suggestion backend timed out".to_string()))
    }
}

pub fn suggestion(target_id: NodeId, relationship_type: RelationshipType, confidence: f64) -> RelationshipSuggestion {
    RelationshipSuggestion {
        target_id,
        relationship_type,
        confidence,
        justification: format!("{relationship_type} with confidence {confidence}"),
    }
}

pub fn discussion() -> DiscussionId {
    DiscussionId::new("discussion-1")
}

pub fn author(name: &str) -> AuthorId {
    AuthorId::new(name)
}

pub fn issue_request(title: &str, author_name: &str) -> CreateNodeRequest {
    CreateNodeRequest::new(title, Category::Issue, discussion(), author(author_name))
}

/// Position answering `issue_id`, linked with a manual `responds_to` edge
pub fn position_request(title: &str, author_name: &str, issue_id: NodeId) -> CreateNodeRequest {
    CreateNodeRequest::new(title, Category::Position, discussion(), author(author_name))
        .with_parent(issue_id)
        .with_relationship(RelationshipRequest::manual(issue_id, RelationshipType::RespondsTo))
}

/// Seeded configuration with a short cleanup schedule
pub fn test_config() -> EngineConfig {
    EngineConfig::default()
        .with_seed(42)
        .with_cleanup_retry(RetryPolicy::new(3, 10))
}

pub fn engine(repo: Arc<dyn NodeRepository>) -> GraphOrchestrator {
    GraphOrchestrator::builder(repo)
        .config(test_config())
        .build()
        .unwrap()
}
