//! Graph orchestrator
//!
//! Entry point for every graph mutation. A creation run validates, checks for
//! near-duplicates, places the node, stores it, links it and hands it to the
//! embedding worker. The gateway has no transactions, so a failed relationship
//! batch is compensated by deleting the node that was just stored.
//!
//! Mutations are serialized per author and each run is spawned onto the
//! runtime: dropping the caller's future never leaves a run half-done.

mod request;
mod state;

pub use request::{CreateNodeRequest, NodeUpdate, RootIssueBatch, RootIssueDraft};
pub use state::{
    allowed_transitions, validate_transition, CreationOutcome, CreationState, CreationTrace,
    IllegalTransition,
};

use crate::config::{ConfigError, EngineConfig};
use crate::duplicate::DuplicateDetector;
use crate::embedding::{EmbeddingDispatch, EmbeddingQueue};
use crate::error::{CleanupError, CreationError, Result, RollbackStatus, Stage};
use crate::gateway::{GatewayError, NodeRepository};
use crate::relationships::{RelationshipBuilder, RelationshipError, RelationshipRequest};
use crate::serializer::WriteSerializer;
use crate::suggestion::{select_suggestions, RelationshipSuggester, RelationshipSuggestion, SuggestionQuery};
use chrono::Utc;
use ibis_layout::PositionAllocator;
use ibis_model::{
    normalize_description, normalize_title, AuthorId, Category, DiscussionId, Node, NodeId,
    Point, RelationshipId, ValidationError,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::sync::Arc;

/// Builder for [`GraphOrchestrator`]
pub struct GraphOrchestratorBuilder {
    repo: Arc<dyn NodeRepository>,
    config: EngineConfig,
    embeddings: Option<EmbeddingQueue>,
    suggester: Option<Arc<dyn RelationshipSuggester>>,
}

impl GraphOrchestratorBuilder {
    /// Engine configuration (defaults otherwise)
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Queue of a running embedding worker
    #[must_use]
    pub fn embeddings(mut self, queue: EmbeddingQueue) -> Self {
        self.embeddings = Some(queue);
        self
    }

    /// Relationship suggestion service
    #[must_use]
    pub fn suggester(mut self, suggester: Arc<dyn RelationshipSuggester>) -> Self {
        self.suggester = Some(suggester);
        self
    }

    /// Validate the configuration and assemble the orchestrator
    ///
    /// # Errors
    /// Any [`EngineConfig::validate`] failure.
    pub fn build(self) -> std::result::Result<GraphOrchestrator, ConfigError> {
        self.config.validate()?;
        let config = self.config;

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let inner = Inner {
            detector: DuplicateDetector::new(self.repo.clone(), config.duplicate.clone()),
            allocator: PositionAllocator::new(config.layout.clone()),
            builder: RelationshipBuilder::new(
                self.repo.clone(),
                config.limits.max_relationships_per_node,
            ),
            serializer: WriteSerializer::new(),
            embeddings: self.embeddings,
            suggester: self.suggester,
            rng: Mutex::new(rng),
            repo: self.repo,
            config,
        };

        Ok(GraphOrchestrator {
            inner: Arc::new(inner),
        })
    }
}

/// Creates and edits IBIS nodes and their relationships
#[derive(Clone)]
pub struct GraphOrchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for GraphOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphOrchestrator")
            .field("config", &self.inner.config)
            .field("pending_authors", &self.inner.serializer.len())
            .finish_non_exhaustive()
    }
}

impl GraphOrchestrator {
    /// Start building an orchestrator over `repo`
    #[must_use]
    pub fn builder(repo: Arc<dyn NodeRepository>) -> GraphOrchestratorBuilder {
        GraphOrchestratorBuilder {
            repo,
            config: EngineConfig::default(),
            embeddings: None,
            suggester: None,
        }
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Authors with a mutation in flight or queued
    #[inline]
    #[must_use]
    pub fn pending_authors(&self) -> usize {
        self.inner.serializer.len()
    }

    /// Create one node and its manual relationships
    ///
    /// # Errors
    /// Any [`CreationError`]. On [`CreationError::Relationship`] the node has
    /// been deleted again unless the rollback status says otherwise.
    pub async fn create_node(&self, request: CreateNodeRequest) -> Result<CreationOutcome> {
        let inner = self.inner.clone();
        detached(async move { inner.create(request).await }).await
    }

    /// Create one node, linking it to suggested targets when the request
    /// carries no manual relationships
    ///
    /// Suggestions are fetched before the author's lock is taken. A failing
    /// or empty suggestion service yields a node with no relationships.
    ///
    /// # Errors
    /// As [`Self::create_node`].
    pub async fn create_with_suggestions(
        &self,
        mut request: CreateNodeRequest,
    ) -> Result<CreationOutcome> {
        let inner = self.inner.clone();
        detached(async move {
            if request.relationships.is_empty() {
                request.relationships = inner
                    .suggestions_for(&request)
                    .await
                    .iter()
                    .map(RelationshipRequest::suggested)
                    .collect();
            }
            inner.create(request).await
        })
        .await
    }

    /// Filtered suggestions for a prospective node, without creating it
    pub async fn suggest_relationships(&self, request: &CreateNodeRequest) -> Vec<RelationshipSuggestion> {
        self.inner.suggestions_for(request).await
    }

    /// Seed a discussion with up to five root issues laid out on a grid
    ///
    /// All drafts are validated before anything is written. If an insert
    /// fails, the issues already stored are deleted again.
    ///
    /// # Errors
    /// [`CreationError::Validation`] for the batch shape or any draft,
    /// [`CreationError::Duplicate`] when a draft repeats a recent node, or
    /// [`CreationError::Persistence`] when the gateway fails.
    pub async fn create_root_issues(&self, batch: RootIssueBatch) -> Result<Vec<CreationOutcome>> {
        let inner = self.inner.clone();
        detached(async move { inner.create_root_issues(batch).await }).await
    }

    /// Edit an existing node; the position is re-constrained to the
    /// (possibly new) category's zone
    ///
    /// # Errors
    /// [`CreationError::NotFound`], [`CreationError::NotOwner`], a
    /// validation failure, or a gateway failure.
    pub async fn update_node(
        &self,
        node_id: NodeId,
        author_id: AuthorId,
        update: NodeUpdate,
    ) -> Result<Node> {
        let inner = self.inner.clone();
        detached(async move { inner.update(node_id, author_id, update).await }).await
    }

    /// Move a node to exactly `position`, bypassing zone constraints
    ///
    /// # Errors
    /// [`CreationError::NotFound`], a non-finite position, or a gateway
    /// failure.
    pub async fn admin_reposition(
        &self,
        node_id: NodeId,
        author_id: AuthorId,
        position: Point,
    ) -> Result<Node> {
        let inner = self.inner.clone();
        detached(async move { inner.reposition(node_id, author_id, position).await }).await
    }

    /// Delete one relationship
    ///
    /// # Errors
    /// [`CreationError::Persistence`] when the relationship is missing or the
    /// delete fails.
    pub async fn delete_relationship(
        &self,
        relationship_id: RelationshipId,
        author_id: AuthorId,
    ) -> Result<()> {
        let inner = self.inner.clone();
        detached(async move { inner.delete_relationship(relationship_id, author_id).await }).await
    }
}

/// Run to completion on the runtime regardless of what happens to the caller
async fn detached<T, F>(run: F) -> Result<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    match tokio::spawn(run).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(CreationError::Interrupted),
    }
}

/// Input after trimming and shape checks
struct Checked {
    title: String,
    description: Option<String>,
}

struct Inner {
    config: EngineConfig,
    repo: Arc<dyn NodeRepository>,
    detector: DuplicateDetector,
    allocator: PositionAllocator,
    builder: RelationshipBuilder,
    serializer: WriteSerializer,
    embeddings: Option<EmbeddingQueue>,
    suggester: Option<Arc<dyn RelationshipSuggester>>,
    rng: Mutex<StdRng>,
}

impl Inner {
    async fn create(&self, request: CreateNodeRequest) -> Result<CreationOutcome> {
        let mut trace = CreationTrace::new();
        let checked = match self.check(&request) {
            Ok(checked) => checked,
            Err(e) => return Err(reject(&mut trace, &request.author_id, e.into())),
        };

        let author = request.author_id.clone();
        self.serializer
            .with_lock(&author, move || self.create_locked(request, checked, trace))
            .await
    }

    fn check(&self, request: &CreateNodeRequest) -> std::result::Result<Checked, ValidationError> {
        let title = normalize_title(&request.title)?;
        let description = normalize_description(request.description.as_deref())?;
        check_scope(&request.discussion_id, &request.author_id)?;
        if request.position.is_some_and(|p| !p.is_finite()) {
            return Err(ValidationError::NonFinitePosition);
        }
        self.builder.validate_batch(None, &request.relationships)?;
        Ok(Checked { title, description })
    }

    async fn create_locked(
        &self,
        request: CreateNodeRequest,
        checked: Checked,
        mut trace: CreationTrace,
    ) -> Result<CreationOutcome> {
        let author = &request.author_id;

        trace.enter(CreationState::DuplicateChecking);
        match self
            .detector
            .check_duplicate(&checked.title, &request.discussion_id, author)
            .await
        {
            Ok(None) => {}
            Ok(Some(found)) => {
                let error = CreationError::Duplicate {
                    conflicting_title: found.node.title,
                    existing_id: found.node.id,
                    similarity: found.similarity,
                };
                return Err(reject(&mut trace, author, error));
            }
            Err(e) => {
                let error = CreationError::persistence(Stage::DuplicateCheck, e);
                return Err(reject(&mut trace, author, error));
            }
        }

        trace.enter(CreationState::Positioning);
        let position = match self.place(&request).await {
            Ok(position) => position,
            Err(e) => return Err(reject(&mut trace, author, e)),
        };

        trace.enter(CreationState::Persisting);
        let node = Node::new(
            checked.title,
            request.category,
            request.discussion_id.clone(),
            author.clone(),
            position,
        )
        .with_description(checked.description)
        .with_parent(request.parent_id)
        .with_source_message(request.source_message_id.clone());

        if let Err(e) = self.repo.insert_node(node.clone()).await {
            let error = CreationError::persistence(Stage::InsertNode, e);
            return Err(reject(&mut trace, author, error));
        }

        trace.enter(CreationState::LinkingRelationships);
        let relationships = match self
            .builder
            .create_batch(node.id, &request.relationships, &node.discussion_id, author)
            .await
        {
            Ok(relationships) => relationships,
            Err(source) => {
                tracing::warn!(
                    node_id = %node.id,
                    author = %author,
                    error = %source,
                    "relationship batch failed, rolling back node"
                );
                let rollback = self.rollback_node(node.id).await;
                trace.enter(CreationState::RolledBack);
                return Err(CreationError::Relationship { source, rollback });
            }
        };

        trace.enter(CreationState::EmbeddingTriggered);
        let embedding = self.dispatch_embedding(node.id);

        trace.enter(CreationState::Done);
        tracing::info!(
            node_id = %node.id,
            author = %author,
            discussion = %node.discussion_id,
            category = %node.category,
            relationships = relationships.len(),
            "node created"
        );

        Ok(CreationOutcome {
            node,
            relationships,
            embedding,
            trace,
        })
    }

    /// Parent lookup, allocation, zone constraint
    async fn place(&self, request: &CreateNodeRequest) -> Result<Point> {
        let parent = match request.parent_id {
            Some(parent_id) => {
                let parent = self
                    .repo
                    .get_node(parent_id)
                    .await
                    .map_err(|e| CreationError::persistence(Stage::ParentLookup, e))?
                    .ok_or(ValidationError::ParentNotFound(parent_id))?;
                if parent.discussion_id != request.discussion_id {
                    return Err(ValidationError::ParentInOtherDiscussion(parent_id).into());
                }
                Some(parent.position)
            }
            None => None,
        };

        let point = match request.position {
            Some(point) => point,
            None => {
                let mut rng = self.rng.lock();
                self.allocator.allocate(request.category, parent, &mut *rng)
            }
        };
        Ok(self.config.layout.zones.constrain(request.category, point))
    }

    /// Delete a node stored by a failed run
    async fn rollback_node(&self, node_id: NodeId) -> RollbackStatus {
        let repo = &self.repo;
        let outcome = self
            .config
            .cleanup_retry
            .run_if(
                move |attempt| async move {
                    match repo.delete_node(node_id).await {
                        Ok(()) | Err(GatewayError::NodeNotFound(_)) => Ok(()),
                        Err(e) => {
                            tracing::warn!(node_id = %node_id, attempt, error = %e, "compensating delete failed");
                            Err(e)
                        }
                    }
                },
                GatewayError::is_transient,
            )
            .await;

        match outcome {
            Ok(((), attempts)) => {
                tracing::info!(node_id = %node_id, attempts, "node rolled back");
                RollbackStatus::RolledBack { attempts }
            }
            Err(exhausted) => {
                tracing::error!(
                    node_id = %node_id,
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "rollback exhausted, node orphaned"
                );
                RollbackStatus::CleanupFailed(CleanupError {
                    node_id,
                    attempts: exhausted.attempts,
                    last_error: exhausted.last_error,
                })
            }
        }
    }

    fn dispatch_embedding(&self, node_id: NodeId) -> EmbeddingDispatch {
        match &self.embeddings {
            Some(queue) => queue.enqueue(node_id),
            None => EmbeddingDispatch::Disabled,
        }
    }

    /// Ask the suggestion service, keep the best candidates that point at
    /// existing nodes in the discussion
    async fn suggestions_for(&self, request: &CreateNodeRequest) -> Vec<RelationshipSuggestion> {
        let Some(suggester) = &self.suggester else {
            return Vec::new();
        };

        let query = SuggestionQuery {
            discussion_id: request.discussion_id.clone(),
            title: request.title.trim().to_string(),
            content: request.description.clone(),
            category: request.category,
            limit: self.config.suggestions.request_limit,
        };

        let raw = match suggester.suggest(&query).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    author = %request.author_id,
                    discussion = %request.discussion_id,
                    error = %e,
                    "suggestion service failed, creating without relationships"
                );
                return Vec::new();
            }
        };

        let selected = select_suggestions(
            raw,
            &self.config.suggestions,
            self.config.limits.max_relationships_per_node,
        );

        let mut usable = Vec::with_capacity(selected.len());
        for suggestion in selected {
            match self.repo.get_node(suggestion.target_id).await {
                Ok(Some(target)) if target.discussion_id == request.discussion_id => {
                    usable.push(suggestion);
                }
                Ok(_) => {
                    tracing::debug!(target = %suggestion.target_id, "dropping suggestion for unknown target");
                }
                Err(e) => {
                    tracing::warn!(target = %suggestion.target_id, error = %e, "could not verify suggestion target");
                }
            }
        }
        usable
    }

    async fn create_root_issues(&self, batch: RootIssueBatch) -> Result<Vec<CreationOutcome>> {
        let checked = self.check_root_batch(&batch)?;
        let traces = checked.iter().map(|_| CreationTrace::new()).collect();

        let author = batch.author_id.clone();
        self.serializer
            .with_lock(&author, move || self.create_root_issues_locked(batch, checked, traces))
            .await
    }

    fn check_root_batch(&self, batch: &RootIssueBatch) -> Result<Vec<Checked>> {
        let max = self.config.limits.max_root_issues;
        if batch.drafts.is_empty() {
            return Err(ValidationError::EmptyBatch.into());
        }
        if batch.drafts.len() > max {
            return Err(ValidationError::TooManyRootIssues {
                count: batch.drafts.len(),
                max,
            }
            .into());
        }
        check_scope(&batch.discussion_id, &batch.author_id)?;

        let mut checked: Vec<Checked> = Vec::with_capacity(batch.drafts.len());
        for draft in &batch.drafts {
            let title = normalize_title(&draft.title)?;
            let description = normalize_description(draft.description.as_deref())?;
            if let Some(earlier) = checked
                .iter()
                .find(|c| self.detector.is_near_duplicate(&c.title, &title))
            {
                return Err(ValidationError::DuplicateInBatch {
                    first: earlier.title.clone(),
                    second: title,
                }
                .into());
            }
            checked.push(Checked { title, description });
        }
        Ok(checked)
    }

    async fn create_root_issues_locked(
        &self,
        batch: RootIssueBatch,
        checked: Vec<Checked>,
        mut traces: Vec<CreationTrace>,
    ) -> Result<Vec<CreationOutcome>> {
        let author = &batch.author_id;
        let discussion = &batch.discussion_id;
        for trace in &mut traces {
            trace.enter(CreationState::DuplicateChecking);
        }

        let recent = self
            .detector
            .recent(discussion, author)
            .await
            .map_err(|e| CreationError::persistence(Stage::DuplicateCheck, e))?;
        for item in &checked {
            if let Some(found) = self.detector.find_in(&item.title, &recent) {
                return Err(CreationError::Duplicate {
                    conflicting_title: found.node.title,
                    existing_id: found.node.id,
                    similarity: found.similarity,
                });
            }
        }

        let positions = self.allocator.root_issue_grid(checked.len());
        let nodes: Vec<Node> = checked
            .into_iter()
            .zip(batch.drafts)
            .zip(positions)
            .zip(&mut traces)
            .map(|(((item, draft), point), trace)| {
                trace.enter(CreationState::Positioning);
                let position = self.config.layout.zones.constrain(Category::Issue, point);
                Node::new(item.title, Category::Issue, discussion.clone(), author.clone(), position)
                    .with_description(item.description)
                    .with_source_message(draft.source_message_id)
            })
            .collect();

        for (stored, (node, trace)) in nodes.iter().zip(&mut traces).enumerate() {
            trace.enter(CreationState::Persisting);
            if let Err(e) = self.repo.insert_node(node.clone()).await {
                tracing::warn!(
                    author = %author,
                    discussion = %discussion,
                    failed_at = stored,
                    error = %e,
                    "root issue insert failed, rolling back batch"
                );
                let mut orphans = Vec::new();
                for earlier in nodes[..stored].iter().rev() {
                    if let RollbackStatus::CleanupFailed(cleanup) = self.rollback_node(earlier.id).await {
                        orphans.push(cleanup);
                    }
                }
                if orphans.is_empty() {
                    return Err(CreationError::persistence(Stage::InsertNode, e));
                }
                tracing::error!(
                    author = %author,
                    discussion = %discussion,
                    orphaned = orphans.len(),
                    "root issue batch left orphaned issues"
                );
                return Err(CreationError::BatchOrphaned { source: e, orphans });
            }
        }

        let outcomes = nodes
            .into_iter()
            .zip(traces)
            .map(|(node, mut trace)| {
                trace.enter(CreationState::LinkingRelationships);
                trace.enter(CreationState::EmbeddingTriggered);
                let embedding = self.dispatch_embedding(node.id);
                trace.enter(CreationState::Done);
                CreationOutcome {
                    node,
                    relationships: Vec::new(),
                    embedding,
                    trace,
                }
            })
            .collect::<Vec<_>>();

        tracing::info!(
            author = %author,
            discussion = %discussion,
            count = outcomes.len(),
            "root issues created"
        );
        Ok(outcomes)
    }

    async fn update(&self, node_id: NodeId, author_id: AuthorId, update: NodeUpdate) -> Result<Node> {
        let title = update.title.as_deref().map(normalize_title).transpose()?;
        let description = update
            .description
            .as_ref()
            .map(|d| normalize_description(d.as_deref()))
            .transpose()?;
        if update.position.is_some_and(|p| !p.is_finite()) {
            return Err(ValidationError::NonFinitePosition.into());
        }

        let author = &author_id;
        self.serializer
            .with_lock(author, move || async move {
                let mut node = self.load(node_id).await?;
                if node.created_by != *author {
                    return Err(CreationError::NotOwner(node_id));
                }
                if update.is_empty() {
                    return Ok(node);
                }

                if let Some(title) = title {
                    node.title = title;
                }
                if let Some(description) = description {
                    node.description = description;
                }
                if let Some(category) = update.category {
                    node.category = category;
                }
                let point = update.position.unwrap_or(node.position);
                node.position = self.config.layout.zones.constrain(node.category, point);

                self.store(node).await
            })
            .await
    }

    async fn reposition(&self, node_id: NodeId, author_id: AuthorId, position: Point) -> Result<Node> {
        if !position.is_finite() {
            return Err(ValidationError::NonFinitePosition.into());
        }

        let author = &author_id;
        self.serializer
            .with_lock(author, move || async move {
                let mut node = self.load(node_id).await?;
                node.position = position;
                tracing::info!(node_id = %node_id, author = %author, "administrative reposition");
                self.store(node).await
            })
            .await
    }

    async fn delete_relationship(&self, relationship_id: RelationshipId, author_id: AuthorId) -> Result<()> {
        let author = &author_id;
        self.serializer
            .with_lock(author, move || async move {
                self.builder
                    .delete(relationship_id)
                    .await
                    .map_err(|e| match e {
                        RelationshipError::Gateway(source) => {
                            CreationError::persistence(Stage::DeleteRelationship, source)
                        }
                        RelationshipError::Invalid(v) => CreationError::Validation(v),
                    })?;
                tracing::info!(relationship_id = %relationship_id, author = %author, "relationship deleted");
                Ok(())
            })
            .await
    }

    async fn load(&self, node_id: NodeId) -> Result<Node> {
        self.repo
            .get_node(node_id)
            .await
            .map_err(|e| CreationError::persistence(Stage::LoadNode, e))?
            .ok_or(CreationError::NotFound(node_id))
    }

    async fn store(&self, mut node: Node) -> Result<Node> {
        node.updated_at = Utc::now();
        match self.repo.update_node(node.clone()).await {
            Ok(()) => Ok(node),
            Err(GatewayError::NodeNotFound(id)) => Err(CreationError::NotFound(id)),
            Err(e) => Err(CreationError::persistence(Stage::UpdateNode, e)),
        }
    }
}

fn check_scope(
    discussion_id: &DiscussionId,
    author_id: &AuthorId,
) -> std::result::Result<(), ValidationError> {
    if discussion_id.is_blank() {
        return Err(ValidationError::MissingDiscussion);
    }
    if author_id.is_blank() {
        return Err(ValidationError::MissingAuthor);
    }
    Ok(())
}

fn reject(trace: &mut CreationTrace, author: &AuthorId, error: CreationError) -> CreationError {
    let stage = trace.current();
    trace.enter(CreationState::Rejected);
    tracing::debug!(author = %author, stage = %stage, error = %error, "creation rejected");
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryRepository;
    use ibis_model::RelationshipType;

    fn orchestrator() -> (Arc<InMemoryRepository>, GraphOrchestrator) {
        let repo = Arc::new(InMemoryRepository::new());
        let orchestrator = GraphOrchestrator::builder(repo.clone())
            .config(EngineConfig::default().with_seed(7))
            .build()
            .unwrap();
        (repo, orchestrator)
    }

    fn request(title: &str, category: Category) -> CreateNodeRequest {
        CreateNodeRequest::new(title, category, DiscussionId::new("d"), AuthorId::new("alice"))
    }

    #[tokio::test]
    async fn creates_node_in_zone() {
        let (repo, orchestrator) = orchestrator();
        let outcome = orchestrator
            .create_node(request("  Should we cut the budget?  ", Category::Issue))
            .await
            .unwrap();

        assert_eq!(outcome.node.title, "Should we cut the budget?");
        assert_eq!(outcome.trace.current(), CreationState::Done);
        assert_eq!(outcome.embedding, EmbeddingDispatch::Disabled);
        assert!(orchestrator.config().layout.zones.issue.contains(outcome.node.position));
        assert_eq!(repo.node_count(), 1);
    }

    #[tokio::test]
    async fn blank_title_rejected_without_writes() {
        let (repo, orchestrator) = orchestrator();
        let err = orchestrator
            .create_node(request("   ", Category::Issue))
            .await
            .unwrap_err();
        assert_eq!(err, CreationError::Validation(ValidationError::EmptyTitle));
        assert_eq!(repo.node_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_reports_existing_node() {
        let (_, orchestrator) = orchestrator();
        let first = orchestrator
            .create_node(request("Budget Reform Now", Category::Issue))
            .await
            .unwrap();
        let err = orchestrator
            .create_node(request("budget reform now!!", Category::Issue))
            .await
            .unwrap_err();

        match err {
            CreationError::Duplicate { existing_id, similarity, .. } => {
                assert_eq!(existing_id, first.node.id);
                assert_eq!(similarity, 1.0);
            }
            other => panic!("expected duplicate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn parent_steers_placement_and_must_share_discussion() {
        let (_, orchestrator) = orchestrator();
        let issue = orchestrator
            .create_node(request("Transit funding", Category::Issue))
            .await
            .unwrap()
            .node;

        let position = orchestrator
            .create_node(
                request("Raise the fare", Category::Position)
                    .with_parent(issue.id)
                    .with_relationship(RelationshipRequest::manual(issue.id, RelationshipType::RespondsTo)),
            )
            .await
            .unwrap();
        assert_eq!(position.node.parent_id, Some(issue.id));
        assert_eq!(position.relationships.len(), 1);
        assert!(orchestrator.config().layout.zones.position.contains(position.node.position));

        let elsewhere = CreateNodeRequest::new(
            "Cut routes",
            Category::Position,
            DiscussionId::new("other"),
            AuthorId::new("alice"),
        )
        .with_parent(issue.id);
        let err = orchestrator.create_node(elsewhere).await.unwrap_err();
        assert_eq!(
            err,
            CreationError::Validation(ValidationError::ParentInOtherDiscussion(issue.id))
        );
    }

    #[tokio::test]
    async fn explicit_position_is_constrained() {
        let (_, orchestrator) = orchestrator();
        let outcome = orchestrator
            .create_node(request("Far away argument", Category::Argument).with_position(Point::new(425.0, 325.0)))
            .await
            .unwrap();
        let zone = &orchestrator.config().layout.zones.argument;
        assert!(zone.contains(outcome.node.position));
    }
}
