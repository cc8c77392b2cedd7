//! IBIS graph engine
//!
//! Turns contributions to a discussion into nodes and relationships of an
//! IBIS (Issue-Based Information System) graph:
//! - Rejects near-duplicate submissions from the same author
//! - Places nodes on a canvas in concentric category zones
//! - Links nodes atomically, rolling the node back when linking fails
//! - Serializes mutations per author
//! - Hands new nodes to a background embedding worker
//!
//! # Example
//!
//! ```rust,ignore
//! use ibis_engine::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = Arc::new(InMemoryRepository::new());
//! let engine = GraphOrchestrator::builder(repo).build()?;
//!
//! let request = CreateNodeRequest::new(
//!     "Should the city fund night buses?",
//!     Category::Issue,
//!     DiscussionId::new("transit"),
//!     AuthorId::new("alice"),
//! );
//! let outcome = engine.create_node(request).await?;
//! println!("placed at {:?}", outcome.node.position);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod duplicate;
pub mod embedding;
pub mod error;
pub mod gateway;
pub mod harness;
pub mod orchestrator;
pub mod relationships;
pub mod retry;
pub mod serializer;
pub mod similarity;
pub mod suggestion;

pub use config::{
    ConfigError, DuplicatePolicy, EmbeddingConfig, EngineConfig, SelectionLimits, SuggestionPolicy,
};
pub use duplicate::{DuplicateDetector, DuplicateMatch};
pub use embedding::{
    EmbeddingDispatch, EmbeddingError, EmbeddingQueue, EmbeddingService, EmbeddingStats,
    EmbeddingWorker,
};
pub use error::{CleanupError, CreationError, ErrorKind, RollbackStatus, Stage};
pub use gateway::{GatewayError, InMemoryRepository, NodeRepository};
pub use orchestrator::{
    CreateNodeRequest, CreationOutcome, CreationState, CreationTrace, GraphOrchestrator,
    GraphOrchestratorBuilder, NodeUpdate, RootIssueBatch, RootIssueDraft,
};
pub use relationships::{RelationshipBuilder, RelationshipError, RelationshipRequest};
pub use retry::{RetryExhausted, RetryPolicy};
pub use serializer::WriteSerializer;
pub use similarity::title_similarity;
pub use suggestion::{
    select_suggestions, RelationshipSuggester, RelationshipSuggestion, SuggestionError,
    SuggestionQuery,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the engine
    pub use crate::{
        CreateNodeRequest, CreationError, CreationOutcome, EngineConfig, GraphOrchestrator,
        InMemoryRepository, NodeRepository, NodeUpdate, RelationshipRequest, RootIssueBatch,
    };
    pub use ibis_model::{AuthorId, Category, DiscussionId, Node, NodeId, Point, RelationshipType};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
