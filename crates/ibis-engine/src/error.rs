//! Error types for the graph engine
//!
//! Lower layers return their own typed errors. They are translated into
//! [`CreationError`] once, at the orchestrator boundary:
//! - Input shape problems
//! - Near-duplicate rejections
//! - Gateway failures, tagged with the stage that hit them
//! - Relationship failures, with the outcome of the compensating delete

use crate::gateway::GatewayError;
use crate::relationships::RelationshipError;
use ibis_model::{NodeId, ValidationError};
use std::fmt;

/// Where a gateway failure surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reading recent nodes for the duplicate check
    DuplicateCheck,
    /// Reading the parent node
    ParentLookup,
    /// Inserting the node row
    InsertNode,
    /// Reading a node for an edit
    LoadNode,
    /// Writing an edited node
    UpdateNode,
    /// Deleting a relationship
    DeleteRelationship,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DuplicateCheck => "duplicate check",
            Self::ParentLookup => "parent lookup",
            Self::InsertNode => "node insert",
            Self::LoadNode => "node load",
            Self::UpdateNode => "node update",
            Self::DeleteRelationship => "relationship delete",
        })
    }
}

/// Main engine error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CreationError {
    /// Input rejected before any side effect
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Near-identical title from the same author within the window
    #[error("near-duplicate of {existing_id} ({conflicting_title:?}, similarity {similarity:.2})")]
    Duplicate {
        /// Title of the existing node
        conflicting_title: String,
        /// Id of the existing node
        existing_id: NodeId,
        /// Similarity score that triggered the rejection
        similarity: f64,
    },

    /// Gateway read or write failed
    #[error("persistence failed during {stage}: {source}")]
    Persistence {
        /// Step that failed
        stage: Stage,
        /// Gateway error
        #[source]
        source: GatewayError,
    },

    /// Relationship batch failed after the node was stored
    #[error("relationship creation failed ({rollback}): {source}")]
    Relationship {
        /// Builder error
        #[source]
        source: RelationshipError,
        /// What happened to the stored node
        rollback: RollbackStatus,
    },

    /// Root-issue insert failed and some earlier issues of the batch could
    /// not be removed
    #[error("root issue insert failed with {} issue(s) orphaned: {source}", orphans.len())]
    BatchOrphaned {
        /// Insert error that aborted the batch
        #[source]
        source: GatewayError,
        /// Compensating deletes that exhausted their retries
        orphans: Vec<CleanupError>,
    },

    /// Edit target does not exist
    #[error("node {0} not found")]
    NotFound(NodeId),

    /// Edit attempted by someone other than the node's author
    #[error("node {0} belongs to another author")]
    NotOwner(NodeId),

    /// The spawned run was aborted by runtime shutdown
    #[error("operation interrupted by runtime shutdown")]
    Interrupted,
}

/// Coarse classification of a [`CreationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input
    Validation,
    /// Near-duplicate
    Duplicate,
    /// Gateway failure
    Persistence,
    /// Relationship batch failure
    Relationship,
    /// Unknown node
    NotFound,
    /// Ownership violation
    NotOwner,
    /// Runtime shutdown
    Interrupted,
}

impl CreationError {
    /// Tag a gateway failure with the stage it hit
    #[inline]
    #[must_use]
    pub fn persistence(stage: Stage, source: GatewayError) -> Self {
        Self::Persistence { stage, source }
    }

    /// Coarse kind, for callers that branch on the failure class
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Duplicate { .. } => ErrorKind::Duplicate,
            Self::Persistence { .. } | Self::BatchOrphaned { .. } => ErrorKind::Persistence,
            Self::Relationship { .. } => ErrorKind::Relationship,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NotOwner(_) => ErrorKind::NotOwner,
            Self::Interrupted => ErrorKind::Interrupted,
        }
    }

    /// Check if resubmitting the same request could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Persistence { .. } | Self::Relationship { .. } | Self::Interrupted
        )
    }

    /// Node left behind by a failed compensating delete, if any
    #[must_use]
    pub fn orphaned_node(&self) -> Option<NodeId> {
        match self {
            Self::Relationship {
                rollback: RollbackStatus::CleanupFailed(cleanup),
                ..
            } => Some(cleanup.node_id),
            _ => None,
        }
    }

    /// Every node left behind by failed compensating deletes
    #[must_use]
    pub fn orphaned_nodes(&self) -> Vec<NodeId> {
        match self {
            Self::BatchOrphaned { orphans, .. } => orphans.iter().map(|c| c.node_id).collect(),
            _ => self.orphaned_node().into_iter().collect(),
        }
    }
}

/// Outcome of the compensating delete after a relationship failure
#[derive(Debug, Clone, PartialEq)]
pub enum RollbackStatus {
    /// Node removed
    RolledBack {
        /// Delete attempts used
        attempts: u32,
    },
    /// Node could not be removed and is orphaned
    CleanupFailed(CleanupError),
}

impl fmt::Display for RollbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RolledBack { attempts } => write!(f, "node rolled back after {attempts} attempt(s)"),
            Self::CleanupFailed(e) => write!(f, "{e}"),
        }
    }
}

/// Compensating delete exhausted its retries
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cleanup of node {node_id} failed after {attempts} attempt(s): {last_error}")]
pub struct CleanupError {
    /// Orphaned node
    pub node_id: NodeId,
    /// Attempts made
    pub attempts: u32,
    /// Error from the final attempt
    pub last_error: GatewayError,
}

/// Result alias for engine operations
pub type Result<T> = std::result::Result<T, CreationError>;
