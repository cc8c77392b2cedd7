//! Background embedding worker
//!
//! Embeddings are an enrichment, not a correctness requirement. The request
//! path only drops a node id on a bounded queue; a worker task drains it with
//! its own retry policy and downgrades final failures to warnings.

use crate::retry::RetryPolicy;
use async_trait::async_trait;
use ibis_model::NodeId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Embedding backend failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmbeddingError {
    /// Backend unreachable
    #[error("embedding service unavailable: {0}")]
    Unavailable(String),

    /// Backend rejected the node
    #[error("embedding failed: {0}")]
    Failed(String),
}

/// Computes and stores a vector for a node
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embed one node
    async fn embed(&self, node_id: NodeId) -> Result<(), EmbeddingError>;
}

/// What happened to an embedding request on the request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingDispatch {
    /// Handed to the worker
    Queued,
    /// Queue full; node stays un-embedded
    QueueFull,
    /// Worker gone; node stays un-embedded
    WorkerStopped,
    /// No embedding worker configured
    Disabled,
}

/// Sending half of the embedding queue
#[derive(Debug, Clone)]
pub struct EmbeddingQueue {
    sender: mpsc::Sender<NodeId>,
}

impl EmbeddingQueue {
    /// Enqueue without waiting
    #[must_use]
    pub fn enqueue(&self, node_id: NodeId) -> EmbeddingDispatch {
        match self.sender.try_send(node_id) {
            Ok(()) => EmbeddingDispatch::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(node_id = %node_id, "embedding queue full, skipping node");
                EmbeddingDispatch::QueueFull
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(node_id = %node_id, "embedding worker stopped, skipping node");
                EmbeddingDispatch::WorkerStopped
            }
        }
    }
}

/// Worker totals, returned when the queue closes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbeddingStats {
    /// Nodes embedded
    pub embedded: usize,
    /// Nodes given up on after every retry
    pub failed: usize,
    /// Attempts made across all nodes
    pub attempts: usize,
}

/// Spawns the worker task
#[derive(Debug)]
pub struct EmbeddingWorker;

impl EmbeddingWorker {
    /// Start a worker on the current runtime
    ///
    /// The worker exits, yielding its stats, once every [`EmbeddingQueue`]
    /// clone has been dropped and the queue is drained.
    #[must_use]
    pub fn spawn(
        service: Arc<dyn EmbeddingService>,
        retry: RetryPolicy,
        capacity: usize,
    ) -> (EmbeddingQueue, JoinHandle<EmbeddingStats>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(worker_task(service, retry, receiver));
        (EmbeddingQueue { sender }, handle)
    }
}

async fn worker_task(
    service: Arc<dyn EmbeddingService>,
    retry: RetryPolicy,
    mut receiver: mpsc::Receiver<NodeId>,
) -> EmbeddingStats {
    let mut stats = EmbeddingStats::default();

    while let Some(node_id) = receiver.recv().await {
        let outcome = retry
            .run(|attempt| {
                let service = service.clone();
                async move {
                    let result = service.embed(node_id).await;
                    if let Err(e) = &result {
                        tracing::debug!(node_id = %node_id, attempt, error = %e, "embedding attempt failed");
                    }
                    result
                }
            })
            .await;

        match outcome {
            Ok(((), attempts)) => {
                stats.embedded += 1;
                stats.attempts += attempts as usize;
            }
            Err(exhausted) => {
                stats.failed += 1;
                stats.attempts += exhausted.attempts as usize;
                tracing::warn!(
                    node_id = %node_id,
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "embedding abandoned"
                );
            }
        }
    }

    stats
}
