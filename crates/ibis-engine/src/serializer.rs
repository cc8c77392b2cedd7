//! Per-author write serialization
//!
//! One fair (FIFO) async mutex per author with pending work. Distinct authors
//! never contend. An entry leaves the table as soon as nobody holds or waits
//! on it, so the table size is bounded by the number of busy authors.

use dashmap::DashMap;
use ibis_model::AuthorId;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

type AuthorLock = Arc<Mutex<()>>;

/// Per-author mutual exclusion for graph mutations
#[derive(Debug, Default)]
pub struct WriteSerializer {
    locks: DashMap<AuthorId, AuthorLock>,
}

impl WriteSerializer {
    /// Create an empty lock table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `operation` while holding `author`'s lock
    ///
    /// A second call for the same author waits until the first completes,
    /// whatever its outcome. Waiters are served in arrival order.
    pub async fn with_lock<F, Fut, T>(&self, author: &AuthorId, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        // Locals drop in reverse order: guard, then our clone, then the prune.
        let _prune = PruneOnDrop {
            table: &self.locks,
            author,
        };
        let lock = self
            .locks
            .entry(author.clone())
            .or_insert_with(AuthorLock::default)
            .clone();
        let _guard = lock.lock().await;
        operation().await
    }

    /// Authors currently holding or waiting on a lock
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// True when no author has pending work
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Removes an author's entry once nobody references it
struct PruneOnDrop<'a> {
    table: &'a DashMap<AuthorId, AuthorLock>,
    author: &'a AuthorId,
}

impl Drop for PruneOnDrop<'_> {
    fn drop(&mut self) {
        // Clones are only handed out under the shard lock, so a count of one
        // here means no holder and no waiter remains.
        self.table
            .remove_if(self.author, |_, lock| Arc::strong_count(lock) == 1);
    }
}
