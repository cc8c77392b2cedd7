//! Creation state machine
//!
//! Every run walks the happy path
//! `Validating → DuplicateChecking → Positioning → Persisting →
//! LinkingRelationships → EmbeddingTriggered → Done`
//! or leaves it for one of the terminal failure states.

use crate::embedding::EmbeddingDispatch;
use ibis_model::{Node, Relationship};
use std::fmt;

/// Where a creation run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreationState {
    /// Checking input shape
    Validating,
    /// Comparing against the author's recent nodes
    DuplicateChecking,
    /// Computing the placement
    Positioning,
    /// Inserting the node row
    Persisting,
    /// Writing the relationship batch
    LinkingRelationships,
    /// Handing the node to the embedding worker
    EmbeddingTriggered,
    /// Node and edges stored
    Done,
    /// Node removed after a relationship failure
    RolledBack,
    /// Stopped before anything was stored
    Rejected,
}

impl CreationState {
    /// No transitions leave this state
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::RolledBack | Self::Rejected)
    }
}

impl fmt::Display for CreationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validating => "validating",
            Self::DuplicateChecking => "duplicate_checking",
            Self::Positioning => "positioning",
            Self::Persisting => "persisting",
            Self::LinkingRelationships => "linking_relationships",
            Self::EmbeddingTriggered => "embedding_triggered",
            Self::Done => "done",
            Self::RolledBack => "rolled_back",
            Self::Rejected => "rejected",
        })
    }
}

/// Attempted move that the state machine does not allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal creation transition {from} -> {to}")]
pub struct IllegalTransition {
    /// State being left
    pub from: CreationState,
    /// Requested state
    pub to: CreationState,
}

/// States reachable in one step from `from`
#[must_use]
pub fn allowed_transitions(from: CreationState) -> &'static [CreationState] {
    use CreationState::*;
    match from {
        Validating => &[DuplicateChecking, Rejected],
        DuplicateChecking => &[Positioning, Rejected],
        Positioning => &[Persisting, Rejected],
        Persisting => &[LinkingRelationships, Rejected],
        LinkingRelationships => &[EmbeddingTriggered, RolledBack],
        EmbeddingTriggered => &[Done],
        Done | RolledBack | Rejected => &[],
    }
}

/// Check one step
///
/// # Errors
/// [`IllegalTransition`] when `to` is not reachable from `from`.
pub fn validate_transition(from: CreationState, to: CreationState) -> Result<(), IllegalTransition> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

/// States visited by one run, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationTrace {
    states: Vec<CreationState>,
}

impl CreationTrace {
    /// A trace positioned at [`CreationState::Validating`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: vec![CreationState::Validating],
        }
    }

    /// Record a step
    ///
    /// # Errors
    /// [`IllegalTransition`] when the step is not allowed; the trace is left
    /// unchanged.
    pub fn advance(&mut self, to: CreationState) -> Result<(), IllegalTransition> {
        validate_transition(self.current(), to)?;
        tracing::debug!(from = %self.current(), to = %to, "creation state");
        self.states.push(to);
        Ok(())
    }

    /// Record a step the orchestrator's own control flow guarantees
    pub(crate) fn enter(&mut self, to: CreationState) {
        if let Err(e) = self.advance(to) {
            debug_assert!(false, "{e}");
            tracing::error!(error = %e, "creation state machine violated");
        }
    }

    /// Latest state
    #[must_use]
    pub fn current(&self) -> CreationState {
        self.states
            .last()
            .copied()
            .unwrap_or(CreationState::Validating)
    }

    /// Every visited state
    #[must_use]
    pub fn states(&self) -> &[CreationState] {
        &self.states
    }
}

impl Default for CreationTrace {
    fn default() -> Self {
        Self::new()
    }
}

/// Successful creation
#[derive(Debug, Clone, PartialEq)]
pub struct CreationOutcome {
    /// Stored node, with its final position
    pub node: Node,
    /// Stored edges from the node
    pub relationships: Vec<Relationship>,
    /// What happened to the embedding request
    pub embedding: EmbeddingDispatch,
    /// States visited
    pub trace: CreationTrace,
}
