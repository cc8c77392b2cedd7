//! IBIS graph model
//!
//! Plain data types for the argumentation graph.
//!
//! # Core Concepts
//!
//! - [`Node`]: an issue, position or argument placed on the layout canvas
//! - [`Relationship`]: a typed, directed edge between two nodes
//! - [`Category`] / [`RelationshipType`]: closed vocabularies
//! - [`ValidationError`]: input-shape failures shared by all write paths

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod ids;
mod node;
mod relationship;
mod validation;

pub use ids::{AuthorId, DiscussionId, MessageId, NodeId, RelationshipId};
pub use node::{Category, Node, Point};
pub use relationship::{Relationship, RelationshipOrigin, RelationshipType};
pub use validation::{
    normalize_description, normalize_title, ValidationError, MAX_DESCRIPTION_CHARS,
    MAX_TITLE_CHARS,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
