//! Graph vertices: issues, positions and arguments

use crate::ids::{AuthorId, DiscussionId, MessageId, NodeId};
use crate::validation::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// IBIS category of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// A question under deliberation (innermost layout band)
    Issue,
    /// A proposed answer to an issue (middle band)
    Position,
    /// A reason for or against a position (outer band)
    Argument,
    /// Not yet classified
    Uncategorized,
}

impl Category {
    /// All categories, innermost band first
    pub const ALL: [Category; 4] = [
        Category::Issue,
        Category::Position,
        Category::Argument,
        Category::Uncategorized,
    ];

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Issue => "issue",
            Category::Position => "position",
            Category::Argument => "argument",
            Category::Uncategorized => "uncategorized",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "issue" => Ok(Category::Issue),
            "position" => Ok(Category::Position),
            "argument" => Ok(Category::Argument),
            "uncategorized" => Ok(Category::Uncategorized),
            other => Err(ValidationError::UnknownCategory(other.to_string())),
        }
    }
}

/// 2-D placement on the layout canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Create a point
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[inline]
    #[must_use]
    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// True when both coordinates are finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A vertex in the argumentation graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,
    /// Trimmed, non-empty title
    pub title: String,
    /// Optional longer text
    pub description: Option<String>,
    /// IBIS category
    pub category: Category,
    /// Owning discussion
    pub discussion_id: DiscussionId,
    /// Optional parent node (same discussion)
    pub parent_id: Option<NodeId>,
    /// Chat message this node was promoted from
    pub source_message_id: Option<MessageId>,
    /// Creator
    pub created_by: AuthorId,
    /// Layout placement
    pub position: Point,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last edit timestamp
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Create a node with a fresh id and timestamps
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        category: Category,
        discussion_id: DiscussionId,
        created_by: AuthorId,
        position: Point,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: NodeId::new(),
            title: title.into(),
            description: None,
            category,
            discussion_id,
            parent_id: None,
            source_message_id: None,
            created_by,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a description
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Attach a parent
    #[must_use]
    pub fn with_parent(mut self, parent_id: Option<NodeId>) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Attach the originating chat message
    #[must_use]
    pub fn with_source_message(mut self, message_id: Option<MessageId>) -> Self {
        self.source_message_id = message_id;
        self
    }

    /// Override the creation timestamp (reconstruction, tests)
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!(" Issue ".parse::<Category>().unwrap(), Category::Issue);
        assert_eq!("ARGUMENT".parse::<Category>().unwrap(), Category::Argument);
        assert!(matches!(
            "question".parse::<Category>(),
            Err(ValidationError::UnknownCategory(_))
        ));
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&Category::Uncategorized).unwrap();
        assert_eq!(json, "\"uncategorized\"");
    }

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn node_builder_sets_optional_fields() {
        let parent = NodeId::new();
        let node = Node::new(
            "Budget reform",
            Category::Issue,
            DiscussionId::new("d1"),
            AuthorId::new("alice"),
            Point::new(425.0, 325.0),
        )
        .with_parent(Some(parent))
        .with_description(Some("why".to_string()));

        assert_eq!(node.parent_id, Some(parent));
        assert_eq!(node.description.as_deref(), Some("why"));
        assert_eq!(node.created_at, node.updated_at);
    }
}
