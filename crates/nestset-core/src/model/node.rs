use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::payload::Payload;

/// Identifier of a tree node, unique within the row store
///
/// Ids are generated client-side (UUID v7) when a node is created in memory,
/// so a staged subtree can reference its parents before any row exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Generate a new time-ordered id
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Wrap an existing id (e.g. read from storage)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discriminator partitioning the row store into independent forests
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Scope {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `[left, right]` interval of one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub left: i64,
    pub right: i64,
}

impl Span {
    pub fn new(left: i64, right: i64) -> Self {
        Self { left, right }
    }

    /// Number of edge values the subtree occupies (2 per node)
    pub fn width(&self) -> i64 {
        self.right - self.left + 1
    }

    /// Number of strict descendants encoded by this interval
    pub fn descendant_count(&self) -> i64 {
        (self.right - self.left - 1) / 2
    }

    /// True if `other` lies strictly inside this interval
    pub fn strictly_contains(&self, other: &Span) -> bool {
        other.left > self.left && other.right < self.right
    }

    /// True if `other` is this interval or lies inside it
    pub fn encloses(&self, other: &Span) -> bool {
        other.left >= self.left && other.right <= self.right
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.left, self.right)
    }
}

/// Classification of a stored node by its edges and parent reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Root,
    Child,
    /// Neither root nor child: corrupt or not yet numbered
    Unknown,
}

/// One row of the nested-set table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRow {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub left: i64,
    pub right: i64,
    /// Depth (root = 1) when the store tracks levels
    pub level: Option<i64>,
    pub scope: Scope,
    pub payload: Payload,
}

impl NodeRow {
    pub fn span(&self) -> Span {
        Span::new(self.left, self.right)
    }

    pub fn has_parent(&self) -> bool {
        self.parent_id.is_some()
    }

    /// `(right - left - 1) / 2`
    pub fn children_count(&self) -> i64 {
        self.span().descendant_count()
    }

    pub fn position(&self) -> Position {
        if !self.has_parent() && self.left == 1 && self.right > self.left {
            Position::Root
        } else if self.has_parent() && self.left > 1 && self.right > self.left {
            Position::Child
        } else {
            Position::Unknown
        }
    }

    /// True if `other` is a strict descendant of this row (same scope)
    pub fn is_ancestor_of(&self, other: &NodeRow) -> bool {
        self.scope == other.scope && self.span().strictly_contains(&other.span())
    }
}
