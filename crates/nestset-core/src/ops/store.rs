//! Row store contract
//!
//! The tree engine never renumbers rows one by one. Every structural change
//! reaches the store as at most one `apply_shift` call plus the insert or
//! delete of the affected rows, all inside one `begin`/`commit` pair.

use crate::errors::StoreResult;
use crate::model::{NodeId, NodeRow, Scope, Span};
use crate::tree::shift::Shift;

/// Interval predicate for scoped range reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePredicate {
    /// `left BETWEEN span.left AND span.right` (node and its descendants)
    FullSet(Span),
    /// `left > span.left AND right < span.right`, optionally `level <= max_level`
    Descendants {
        span: Span,
        max_level: Option<i64>,
    },
    /// `left < span.left AND right > span.right` (strict ancestors)
    Enclosing(Span),
    /// Every row in the scope
    Scope,
}

impl RangePredicate {
    /// Evaluate the predicate against one row
    pub fn matches(&self, row: &NodeRow) -> bool {
        match *self {
            RangePredicate::FullSet(span) => row.left >= span.left && row.left <= span.right,
            RangePredicate::Descendants { span, max_level } => {
                span.strictly_contains(&row.span())
                    && match (max_level, row.level) {
                        (Some(max), Some(level)) => level <= max,
                        _ => true,
                    }
            }
            RangePredicate::Enclosing(span) => row.left < span.left && row.right > span.right,
            RangePredicate::Scope => true,
        }
    }
}

/// Storage collaborator holding one row per node
///
/// All reads return rows ordered by `left`. Implementations must apply a
/// shift as one atomic statement: membership checks and offsets are
/// evaluated against each row's pre-update edges.
pub trait RowStore {
    /// Point read
    fn read_by_id(&self, scope: &Scope, id: &NodeId) -> StoreResult<Option<NodeRow>>;

    /// Scoped range read
    fn read_range(&self, scope: &Scope, predicate: RangePredicate) -> StoreResult<Vec<NodeRow>>;

    /// Rows whose parent is `parent` (`None` selects the roots)
    fn read_children(&self, scope: &Scope, parent: Option<&NodeId>)
        -> StoreResult<Vec<NodeRow>>;

    /// Batch insert; rows arrive in preorder so parents precede children
    fn insert_rows(&mut self, rows: &[NodeRow]) -> StoreResult<()>;

    /// Rewrite parent reference and payload, never the edges or level
    fn update_attributes(&mut self, scope: &Scope, row: &NodeRow) -> StoreResult<()>;

    /// Issue one bulk conditional update; returns the number of rows touched
    fn apply_shift(&mut self, scope: &Scope, shift: &Shift) -> StoreResult<usize>;

    /// Delete every row with `left BETWEEN span.left AND span.right`
    fn delete_span(&mut self, scope: &Scope, span: Span) -> StoreResult<usize>;

    fn begin(&mut self) -> StoreResult<()>;

    fn commit(&mut self) -> StoreResult<()>;

    fn rollback(&mut self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Payload;

    fn row(left: i64, right: i64, level: i64) -> NodeRow {
        NodeRow {
            id: NodeId::generate(),
            parent_id: None,
            left,
            right,
            level: Some(level),
            scope: Scope::from("s"),
            payload: Payload::new(),
        }
    }

    #[test]
    fn test_full_set_includes_the_node_itself() {
        let predicate = RangePredicate::FullSet(Span::new(2, 7));
        assert!(predicate.matches(&row(2, 7, 2)));
        assert!(predicate.matches(&row(3, 4, 3)));
        assert!(!predicate.matches(&row(1, 8, 1)));
    }

    #[test]
    fn test_descendants_respect_level_bound() {
        let predicate = RangePredicate::Descendants {
            span: Span::new(1, 10),
            max_level: Some(2),
        };
        assert!(predicate.matches(&row(2, 7, 2)));
        assert!(!predicate.matches(&row(3, 4, 3)));
        assert!(!predicate.matches(&row(1, 10, 1)));
    }

    #[test]
    fn test_enclosing_selects_strict_ancestors() {
        let predicate = RangePredicate::Enclosing(Span::new(3, 4));
        assert!(predicate.matches(&row(1, 10, 1)));
        assert!(predicate.matches(&row(2, 7, 2)));
        assert!(!predicate.matches(&row(3, 4, 3)));
        assert!(!predicate.matches(&row(8, 9, 2)));
    }
}
