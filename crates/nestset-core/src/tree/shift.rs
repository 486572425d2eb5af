//! Range Shifter
//!
//! Every structural write renumbers existing rows with exactly one bulk
//! conditional update. A `Shift` describes that update: which edge values
//! move, by how much, and which rows the statement has to touch. Stores
//! translate it into a single statement (`CASE` expressions in SQL, a single
//! pass in memory); the arena applies the same arithmetic to the nodes it
//! holds so in-memory intervals never go stale.
//!
//! Left and right edges are shifted independently, each against its own
//! pre-update value.

use crate::model::Span;

/// Inclusive range of edge values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRange {
    pub from: i64,
    pub to: i64,
}

impl EdgeRange {
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.from && value <= self.to
    }

    pub fn is_empty(&self) -> bool {
        self.from > self.to
    }

    /// True if the interval `[span.left, span.right]` shares a value with this range
    pub fn intersects(&self, span: Span) -> bool {
        !self.is_empty() && span.right >= self.from && span.left <= self.to
    }
}

/// One bulk conditional update against a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    /// Make room for an inserted subtree: edges `>= at` grow by `offset`
    OpenGap { at: i64, offset: i64 },
    /// Swap a moved subtree with the interior range it jumps over
    Move {
        moved: EdgeRange,
        moved_offset: i64,
        interior: EdgeRange,
        interior_offset: i64,
        /// Added to the level of every row whose left edge lies in `moved`
        level_delta: i64,
    },
    /// Remove the hole left by a deleted subtree: edges `> after` shrink by `width`
    CloseGap { after: i64, width: i64 },
}

impl Shift {
    /// Gap for a subtree of `width` edge values inserted at `at`
    pub fn open_gap(at: i64, width: i64) -> Self {
        Shift::OpenGap { at, offset: width }
    }

    /// Gap closing after `removed` was deleted
    pub fn close_gap(removed: Span) -> Self {
        Shift::CloseGap {
            after: removed.right,
            width: removed.width(),
        }
    }

    /// Plan moving `node` to become the last child of `new_parent`
    ///
    /// Returns `None` when `new_parent` is `node` itself or one of its
    /// descendants, since no interval arithmetic can express that.
    pub fn plan_move(node: Span, new_parent: Span, level_delta: i64) -> Option<Self> {
        if node.encloses(&new_parent) {
            return None;
        }

        let width = node.width();
        let target = new_parent.right;

        let shift = if target > node.right {
            // Moving right: the rows between the subtree and the new parent's
            // right edge slide left to fill the hole.
            Shift::Move {
                moved: EdgeRange::new(node.left, node.right),
                moved_offset: target - 1 - node.right,
                interior: EdgeRange::new(node.right + 1, target - 1),
                interior_offset: -width,
                level_delta,
            }
        } else {
            // Moving left: the new parent's right edge and everything up to
            // the subtree slide right.
            Shift::Move {
                moved: EdgeRange::new(node.left, node.right),
                moved_offset: target - node.left,
                interior: EdgeRange::new(target, node.left - 1),
                interior_offset: width,
                level_delta,
            }
        };

        Some(shift)
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Shift::OpenGap { .. } => "open_gap",
            Shift::Move { .. } => "move",
            Shift::CloseGap { .. } => "close_gap",
        }
    }

    /// True if applying the shift changes nothing
    pub fn is_noop(&self) -> bool {
        match *self {
            Shift::OpenGap { offset, .. } => offset == 0,
            Shift::Move {
                moved_offset,
                interior,
                level_delta,
                ..
            } => moved_offset == 0 && level_delta == 0 && interior.is_empty(),
            Shift::CloseGap { width, .. } => width == 0,
        }
    }

    /// New value of one edge (left or right) given its pre-update value
    pub fn apply_edge(&self, value: i64) -> i64 {
        match *self {
            Shift::OpenGap { at, offset } => {
                if value >= at {
                    value + offset
                } else {
                    value
                }
            }
            Shift::Move {
                moved,
                moved_offset,
                interior,
                interior_offset,
                ..
            } => {
                if moved.contains(value) {
                    value + moved_offset
                } else if interior.contains(value) {
                    value + interior_offset
                } else {
                    value
                }
            }
            Shift::CloseGap { after, width } => {
                if value > after {
                    value - width
                } else {
                    value
                }
            }
        }
    }

    /// New level of a row given its pre-update left edge
    pub fn apply_level(&self, left: i64, level: i64) -> i64 {
        match *self {
            Shift::Move {
                moved, level_delta, ..
            } if moved.contains(left) => level + level_delta,
            _ => level,
        }
    }

    /// Shift a whole interval
    pub fn apply_span(&self, span: Span) -> Span {
        Span::new(self.apply_edge(span.left), self.apply_edge(span.right))
    }

    /// The statement's row predicate: does this row have an edge to update?
    pub fn touches(&self, span: Span) -> bool {
        match *self {
            Shift::OpenGap { at, .. } => span.right >= at,
            Shift::Move {
                moved, interior, ..
            } => moved.intersects(span) || interior.intersects(span),
            Shift::CloseGap { after, .. } => span.right > after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A(1,8) B(2,5) C(3,4) D(6,7)
    fn sample() -> Vec<Span> {
        vec![
            Span::new(1, 8),
            Span::new(2, 5),
            Span::new(3, 4),
            Span::new(6, 7),
        ]
    }

    fn apply(shift: &Shift, spans: &[Span]) -> Vec<Span> {
        spans.iter().map(|s| shift.apply_span(*s)).collect()
    }

    #[test]
    fn test_open_gap_widens_enclosing_and_following() {
        // Insert a leaf as last child of B: left = B.right = 5
        let shift = Shift::open_gap(5, 2);
        let shifted = apply(&shift, &sample());

        assert_eq!(
            shifted,
            vec![
                Span::new(1, 10),
                Span::new(2, 7),
                Span::new(3, 4),
                Span::new(8, 9)
            ]
        );
        assert!(!shift.touches(Span::new(3, 4)));
        assert!(shift.touches(Span::new(6, 7)));
    }

    #[test]
    fn test_close_gap_after_removing_b() {
        let shift = Shift::close_gap(Span::new(2, 5));
        assert_eq!(shift.apply_span(Span::new(1, 8)), Span::new(1, 4));
        assert_eq!(shift.apply_span(Span::new(6, 7)), Span::new(2, 3));
        assert!(!shift.touches(Span::new(2, 5)));
    }

    #[test]
    fn test_move_left_under_earlier_sibling() {
        // A(1,6) B(2,3) C(4,5): move C under B
        let shift = Shift::plan_move(Span::new(4, 5), Span::new(2, 3), 1).unwrap();

        assert_eq!(shift.apply_span(Span::new(1, 6)), Span::new(1, 6));
        assert_eq!(shift.apply_span(Span::new(2, 3)), Span::new(2, 5));
        assert_eq!(shift.apply_span(Span::new(4, 5)), Span::new(3, 4));
        assert_eq!(shift.apply_level(4, 2), 3);
        assert_eq!(shift.apply_level(2, 2), 2);
    }

    #[test]
    fn test_move_right_under_later_sibling() {
        // A(1,6) B(2,3) C(4,5): move B under C
        let shift = Shift::plan_move(Span::new(2, 3), Span::new(4, 5), 1).unwrap();

        assert_eq!(shift.apply_span(Span::new(2, 3)), Span::new(3, 4));
        assert_eq!(shift.apply_span(Span::new(4, 5)), Span::new(2, 5));
        assert_eq!(shift.apply_span(Span::new(1, 6)), Span::new(1, 6));
    }

    #[test]
    fn test_move_up_to_grandparent() {
        // Move C out of B to become the last child of A
        let shift = Shift::plan_move(Span::new(3, 4), Span::new(1, 8), -1).unwrap();
        let shifted = apply(&shift, &sample());

        assert_eq!(
            shifted,
            vec![
                Span::new(1, 8),
                Span::new(2, 3),
                Span::new(6, 7),
                Span::new(4, 5)
            ]
        );
        assert_eq!(shift.apply_level(3, 3), 2);
    }

    #[test]
    fn test_move_into_own_subtree_is_rejected() {
        assert!(Shift::plan_move(Span::new(2, 5), Span::new(3, 4), 1).is_none());
        assert!(Shift::plan_move(Span::new(2, 5), Span::new(2, 5), 1).is_none());
    }

    #[test]
    fn test_move_to_current_position_is_noop() {
        // D is already the last child of A
        let shift = Shift::plan_move(Span::new(6, 7), Span::new(1, 8), 0).unwrap();
        assert!(shift.is_noop());
        assert_eq!(apply(&shift, &sample()), sample());
    }

    #[test]
    fn test_edge_range_intersection() {
        let range = EdgeRange::new(4, 6);
        assert!(range.intersects(Span::new(1, 8)));
        assert!(range.intersects(Span::new(6, 7)));
        assert!(!range.intersects(Span::new(7, 8)));
        assert!(!EdgeRange::new(5, 4).intersects(Span::new(1, 8)));
    }
}
