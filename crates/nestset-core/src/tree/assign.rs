//! Interval Assigner
//!
//! One preorder walk numbers a whole staged subtree. Children are visited in
//! the order they were attached and never re-sorted.

use crate::errors::Result;
use crate::model::Span;
use crate::tree::arena::{NodeHandle, TreeArena};

/// Number `node` and its in-memory descendants starting at `left`
///
/// Returns the right edge assigned to `node`. `level` is the depth given to
/// `node` when levels are tracked; each child step adds one.
pub fn assign(
    arena: &mut TreeArena,
    node: NodeHandle,
    left: i64,
    level: Option<i64>,
) -> Result<i64> {
    let children = arena.node(node)?.children().to_vec();

    let mut cursor = left;
    for child in children {
        cursor = assign(arena, child, cursor + 1, level.map(|l| l + 1))?;
    }
    let right = cursor + 1;

    arena.set_numbering(node, Span::new(left, right), level)?;
    Ok(right)
}
