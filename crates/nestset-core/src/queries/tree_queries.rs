//! Query Facade
//!
//! Stateless, scope-qualified reads. Everything except `ancestors` is a
//! single interval or parent-id read against the row store.

use std::collections::HashSet;

use crate::errors::{Result, TreeError};
use crate::model::{NodeId, NodeRow, Position, Scope};
use crate::ops::store::{RangePredicate, RowStore};

/// Point read that treats a missing row as `NodeNotFound`
pub fn node<S: RowStore + ?Sized>(store: &S, scope: &Scope, id: &NodeId) -> Result<NodeRow> {
    store
        .read_by_id(scope, id)?
        .ok_or_else(|| TreeError::NodeNotFound {
            scope: scope.to_string(),
            node_id: id.to_string(),
        })
}

/// Strict ancestors, nearest first, found by walking parent ids
///
/// A missing parent, a parent that does not enclose its child, or a cycle
/// is reported as an invariant violation.
pub fn ancestors<S: RowStore + ?Sized>(store: &S, node: &NodeRow) -> Result<Vec<NodeRow>> {
    let mut out: Vec<NodeRow> = Vec::new();
    let mut seen: HashSet<NodeId> = HashSet::new();
    seen.insert(node.id.clone());

    let mut child = node.clone();
    while let Some(parent_id) = child.parent_id.clone() {
        if !seen.insert(parent_id.clone()) {
            return Err(TreeError::invariant(
                &node.scope,
                format!("parent chain of {} loops at {}", node.id, parent_id),
            ));
        }
        let parent = store.read_by_id(&node.scope, &parent_id)?.ok_or_else(|| {
            TreeError::invariant(
                &node.scope,
                format!("parent {} of {} is missing", parent_id, child.id),
            )
        })?;
        if !parent.is_ancestor_of(&child) {
            return Err(TreeError::invariant(
                &node.scope,
                format!(
                    "parent {} {} does not enclose {} {}",
                    parent.id,
                    parent.span(),
                    child.id,
                    child.span()
                ),
            ));
        }
        out.push(parent.clone());
        child = parent;
    }

    Ok(out)
}

/// Strict ancestors found with one enclosing-interval read, nearest first
pub fn ancestors_by_interval<S: RowStore + ?Sized>(
    store: &S,
    node: &NodeRow,
) -> Result<Vec<NodeRow>> {
    let mut rows = store.read_range(&node.scope, RangePredicate::Enclosing(node.span()))?;
    rows.reverse();
    Ok(rows)
}

/// The node followed by its ancestors
pub fn self_and_ancestors<S: RowStore + ?Sized>(
    store: &S,
    node: &NodeRow,
) -> Result<Vec<NodeRow>> {
    let mut out = vec![node.clone()];
    out.extend(ancestors(store, node)?);
    Ok(out)
}

/// Top-most ancestor, or the node itself
pub fn root<S: RowStore + ?Sized>(store: &S, node: &NodeRow) -> Result<NodeRow> {
    Ok(ancestors(store, node)?
        .pop()
        .unwrap_or_else(|| node.clone()))
}

/// Parentless rows of a scope, ordered by left
pub fn roots<S: RowStore + ?Sized>(store: &S, scope: &Scope) -> Result<Vec<NodeRow>> {
    Ok(store.read_children(scope, None)?)
}

/// Rows sharing the node's parent, ordered by left
pub fn self_and_siblings<S: RowStore + ?Sized>(
    store: &S,
    node: &NodeRow,
) -> Result<Vec<NodeRow>> {
    Ok(store.read_children(&node.scope, node.parent_id.as_ref())?)
}

/// `self_and_siblings` without the node itself
pub fn siblings<S: RowStore + ?Sized>(store: &S, node: &NodeRow) -> Result<Vec<NodeRow>> {
    let mut rows = self_and_siblings(store, node)?;
    rows.retain(|row| row.id != node.id);
    Ok(rows)
}

/// Number of descendants, from the interval width alone
pub fn children_count(node: &NodeRow) -> i64 {
    node.children_count()
}

/// The node and all descendants, ordered by left
pub fn full_set<S: RowStore + ?Sized>(store: &S, node: &NodeRow) -> Result<Vec<NodeRow>> {
    Ok(store.read_range(&node.scope, RangePredicate::FullSet(node.span()))?)
}

/// All descendants, ordered by left
pub fn all_children<S: RowStore + ?Sized>(store: &S, node: &NodeRow) -> Result<Vec<NodeRow>> {
    Ok(store.read_range(
        &node.scope,
        RangePredicate::Descendants {
            span: node.span(),
            max_level: None,
        },
    )?)
}

/// Rows whose parent is the node, ordered by left
pub fn direct_children<S: RowStore + ?Sized>(
    store: &S,
    node: &NodeRow,
) -> Result<Vec<NodeRow>> {
    Ok(store.read_children(&node.scope, Some(&node.id))?)
}

pub fn position(node: &NodeRow) -> Position {
    node.position()
}
