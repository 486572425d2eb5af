//! Read-only tree query surface.
//!
//! `apply_tree_query` is the single entry point for reads. Unlike
//! `apply_tree_command` it takes a shared `NestedSet` and never writes.

#![allow(clippy::result_large_err)]

use nestset_core::errors::Result;
use nestset_core::queries::{load_subtree, tree_queries};
use nestset_core::{
    log_op_end, log_op_error, log_op_start, LoadedSubtree, NestedSet, NodeId, NodeRow, Position,
    RowStore, Scope,
};

/// Read-only queries against one scope
#[derive(Debug, Clone)]
pub enum TreeQuery {
    Node { node_id: NodeId },
    /// Every parentless row, ordered by left
    Roots,
    /// Strict ancestors, nearest first
    Ancestors { node_id: NodeId },
    /// Rows whose parent is `node_id`
    Children { node_id: NodeId },
    /// Every descendant, ordered by left
    Descendants { node_id: NodeId },
    /// Other rows sharing the parent of `node_id`
    Siblings { node_id: NodeId },
    /// Descendants linked by index, at most `max_depth` levels (`0` = all)
    Subtree { node_id: NodeId, max_depth: u32 },
    Position { node_id: NodeId },
    /// Check every interval invariant of the scope
    Verify,
}

impl TreeQuery {
    fn op_name(&self) -> &'static str {
        match self {
            TreeQuery::Node { .. } => "node_get",
            TreeQuery::Roots => "roots_list",
            TreeQuery::Ancestors { .. } => "ancestors_list",
            TreeQuery::Children { .. } => "children_list",
            TreeQuery::Descendants { .. } => "descendants_list",
            TreeQuery::Siblings { .. } => "siblings_list",
            TreeQuery::Subtree { .. } => "subtree_load",
            TreeQuery::Position { .. } => "position_get",
            TreeQuery::Verify => "scope_verify",
        }
    }
}

/// Result of a tree query
#[derive(Debug, Clone)]
pub enum TreeQueryResult {
    Node(NodeRow),
    Rows(Vec<NodeRow>),
    Subtree(LoadedSubtree),
    Position(Position),
    /// Number of rows checked
    Verified(usize),
}

/// Run a read-only query against `scope`
pub fn apply_tree_query<S: RowStore>(
    query: TreeQuery,
    tree: &NestedSet<S>,
    scope: &Scope,
) -> Result<TreeQueryResult> {
    let op = query.op_name();
    log_op_start!(op, scope = %scope);
    let start = std::time::Instant::now();

    let result = query_impl(query, tree, scope).map_err(|e| {
        log_op_error!(
            op,
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            scope = %scope
        );
        e
    })?;

    log_op_end!(op, duration_ms = start.elapsed().as_millis() as u64);
    Ok(result)
}

fn query_impl<S: RowStore>(
    query: TreeQuery,
    tree: &NestedSet<S>,
    scope: &Scope,
) -> Result<TreeQueryResult> {
    let store = tree.store();
    let result = match query {
        TreeQuery::Node { node_id } => TreeQueryResult::Node(tree.node(scope, &node_id)?),
        TreeQuery::Roots => TreeQueryResult::Rows(tree_queries::roots(store, scope)?),
        TreeQuery::Ancestors { node_id } => {
            let row = tree.node(scope, &node_id)?;
            TreeQueryResult::Rows(tree_queries::ancestors(store, &row)?)
        }
        TreeQuery::Children { node_id } => {
            let row = tree.node(scope, &node_id)?;
            TreeQueryResult::Rows(tree_queries::direct_children(store, &row)?)
        }
        TreeQuery::Descendants { node_id } => {
            let row = tree.node(scope, &node_id)?;
            TreeQueryResult::Rows(tree_queries::all_children(store, &row)?)
        }
        TreeQuery::Siblings { node_id } => {
            let row = tree.node(scope, &node_id)?;
            TreeQueryResult::Rows(tree_queries::siblings(store, &row)?)
        }
        TreeQuery::Subtree { node_id, max_depth } => {
            let row = tree.node(scope, &node_id)?;
            TreeQueryResult::Subtree(load_subtree(store, &row, max_depth)?)
        }
        TreeQuery::Position { node_id } => {
            let row = tree.node(scope, &node_id)?;
            TreeQueryResult::Position(tree_queries::position(&row))
        }
        TreeQuery::Verify => TreeQueryResult::Verified(tree.verify(scope)?),
    };
    Ok(result)
}
