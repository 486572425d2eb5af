//! Structural tree commands.
//!
//! Each command is wrapped with:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure

#![allow(clippy::result_large_err)]

use nestset_core::errors::Result;
use nestset_core::{
    log_op_end, log_op_error, log_op_start, DestroyReport, MoveReport, NestedSet, NodeHandle,
    NodeId, Payload, RowStore, SaveReport, Scope, TreeArena,
};
use serde::{Deserialize, Serialize};

/// A node to create together with its children
///
/// Deserializes from `{"payload": {...}, "children": [...]}`; both keys are
/// optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default)]
    pub payload: Payload,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            payload: Payload::named(name),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes including this one
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NodeSpec::node_count).sum::<usize>()
    }
}

/// Structural writes against one scope
#[derive(Debug, Clone)]
pub enum TreeCommand {
    /// Add one node, as the root when `parent_id` is `None`
    AddNode {
        parent_id: Option<NodeId>,
        payload: Payload,
    },
    /// Add a whole subtree with one gap-opening shift
    AddSubtree {
        parent_id: Option<NodeId>,
        spec: NodeSpec,
    },
    /// Make `node_id` the last child of `new_parent_id`
    MoveNode {
        node_id: NodeId,
        new_parent_id: NodeId,
    },
    /// Remove a node and every descendant
    DeleteNode { node_id: NodeId },
    /// Set one payload attribute of a stored node
    UpdatePayload {
        node_id: NodeId,
        key: String,
        value: serde_json::Value,
    },
}

impl TreeCommand {
    fn op_name(&self) -> &'static str {
        match self {
            TreeCommand::AddNode { .. } => "node_add",
            TreeCommand::AddSubtree { .. } => "subtree_add",
            TreeCommand::MoveNode { .. } => "node_move",
            TreeCommand::DeleteNode { .. } => "node_delete",
            TreeCommand::UpdatePayload { .. } => "payload_update",
        }
    }
}

/// Result of applying a tree command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeCommandResult {
    Added {
        node_id: NodeId,
        report: SaveReport,
    },
    /// Ids of the created nodes in preorder
    AddedSubtree {
        node_ids: Vec<NodeId>,
        report: SaveReport,
    },
    Moved(MoveReport),
    Deleted(DestroyReport),
    Updated {
        node_id: NodeId,
        report: SaveReport,
    },
}

/// Apply a structural command to `scope`
pub fn apply_tree_command<S: RowStore>(
    cmd: TreeCommand,
    tree: &mut NestedSet<S>,
    scope: &Scope,
) -> Result<TreeCommandResult> {
    let op = cmd.op_name();
    log_op_start!(op, scope = %scope);
    let start = std::time::Instant::now();

    let result = apply_impl(cmd, tree, scope).map_err(|e| {
        log_op_error!(
            op,
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            scope = %scope
        );
        e
    })?;

    log_op_end!(
        op,
        duration_ms = start.elapsed().as_millis() as u64,
        scope = %scope
    );

    Ok(result)
}

fn apply_impl<S: RowStore>(
    cmd: TreeCommand,
    tree: &mut NestedSet<S>,
    scope: &Scope,
) -> Result<TreeCommandResult> {
    let mut arena = TreeArena::new(scope.clone());

    match cmd {
        TreeCommand::AddNode { parent_id, payload } => {
            let node = tree.new_node(&mut arena, payload)?;
            attach_to(tree, &mut arena, parent_id.as_ref(), node)?;
            let report = tree.save(&mut arena, node)?;
            Ok(TreeCommandResult::Added {
                node_id: arena.node(node)?.id().clone(),
                report,
            })
        }
        TreeCommand::AddSubtree { parent_id, spec } => {
            let top = stage(tree, &mut arena, spec)?;
            attach_to(tree, &mut arena, parent_id.as_ref(), top)?;
            let report = tree.save(&mut arena, top)?;
            let node_ids = arena
                .preorder(top)?
                .into_iter()
                .map(|h| arena.node(h).map(|n| n.id().clone()))
                .collect::<Result<Vec<_>>>()?;
            Ok(TreeCommandResult::AddedSubtree { node_ids, report })
        }
        TreeCommand::MoveNode {
            node_id,
            new_parent_id,
        } => {
            let node = tree.load(&mut arena, &node_id)?;
            let parent = tree.load(&mut arena, &new_parent_id)?;
            let report = tree.move_to(&mut arena, node, parent)?;
            Ok(TreeCommandResult::Moved(report))
        }
        TreeCommand::DeleteNode { node_id } => {
            let node = tree.load(&mut arena, &node_id)?;
            let report = tree.destroy(&mut arena, node)?;
            Ok(TreeCommandResult::Deleted(report))
        }
        TreeCommand::UpdatePayload {
            node_id,
            key,
            value,
        } => {
            let node = tree.load(&mut arena, &node_id)?;
            tree.set_attribute(&mut arena, node, &key, value)?;
            let report = tree.save(&mut arena, node)?;
            Ok(TreeCommandResult::Updated { node_id, report })
        }
    }
}

fn attach_to<S: RowStore>(
    tree: &NestedSet<S>,
    arena: &mut TreeArena,
    parent_id: Option<&NodeId>,
    node: NodeHandle,
) -> Result<()> {
    if let Some(parent_id) = parent_id {
        let parent = tree.load(arena, parent_id)?;
        arena.attach(parent, node)?;
    }
    Ok(())
}

/// Create the staged nodes of `spec`, returning the top handle
fn stage<S: RowStore>(
    tree: &NestedSet<S>,
    arena: &mut TreeArena,
    spec: NodeSpec,
) -> Result<NodeHandle> {
    let node = tree.new_node(arena, spec.payload)?;
    for child in spec.children {
        let child = stage(tree, arena, child)?;
        arena.attach(node, child)?;
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestset_core::{MemoryRowStore, Span, TreeError};

    fn tree() -> NestedSet<MemoryRowStore> {
        NestedSet::with_defaults(MemoryRowStore::new())
    }

    #[test]
    fn test_node_spec_from_json() {
        let spec: NodeSpec = serde_json::from_str(
            r#"{"payload": {"name": "A"}, "children": [{"payload": {"name": "B"}}, {}]}"#,
        )
        .unwrap();
        assert_eq!(spec.node_count(), 3);
        assert_eq!(spec.children[0].payload.name(), Some("B"));
        assert!(spec.children[1].payload.is_empty());
    }

    #[test]
    fn test_add_subtree_returns_preorder_ids() {
        let mut tree = tree();
        let scope = Scope::from("s");
        let spec = NodeSpec::named("A")
            .with_child(NodeSpec::named("B").with_child(NodeSpec::named("C")))
            .with_child(NodeSpec::named("D"));

        let result = apply_tree_command(
            TreeCommand::AddSubtree {
                parent_id: None,
                spec,
            },
            &mut tree,
            &scope,
        )
        .unwrap();

        let TreeCommandResult::AddedSubtree { node_ids, report } = result else {
            panic!("expected AddedSubtree");
        };
        assert_eq!(report.inserted, 4);
        let c = tree.node(&scope, &node_ids[2]).unwrap();
        assert_eq!(c.payload.name(), Some("C"));
        assert_eq!(c.span(), Span::new(3, 4));
    }

    #[test]
    fn test_update_payload_rejects_structural_key() {
        let mut tree = tree();
        let scope = Scope::from("s");
        let TreeCommandResult::Added { node_id, .. } = apply_tree_command(
            TreeCommand::AddNode {
                parent_id: None,
                payload: Payload::named("A"),
            },
            &mut tree,
            &scope,
        )
        .unwrap() else {
            panic!("expected Added");
        };

        let err = apply_tree_command(
            TreeCommand::UpdatePayload {
                node_id,
                key: "lft".to_string(),
                value: serde_json::json!(9),
            },
            &mut tree,
            &scope,
        )
        .unwrap_err();
        assert!(matches!(err, TreeError::Configuration { .. }));
    }
}
