use nestset_core::{NestedSet, NodeId, RowStore, Scope};
use nestset_engine::{apply_tree_command, NodeSpec, TreeCommand, TreeCommandResult};

#[allow(dead_code)]
pub const SCOPE: &str = "test";

#[allow(dead_code)]
pub fn scope() -> Scope {
    Scope::from(SCOPE)
}

/// Store A(B(C), D) and return the ids in preorder
#[allow(dead_code)]
pub fn seed_tree<S: RowStore>(tree: &mut NestedSet<S>) -> Vec<NodeId> {
    let spec = NodeSpec::named("A")
        .with_child(NodeSpec::named("B").with_child(NodeSpec::named("C")))
        .with_child(NodeSpec::named("D"));
    match apply_tree_command(
        TreeCommand::AddSubtree {
            parent_id: None,
            spec,
        },
        tree,
        &scope(),
    )
    .unwrap()
    {
        TreeCommandResult::AddedSubtree { node_ids, .. } => node_ids,
        other => panic!("unexpected result {other:?}"),
    }
}
