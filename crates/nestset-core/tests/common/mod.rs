use nestset_core::{
    MemoryRowStore, NestedSet, NodeHandle, NodeId, NodeRow, Payload, Scope, Span, TreeArena,
};

pub const SCOPE: &str = "test";

/// Fresh engine over an empty memory store
#[allow(dead_code)]
pub fn new_tree() -> NestedSet<MemoryRowStore> {
    NestedSet::with_defaults(MemoryRowStore::new())
}

#[allow(dead_code)]
pub fn new_arena() -> TreeArena {
    TreeArena::new(Scope::from(SCOPE))
}

/// Create a node carrying `name`
#[allow(dead_code)]
pub fn named(tree: &NestedSet<MemoryRowStore>, arena: &mut TreeArena, name: &str) -> NodeHandle {
    tree.new_node(arena, Payload::named(name)).unwrap()
}

#[allow(dead_code)]
pub fn id_of(arena: &TreeArena, handle: NodeHandle) -> NodeId {
    arena.node(handle).unwrap().id().clone()
}

/// Stored row for an arena node
#[allow(dead_code)]
pub fn stored(tree: &NestedSet<MemoryRowStore>, arena: &TreeArena, handle: NodeHandle) -> NodeRow {
    tree.node(arena.scope(), &id_of(arena, handle)).unwrap()
}

#[allow(dead_code)]
pub fn stored_span(
    tree: &NestedSet<MemoryRowStore>,
    arena: &TreeArena,
    handle: NodeHandle,
) -> Span {
    stored(tree, arena, handle).span()
}

/// Names of rows in order
#[allow(dead_code)]
pub fn names(rows: &[NodeRow]) -> Vec<String> {
    rows.iter()
        .map(|row| row.payload.name().unwrap_or_default().to_string())
        .collect()
}
