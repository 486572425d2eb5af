use nestset_core::{NestedSet, NodeHandle, NodeId, NodeRow, Payload, Scope, Span, TreeArena, TreeConfig};
use nestset_store::SqliteRowStore;

pub const SCOPE: &str = "test";

/// Engine over a fresh in-memory SQLite store
#[allow(dead_code)]
pub fn sqlite_tree() -> NestedSet<SqliteRowStore> {
    sqlite_tree_with(TreeConfig::default())
}

#[allow(dead_code)]
pub fn sqlite_tree_with(config: TreeConfig) -> NestedSet<SqliteRowStore> {
    let store = SqliteRowStore::open_in_memory(config.clone()).unwrap();
    NestedSet::new(store, config).unwrap()
}

#[allow(dead_code)]
pub fn new_arena() -> TreeArena {
    TreeArena::new(Scope::from(SCOPE))
}

#[allow(dead_code)]
pub fn named(tree: &NestedSet<SqliteRowStore>, arena: &mut TreeArena, name: &str) -> NodeHandle {
    tree.new_node(arena, Payload::named(name)).unwrap()
}

#[allow(dead_code)]
pub fn id_of(arena: &TreeArena, handle: NodeHandle) -> NodeId {
    arena.node(handle).unwrap().id().clone()
}

#[allow(dead_code)]
pub fn stored(tree: &NestedSet<SqliteRowStore>, arena: &TreeArena, handle: NodeHandle) -> NodeRow {
    tree.node(arena.scope(), &id_of(arena, handle)).unwrap()
}

#[allow(dead_code)]
pub fn stored_span(
    tree: &NestedSet<SqliteRowStore>,
    arena: &TreeArena,
    handle: NodeHandle,
) -> Span {
    stored(tree, arena, handle).span()
}

#[allow(dead_code)]
pub fn names(rows: &[NodeRow]) -> Vec<String> {
    rows.iter()
        .map(|row| row.payload.name().unwrap_or_default().to_string())
        .collect()
}
