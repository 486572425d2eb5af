//! Structural operations fully succeed or fully fail

mod common;

use common::*;
use nestset_core::{
    ExError, ExErrorKind, MemoryRowStore, NestedSet, NodeId, NodeRow, NodeState, Payload,
    RangePredicate, RowStore, Scope, Shift, Span, StoreResult, TreeArena, TreeError,
};

/// Memory store that fails the chosen write
#[derive(Default)]
struct FlakyStore {
    inner: MemoryRowStore,
    fail_insert: bool,
    fail_delete: bool,
}

impl RowStore for FlakyStore {
    fn read_by_id(&self, scope: &Scope, id: &NodeId) -> StoreResult<Option<NodeRow>> {
        self.inner.read_by_id(scope, id)
    }

    fn read_range(&self, scope: &Scope, predicate: RangePredicate) -> StoreResult<Vec<NodeRow>> {
        self.inner.read_range(scope, predicate)
    }

    fn read_children(
        &self,
        scope: &Scope,
        parent: Option<&NodeId>,
    ) -> StoreResult<Vec<NodeRow>> {
        self.inner.read_children(scope, parent)
    }

    fn insert_rows(&mut self, rows: &[NodeRow]) -> StoreResult<()> {
        if self.fail_insert {
            return Err(ExError::new(ExErrorKind::Persistence)
                .with_op("insert_rows")
                .with_message("disk full"));
        }
        self.inner.insert_rows(rows)
    }

    fn update_attributes(&mut self, scope: &Scope, row: &NodeRow) -> StoreResult<()> {
        self.inner.update_attributes(scope, row)
    }

    fn apply_shift(&mut self, scope: &Scope, shift: &Shift) -> StoreResult<usize> {
        self.inner.apply_shift(scope, shift)
    }

    fn delete_span(&mut self, scope: &Scope, span: Span) -> StoreResult<usize> {
        if self.fail_delete {
            return Err(ExError::new(ExErrorKind::Persistence).with_op("delete_span"));
        }
        self.inner.delete_span(scope, span)
    }

    fn begin(&mut self) -> StoreResult<()> {
        self.inner.begin()
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.inner.commit()
    }

    fn rollback(&mut self) -> StoreResult<()> {
        self.inner.rollback()
    }
}

fn seeded() -> (NestedSet<FlakyStore>, TreeArena, Vec<nestset_core::NodeHandle>) {
    let mut tree = NestedSet::with_defaults(FlakyStore::default());
    let mut arena = new_arena();
    let a = tree.new_node(&mut arena, Payload::named("A")).unwrap();
    let b = tree.new_node(&mut arena, Payload::named("B")).unwrap();
    arena.attach(a, b).unwrap();
    tree.save(&mut arena, a).unwrap();
    (tree, arena, vec![a, b])
}

fn spans(tree: &NestedSet<FlakyStore>) -> Vec<Span> {
    tree.store()
        .read_range(&Scope::from(SCOPE), RangePredicate::Scope)
        .unwrap()
        .iter()
        .map(NodeRow::span)
        .collect()
}

#[test]
fn test_failed_insert_rolls_back_the_gap() {
    // GIVEN A (1,4), B (2,3)
    let (mut tree, mut arena, handles) = seeded();
    let c = tree.new_node(&mut arena, Payload::named("C")).unwrap();
    arena.attach(handles[0], c).unwrap();

    // WHEN the insert after the widening shift fails
    tree.store_mut().fail_insert = true;
    let err = tree.save(&mut arena, c).unwrap_err();

    // THEN the store error passes through, tagged with the operation id
    match &err {
        TreeError::Store(inner) => {
            assert_eq!(inner.kind(), ExErrorKind::Persistence);
            assert_eq!(inner.op(), Some("insert_rows"));
            assert!(inner.operation_id().is_some());
        }
        other => panic!("unexpected error {other:?}"),
    }

    // AND neither the store nor the arena kept the shift
    assert_eq!(spans(&tree), vec![Span::new(1, 4), Span::new(2, 3)]);
    assert_eq!(arena.node(handles[0]).unwrap().span(), Some(Span::new(1, 4)));
    assert_eq!(arena.node(c).unwrap().state(), NodeState::Staged);
    assert!(!tree.store().inner.in_transaction());

    // AND the same save succeeds once the store recovers
    tree.store_mut().fail_insert = false;
    tree.save(&mut arena, c).unwrap();
    assert_eq!(spans(&tree).len(), 3);
}

#[test]
fn test_failed_delete_keeps_subtree() {
    let (mut tree, mut arena, handles) = seeded();
    tree.store_mut().fail_delete = true;

    let err = tree.destroy(&mut arena, handles[1]).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Persistence);
    assert!(arena.contains(handles[1]));
    assert_eq!(spans(&tree), vec![Span::new(1, 4), Span::new(2, 3)]);
}
