//! Tree operations against SQLite
//!
//! ## Scenarios Covered
//!
//! 1. Building a staged subtree numbers it depth-first in one batch
//! 2. Adding a child under a stored parent opens a gap of the subtree width
//! 3. Moving left, right and up renumbers with one UPDATE
//! 4. Illegal moves leave the database untouched
//! 5. Destroying a subtree closes the gap
//! 6. Interval queries answer from the stored edges
//! 7. A second root is rejected

mod common;

use common::*;
use nestset_core::queries::tree_queries;
use nestset_core::{Payload, Position, RangePredicate, RowStore, Scope, Span, TreeError};

#[test]
fn test_build_tree_in_one_save() {
    // GIVEN a staged tree A(B(C), D)
    let mut tree = sqlite_tree();
    let mut arena = new_arena();
    let a = named(&tree, &mut arena, "A");
    let b = named(&tree, &mut arena, "B");
    let c = named(&tree, &mut arena, "C");
    let d = named(&tree, &mut arena, "D");
    arena.attach(a, b).unwrap();
    arena.attach(b, c).unwrap();
    arena.attach(a, d).unwrap();

    // WHEN the root is saved
    let report = tree.save(&mut arena, a).unwrap();

    // THEN every row carries its depth-first numbering
    assert_eq!(report.inserted, 4);
    assert_eq!(stored_span(&tree, &arena, a), Span::new(1, 8));
    assert_eq!(stored_span(&tree, &arena, b), Span::new(2, 5));
    assert_eq!(stored_span(&tree, &arena, c), Span::new(3, 4));
    assert_eq!(stored_span(&tree, &arena, d), Span::new(6, 7));
    assert_eq!(stored(&tree, &arena, c).level, Some(3));
    assert_eq!(tree.verify(&Scope::from(SCOPE)).unwrap(), 4);
}

#[test]
fn test_add_subtree_under_stored_parent() {
    // GIVEN A(1,4) B(2,3) stored
    let mut tree = sqlite_tree();
    let mut arena = new_arena();
    let a = named(&tree, &mut arena, "A");
    let b = named(&tree, &mut arena, "B");
    arena.attach(a, b).unwrap();
    tree.save(&mut arena, a).unwrap();

    // WHEN a staged pair X(Y) is attached to B and saved
    let x = named(&tree, &mut arena, "X");
    let y = named(&tree, &mut arena, "Y");
    arena.attach(x, y).unwrap();
    arena.attach(b, x).unwrap();
    let report = tree.save(&mut arena, y).unwrap();

    // THEN the gap was opened by the pair's width once
    assert_eq!(report.shifts, 1);
    assert_eq!(report.inserted, 2);
    assert_eq!(stored_span(&tree, &arena, a), Span::new(1, 8));
    assert_eq!(stored_span(&tree, &arena, b), Span::new(2, 7));
    assert_eq!(stored_span(&tree, &arena, x), Span::new(3, 6));
    assert_eq!(stored_span(&tree, &arena, y), Span::new(4, 5));
}

#[test]
fn test_moves_in_every_direction() {
    // GIVEN root(1,10) x(2,5) x1(3,4) y(6,7) z(8,9)
    let mut tree = sqlite_tree();
    let mut arena = new_arena();
    let root = named(&tree, &mut arena, "root");
    let x = named(&tree, &mut arena, "x");
    let x1 = named(&tree, &mut arena, "x1");
    let y = named(&tree, &mut arena, "y");
    let z = named(&tree, &mut arena, "z");
    arena.attach(root, x).unwrap();
    arena.attach(x, x1).unwrap();
    arena.attach(root, y).unwrap();
    arena.attach(root, z).unwrap();
    tree.save(&mut arena, root).unwrap();

    // WHEN x moves right under z
    tree.move_to(&mut arena, x, z).unwrap();

    // THEN z encloses x and x1 one level deeper
    assert_eq!(stored_span(&tree, &arena, y), Span::new(2, 3));
    assert_eq!(stored_span(&tree, &arena, z), Span::new(4, 9));
    assert_eq!(stored_span(&tree, &arena, x), Span::new(5, 8));
    assert_eq!(stored_span(&tree, &arena, x1), Span::new(6, 7));
    assert_eq!(stored(&tree, &arena, x1).level, Some(4));

    // WHEN x1 moves up to the root
    tree.move_to(&mut arena, x1, root).unwrap();

    // THEN it becomes the root's last child at level 2
    assert_eq!(stored_span(&tree, &arena, x), Span::new(5, 6));
    assert_eq!(stored_span(&tree, &arena, z), Span::new(4, 7));
    assert_eq!(stored_span(&tree, &arena, x1), Span::new(8, 9));
    assert_eq!(stored(&tree, &arena, x1).level, Some(2));

    // WHEN x1 moves left under y
    tree.move_to(&mut arena, x1, y).unwrap();

    // THEN y encloses it
    assert_eq!(stored_span(&tree, &arena, y), Span::new(2, 5));
    assert_eq!(stored_span(&tree, &arena, x1), Span::new(3, 4));
    assert_eq!(stored_span(&tree, &arena, z), Span::new(6, 9));
    assert_eq!(stored_span(&tree, &arena, root), Span::new(1, 10));
    tree.verify(&Scope::from(SCOPE)).unwrap();
}

#[test]
fn test_illegal_move_leaves_rows_untouched() {
    // GIVEN A(B(C))
    let mut tree = sqlite_tree();
    let mut arena = new_arena();
    let a = named(&tree, &mut arena, "A");
    let b = named(&tree, &mut arena, "B");
    let c = named(&tree, &mut arena, "C");
    arena.attach(a, b).unwrap();
    arena.attach(b, c).unwrap();
    tree.save(&mut arena, a).unwrap();
    let before = tree
        .store()
        .read_range(&Scope::from(SCOPE), RangePredicate::Scope)
        .unwrap();

    // WHEN B is moved under its own child
    let err = tree.move_to(&mut arena, b, c).unwrap_err();

    // THEN the move is rejected and nothing changed
    assert!(matches!(err, TreeError::IllegalReparent { .. }));
    let after = tree
        .store()
        .read_range(&Scope::from(SCOPE), RangePredicate::Scope)
        .unwrap();
    assert_eq!(before, after);
    assert!(tree.store().connection().is_autocommit());
}

#[test]
fn test_destroy_closes_gap() {
    // GIVEN root(1,10) x(2,5) x1(3,4) y(6,7) z(8,9)
    let mut tree = sqlite_tree();
    let mut arena = new_arena();
    let root = named(&tree, &mut arena, "root");
    let x = named(&tree, &mut arena, "x");
    let x1 = named(&tree, &mut arena, "x1");
    let y = named(&tree, &mut arena, "y");
    let z = named(&tree, &mut arena, "z");
    arena.attach(root, x).unwrap();
    arena.attach(x, x1).unwrap();
    arena.attach(root, y).unwrap();
    arena.attach(root, z).unwrap();
    tree.save(&mut arena, root).unwrap();

    // WHEN x is destroyed
    let report = tree.destroy(&mut arena, x).unwrap();

    // THEN its rows are gone and the rest slide down by 4
    assert_eq!(report.rows_deleted, 2);
    assert_eq!(stored_span(&tree, &arena, root), Span::new(1, 6));
    assert_eq!(stored_span(&tree, &arena, y), Span::new(2, 3));
    assert_eq!(stored_span(&tree, &arena, z), Span::new(4, 5));
    assert_eq!(tree.verify(&Scope::from(SCOPE)).unwrap(), 3);
}

#[test]
fn test_queries_read_stored_edges() {
    // GIVEN A(B(C), D)
    let mut tree = sqlite_tree();
    let mut arena = new_arena();
    let a = named(&tree, &mut arena, "A");
    let b = named(&tree, &mut arena, "B");
    let c = named(&tree, &mut arena, "C");
    let d = named(&tree, &mut arena, "D");
    arena.attach(a, b).unwrap();
    arena.attach(b, c).unwrap();
    arena.attach(a, d).unwrap();
    tree.save(&mut arena, a).unwrap();
    let store = tree.store();
    let c_row = stored(&tree, &arena, c);
    let a_row = stored(&tree, &arena, a);

    // THEN ancestors come nearest first, by parent walk and by interval
    assert_eq!(names(&tree_queries::ancestors(store, &c_row).unwrap()), vec!["B", "A"]);
    assert_eq!(
        names(&tree_queries::ancestors_by_interval(store, &c_row).unwrap()),
        vec!["B", "A"]
    );
    // AND descendant reads follow left order
    assert_eq!(
        names(&tree_queries::all_children(store, &a_row).unwrap()),
        vec!["B", "C", "D"]
    );
    assert_eq!(
        names(&tree_queries::direct_children(store, &a_row).unwrap()),
        vec!["B", "D"]
    );
    assert_eq!(
        names(&tree_queries::siblings(store, &stored(&tree, &arena, b)).unwrap()),
        vec!["D"]
    );
    assert_eq!(tree_queries::root(store, &c_row).unwrap().id, a_row.id);
    assert_eq!(tree_queries::position(&a_row), Position::Root);
    assert_eq!(tree_queries::position(&c_row), Position::Child);
}

#[test]
fn test_second_root_is_rejected() {
    // GIVEN a stored root
    let mut tree = sqlite_tree();
    let mut arena = new_arena();
    let a = named(&tree, &mut arena, "A");
    tree.save(&mut arena, a).unwrap();

    // WHEN another parentless node is saved
    let other = tree.new_node(&mut arena, Payload::named("other")).unwrap();
    let err = tree.save(&mut arena, other).unwrap_err();

    // THEN it is refused and only one row exists
    assert!(matches!(err, TreeError::MultipleRoots { .. }));
    let rows = tree
        .store()
        .read_range(&Scope::from(SCOPE), RangePredicate::Scope)
        .unwrap();
    assert_eq!(rows.len(), 1);
}
