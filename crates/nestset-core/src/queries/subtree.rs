//! Bounded-depth subtree loading
//!
//! One range read fetches the descendants of a node; the result is kept as a
//! flat row vector plus an id index, with child lists rebuilt from the
//! stored parent ids.

use std::collections::{HashMap, HashSet};

use crate::errors::{Result, TreeError};
use crate::model::{NodeId, NodeRow};
use crate::ops::store::{RangePredicate, RowStore};

/// Descendants of one stored node, linked by index
#[derive(Debug, Clone)]
pub struct LoadedSubtree {
    root: NodeRow,
    rows: Vec<NodeRow>,
    index: HashMap<NodeId, usize>,
    depths: Vec<u32>,
    children: Vec<Vec<usize>>,
    root_children: Vec<usize>,
    descendants: Vec<usize>,
}

impl LoadedSubtree {
    /// Link `rows` (ordered by left) under `root`
    ///
    /// With `max_depth > 0`, rows deeper than `max_depth` below `root` are
    /// dropped; this is what bounds the load when levels are not tracked.
    pub fn build(root: NodeRow, rows: Vec<NodeRow>, max_depth: u32) -> Result<Self> {
        let mut kept: Vec<NodeRow> = Vec::with_capacity(rows.len());
        let mut index = HashMap::new();
        let mut depths = Vec::new();
        let mut children: Vec<Vec<usize>> = Vec::new();
        let mut root_children = Vec::new();
        let mut skipped: HashSet<NodeId> = HashSet::new();

        for row in rows {
            let parent_id = row.parent_id.as_ref().ok_or_else(|| {
                TreeError::invariant(
                    &root.scope,
                    format!("descendant {} of {} has no parent", row.id, root.id),
                )
            })?;

            let (parent, depth) = if *parent_id == root.id {
                (None, 1)
            } else if let Some(&p) = index.get(parent_id) {
                (Some(p), depths[p] + 1)
            } else if skipped.contains(parent_id) {
                skipped.insert(row.id.clone());
                continue;
            } else {
                return Err(TreeError::invariant(
                    &root.scope,
                    format!(
                        "parent {} of {} is not inside {}",
                        parent_id,
                        row.id,
                        root.span()
                    ),
                ));
            };

            if max_depth > 0 && depth > max_depth {
                skipped.insert(row.id.clone());
                continue;
            }

            let i = kept.len();
            index.insert(row.id.clone(), i);
            depths.push(depth);
            children.push(Vec::new());
            match parent {
                Some(p) => children[p].push(i),
                None => root_children.push(i),
            }
            kept.push(row);
        }

        // Children always sit at higher indices than their parent
        let mut descendants = vec![0usize; kept.len()];
        for i in (0..kept.len()).rev() {
            descendants[i] = children[i].iter().map(|c| 1 + descendants[*c]).sum();
        }

        Ok(Self {
            root,
            rows: kept,
            index,
            depths,
            children,
            root_children,
            descendants,
        })
    }

    /// The node the subtree was loaded for
    pub fn root(&self) -> &NodeRow {
        &self.root
    }

    pub fn rows(&self) -> &[NodeRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NodeRow> {
        self.rows.get(index)
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Depth below the root (direct children are 1)
    pub fn depth(&self, index: usize) -> Option<u32> {
        self.depths.get(index).copied()
    }

    pub fn children_of(&self, index: usize) -> &[usize] {
        self.children.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn root_children(&self) -> &[usize] {
        &self.root_children
    }

    /// Number of loaded rows below the row at `index`
    pub fn loaded_descendants(&self, index: usize) -> usize {
        self.descendants.get(index).copied().unwrap_or(0)
    }
}

/// Load the descendants of `root`, at most `max_depth` levels deep
///
/// `max_depth == 0` loads the whole subtree. When levels are tracked the
/// bound is pushed into the range read.
pub fn load_subtree<S: RowStore + ?Sized>(
    store: &S,
    root: &NodeRow,
    max_depth: u32,
) -> Result<LoadedSubtree> {
    let max_level = match (max_depth, root.level) {
        (0, _) | (_, None) => None,
        (depth, Some(level)) => Some(level + i64::from(depth)),
    };
    let rows = store.read_range(
        &root.scope,
        RangePredicate::Descendants {
            span: root.span(),
            max_level,
        },
    )?;
    LoadedSubtree::build(root.clone(), rows, max_depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Payload, Scope};

    fn row(id: &str, parent: Option<&str>, left: i64, right: i64) -> NodeRow {
        NodeRow {
            id: NodeId::from(id),
            parent_id: parent.map(NodeId::from),
            left,
            right,
            level: None,
            scope: Scope::from("s"),
            payload: Payload::new(),
        }
    }

    // a(1,10) b(2,7) d(3,4) e(5,6) c(8,9)
    fn rows() -> Vec<NodeRow> {
        vec![
            row("b", Some("a"), 2, 7),
            row("d", Some("b"), 3, 4),
            row("e", Some("b"), 5, 6),
            row("c", Some("a"), 8, 9),
        ]
    }

    #[test]
    fn test_build_links_children_by_index() {
        let subtree = LoadedSubtree::build(row("a", None, 1, 10), rows(), 0).unwrap();

        assert_eq!(subtree.len(), 4);
        assert_eq!(subtree.root_children(), &[0, 3]);
        assert_eq!(subtree.children_of(0), &[1, 2]);
        assert_eq!(subtree.loaded_descendants(0), 2);
        assert_eq!(subtree.depth(1), Some(2));
        assert_eq!(subtree.index_of(&NodeId::from("c")), Some(3));
    }

    #[test]
    fn test_depth_bound_without_levels() {
        let subtree = LoadedSubtree::build(row("a", None, 1, 10), rows(), 1).unwrap();

        let ids: Vec<&str> = subtree.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(subtree.loaded_descendants(0), 0);
    }

    #[test]
    fn test_orphan_row_is_an_invariant_violation() {
        let mut broken = rows();
        broken[1].parent_id = Some(NodeId::from("ghost"));
        let err = LoadedSubtree::build(row("a", None, 1, 10), broken, 0).unwrap_err();
        assert!(matches!(err, TreeError::InvariantViolation { .. }));
    }
}
