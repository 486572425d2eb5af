//! Commit Coordinator
//!
//! `NestedSet` owns a row store and drives every structural write against
//! it. Each public write runs in one store transaction with a fresh
//! `CommitSession`; on error the store is rolled back and the arena restored
//! to its state before the call.

use serde::Serialize;
use serde_json::Value;

use crate::errors::{Result, TreeError};
use crate::model::{NodeId, NodeRow, Payload, Scope, TreeConfig};
use crate::ops::store::RowStore;
use crate::queries::subtree::load_subtree;
use crate::queries::tree_queries;
use crate::rules::invariants;
use crate::tree::arena::{NodeHandle, TreeArena};
use crate::tree::assign::assign;
use crate::tree::session::{CommitSession, SaveReport};
use crate::tree::shift::Shift;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveReport {
    pub node_id: NodeId,
    pub new_parent_id: NodeId,
    pub level_delta: i64,
    pub rows_shifted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestroyReport {
    pub node_id: NodeId,
    pub rows_deleted: usize,
    pub rows_shifted: usize,
}

/// Nested-set tree engine over one row store
pub struct NestedSet<S: RowStore> {
    store: S,
    config: TreeConfig,
}

impl<S: RowStore> NestedSet<S> {
    /// Create an engine; the configuration is validated once here
    pub fn new(store: S, config: TreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Engine with the default column layout
    pub fn with_defaults(store: S) -> Self {
        Self {
            store,
            config: TreeConfig::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    fn track_level(&self) -> bool {
        self.config.track_level
    }

    /// Create an unattached node after checking its payload keys
    pub fn new_node(&self, arena: &mut TreeArena, payload: Payload) -> Result<NodeHandle> {
        self.check_payload(&payload)?;
        Ok(arena.create(payload))
    }

    /// Change one payload attribute of an in-memory node
    pub fn set_attribute(
        &self,
        arena: &mut TreeArena,
        node: NodeHandle,
        key: &str,
        value: Value,
    ) -> Result<()> {
        self.check_key(key)?;
        arena.set_attribute(node, key, value)
    }

    fn check_key(&self, key: &str) -> Result<()> {
        if self.config.reserved_keys().contains(&key) {
            return Err(TreeError::Configuration {
                reason: format!(
                    "'{}' is a structural column; use attach or move_to instead",
                    key
                ),
            });
        }
        Ok(())
    }

    fn check_payload(&self, payload: &Payload) -> Result<()> {
        payload.keys().try_for_each(|key| self.check_key(key))
    }

    /// Point read of a stored node
    pub fn node(&self, scope: &Scope, id: &NodeId) -> Result<NodeRow> {
        tree_queries::node(&self.store, scope, id)
    }

    /// Load one stored node into the arena
    pub fn load(&self, arena: &mut TreeArena, id: &NodeId) -> Result<NodeHandle> {
        let row = tree_queries::node(&self.store, arena.scope(), id)?;
        arena.insert_committed(&row)
    }

    /// Load descendants of a committed node, at most `max_depth` levels deep
    /// (`0` loads everything), and link them under it
    pub fn load_subtree(
        &self,
        arena: &mut TreeArena,
        node: NodeHandle,
        max_depth: u32,
    ) -> Result<Vec<NodeHandle>> {
        let current = arena.node(node)?;
        if !current.is_committed() {
            return Err(TreeError::NotCommitted {
                node_id: current.id().to_string(),
            });
        }
        let row = tree_queries::node(&self.store, arena.scope(), current.id())?;
        arena.refresh(node, &row)?;
        let subtree = load_subtree(&self.store, &row, max_depth)?;
        arena.graft(node, &subtree)
    }

    /// Check every interval invariant of a scope; returns the row count
    pub fn verify(&self, scope: &Scope) -> Result<usize> {
        invariants::verify_scope(&self.store, scope, self.track_level())
    }

    /// Persist the pending change set containing `node`
    ///
    /// An unsaved node is saved through the top-most unsaved node of its
    /// batch, so the whole staged subtree is numbered and inserted after a
    /// single gap-opening shift. A committed node flushes its dirty
    /// descendants and rewritten attributes.
    pub fn save(&mut self, arena: &mut TreeArena, node: NodeHandle) -> Result<SaveReport> {
        let root = arena.batch_root(node)?;
        self.in_transaction(arena, |tree, arena| {
            let mut session = CommitSession::new(arena.scope().clone());
            tree.save_node(arena, &mut session, root)
                .and_then(|()| {
                    while let Some(next) = session.take_pending() {
                        tree.save_node(arena, &mut session, next)?;
                    }
                    Ok(())
                })
                .map_err(|err| match err {
                    TreeError::Store(inner) => {
                        TreeError::Store(inner.with_operation_id(session.operation_id().clone()))
                    }
                    other => other,
                })?;

            let report = session.report();
            tracing::debug!(
                operation_id = %session.operation_id(),
                scope = %session.scope(),
                inserted = report.inserted,
                rewritten = report.rewritten,
                shifts = report.shifts,
                "save complete"
            );
            Ok(session.into_report())
        })
    }

    fn save_node(
        &mut self,
        arena: &mut TreeArena,
        session: &mut CommitSession,
        node: NodeHandle,
    ) -> Result<()> {
        let committed = arena.node(node)?.is_committed();
        if !session.claim_save_root(node) {
            if !committed {
                session.queue_pending(node);
            }
            return Ok(());
        }

        let result = if committed {
            self.save_committed(arena, session, node)
        } else {
            self.save_new(arena, session, node)
        };
        session.release_save_root(node);
        result
    }

    fn save_new(
        &mut self,
        arena: &mut TreeArena,
        session: &mut CommitSession,
        node: NodeHandle,
    ) -> Result<()> {
        let subtree = arena.preorder(node)?;
        for handle in &subtree {
            self.check_payload(arena.node(*handle)?.payload())?;
        }

        let scope = arena.scope().clone();
        let parent = arena.node(node)?.parent();
        let (left, level) = match parent {
            Some(parent) => {
                let parent_node = arena.node(parent)?;
                if !parent_node.is_committed() {
                    return Err(TreeError::NotCommitted {
                        node_id: parent_node.id().to_string(),
                    });
                }
                let parent_row = tree_queries::node(&self.store, &scope, parent_node.id())?;
                arena.refresh(parent, &parent_row)?;
                let level = if self.track_level() {
                    parent_row.level.map(|l| l + 1)
                } else {
                    None
                };
                (parent_row.right, level)
            }
            None => {
                if !self.store.read_children(&scope, None)?.is_empty() {
                    return Err(TreeError::MultipleRoots {
                        scope: scope.to_string(),
                    });
                }
                (1, self.track_level().then_some(1))
            }
        };

        let right = assign(arena, node, left, level)?;

        if parent.is_some() {
            let shift = Shift::open_gap(left, right - left + 1);
            let touched = self.store.apply_shift(&scope, &shift)?;
            arena.apply_shift(&shift);
            session.record_shift(touched);
            tracing::debug!(
                operation_id = %session.operation_id(),
                scope = %scope,
                shift_kind = shift.kind(),
                at = left,
                width = right - left + 1,
                rows_affected = touched,
                "opened gap"
            );
        }

        let rows = subtree
            .iter()
            .map(|handle| arena.row(*handle))
            .collect::<Result<Vec<_>>>()?;
        self.store.insert_rows(&rows)?;
        for handle in &subtree {
            arena.mark_committed(*handle)?;
        }
        session.record_inserted(rows.len());
        Ok(())
    }

    fn save_committed(
        &mut self,
        arena: &mut TreeArena,
        session: &mut CommitSession,
        node: NodeHandle,
    ) -> Result<()> {
        let current = arena.node(node)?;
        let dirty = current.is_dirty();
        let changed = current.attributes_changed();
        let children = current.children().to_vec();

        if changed {
            self.check_payload(current.payload())?;
            let row = arena.row(node)?;
            self.store.update_attributes(arena.scope(), &row)?;
            session.record_rewritten();
        }

        if dirty {
            // Reversed so the last-in-first-out flush inserts siblings in build order
            for child in children.into_iter().rev() {
                if arena.node(child)?.is_committed() {
                    self.save_committed(arena, session, child)?;
                } else {
                    self.save_node(arena, session, child)?;
                }
            }
        }

        arena.clear_flags(node)
    }

    /// Make `node` the last child of `new_parent` with one bulk shift
    pub fn move_to(
        &mut self,
        arena: &mut TreeArena,
        node: NodeHandle,
        new_parent: NodeHandle,
    ) -> Result<MoveReport> {
        for handle in [node, new_parent] {
            let current = arena.node(handle)?;
            if !current.is_committed() {
                return Err(TreeError::NotCommitted {
                    node_id: current.id().to_string(),
                });
            }
        }

        self.in_transaction(arena, |tree, arena| {
            let mut session = CommitSession::new(arena.scope().clone());
            let scope = arena.scope().clone();
            let node_id = arena.node(node)?.id().clone();
            let parent_id = arena.node(new_parent)?.id().clone();

            let node_row = tree_queries::node(&tree.store, &scope, &node_id)?;
            let parent_row = tree_queries::node(&tree.store, &scope, &parent_id)?;
            arena.refresh(node, &node_row)?;
            arena.refresh(new_parent, &parent_row)?;

            let level_delta = match (node_row.level, parent_row.level) {
                (Some(current), Some(parent)) => parent + 1 - current,
                _ => 0,
            };
            let shift = Shift::plan_move(node_row.span(), parent_row.span(), level_delta)
                .ok_or_else(|| TreeError::IllegalReparent {
                    node_id: node_id.to_string(),
                    new_parent_id: parent_id.to_string(),
                })?;

            if !shift.is_noop() {
                let touched = tree.store.apply_shift(&scope, &shift)?;
                arena.apply_shift(&shift);
                session.record_shift(touched);
            }
            tracing::debug!(
                operation_id = %session.operation_id(),
                scope = %scope,
                node_id = %node_id,
                parent_id = %parent_id,
                level_delta,
                rows_affected = session.report().rows_shifted,
                "moved subtree"
            );

            arena.relink(node, new_parent)?;
            let row = arena.row(node)?;
            tree.check_payload(&row.payload)?;
            tree.store.update_attributes(&scope, &row)?;

            Ok(MoveReport {
                node_id,
                new_parent_id: parent_id,
                level_delta,
                rows_shifted: session.report().rows_shifted,
            })
        })
    }

    /// Remove `node` and its whole subtree
    ///
    /// A node that was never stored is only released from the arena.
    pub fn destroy(&mut self, arena: &mut TreeArena, node: NodeHandle) -> Result<DestroyReport> {
        let current = arena.node(node)?;
        if !current.is_committed() {
            let node_id = current.id().clone();
            arena.release_subtree(node)?;
            return Ok(DestroyReport {
                node_id,
                rows_deleted: 0,
                rows_shifted: 0,
            });
        }

        self.in_transaction(arena, |tree, arena| {
            let mut session = CommitSession::new(arena.scope().clone());
            session.claim_destroy_root(node);
            tree.destroy_node(arena, &mut session, node)
        })
    }

    fn destroy_node(
        &mut self,
        arena: &mut TreeArena,
        session: &mut CommitSession,
        node: NodeHandle,
    ) -> Result<DestroyReport> {
        let children = arena.node(node)?.children().to_vec();
        for child in children {
            self.destroy_node(arena, session, child)?;
        }

        let node_id = arena.node(node)?.id().clone();
        let mut report = DestroyReport {
            node_id: node_id.clone(),
            rows_deleted: 0,
            rows_shifted: 0,
        };

        if !session.is_destroy_root(node) {
            arena.release(node)?;
            return Ok(report);
        }

        // Only the top-most node touches the store; the scoped delete also
        // removes descendants that were never loaded.
        let scope = session.scope().clone();
        let row = tree_queries::node(&self.store, &scope, &node_id)?;
        report.rows_deleted = self.store.delete_span(&scope, row.span())?;
        arena.release(node)?;

        let shift = Shift::close_gap(row.span());
        report.rows_shifted = self.store.apply_shift(&scope, &shift)?;
        arena.apply_shift(&shift);
        session.record_shift(report.rows_shifted);
        session.release_destroy_root(node);

        tracing::debug!(
            operation_id = %session.operation_id(),
            scope = %scope,
            node_id = %node_id,
            rows_deleted = report.rows_deleted,
            rows_affected = report.rows_shifted,
            "destroyed subtree"
        );
        Ok(report)
    }

    fn in_transaction<T>(
        &mut self,
        arena: &mut TreeArena,
        op: impl FnOnce(&mut Self, &mut TreeArena) -> Result<T>,
    ) -> Result<T> {
        let backup = arena.clone();
        self.store.begin()?;

        let result = op(self, arena).and_then(|value| {
            self.store.commit()?;
            Ok(value)
        });

        if result.is_err() {
            *arena = backup;
            if let Err(rollback_err) = self.store.rollback() {
                tracing::warn!(error = %rollback_err, "rollback after failed operation failed");
            }
        }
        result
    }
}
