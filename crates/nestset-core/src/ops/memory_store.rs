use std::collections::HashMap;

use crate::errors::{ExError, ExErrorKind, StoreResult};
use crate::model::{NodeId, NodeRow, Scope, Span};
use crate::ops::store::{RangePredicate, RowStore};
use crate::tree::shift::Shift;

/// In-memory row store
///
/// A HashMap keyed by node id. Transactions snapshot the whole map on
/// `begin` and restore it on `rollback`. Not thread-safe; intended for tests
/// and embedders that keep a tree in process.
#[derive(Debug, Clone, Default)]
pub struct MemoryRowStore {
    rows: HashMap<NodeId, NodeRow>,
    snapshot: Option<HashMap<NodeId, NodeRow>>,
    /// Number of shift statements issued, for asserting single-update behaviour
    shift_count: usize,
}

impl MemoryRowStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows across all scopes
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of `apply_shift` calls served so far
    pub fn shift_count(&self) -> usize {
        self.shift_count
    }

    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    fn sorted(mut rows: Vec<NodeRow>) -> Vec<NodeRow> {
        rows.sort_by(|a, b| a.left.cmp(&b.left).then_with(|| a.id.cmp(&b.id)));
        rows
    }

    fn scoped<'a>(&'a self, scope: &'a Scope) -> impl Iterator<Item = &'a NodeRow> + 'a {
        self.rows.values().filter(move |row| &row.scope == scope)
    }
}

impl RowStore for MemoryRowStore {
    fn read_by_id(&self, scope: &Scope, id: &NodeId) -> StoreResult<Option<NodeRow>> {
        Ok(self.rows.get(id).filter(|row| &row.scope == scope).cloned())
    }

    fn read_range(&self, scope: &Scope, predicate: RangePredicate) -> StoreResult<Vec<NodeRow>> {
        Ok(Self::sorted(
            self.scoped(scope)
                .filter(|row| predicate.matches(row))
                .cloned()
                .collect(),
        ))
    }

    fn read_children(
        &self,
        scope: &Scope,
        parent: Option<&NodeId>,
    ) -> StoreResult<Vec<NodeRow>> {
        Ok(Self::sorted(
            self.scoped(scope)
                .filter(|row| row.parent_id.as_ref() == parent)
                .cloned()
                .collect(),
        ))
    }

    fn insert_rows(&mut self, rows: &[NodeRow]) -> StoreResult<()> {
        for row in rows {
            if self.rows.contains_key(&row.id) {
                return Err(ExError::new(ExErrorKind::ConstraintViolation)
                    .with_op("insert_rows")
                    .with_entity_id(row.id.to_string())
                    .with_message("duplicate node id"));
            }
            // Mirrors the parent foreign key of the SQL schema
            if let Some(parent_id) = &row.parent_id {
                if !self.rows.contains_key(parent_id) {
                    return Err(ExError::new(ExErrorKind::ConstraintViolation)
                        .with_op("insert_rows")
                        .with_entity_id(row.id.to_string())
                        .with_message(format!("parent {} does not exist", parent_id)));
                }
            }
            self.rows.insert(row.id.clone(), row.clone());
        }
        Ok(())
    }

    fn update_attributes(&mut self, scope: &Scope, row: &NodeRow) -> StoreResult<()> {
        let stored = self
            .rows
            .get_mut(&row.id)
            .filter(|stored| &stored.scope == scope)
            .ok_or_else(|| {
                ExError::new(ExErrorKind::NotFound)
                    .with_op("update_attributes")
                    .with_entity_id(row.id.to_string())
                    .with_scope(scope.to_string())
            })?;
        stored.parent_id = row.parent_id.clone();
        stored.payload = row.payload.clone();
        Ok(())
    }

    fn apply_shift(&mut self, scope: &Scope, shift: &Shift) -> StoreResult<usize> {
        self.shift_count += 1;
        let mut touched = 0;
        for row in self.rows.values_mut().filter(|row| &row.scope == scope) {
            if !shift.touches(row.span()) {
                continue;
            }
            let old_left = row.left;
            row.left = shift.apply_edge(row.left);
            row.right = shift.apply_edge(row.right);
            row.level = row.level.map(|level| shift.apply_level(old_left, level));
            touched += 1;
        }
        tracing::debug!(
            scope = %scope,
            shift_kind = shift.kind(),
            rows_affected = touched,
            "memory store shift"
        );
        Ok(touched)
    }

    fn delete_span(&mut self, scope: &Scope, span: Span) -> StoreResult<usize> {
        let before = self.rows.len();
        self.rows.retain(|_, row| {
            &row.scope != scope || row.left < span.left || row.left > span.right
        });
        Ok(before - self.rows.len())
    }

    fn begin(&mut self) -> StoreResult<()> {
        if self.snapshot.is_some() {
            return Err(ExError::new(ExErrorKind::Concurrency)
                .with_op("begin")
                .with_message("transaction already open"));
        }
        self.snapshot = Some(self.rows.clone());
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.snapshot.take().map(|_| ()).ok_or_else(|| {
            ExError::new(ExErrorKind::Concurrency)
                .with_op("commit")
                .with_message("no open transaction")
        })
    }

    fn rollback(&mut self) -> StoreResult<()> {
        let snapshot = self.snapshot.take().ok_or_else(|| {
            ExError::new(ExErrorKind::Concurrency)
                .with_op("rollback")
                .with_message("no open transaction")
        })?;
        self.rows = snapshot;
        Ok(())
    }
}
