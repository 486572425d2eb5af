//! SQLite row store
//!
//! Implements `RowStore` over one `rusqlite::Connection`. Each shift is a
//! single `UPDATE ... CASE` statement, so SQLite evaluates every edge
//! against its pre-update value.

#![allow(clippy::result_large_err)]

use crate::db;
use crate::errors::{from_rusqlite, serialization_error, Result};
use crate::migrations::apply_migrations;
use crate::repo::hydration::node_row;
use crate::repo::sql;
use nestset_core::errors::{ExError, ExErrorKind, StoreResult};
use nestset_core::{NodeId, NodeRow, RangePredicate, RowStore, Scope, Shift, Span, TreeConfig};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::path::Path;

/// Nested-set rows in a SQLite table laid out by a `TreeConfig`
pub struct SqliteRowStore {
    conn: Connection,
    config: TreeConfig,
}

impl SqliteRowStore {
    /// Wrap an already configured connection
    ///
    /// Does not create the table; call `ensure_table` for custom layouts.
    pub fn new(conn: Connection, config: TreeConfig) -> Result<Self> {
        config.validate().map_err(ExError::from)?;
        Ok(Self { conn, config })
    }

    /// Open a database file, apply migrations and create the configured table
    pub fn open<P: AsRef<Path>>(path: P, config: TreeConfig) -> Result<Self> {
        let mut conn = db::open(path)?;
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        let store = Self::new(conn, config)?;
        store.ensure_table()?;
        Ok(store)
    }

    /// In-memory database with the same setup as `open`
    pub fn open_in_memory(config: TreeConfig) -> Result<Self> {
        let mut conn = db::open_in_memory()?;
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        let store = Self::new(conn, config)?;
        store.ensure_table()?;
        Ok(store)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Create the configured table and its indexes if missing
    pub fn ensure_table(&self) -> Result<()> {
        self.conn
            .execute_batch(&sql::create_table_sql(&self.config))
            .map_err(from_rusqlite)
    }

    fn query_rows(&self, sql: &str, params: Vec<Value>) -> Result<Vec<NodeRow>> {
        let mut stmt = self.conn.prepare_cached(sql).map_err(from_rusqlite)?;
        let rows = stmt
            .query_map(params_from_iter(params), node_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(rows)
    }
}

fn bound(values: &[i64], scope: &Scope) -> Vec<Value> {
    values
        .iter()
        .map(|v| Value::Integer(*v))
        .chain(std::iter::once(Value::Text(scope.to_string())))
        .collect()
}

impl RowStore for SqliteRowStore {
    fn read_by_id(&self, scope: &Scope, id: &NodeId) -> StoreResult<Option<NodeRow>> {
        let mut stmt = self
            .conn
            .prepare_cached(&sql::select_by_id(&self.config))
            .map_err(from_rusqlite)?;
        stmt.query_row([id.as_str(), scope.as_str()], node_row)
            .optional()
            .map_err(from_rusqlite)
    }

    fn read_range(&self, scope: &Scope, predicate: RangePredicate) -> StoreResult<Vec<NodeRow>> {
        let query = sql::select_range(&self.config, predicate);
        self.query_rows(&query.sql, bound(&query.bounds, scope))
    }

    fn read_children(
        &self,
        scope: &Scope,
        parent: Option<&NodeId>,
    ) -> StoreResult<Vec<NodeRow>> {
        let parent = parent
            .map(|id| Value::Text(id.to_string()))
            .unwrap_or(Value::Null);
        self.query_rows(
            &sql::select_children(&self.config),
            vec![parent, Value::Text(scope.to_string())],
        )
    }

    fn insert_rows(&mut self, rows: &[NodeRow]) -> StoreResult<()> {
        let track_level = self.config.track_level;
        let mut stmt = self
            .conn
            .prepare_cached(&sql::insert_row(&self.config))
            .map_err(from_rusqlite)?;

        for row in rows {
            let payload = row
                .payload
                .to_json_string()
                .map_err(|e| serialization_error(row.id.as_str(), e))?;
            let mut params = vec![
                Value::Text(row.id.to_string()),
                row.parent_id
                    .as_ref()
                    .map(|p| Value::Text(p.to_string()))
                    .unwrap_or(Value::Null),
                Value::Integer(row.left),
                Value::Integer(row.right),
                Value::Text(row.scope.to_string()),
                Value::Text(payload),
            ];
            if track_level {
                params.push(row.level.map(Value::Integer).unwrap_or(Value::Null));
            }
            stmt.execute(params_from_iter(params))
                .map_err(|e| from_rusqlite(e).with_entity_id(row.id.to_string()))?;
        }

        tracing::debug!(rows = rows.len(), table = %self.config.table, "inserted rows");
        Ok(())
    }

    fn update_attributes(&mut self, scope: &Scope, row: &NodeRow) -> StoreResult<()> {
        let payload = row
            .payload
            .to_json_string()
            .map_err(|e| serialization_error(row.id.as_str(), e))?;
        let changed = self
            .conn
            .execute(
                &sql::update_attributes(&self.config),
                rusqlite::params![
                    row.parent_id.as_ref().map(|p| p.as_str()),
                    payload,
                    row.id.as_str(),
                    scope.as_str(),
                ],
            )
            .map_err(from_rusqlite)?;

        if changed == 0 {
            return Err(ExError::new(ExErrorKind::NotFound)
                .with_op("update_attributes")
                .with_entity_id(row.id.to_string())
                .with_scope(scope.to_string()));
        }
        Ok(())
    }

    fn apply_shift(&mut self, scope: &Scope, shift: &Shift) -> StoreResult<usize> {
        let statement = sql::shift_statement(&self.config, shift);
        let touched = self
            .conn
            .execute(&statement.sql, params_from_iter(bound(&statement.bounds, scope)))
            .map_err(|e| from_rusqlite(e).with_scope(scope.to_string()))?;

        tracing::debug!(
            scope = %scope,
            shift_kind = shift.kind(),
            rows_affected = touched,
            "sqlite shift"
        );
        Ok(touched)
    }

    fn delete_span(&mut self, scope: &Scope, span: Span) -> StoreResult<usize> {
        let deleted = self
            .conn
            .execute(
                &sql::delete_span(&self.config),
                rusqlite::params![scope.as_str(), span.left, span.right],
            )
            .map_err(from_rusqlite)?;
        tracing::debug!(scope = %scope, rows_deleted = deleted, "deleted span");
        Ok(deleted)
    }

    fn begin(&mut self) -> StoreResult<()> {
        if !self.conn.is_autocommit() {
            return Err(ExError::new(ExErrorKind::Concurrency)
                .with_op("begin")
                .with_message("transaction already open"));
        }
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(from_rusqlite)
    }

    fn commit(&mut self) -> StoreResult<()> {
        if self.conn.is_autocommit() {
            return Err(ExError::new(ExErrorKind::Concurrency)
                .with_op("commit")
                .with_message("no open transaction"));
        }
        self.conn.execute_batch("COMMIT").map_err(from_rusqlite)
    }

    fn rollback(&mut self) -> StoreResult<()> {
        if self.conn.is_autocommit() {
            return Err(ExError::new(ExErrorKind::Concurrency)
                .with_op("rollback")
                .with_message("no open transaction"));
        }
        self.conn.execute_batch("ROLLBACK").map_err(from_rusqlite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestset_core::Payload;

    fn row(id: &str, parent: Option<&str>, left: i64, right: i64, level: i64) -> NodeRow {
        NodeRow {
            id: NodeId::from(id),
            parent_id: parent.map(NodeId::from),
            left,
            right,
            level: Some(level),
            scope: Scope::from("s"),
            payload: Payload::named(id),
        }
    }

    fn seeded() -> SqliteRowStore {
        let mut store = SqliteRowStore::open_in_memory(TreeConfig::default()).unwrap();
        store
            .insert_rows(&[
                row("a", None, 1, 6, 1),
                row("b", Some("a"), 2, 3, 2),
                row("c", Some("a"), 4, 5, 2),
            ])
            .unwrap();
        store
    }

    fn span_of(store: &SqliteRowStore, id: &str) -> (i64, i64, Option<i64>) {
        let row = store
            .read_by_id(&Scope::from("s"), &NodeId::from(id))
            .unwrap()
            .unwrap();
        (row.left, row.right, row.level)
    }

    #[test]
    fn test_round_trip_keeps_payload() {
        let store = seeded();
        let b = store
            .read_by_id(&Scope::from("s"), &NodeId::from("b"))
            .unwrap()
            .unwrap();
        assert_eq!(b.parent_id, Some(NodeId::from("a")));
        assert_eq!(b.payload.name(), Some("b"));
        assert!(store
            .read_by_id(&Scope::from("other"), &NodeId::from("b"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_move_shift_is_one_statement() {
        let mut store = seeded();
        let shift = Shift::plan_move(Span::new(4, 5), Span::new(2, 3), 1).unwrap();
        let touched = store.apply_shift(&Scope::from("s"), &shift).unwrap();

        assert_eq!(touched, 3);
        assert_eq!(span_of(&store, "a"), (1, 6, Some(1)));
        assert_eq!(span_of(&store, "b"), (2, 5, Some(2)));
        assert_eq!(span_of(&store, "c"), (3, 4, Some(3)));
    }

    #[test]
    fn test_children_of_root_and_null_parent() {
        let store = seeded();
        let roots = store.read_children(&Scope::from("s"), None).unwrap();
        assert_eq!(roots.len(), 1);

        let children = store
            .read_children(&Scope::from("s"), Some(&NodeId::from("a")))
            .unwrap();
        let ids: Vec<&str> = children.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_missing_parent_violates_foreign_key() {
        let mut store = SqliteRowStore::open_in_memory(TreeConfig::default()).unwrap();
        let err = store
            .insert_rows(&[row("b", Some("ghost"), 2, 3, 2)])
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
        assert_eq!(err.entity_id(), Some("b"));
    }

    #[test]
    fn test_rollback_discards_writes() {
        let mut store = seeded();
        store.begin().unwrap();
        store.delete_span(&Scope::from("s"), Span::new(2, 3)).unwrap();
        store.rollback().unwrap();

        let all = store
            .read_range(&Scope::from("s"), RangePredicate::Scope)
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_nested_begin_is_rejected() {
        let mut store = seeded();
        store.begin().unwrap();
        assert_eq!(store.begin().unwrap_err().kind(), ExErrorKind::Concurrency);
        store.commit().unwrap();
        assert_eq!(store.commit().unwrap_err().kind(), ExErrorKind::Concurrency);
    }

    #[test]
    fn test_update_missing_row_is_not_found() {
        let mut store = seeded();
        let err = store
            .update_attributes(&Scope::from("s"), &row("zz", None, 1, 2, 1))
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
    }
}
