//! Hydration - converts SQLite rows into `NodeRow`s
//!
//! Expects the column order produced by `sql::select_columns`.

use nestset_core::{NodeId, NodeRow, Payload, Scope};
use rusqlite::types::Type;
use rusqlite::Row;

/// Build a `NodeRow` from one result row
pub fn node_row(row: &Row<'_>) -> rusqlite::Result<NodeRow> {
    let id: String = row.get(0)?;
    let parent_id: Option<String> = row.get(1)?;
    let left: i64 = row.get(2)?;
    let right: i64 = row.get(3)?;
    let level: Option<i64> = row.get(4)?;
    let scope: String = row.get(5)?;
    let payload_json: String = row.get(6)?;

    let payload = Payload::from_json_str(&payload_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

    Ok(NodeRow {
        id: NodeId::from_string(id),
        parent_id: parent_id.map(NodeId::from_string),
        left,
        right,
        level,
        scope: Scope::new(scope),
        payload,
    })
}
