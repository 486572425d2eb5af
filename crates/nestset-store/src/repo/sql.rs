//! SQL text for a configured nested-set table
//!
//! Column names come from a validated `TreeConfig` and are quoted as
//! identifiers; every value is bound as a numbered parameter.

use nestset_core::{RangePredicate, Shift, TreeConfig};

/// Quote a validated identifier
pub fn ident(name: &str) -> String {
    format!("\"{}\"", name)
}

/// `CREATE TABLE IF NOT EXISTS` plus indexes for the configured layout
pub fn create_table_sql(config: &TreeConfig) -> String {
    let table = ident(&config.table);
    let id = ident(&config.id_column);
    let parent = ident(&config.parent_column);
    let left = ident(&config.left_column);
    let right = ident(&config.right_column);
    let scope = ident(&config.scope_column);
    let payload = ident(&config.payload_column);

    let level_def = match config.level_column() {
        Some(level) => format!("    {} INTEGER NULL,\n", ident(level)),
        None => String::new(),
    };

    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n\
         \x20   {id} TEXT PRIMARY KEY,\n\
         \x20   {parent} TEXT NULL REFERENCES {table}({id}),\n\
         \x20   {left} INTEGER NOT NULL,\n\
         \x20   {right} INTEGER NOT NULL,\n\
         {level_def}\
         \x20   {scope} TEXT NOT NULL,\n\
         \x20   {payload} TEXT NOT NULL DEFAULT '{{}}',\n\
         \x20   CHECK ({left} > 0 AND {right} > {left})\n\
         );\n"
    );

    let raw = &config.table;
    sql.push_str(&format!(
        "CREATE INDEX IF NOT EXISTS \"idx_{raw}_scope_lft\" ON {table}({scope}, {left});\n\
         CREATE INDEX IF NOT EXISTS \"idx_{raw}_scope_rgt\" ON {table}({scope}, {right});\n\
         CREATE INDEX IF NOT EXISTS \"idx_{raw}_scope_parent\" ON {table}({scope}, {parent});\n"
    ));
    if let Some(level) = config.level_column() {
        sql.push_str(&format!(
            "CREATE INDEX IF NOT EXISTS \"idx_{raw}_level\" ON {table}({});\n",
            ident(level)
        ));
    }
    sql
}

/// Select list in hydration order: id, parent, left, right, level, scope, payload
pub fn select_columns(config: &TreeConfig) -> String {
    let level = config
        .level_column()
        .map(ident)
        .unwrap_or_else(|| "NULL".to_string());
    format!(
        "{}, {}, {}, {}, {}, {}, {}",
        ident(&config.id_column),
        ident(&config.parent_column),
        ident(&config.left_column),
        ident(&config.right_column),
        level,
        ident(&config.scope_column),
        ident(&config.payload_column),
    )
}

pub fn select_by_id(config: &TreeConfig) -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = ?1 AND {} = ?2",
        select_columns(config),
        ident(&config.table),
        ident(&config.id_column),
        ident(&config.scope_column),
    )
}

pub fn select_children(config: &TreeConfig) -> String {
    format!(
        "SELECT {} FROM {} WHERE {} IS ?1 AND {} = ?2 ORDER BY {}",
        select_columns(config),
        ident(&config.table),
        ident(&config.parent_column),
        ident(&config.scope_column),
        ident(&config.left_column),
    )
}

/// Range read: SQL text plus the integer bounds bound before the scope
pub struct RangeQuery {
    pub sql: String,
    pub bounds: Vec<i64>,
}

pub fn select_range(config: &TreeConfig, predicate: RangePredicate) -> RangeQuery {
    let left = ident(&config.left_column);
    let right = ident(&config.right_column);

    let (condition, bounds) = match predicate {
        RangePredicate::FullSet(span) => (
            format!("{left} BETWEEN ?1 AND ?2"),
            vec![span.left, span.right],
        ),
        RangePredicate::Descendants { span, max_level } => {
            match (max_level, config.level_column()) {
                (Some(max), Some(level)) => (
                    format!(
                        "{left} > ?1 AND {right} < ?2 AND ({level} IS NULL OR {level} <= ?3)",
                        level = ident(level)
                    ),
                    vec![span.left, span.right, max],
                ),
                _ => (
                    format!("{left} > ?1 AND {right} < ?2"),
                    vec![span.left, span.right],
                ),
            }
        }
        RangePredicate::Enclosing(span) => (
            format!("{left} < ?1 AND {right} > ?2"),
            vec![span.left, span.right],
        ),
        RangePredicate::Scope => ("1 = 1".to_string(), Vec::new()),
    };

    let sql = format!(
        "SELECT {} FROM {} WHERE {} AND {} = ?{} ORDER BY {}",
        select_columns(config),
        ident(&config.table),
        condition,
        ident(&config.scope_column),
        bounds.len() + 1,
        left,
    );
    RangeQuery { sql, bounds }
}

pub fn insert_row(config: &TreeConfig) -> String {
    let mut columns = vec![
        ident(&config.id_column),
        ident(&config.parent_column),
        ident(&config.left_column),
        ident(&config.right_column),
        ident(&config.scope_column),
        ident(&config.payload_column),
    ];
    if let Some(level) = config.level_column() {
        columns.push(ident(level));
    }
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        ident(&config.table),
        columns.join(", "),
        placeholders.join(", ")
    )
}

pub fn update_attributes(config: &TreeConfig) -> String {
    format!(
        "UPDATE {} SET {} = ?1, {} = ?2 WHERE {} = ?3 AND {} = ?4",
        ident(&config.table),
        ident(&config.parent_column),
        ident(&config.payload_column),
        ident(&config.id_column),
        ident(&config.scope_column),
    )
}

pub fn delete_span(config: &TreeConfig) -> String {
    format!(
        "DELETE FROM {} WHERE {} = ?1 AND {} BETWEEN ?2 AND ?3",
        ident(&config.table),
        ident(&config.scope_column),
        ident(&config.left_column),
    )
}

/// One `UPDATE` statement for a shift; `bounds` bind `?1..?n`, scope binds `?n+1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftStatement {
    pub sql: String,
    pub bounds: Vec<i64>,
}

pub fn shift_statement(config: &TreeConfig, shift: &Shift) -> ShiftStatement {
    let table = ident(&config.table);
    let left = ident(&config.left_column);
    let right = ident(&config.right_column);
    let scope = ident(&config.scope_column);

    match *shift {
        Shift::OpenGap { at, offset } => ShiftStatement {
            sql: format!(
                "UPDATE {table} SET \
                 {left} = CASE WHEN {left} >= ?1 THEN {left} + ?2 ELSE {left} END, \
                 {right} = CASE WHEN {right} >= ?1 THEN {right} + ?2 ELSE {right} END \
                 WHERE {right} >= ?1 AND {scope} = ?3"
            ),
            bounds: vec![at, offset],
        },
        Shift::CloseGap { after, width } => ShiftStatement {
            sql: format!(
                "UPDATE {table} SET \
                 {left} = CASE WHEN {left} > ?1 THEN {left} - ?2 ELSE {left} END, \
                 {right} = CASE WHEN {right} > ?1 THEN {right} - ?2 ELSE {right} END \
                 WHERE {right} > ?1 AND {scope} = ?3"
            ),
            bounds: vec![after, width],
        },
        Shift::Move {
            moved,
            moved_offset,
            interior,
            interior_offset,
            level_delta,
        } => {
            let edge = |col: &str| {
                format!(
                    "{col} = CASE \
                     WHEN {col} BETWEEN ?1 AND ?2 THEN {col} + ?3 \
                     WHEN {col} BETWEEN ?4 AND ?5 THEN {col} + ?6 \
                     ELSE {col} END"
                )
            };
            let mut sets = vec![edge(&left), edge(&right)];
            if let Some(level) = config.level_column() {
                let level = ident(level);
                sets.push(format!(
                    "{level} = CASE WHEN {left} BETWEEN ?1 AND ?2 THEN {level} + ?7 ELSE {level} END"
                ));
            }
            ShiftStatement {
                sql: format!(
                    "UPDATE {table} SET {} \
                     WHERE (({right} >= ?1 AND {left} <= ?2) \
                     OR (?4 <= ?5 AND {right} >= ?4 AND {left} <= ?5)) \
                     AND {scope} = ?8",
                    sets.join(", ")
                ),
                bounds: vec![
                    moved.from,
                    moved.to,
                    moved_offset,
                    interior.from,
                    interior.to,
                    interior_offset,
                    level_delta,
                ],
            }
        }
    }
}
