use std::collections::HashSet;
use std::fmt;

use crate::errors::{Result, TreeError};
use crate::model::{NodeRow, Scope};
use crate::ops::store::{RangePredicate, RowStore};

/// One broken interval rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// `left >= right` or `left < 1`
    BadInterval { id: String, left: i64, right: i64 },
    /// Edge values are not exactly `1..=2n`
    EdgesNotContiguous { expected: i64, found: i64 },
    /// Two intervals overlap without nesting
    Overlap { id: String, other: String },
    /// Stored parent differs from the nearest enclosing interval
    WrongParent {
        id: String,
        stored: Option<String>,
        enclosing: Option<String>,
    },
    /// Level is not parent level + 1 (or 1 for a root)
    WrongLevel {
        id: String,
        expected: i64,
        found: Option<i64>,
    },
    /// `(right - left - 1) / 2` disagrees with the rows inside the interval
    WrongWidth { id: String, encoded: i64, found: i64 },
    MultipleRoots { count: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::BadInterval { id, left, right } => {
                write!(f, "node {} has invalid interval ({}, {})", id, left, right)
            }
            Violation::EdgesNotContiguous { expected, found } => {
                write!(f, "edge {} expected, found {}", expected, found)
            }
            Violation::Overlap { id, other } => {
                write!(f, "node {} overlaps {} without nesting", id, other)
            }
            Violation::WrongParent {
                id,
                stored,
                enclosing,
            } => write!(
                f,
                "node {} stores parent {:?} but is enclosed by {:?}",
                id, stored, enclosing
            ),
            Violation::WrongLevel {
                id,
                expected,
                found,
            } => write!(f, "node {} has level {:?}, expected {}", id, found, expected),
            Violation::WrongWidth { id, encoded, found } => write!(
                f,
                "node {} encodes {} descendants but encloses {}",
                id, encoded, found
            ),
            Violation::MultipleRoots { count } => write!(f, "{} root intervals", count),
        }
    }
}

/// Check every interval rule over the rows of one scope
///
/// Rows may arrive in any order. Returns every violation found; an empty
/// scope is valid.
pub fn find_violations(rows: &[NodeRow], track_level: bool) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut sorted: Vec<&NodeRow> = rows.iter().collect();
    sorted.sort_by_key(|row| row.left);

    for row in &sorted {
        if row.left < 1 || row.left >= row.right {
            violations.push(Violation::BadInterval {
                id: row.id.to_string(),
                left: row.left,
                right: row.right,
            });
        }
    }
    if !violations.is_empty() {
        return violations;
    }

    let mut edges: Vec<i64> = sorted.iter().flat_map(|r| [r.left, r.right]).collect();
    edges.sort_unstable();
    if let Some((expected, found)) = edges
        .iter()
        .enumerate()
        .map(|(i, edge)| (i as i64 + 1, *edge))
        .find(|(expected, found)| expected != found)
    {
        violations.push(Violation::EdgesNotContiguous { expected, found });
    }

    let lefts: Vec<i64> = sorted.iter().map(|r| r.left).collect();
    let mut stack: Vec<&NodeRow> = Vec::new();
    let mut roots = 0;
    for (i, row) in sorted.iter().enumerate() {
        while stack.last().is_some_and(|top| top.right < row.left) {
            stack.pop();
        }

        let enclosing = stack.last().copied();
        if let Some(top) = enclosing {
            if row.right > top.right {
                violations.push(Violation::Overlap {
                    id: row.id.to_string(),
                    other: top.id.to_string(),
                });
            }
        } else {
            roots += 1;
        }

        if row.parent_id.as_ref() != enclosing.map(|top| &top.id) {
            violations.push(Violation::WrongParent {
                id: row.id.to_string(),
                stored: row.parent_id.as_ref().map(ToString::to_string),
                enclosing: enclosing.map(|top| top.id.to_string()),
            });
        }

        if track_level {
            let expected = enclosing.and_then(|top| top.level).map_or(1, |l| l + 1);
            if row.level != Some(expected) {
                violations.push(Violation::WrongLevel {
                    id: row.id.to_string(),
                    expected,
                    found: row.level,
                });
            }
        }

        let inside = lefts.partition_point(|left| *left <= row.right) - i - 1;
        if row.children_count() != inside as i64 {
            violations.push(Violation::WrongWidth {
                id: row.id.to_string(),
                encoded: row.children_count(),
                found: inside as i64,
            });
        }

        stack.push(*row);
    }

    if roots > 1 {
        violations.push(Violation::MultipleRoots { count: roots });
    }

    violations
}

/// Fail with the first violation found in `rows`
pub fn check_rows(scope: &Scope, rows: &[NodeRow], track_level: bool) -> Result<()> {
    let ids: HashSet<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    if ids.len() != rows.len() {
        return Err(TreeError::invariant(scope, "duplicate node ids"));
    }
    match find_violations(rows, track_level).into_iter().next() {
        Some(violation) => Err(TreeError::invariant(scope, violation.to_string())),
        None => Ok(()),
    }
}

/// Read a whole scope and check it; returns the number of rows checked
pub fn verify_scope<S: RowStore + ?Sized>(
    store: &S,
    scope: &Scope,
    track_level: bool,
) -> Result<usize> {
    let rows = store.read_range(scope, RangePredicate::Scope)?;
    check_rows(scope, &rows, track_level)?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeId, Payload};

    fn row(id: &str, parent: Option<&str>, left: i64, right: i64, level: i64) -> NodeRow {
        NodeRow {
            id: NodeId::from(id),
            parent_id: parent.map(NodeId::from),
            left,
            right,
            level: Some(level),
            scope: Scope::from("s"),
            payload: Payload::new(),
        }
    }

    fn valid() -> Vec<NodeRow> {
        vec![
            row("a", None, 1, 8, 1),
            row("b", Some("a"), 2, 5, 2),
            row("c", Some("b"), 3, 4, 3),
            row("d", Some("a"), 6, 7, 2),
        ]
    }

    #[test]
    fn test_valid_scope_has_no_violations() {
        assert!(find_violations(&valid(), true).is_empty());
        assert!(find_violations(&[], true).is_empty());
        assert!(check_rows(&Scope::from("s"), &valid(), true).is_ok());
    }

    #[test]
    fn test_gap_in_edges_is_found() {
        let mut rows = valid();
        rows[3] = row("d", Some("a"), 6, 9, 2);
        rows[0] = row("a", None, 1, 10, 1);
        let violations = find_violations(&rows, true);
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::EdgesNotContiguous { .. })));
    }

    #[test]
    fn test_overlap_is_found() {
        let rows = vec![
            row("a", None, 1, 6, 1),
            row("b", Some("a"), 2, 4, 2),
            row("c", Some("b"), 3, 5, 3),
        ];
        let violations = find_violations(&rows, false);
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::Overlap { .. })));
    }

    #[test]
    fn test_parent_must_be_nearest_container() {
        let mut rows = valid();
        rows[2].parent_id = Some(NodeId::from("a"));
        let violations = find_violations(&rows, false);
        assert_eq!(
            violations,
            vec![Violation::WrongParent {
                id: "c".to_string(),
                stored: Some("a".to_string()),
                enclosing: Some("b".to_string()),
            }]
        );
    }

    #[test]
    fn test_level_checked_only_when_tracked() {
        let mut rows = valid();
        rows[2].level = Some(7);
        assert!(find_violations(&rows, false).is_empty());
        assert!(matches!(
            find_violations(&rows, true)[0],
            Violation::WrongLevel { expected: 3, .. }
        ));
    }

    #[test]
    fn test_second_root_is_reported() {
        let rows = vec![row("a", None, 1, 2, 1), row("b", None, 3, 4, 1)];
        let err = check_rows(&Scope::from("s"), &rows, true).unwrap_err();
        assert!(err.to_string().contains("2 root intervals"));
    }

    #[test]
    fn test_inverted_interval_short_circuits() {
        let rows = vec![row("a", None, 4, 1, 1)];
        assert!(matches!(
            find_violations(&rows, true)[0],
            Violation::BadInterval { .. }
        ));
    }
}
