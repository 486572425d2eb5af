pub mod invariants;

pub use invariants::{check_rows, find_violations, verify_scope, Violation};
