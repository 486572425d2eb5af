//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_OPERATION_ID: &str = "operation_id";

// Tree identifiers
pub const FIELD_SCOPE: &str = "scope";
pub const FIELD_NODE_ID: &str = "node_id";
pub const FIELD_PARENT_ID: &str = "parent_id";

// Shift details
pub const FIELD_SHIFT_KIND: &str = "shift_kind";
pub const FIELD_ROWS_AFFECTED: &str = "rows_affected";
pub const FIELD_ROWS_INSERTED: &str = "rows_inserted";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
