//! Structured logging facility for nestset
//!
//! This module provides a canonical logging facility with:
//! - Single initialization point via `init(profile)`
//! - Structured logging macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! # Usage
//!
//! ```rust
//! use nestset_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```
//!
//! The command layer owns start/end/error events. The tree engine and the
//! row stores only emit `tracing::debug!` lines for shift plans and row
//! counts.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
