//! Provide the canonical vocabulary shared by the funparam engine and its harness.
//!
//! This crate is intentionally small and dependency-light. It contains:
//! - the reserved fixture names the engine anchors on (`funparam`, `_funparam_call_number`),
//! - the per-call mark vocabulary (`skip`, `xfail`, `slow`) as a registry of stable ids,
//! - the user-facing message text that diagnostics and raised failures must agree on.
//!
//! ## Notes
//!
//! - This is a “vocabulary” crate: **no IO**, no global state, and no engine types.

pub mod errors;
pub mod lang;

pub use lang::fixtures::{CALL_NUMBER_PARAM, FUNPARAM_FIXTURE};
