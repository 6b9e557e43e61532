//! Funparam vocabulary registries.
//!
//! Callers work with **stable ids** (e.g. `MarkId`) and look up spellings/metadata via
//! registry tables instead of comparing strings ad hoc.
//!
//! ## Examples
//! ```rust
//! use funparam_core::lang::marks::{self, MarkId};
//!
//! assert_eq!(marks::from_str("xfail"), Some(MarkId::XFail));
//! assert_eq!(marks::as_str(MarkId::Skip), "skip");
//! ```

pub mod fixtures;
pub mod marks;
pub mod registry;
