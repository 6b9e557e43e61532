//! Execution tags attached to generated cases or whole tests.

use std::fmt;
use std::str::FromStr;

use funparam_core::lang::marks::{self, MarkId};

use crate::errors::FunparamError;

/// A mark applied to a test item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mark {
    Skip(String),
    XFail(String),
    Slow,
}

impl Mark {
    /// Skip the case with a reason.
    pub fn skip(reason: impl Into<String>) -> Self {
        Mark::Skip(reason.into())
    }

    /// Expect the case to fail.
    pub fn xfail(reason: impl Into<String>) -> Self {
        Mark::XFail(reason.into())
    }

    pub fn id(&self) -> MarkId {
        match self {
            Mark::Skip(_) => MarkId::Skip,
            Mark::XFail(_) => MarkId::XFail,
            Mark::Slow => MarkId::Slow,
        }
    }

    /// Canonical mark name (`skip`, `xfail`, `slow`).
    pub fn name(&self) -> &'static str {
        marks::as_str(self.id())
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Mark::Skip(reason) | Mark::XFail(reason) => Some(reason),
            Mark::Slow => None,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) if !reason.is_empty() => write!(f, "{}({:?})", self.name(), reason),
            _ => f.write_str(self.name()),
        }
    }
}

/// Mark-based selection, parsed from `NAME` or `not NAME`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkFilter {
    pub mark: MarkId,
    pub negated: bool,
}

impl MarkFilter {
    pub fn matches(&self, marks: &[Mark]) -> bool {
        marks.iter().any(|m| m.id() == self.mark) != self.negated
    }
}

impl FromStr for MarkFilter {
    type Err = FunparamError;

    fn from_str(expr: &str) -> Result<Self, Self::Err> {
        let expr = expr.trim();
        let (negated, name) = match expr.strip_prefix("not ") {
            Some(rest) => (true, rest.trim()),
            None => (false, expr),
        };
        let mark = marks::from_str(name).ok_or_else(|| FunparamError::UnknownMark {
            name: name.to_string(),
            known: marks::canonical_names().collect::<Vec<_>>().join(", "),
        })?;
        Ok(MarkFilter { mark, negated })
    }
}
