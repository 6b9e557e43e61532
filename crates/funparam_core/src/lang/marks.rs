//! Mark vocabulary registry.
//!
//! Marks are execution tags attached to a single generated case (via the call-scoped
//! `marks` option) or to a whole test.

use super::registry::LangItemInfo;

/// Stable identifier for supported marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkId {
    Skip,
    XFail,
    Slow,
}

/// Metadata entry for a mark.
pub type MarkInfo = LangItemInfo<MarkId>;

/// Registry of supported marks.
pub const MARKS: &[MarkInfo] = &[
    info(MarkId::Skip, "skip", &[], "Do not run the case; report it as skipped."),
    info(
        MarkId::XFail,
        "xfail",
        &["expected_failure"],
        "Run the case and expect it to fail.",
    ),
    info(MarkId::Slow, "slow", &[], "Only run the case when slow tests are included."),
];

/// Resolve a mark name typed by a user (`-m xfail`, `-m expected_failure`) to its stable id.
pub fn from_str(name: &str) -> Option<MarkId> {
    MARKS.iter().find(|m| m.accepts(name)).map(|m| m.id)
}

/// Canonical spellings, for error messages listing what is accepted.
pub fn canonical_names() -> impl Iterator<Item = &'static str> {
    MARKS.iter().map(|m| m.canonical)
}

/// Return the canonical spelling for a mark.
pub fn as_str(id: MarkId) -> &'static str {
    info_for(id).canonical
}

/// Return the metadata entry for a mark.
pub fn info_for(id: MarkId) -> &'static MarkInfo {
    match id {
        MarkId::Skip => &MARKS[0],
        MarkId::XFail => &MARKS[1],
        MarkId::Slow => &MARKS[2],
    }
}

const fn info(
    id: MarkId,
    canonical: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
) -> MarkInfo {
    LangItemInfo {
        id,
        canonical,
        aliases,
        description,
    }
}
