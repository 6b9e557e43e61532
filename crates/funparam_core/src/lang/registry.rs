//! Shareable metadata for `funparam_core::lang` registries.
//!
//! ## Notes
//! - These types are `Copy` so registries can live in `const` tables.

/// Metadata row of a vocabulary table: a stable `id`, the spellings accepted when parsing user input
/// (`canonical` first, then `aliases`), and a one-line `description` used in help output.
#[derive(Debug, Clone, Copy)]
pub struct LangItemInfo<Id> {
    pub id: Id,
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
}

impl<Id> LangItemInfo<Id> {
    /// Whether `name` is one of this item's spellings.
    pub fn accepts(&self, name: &str) -> bool {
        self.canonical == name || self.aliases.contains(&name)
    }
}
