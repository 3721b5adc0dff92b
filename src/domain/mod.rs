//! Domain types for the nutrition lookup cache.
//!
//! Identifiers are wrapped in newtypes so provider food ids never get mixed up
//! with free-text search terms, and every cache key goes through
//! [`normalize_query`] before it touches the store.

pub mod food;

pub use food::{
    AutocompleteEntry, FoodDetail, FoodEntry, FoodFullDetail, FoodSummary, Measure,
    SearchTermEntry, ServingSize,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque food identifier issued by the upstream provider.
///
/// The value is stored verbatim; it is never normalized or case-folded.
///
/// # Examples
///
/// ```rust
/// use foodcache::domain::FoodId;
///
/// let id = FoodId::new("food_a1gb9ubb72c7snbuxr3weagwv0dd");
/// assert_eq!(id.as_str(), "food_a1gb9ubb72c7snbuxr3weagwv0dd");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoodId(String);

impl FoodId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for FoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FoodId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for FoodId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for FoodId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonical cache key for search phrases and autocomplete prefixes.
///
/// Lowercases, collapses every run of whitespace to a single space and trims
/// both ends. Reads and writes must both go through this function.
#[must_use]
pub fn normalize_query(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Which of the three caches an operation touched. Used as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Food,
    Search,
    Autocomplete,
}

impl CacheKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Search => "search",
            Self::Autocomplete => "autocomplete",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_and_whitespace() {
        assert_eq!(normalize_query("  Chicken   Breast "), "chicken breast");
        assert_eq!(normalize_query("chicken breast"), "chicken breast");
        assert_eq!(normalize_query("CHICKEN\tBREAST\n"), "chicken breast");
    }

    #[test]
    fn normalize_empty_and_blank() {
        assert_eq!(normalize_query(""), "");
        assert_eq!(normalize_query("   \t "), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_query("  Greek  YOGURT plain ");
        assert_eq!(normalize_query(&once), once);
    }

    #[test]
    fn food_id_is_not_normalized() {
        let id = FoodId::new("Food_ABC");
        assert_eq!(id.to_string(), "Food_ABC");
        assert_ne!(id, FoodId::from("food_abc"));
    }

    #[test]
    fn food_id_serializes_transparently() {
        let id = FoodId::new("food_1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"food_1\"");
        let back: FoodId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn cache_kind_labels() {
        assert_eq!(CacheKind::Food.to_string(), "food");
        assert_eq!(CacheKind::Search.as_str(), "search");
        assert_eq!(CacheKind::Autocomplete.as_str(), "autocomplete");
    }
}
