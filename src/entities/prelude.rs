pub use super::autocomplete_entries::Entity as AutocompleteEntries;
pub use super::food_entries::Entity as FoodEntries;
pub use super::search_terms::Entity as SearchTerms;
