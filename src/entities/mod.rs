pub mod prelude;

pub mod autocomplete_entries;
pub mod food_entries;
pub mod search_terms;
