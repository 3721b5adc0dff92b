mod autocomplete;
mod lookup;
mod search;
mod stats;
mod sweep;

pub use autocomplete::cmd_autocomplete;
pub use lookup::cmd_lookup;
pub use search::cmd_search;
pub use stats::cmd_stats;
pub use sweep::cmd_sweep;

use crate::services::{Origin, Resolved};

fn source_label<T>(resolved: &Resolved<T>) -> &'static str {
    match (resolved.origin, resolved.persisted) {
        (Origin::Cache, _) => "cache",
        (Origin::Provider, true) => "provider",
        (Origin::Provider, false) => "provider, not cached",
        (Origin::EmptyQuery, _) => "empty query",
    }
}
