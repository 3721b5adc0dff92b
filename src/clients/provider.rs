//! Seam between the cache and the upstream food database.

use crate::domain::{FoodFullDetail, FoodId, FoodSummary};
use std::time::Duration;
use thiserror::Error;

/// Failure kinds reported by a [`FoodProvider`].
///
/// None of these are cached; the coordinator only decides whether to call the
/// provider at all.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network failure, timeout, 5xx or an unreadable response.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Provider rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },

    /// The provider confirmed it has no data for the id or query.
    #[error("Provider has no data for: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Unavailable(format!("request timed out: {err}"))
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}

/// Upstream food/nutrition API as seen by the cache.
///
/// Calls are idempotent reads. Implementations own any retry policy; the
/// cache never retries.
#[async_trait::async_trait]
pub trait FoodProvider: Send + Sync {
    /// Free-text food search, in provider ranking order.
    async fn search_by_text(&self, text: &str) -> Result<Vec<FoodSummary>, ProviderError>;

    /// Full nutrient detail for one food.
    async fn fetch_detail(&self, food_id: &FoodId) -> Result<FoodFullDetail, ProviderError>;

    /// Ranked completion strings for a partial query.
    async fn autocomplete_suggestions(&self, prefix: &str)
    -> Result<Vec<String>, ProviderError>;
}
