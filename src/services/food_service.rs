//! Entry point the API layer uses to resolve food queries.
//!
//! Every operation is read-through-write-back: a cache hit never reaches the
//! provider, and a miss is persisted before it is returned, so an identical
//! follow-up request is served from the cache.

use crate::clients::ProviderError;
use crate::db::CacheStats;
use crate::domain::{FoodEntry, FoodId};
use crate::services::retention::SweepReport;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to callers of [`FoodService`].
///
/// Cache misses are not errors. Store failures on the request path degrade to
/// misses (reads) or to `persisted == false` (writes) and only show up here
/// for maintenance operations.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Food not found: {0}")]
    NotFound(FoodId),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Provider rate limited")]
    ProviderRateLimited { retry_after: Option<Duration> },

    #[error("Store error: {0}")]
    Store(String),
}

impl From<ProviderError> for LookupError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable(msg) => Self::ProviderUnavailable(msg),
            ProviderError::RateLimited { retry_after } => Self::ProviderRateLimited { retry_after },
            ProviderError::NotFound(id) => Self::NotFound(FoodId::new(id)),
        }
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Provider,
    /// The query normalized to nothing; neither cache nor provider was asked.
    EmptyQuery,
}

/// A value returned by the coordinator, with provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub origin: Origin,
    /// `false` when fresh provider data could not be written to the store.
    pub persisted: bool,
}

impl<T> Resolved<T> {
    #[must_use]
    pub const fn cached(value: T) -> Self {
        Self {
            value,
            origin: Origin::Cache,
            persisted: true,
        }
    }

    #[must_use]
    pub const fn fetched(value: T, persisted: bool) -> Self {
        Self {
            value,
            origin: Origin::Provider,
            persisted,
        }
    }

    #[must_use]
    pub const fn is_hit(&self) -> bool {
        matches!(self.origin, Origin::Cache)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        Resolved {
            value: f(self.value),
            origin: self.origin,
            persisted: self.persisted,
        }
    }
}

impl<T: Default> Resolved<T> {
    #[must_use]
    pub fn empty_query() -> Self {
        Self {
            value: T::default(),
            origin: Origin::EmptyQuery,
            persisted: true,
        }
    }
}

/// Cache coordinator operations.
///
/// # Examples
///
/// ```rust,ignore
/// use foodcache::services::{FoodService, LookupError};
/// use foodcache::domain::FoodId;
/// use std::sync::Arc;
///
/// async fn example(service: Arc<dyn FoodService>) -> Result<(), LookupError> {
///     let ids = service.search_foods("chicken breast").await?;
///     if let Some(first) = ids.value.first() {
///         let _food = service.lookup_food(first, true).await?;
///     }
///     Ok(())
/// }
/// ```
#[async_trait::async_trait]
pub trait FoodService: Send + Sync {
    /// Resolves one food, hydrating it from the provider when full detail is
    /// requested and only a stub is cached.
    ///
    /// # Errors
    ///
    /// - Returns [`LookupError::NotFound`] if the provider has no such food
    /// - Returns [`LookupError::ProviderUnavailable`] or
    ///   [`LookupError::ProviderRateLimited`] when a needed provider call fails
    async fn lookup_food(
        &self,
        food_id: &FoodId,
        want_full_detail: bool,
    ) -> Result<Resolved<FoodEntry>, LookupError>;

    /// Returns food ids matching `query`, in provider ranking order.
    ///
    /// A miss also seeds stub food entries for every result.
    ///
    /// # Errors
    ///
    /// Returns a provider error when the term is not cached and the provider
    /// call fails.
    async fn search_foods(&self, query: &str) -> Result<Resolved<Vec<FoodId>>, LookupError>;

    /// Like [`FoodService::search_foods`], joined to the cached food entries.
    ///
    /// Ids whose entry was evicted fall through to a per-id lookup; ids the
    /// provider no longer knows are skipped.
    ///
    /// # Errors
    ///
    /// Returns a provider error when the search or a fall-through lookup fails.
    async fn search_food_entries(
        &self,
        query: &str,
    ) -> Result<Resolved<Vec<FoodEntry>>, LookupError>;

    /// Ranked suggestions for a partial query.
    ///
    /// # Errors
    ///
    /// Returns a provider error when the prefix is not cached and the provider
    /// call fails.
    async fn autocomplete(&self, prefix: &str) -> Result<Resolved<Vec<String>>, LookupError>;

    /// Runs the recency sweep on all three caches. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Store`] if a delete fails.
    async fn evict_stale(&self, now: DateTime<Utc>) -> Result<SweepReport, LookupError>;

    /// # Errors
    ///
    /// Returns [`LookupError::Store`] on connection failures.
    async fn stats(&self) -> Result<CacheStats, LookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_convert() {
        let err: LookupError = ProviderError::NotFound("ZZZ".to_string()).into();
        assert!(matches!(err, LookupError::NotFound(ref id) if id.as_str() == "ZZZ"));

        let err: LookupError = ProviderError::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        }
        .into();
        assert!(matches!(
            err,
            LookupError::ProviderRateLimited { retry_after: Some(d) } if d.as_secs() == 30
        ));

        let err: LookupError = ProviderError::Unavailable("timeout".to_string()).into();
        assert_eq!(err.to_string(), "Provider unavailable: timeout");
    }

    #[test]
    fn resolved_provenance() {
        let hit = Resolved::cached(vec![1, 2]);
        assert!(hit.is_hit());
        assert!(hit.persisted);

        let miss = Resolved::fetched("x", false).map(str::len);
        assert!(!miss.is_hit());
        assert!(!miss.persisted);
        assert_eq!(miss.value, 1);

        let empty: Resolved<Vec<String>> = Resolved::empty_query();
        assert_eq!(empty.origin, Origin::EmptyQuery);
        assert!(empty.value.is_empty());
    }
}
