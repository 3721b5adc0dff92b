//! Store-backed implementation of [`FoodService`].
//!
//! The coordinator is the only component that talks to the provider. It
//! decides whether an upstream call is needed (true misses only), persists
//! what comes back, and keeps usage metadata current on every hit.

use crate::clients::{FoodProvider, ProviderError};
use crate::db::{CacheStats, FoodLookup, Store};
use crate::domain::food::dedup_food_ids;
use crate::domain::{CacheKind, FoodEntry, FoodId, normalize_query};
use crate::services::food_service::{FoodService, LookupError, Origin, Resolved};
use crate::services::retention::{RetentionPolicy, SweepReport};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Read-through-write-back coordinator over the three caches.
///
/// Concurrent misses on the same key may each reach the provider; the last
/// write wins and every write is a complete row.
pub struct CacheCoordinator {
    store: Store,
    provider: Arc<dyn FoodProvider>,
    retention: RetentionPolicy,
}

impl CacheCoordinator {
    #[must_use]
    pub fn new(store: Store, provider: Arc<dyn FoodProvider>, retention: RetentionPolicy) -> Self {
        Self {
            store,
            provider,
            retention,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub const fn retention(&self) -> &RetentionPolicy {
        &self.retention
    }

    async fn call_provider<T, F>(&self, endpoint: &'static str, call: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        let start = Instant::now();
        let result = call.await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(ProviderError::NotFound(_)) => "not_found",
            Err(ProviderError::RateLimited { .. }) => "rate_limited",
            Err(ProviderError::Unavailable(_)) => "unavailable",
        };

        metrics::counter!(
            "foodcache_provider_calls_total",
            "endpoint" => endpoint,
            "outcome" => outcome
        )
        .increment(1);

        debug!(
            endpoint,
            outcome,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Provider call finished"
        );

        result
    }

    /// Fetches full detail, persists it and returns the resulting entry.
    async fn hydrate(
        &self,
        food_id: &FoodId,
        stub: Option<FoodEntry>,
        now: DateTime<Utc>,
    ) -> Result<Resolved<FoodEntry>, LookupError> {
        let detail = self
            .call_provider("detail", self.provider.fetch_detail(food_id))
            .await?;

        let persisted = record_write(
            "upsert_food_full_detail",
            self.store.upsert_food_full_detail(&detail, now).await,
        );

        if persisted {
            match self.store.peek_food(food_id).await {
                Ok(Some(entry)) => return Ok(Resolved::fetched(entry, true)),
                Ok(None) => {}
                Err(e) => record_store_error("peek_food", &e),
            }
        }

        Ok(Resolved::fetched(
            FoodEntry::with_full_detail(stub, detail, now),
            persisted,
        ))
    }
}

#[async_trait::async_trait]
impl FoodService for CacheCoordinator {
    async fn lookup_food(
        &self,
        food_id: &FoodId,
        want_full_detail: bool,
    ) -> Result<Resolved<FoodEntry>, LookupError> {
        let now = Utc::now();

        let lookup = self
            .store
            .get_food_full_detail(food_id, now)
            .await
            .unwrap_or_else(|e| {
                record_store_error("get_food", &e);
                FoodLookup::Missing
            });

        let stub = match lookup {
            FoodLookup::Hydrated(entry) => {
                record_hit(CacheKind::Food);
                return Ok(Resolved::cached(entry));
            }
            FoodLookup::Stub(entry) if !want_full_detail => {
                record_hit(CacheKind::Food);
                return Ok(Resolved::cached(entry));
            }
            FoodLookup::Stub(entry) => {
                debug!(food_id = %food_id, "Cached food is a stub, hydrating");
                Some(entry)
            }
            FoodLookup::Missing => None,
        };

        record_miss(CacheKind::Food);
        self.hydrate(food_id, stub, now).await
    }

    async fn search_foods(&self, query: &str) -> Result<Resolved<Vec<FoodId>>, LookupError> {
        let term = normalize_query(query);
        if term.is_empty() {
            return Ok(Resolved::empty_query());
        }

        let now = Utc::now();

        match self.store.get_search_term(&term, now).await {
            Ok(Some(entry)) => {
                record_hit(CacheKind::Search);
                return Ok(Resolved::cached(entry.food_ids));
            }
            Ok(None) => {}
            Err(e) => record_store_error("get_search_term", &e),
        }

        record_miss(CacheKind::Search);

        let summaries = match self
            .call_provider("search", self.provider.search_by_text(&term))
            .await
        {
            Ok(summaries) => summaries,
            Err(ProviderError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let food_ids = dedup_food_ids(summaries.iter().map(|s| s.food_id.clone()));

        if food_ids.is_empty() {
            debug!(term = %term, "Search returned no foods, not caching");
            return Ok(Resolved::fetched(food_ids, false));
        }

        let stub_writes = futures::future::join_all(
            summaries
                .iter()
                .map(|summary| self.store.upsert_food_stub(summary, now)),
        )
        .await;

        let mut persisted = true;
        for result in stub_writes {
            persisted &= record_write("upsert_food_stub", result);
        }

        persisted &= record_write(
            "put_search_term",
            self.store.put_search_term(&term, &food_ids, now).await,
        );

        info!(term = %term, results = food_ids.len(), persisted, "Cached provider search");

        Ok(Resolved::fetched(food_ids, persisted))
    }

    async fn search_food_entries(
        &self,
        query: &str,
    ) -> Result<Resolved<Vec<FoodEntry>>, LookupError> {
        let ids = self.search_foods(query).await?;
        if ids.value.is_empty() {
            return Ok(ids.map(|_| Vec::new()));
        }

        let mut cached = self
            .store
            .get_foods(&ids.value, Utc::now())
            .await
            .unwrap_or_else(|e| {
                record_store_error("get_foods", &e);
                std::collections::HashMap::new()
            });

        let mut origin = ids.origin;
        let mut persisted = ids.persisted;
        let mut entries = Vec::with_capacity(ids.value.len());

        for food_id in &ids.value {
            if let Some(entry) = cached.remove(food_id) {
                entries.push(entry);
                continue;
            }

            // Evicted after the search row was cached.
            match self.lookup_food(food_id, false).await {
                Ok(resolved) => {
                    if resolved.origin == Origin::Provider {
                        origin = Origin::Provider;
                    }
                    persisted &= resolved.persisted;
                    entries.push(resolved.value);
                }
                Err(LookupError::NotFound(_)) => {
                    warn!(food_id = %food_id, "Search result no longer known upstream, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Resolved {
            value: entries,
            origin,
            persisted,
        })
    }

    async fn autocomplete(&self, prefix: &str) -> Result<Resolved<Vec<String>>, LookupError> {
        let query = normalize_query(prefix);
        if query.is_empty() {
            return Ok(Resolved::empty_query());
        }

        let now = Utc::now();

        match self.store.get_autocomplete(&query, now).await {
            Ok(Some(entry)) => {
                record_hit(CacheKind::Autocomplete);
                return Ok(Resolved::cached(entry.suggestions));
            }
            Ok(None) => {}
            Err(e) => record_store_error("get_autocomplete", &e),
        }

        record_miss(CacheKind::Autocomplete);

        let suggestions = match self
            .call_provider(
                "autocomplete",
                self.provider.autocomplete_suggestions(&query),
            )
            .await
        {
            Ok(suggestions) => suggestions,
            Err(ProviderError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        if suggestions.is_empty() {
            return Ok(Resolved::fetched(suggestions, false));
        }

        let persisted = record_write(
            "put_autocomplete",
            self.store.put_autocomplete(&query, &suggestions, now).await,
        );

        Ok(Resolved::fetched(suggestions, persisted))
    }

    async fn evict_stale(&self, now: DateTime<Utc>) -> Result<SweepReport, LookupError> {
        let batch = self.retention.batch_size;
        let store_err = |e: anyhow::Error| LookupError::Store(e.to_string());

        let report = SweepReport {
            food_entries: self
                .store
                .evict_stale_foods(self.retention.cutoff(CacheKind::Food, now), batch)
                .await
                .map_err(store_err)?,
            search_terms: self
                .store
                .evict_stale_search_terms(self.retention.cutoff(CacheKind::Search, now), batch)
                .await
                .map_err(store_err)?,
            autocomplete_entries: self
                .store
                .evict_stale_autocomplete(
                    self.retention.cutoff(CacheKind::Autocomplete, now),
                    batch,
                )
                .await
                .map_err(store_err)?,
        };

        for (kind, removed) in [
            (CacheKind::Food, report.food_entries),
            (CacheKind::Search, report.search_terms),
            (CacheKind::Autocomplete, report.autocomplete_entries),
        ] {
            metrics::counter!("foodcache_evicted_rows_total", "cache" => kind.as_str())
                .increment(removed);
        }

        info!(
            event = "sweep_finished",
            food_entries = report.food_entries,
            search_terms = report.search_terms,
            autocomplete_entries = report.autocomplete_entries,
            "Evicted stale cache rows"
        );

        Ok(report)
    }

    async fn stats(&self) -> Result<CacheStats, LookupError> {
        self.store
            .stats()
            .await
            .map_err(|e| LookupError::Store(e.to_string()))
    }
}

fn record_hit(kind: CacheKind) {
    metrics::counter!("foodcache_cache_hits_total", "cache" => kind.as_str()).increment(1);
}

fn record_miss(kind: CacheKind) {
    metrics::counter!("foodcache_cache_misses_total", "cache" => kind.as_str()).increment(1);
}

fn record_store_error(op: &'static str, err: &anyhow::Error) {
    metrics::counter!("foodcache_store_errors_total", "op" => op).increment(1);
    warn!(op, error = %err, "Store operation failed, continuing without cache");
}

/// Logs a failed best-effort write and reports whether it succeeded.
fn record_write(op: &'static str, result: anyhow::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            record_store_error(op, &e);
            false
        }
    }
}
