use crate::config::CacheConfig;
use crate::domain::CacheKind;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Per-cache recency windows for the eviction sweep.
///
/// Usage counts never protect a row; only the last access time matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub food: Duration,
    pub search: Duration,
    pub autocomplete: Duration,
    pub batch_size: u64,
}

impl RetentionPolicy {
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            food: config.food_retention(),
            search: config.search_retention(),
            autocomplete: config.autocomplete_retention(),
            batch_size: config.sweep_batch_size,
        }
    }

    #[must_use]
    pub const fn window(&self, kind: CacheKind) -> Duration {
        match kind {
            CacheKind::Food => self.food,
            CacheKind::Search => self.search,
            CacheKind::Autocomplete => self.autocomplete,
        }
    }

    /// Rows last used (or created, if never used) before this instant are stale.
    #[must_use]
    pub fn cutoff(&self, kind: CacheKind, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window(kind))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

/// Rows removed by one sweep, per cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SweepReport {
    pub food_entries: u64,
    pub search_terms: u64,
    pub autocomplete_entries: u64,
}

impl SweepReport {
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.food_entries + self.search_terms + self.autocomplete_entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn cutoffs_follow_configured_windows() {
        let policy = RetentionPolicy::default();
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();

        assert_eq!(
            policy.cutoff(CacheKind::Food, now),
            Utc.with_ymd_and_hms(2026, 7, 21, 12, 0, 0).unwrap()
        );
        assert_eq!(
            policy.cutoff(CacheKind::Search, now),
            Utc.with_ymd_and_hms(2026, 10, 12, 12, 0, 0).unwrap()
        );
        assert_eq!(
            policy.cutoff(CacheKind::Autocomplete, now),
            Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn report_total() {
        let report = SweepReport {
            food_entries: 3,
            search_terms: 2,
            autocomplete_entries: 10,
        };
        assert_eq!(report.total(), 15);
    }
}
