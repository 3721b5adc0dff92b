pub mod autocomplete;
pub mod food;
pub mod search_term;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Timestamps are stored as fixed-width UTC strings so that string comparison
/// in SQL matches chronological order.
pub(crate) fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_time(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid stored timestamp: {raw}"))?;
    Ok(parsed.with_timezone(&Utc))
}

pub(crate) fn decode_optional_time(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    raw.map(decode_time).transpose()
}

/// Rows whose last access (or insertion, if never accessed) is before `cutoff`.
fn stale_before(cutoff: &str) -> SimpleExpr {
    Expr::cust_with_values("COALESCE(last_used, created_at) < ?", [cutoff.to_string()])
}

/// Bumps `usage_count` and `last_used` for one row in a single statement.
///
/// Returns `false` when no row has that key.
pub(crate) async fn bump_usage<E>(
    conn: &DatabaseConnection,
    key_column: E::Column,
    key: &str,
    usage_column: E::Column,
    last_used_column: E::Column,
    now: DateTime<Utc>,
) -> Result<bool>
where
    E: EntityTrait,
{
    let result = E::update_many()
        .col_expr(usage_column, Expr::col(usage_column).add(1))
        .col_expr(last_used_column, Expr::value(encode_time(now)))
        .filter(key_column.eq(key))
        .exec(conn)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Deletes stale rows in batches, oldest first.
///
/// Candidates are ordered by effective recency and then by insertion time.
/// The delete re-applies the staleness predicate, so a row that was touched
/// after being selected is left in place.
pub(crate) async fn sweep_stale<E>(
    conn: &DatabaseConnection,
    key_column: E::Column,
    created_column: E::Column,
    cutoff: DateTime<Utc>,
    batch_size: u64,
) -> Result<u64>
where
    E: EntityTrait,
{
    let cutoff = encode_time(cutoff);
    let batch_size = batch_size.max(1);
    let mut removed = 0;

    loop {
        let keys: Vec<String> = E::find()
            .select_only()
            .column(key_column)
            .filter(stale_before(&cutoff))
            .order_by_asc(Expr::cust("COALESCE(last_used, created_at)"))
            .order_by_asc(created_column)
            .limit(batch_size)
            .into_tuple()
            .all(conn)
            .await?;

        if keys.is_empty() {
            break;
        }

        let selected = keys.len() as u64;

        let result = E::delete_many()
            .filter(key_column.is_in(keys))
            .filter(stale_before(&cutoff))
            .exec(conn)
            .await?;

        removed += result.rows_affected;

        if selected < batch_size {
            break;
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn encoded_times_sort_chronologically() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let whole = encode_time(base);
        let fractional = encode_time(base + Duration::milliseconds(500));
        let later = encode_time(base + Duration::seconds(1));

        assert!(whole < fractional);
        assert!(fractional < later);
        assert_eq!(whole.len(), later.len());
    }

    #[test]
    fn time_roundtrip_keeps_microseconds() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap() + Duration::microseconds(42);
        assert_eq!(decode_time(&encode_time(at)).unwrap(), at);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_time("yesterday").is_err());
        assert!(decode_optional_time(None).unwrap().is_none());
    }
}
