use super::{bump_usage, decode_optional_time, decode_time, encode_time, sweep_stale};
use crate::domain::food::dedup_food_ids;
use crate::domain::{FoodId, SearchTermEntry};
use crate::entities::{prelude::*, search_terms};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, Set};

pub struct SearchTermRepository {
    conn: DatabaseConnection,
}

impl SearchTermRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Looks up a normalized term, recording the hit.
    pub async fn get(&self, term: &str, now: DateTime<Utc>) -> Result<Option<SearchTermEntry>> {
        let hit = bump_usage::<SearchTerms>(
            &self.conn,
            search_terms::Column::SearchTerm,
            term,
            search_terms::Column::UsageCount,
            search_terms::Column::LastUsed,
            now,
        )
        .await?;

        if !hit {
            return Ok(None);
        }

        self.peek(term).await
    }

    pub async fn peek(&self, term: &str) -> Result<Option<SearchTermEntry>> {
        SearchTerms::find_by_id(term)
            .one(&self.conn)
            .await?
            .map(model_to_entry)
            .transpose()
    }

    /// Stores a fresh result list, fully replacing any previous one.
    pub async fn put(&self, term: &str, food_ids: &[FoodId], now: DateTime<Utc>) -> Result<()> {
        let food_ids = dedup_food_ids(food_ids.iter().cloned());
        let stamp = encode_time(now);

        let active_model = search_terms::ActiveModel {
            search_term: Set(term.to_string()),
            food_ids_json: Set(serde_json::to_string(&food_ids)?),
            created_at: Set(stamp.clone()),
            updated_at: Set(stamp.clone()),
            last_used: Set(Some(stamp)),
            usage_count: Set(1),
        };

        SearchTerms::insert(active_model)
            .on_conflict(
                OnConflict::column(search_terms::Column::SearchTerm)
                    .update_columns([
                        search_terms::Column::FoodIdsJson,
                        search_terms::Column::UpdatedAt,
                        search_terms::Column::LastUsed,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn evict_stale(&self, cutoff: DateTime<Utc>, batch_size: u64) -> Result<u64> {
        sweep_stale::<SearchTerms>(
            &self.conn,
            search_terms::Column::SearchTerm,
            search_terms::Column::CreatedAt,
            cutoff,
            batch_size,
        )
        .await
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(SearchTerms::find().count(&self.conn).await?)
    }
}

fn model_to_entry(m: search_terms::Model) -> Result<SearchTermEntry> {
    Ok(SearchTermEntry {
        search_term: m.search_term,
        food_ids: serde_json::from_str(&m.food_ids_json)?,
        created_at: decode_time(&m.created_at)?,
        updated_at: decode_time(&m.updated_at)?,
        last_used: decode_optional_time(m.last_used.as_deref())?,
        usage_count: m.usage_count,
    })
}
