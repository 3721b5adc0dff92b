use super::{bump_usage, decode_optional_time, decode_time, encode_time, sweep_stale};
use crate::domain::AutocompleteEntry;
use crate::entities::{autocomplete_entries, prelude::*};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, Set};

pub struct AutocompleteRepository {
    conn: DatabaseConnection,
}

impl AutocompleteRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, query: &str, now: DateTime<Utc>) -> Result<Option<AutocompleteEntry>> {
        let hit = bump_usage::<AutocompleteEntries>(
            &self.conn,
            autocomplete_entries::Column::Query,
            query,
            autocomplete_entries::Column::UsageCount,
            autocomplete_entries::Column::LastUsed,
            now,
        )
        .await?;

        if !hit {
            return Ok(None);
        }

        self.peek(query).await
    }

    pub async fn peek(&self, query: &str) -> Result<Option<AutocompleteEntry>> {
        AutocompleteEntries::find_by_id(query)
            .one(&self.conn)
            .await?
            .map(model_to_entry)
            .transpose()
    }

    pub async fn put(&self, query: &str, suggestions: &[String], now: DateTime<Utc>) -> Result<()> {
        let stamp = encode_time(now);

        let active_model = autocomplete_entries::ActiveModel {
            query: Set(query.to_string()),
            suggestions_json: Set(serde_json::to_string(suggestions)?),
            created_at: Set(stamp.clone()),
            last_used: Set(Some(stamp)),
            usage_count: Set(1),
        };

        AutocompleteEntries::insert(active_model)
            .on_conflict(
                OnConflict::column(autocomplete_entries::Column::Query)
                    .update_columns([
                        autocomplete_entries::Column::SuggestionsJson,
                        autocomplete_entries::Column::LastUsed,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn evict_stale(&self, cutoff: DateTime<Utc>, batch_size: u64) -> Result<u64> {
        sweep_stale::<AutocompleteEntries>(
            &self.conn,
            autocomplete_entries::Column::Query,
            autocomplete_entries::Column::CreatedAt,
            cutoff,
            batch_size,
        )
        .await
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(AutocompleteEntries::find().count(&self.conn).await?)
    }
}

fn model_to_entry(m: autocomplete_entries::Model) -> Result<AutocompleteEntry> {
    Ok(AutocompleteEntry {
        query: m.query,
        suggestions: serde_json::from_str(&m.suggestions_json)?,
        created_at: decode_time(&m.created_at)?,
        last_used: decode_optional_time(m.last_used.as_deref())?,
        usage_count: m.usage_count,
    })
}
