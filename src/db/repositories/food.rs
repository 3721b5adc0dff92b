use super::{bump_usage, decode_optional_time, decode_time, encode_time, sweep_stale};
use crate::domain::{FoodDetail, FoodEntry, FoodFullDetail, FoodId, FoodSummary};
use crate::entities::{food_entries, prelude::*};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict, SimpleExpr};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use std::collections::HashMap;

/// Outcome of a full-detail lookup against the food cache.
#[derive(Debug, Clone, PartialEq)]
pub enum FoodLookup {
    Hydrated(FoodEntry),
    /// Present, but only with search-response data.
    Stub(FoodEntry),
    Missing,
}

impl FoodLookup {
    #[must_use]
    pub const fn needs_hydration(&self) -> bool {
        !matches!(self, Self::Hydrated(_))
    }
}

pub struct FoodRepository {
    conn: DatabaseConnection,
}

impl FoodRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns the entry and records the hit, or `None` on a miss.
    pub async fn get(&self, food_id: &FoodId, now: DateTime<Utc>) -> Result<Option<FoodEntry>> {
        let hit = bump_usage::<FoodEntries>(
            &self.conn,
            food_entries::Column::FoodId,
            food_id.as_str(),
            food_entries::Column::UsageCount,
            food_entries::Column::LastUsed,
            now,
        )
        .await?;

        if !hit {
            return Ok(None);
        }

        self.peek(food_id).await
    }

    /// Like [`Self::get`], but tells the caller whether the row still has to be
    /// hydrated from the provider.
    pub async fn get_full_detail(&self, food_id: &FoodId, now: DateTime<Utc>) -> Result<FoodLookup> {
        Ok(match self.get(food_id, now).await? {
            Some(entry) if entry.has_full_details() => FoodLookup::Hydrated(entry),
            Some(entry) => FoodLookup::Stub(entry),
            None => FoodLookup::Missing,
        })
    }

    /// Reads an entry without touching its usage metadata.
    pub async fn peek(&self, food_id: &FoodId) -> Result<Option<FoodEntry>> {
        FoodEntries::find_by_id(food_id.as_str())
            .one(&self.conn)
            .await?
            .map(model_to_entry)
            .transpose()
    }

    /// Fetches several entries at once, recording a hit on each one found.
    pub async fn get_many(
        &self,
        food_ids: &[FoodId],
        now: DateTime<Utc>,
    ) -> Result<HashMap<FoodId, FoodEntry>> {
        if food_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let keys: Vec<&str> = food_ids.iter().map(FoodId::as_str).collect();

        FoodEntries::update_many()
            .col_expr(
                food_entries::Column::UsageCount,
                Expr::col(food_entries::Column::UsageCount).add(1),
            )
            .col_expr(
                food_entries::Column::LastUsed,
                Expr::value(encode_time(now)),
            )
            .filter(food_entries::Column::FoodId.is_in(keys.clone()))
            .exec(&self.conn)
            .await?;

        let rows = FoodEntries::find()
            .filter(food_entries::Column::FoodId.is_in(keys))
            .all(&self.conn)
            .await?;

        rows.into_iter()
            .map(|row| model_to_entry(row).map(|entry| (entry.food_id.clone(), entry)))
            .collect()
    }

    /// Inserts a stub from search data, or refreshes the summary columns of an
    /// existing row.
    ///
    /// Nutrients, measures and qualifiers of a hydrated row are kept, and the
    /// detail flag is never written on conflict.
    pub async fn upsert_stub(&self, summary: &FoodSummary, now: DateTime<Utc>) -> Result<()> {
        let stamp = encode_time(now);

        let active_model = food_entries::ActiveModel {
            food_id: Set(summary.food_id.as_str().to_string()),
            name: Set(summary.name.clone()),
            known_as: Set(summary.known_as.clone()),
            category: Set(summary.category.clone()),
            category_label: Set(summary.category_label.clone()),
            brand: Set(summary.brand.clone()),
            image_url: Set(summary.image_url.clone()),
            upc: Set(summary.upc.clone()),
            food_contents_label: Set(summary.food_contents_label.clone()),
            nutrients_json: Set(serde_json::to_string(&summary.nutrients)?),
            measures_json: Set(serde_json::to_string(&summary.measures)?),
            serving_sizes_json: Set(serde_json::to_string(&summary.serving_sizes)?),
            health_labels_json: Set("[]".to_string()),
            diet_labels_json: Set("[]".to_string()),
            qualifiers_json: Set(serde_json::to_string(&summary.qualifiers())?),
            full_details: Set(None),
            has_full_details: Set(false),
            last_api_update: Set(stamp.clone()),
            created_at: Set(stamp.clone()),
            updated_at: Set(stamp),
            last_used: Set(None),
            usage_count: Set(1),
        };

        FoodEntries::insert(active_model)
            .on_conflict(
                OnConflict::column(food_entries::Column::FoodId)
                    .update_columns([
                        food_entries::Column::Name,
                        food_entries::Column::KnownAs,
                        food_entries::Column::Category,
                        food_entries::Column::CategoryLabel,
                        food_entries::Column::Brand,
                        food_entries::Column::ImageUrl,
                        food_entries::Column::Upc,
                        food_entries::Column::FoodContentsLabel,
                        food_entries::Column::ServingSizesJson,
                        food_entries::Column::LastApiUpdate,
                        food_entries::Column::UpdatedAt,
                    ])
                    .value(
                        food_entries::Column::NutrientsJson,
                        keep_when_hydrated("nutrients_json"),
                    )
                    .value(
                        food_entries::Column::MeasuresJson,
                        keep_when_hydrated("measures_json"),
                    )
                    .value(
                        food_entries::Column::QualifiersJson,
                        keep_when_hydrated("qualifiers_json"),
                    )
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    /// Inserts or promotes a row to full detail.
    ///
    /// Summary columns of an existing row are left alone. Measures are only
    /// replaced when the detail response carried any.
    pub async fn upsert_full_detail(
        &self,
        detail: &FoodFullDetail,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let stamp = encode_time(now);
        let name = detail
            .label
            .clone()
            .unwrap_or_else(|| detail.food_id.to_string());

        let active_model = food_entries::ActiveModel {
            food_id: Set(detail.food_id.as_str().to_string()),
            name: Set(name),
            known_as: Set(None),
            category: Set(None),
            category_label: Set(None),
            brand: Set(None),
            image_url: Set(None),
            upc: Set(None),
            food_contents_label: Set(None),
            nutrients_json: Set(serde_json::to_string(&detail.nutrients)?),
            measures_json: Set(serde_json::to_string(&detail.measures)?),
            serving_sizes_json: Set("[]".to_string()),
            health_labels_json: Set(serde_json::to_string(&detail.health_labels)?),
            diet_labels_json: Set(serde_json::to_string(&detail.diet_labels)?),
            qualifiers_json: Set(serde_json::to_string(&detail.qualifiers())?),
            full_details: Set(Some(serde_json::to_string(&detail.payload)?)),
            has_full_details: Set(true),
            last_api_update: Set(stamp.clone()),
            created_at: Set(stamp.clone()),
            updated_at: Set(stamp.clone()),
            last_used: Set(Some(stamp)),
            usage_count: Set(1),
        };

        FoodEntries::insert(active_model)
            .on_conflict(
                OnConflict::column(food_entries::Column::FoodId)
                    .update_columns([
                        food_entries::Column::NutrientsJson,
                        food_entries::Column::HealthLabelsJson,
                        food_entries::Column::DietLabelsJson,
                        food_entries::Column::FullDetails,
                        food_entries::Column::HasFullDetails,
                        food_entries::Column::LastApiUpdate,
                        food_entries::Column::UpdatedAt,
                    ])
                    .value(
                        food_entries::Column::MeasuresJson,
                        keep_when_no_measures("measures_json"),
                    )
                    .value(
                        food_entries::Column::QualifiersJson,
                        keep_when_no_measures("qualifiers_json"),
                    )
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    /// Removes rows not used since `cutoff`; never-used rows age from insertion.
    pub async fn evict_stale(&self, cutoff: DateTime<Utc>, batch_size: u64) -> Result<u64> {
        sweep_stale::<FoodEntries>(
            &self.conn,
            food_entries::Column::FoodId,
            food_entries::Column::CreatedAt,
            cutoff,
            batch_size,
        )
        .await
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(FoodEntries::find().count(&self.conn).await?)
    }

    pub async fn count_hydrated(&self) -> Result<u64> {
        Ok(FoodEntries::find()
            .filter(food_entries::Column::HasFullDetails.eq(true))
            .count(&self.conn)
            .await?)
    }
}

fn keep_when_hydrated(column: &str) -> SimpleExpr {
    Expr::cust(format!(
        r#"CASE WHEN "food_entries"."has_full_details" THEN "food_entries"."{column}" ELSE "excluded"."{column}" END"#
    ))
}

fn keep_when_no_measures(column: &str) -> SimpleExpr {
    Expr::cust(format!(
        r#"CASE WHEN "excluded"."measures_json" = '[]' THEN "food_entries"."{column}" ELSE "excluded"."{column}" END"#
    ))
}

fn model_to_entry(m: food_entries::Model) -> Result<FoodEntry> {
    // A flagged row without a payload is served as a stub so it gets re-hydrated.
    let detail = match (m.has_full_details, m.full_details.as_deref()) {
        (true, Some(raw)) => FoodDetail::Hydrated {
            payload: serde_json::from_str(raw)?,
        },
        _ => FoodDetail::Stub,
    };

    Ok(FoodEntry {
        food_id: FoodId::new(m.food_id),
        name: m.name,
        known_as: m.known_as,
        category: m.category,
        category_label: m.category_label,
        brand: m.brand,
        image_url: m.image_url,
        upc: m.upc,
        food_contents_label: m.food_contents_label,
        nutrients: serde_json::from_str(&m.nutrients_json)?,
        measures: serde_json::from_str(&m.measures_json)?,
        serving_sizes: serde_json::from_str(&m.serving_sizes_json)?,
        health_labels: serde_json::from_str(&m.health_labels_json)?,
        diet_labels: serde_json::from_str(&m.diet_labels_json)?,
        qualifiers: serde_json::from_str(&m.qualifiers_json)?,
        detail,
        last_api_update: decode_time(&m.last_api_update)?,
        created_at: decode_time(&m.created_at)?,
        updated_at: decode_time(&m.updated_at)?,
        last_used: decode_optional_time(m.last_used.as_deref())?,
        usage_count: m.usage_count,
    })
}
