use crate::domain::{
    AutocompleteEntry, FoodEntry, FoodFullDetail, FoodId, FoodSummary, SearchTermEntry,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::autocomplete::AutocompleteRepository;
pub use repositories::food::{FoodLookup, FoodRepository};
pub use repositories::search_term::SearchTermRepository;

/// Row counts per cache table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub food_entries: u64,
    pub hydrated_food_entries: u64,
    pub search_terms: u64,
    pub autocomplete_entries: u64,
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn food_repo(&self) -> FoodRepository {
        FoodRepository::new(self.conn.clone())
    }

    fn search_repo(&self) -> SearchTermRepository {
        SearchTermRepository::new(self.conn.clone())
    }

    fn autocomplete_repo(&self) -> AutocompleteRepository {
        AutocompleteRepository::new(self.conn.clone())
    }

    // Food entries

    pub async fn get_food(&self, food_id: &FoodId, now: DateTime<Utc>) -> Result<Option<FoodEntry>> {
        self.food_repo().get(food_id, now).await
    }

    pub async fn get_food_full_detail(
        &self,
        food_id: &FoodId,
        now: DateTime<Utc>,
    ) -> Result<FoodLookup> {
        self.food_repo().get_full_detail(food_id, now).await
    }

    pub async fn peek_food(&self, food_id: &FoodId) -> Result<Option<FoodEntry>> {
        self.food_repo().peek(food_id).await
    }

    pub async fn get_foods(
        &self,
        food_ids: &[FoodId],
        now: DateTime<Utc>,
    ) -> Result<HashMap<FoodId, FoodEntry>> {
        self.food_repo().get_many(food_ids, now).await
    }

    pub async fn upsert_food_stub(&self, summary: &FoodSummary, now: DateTime<Utc>) -> Result<()> {
        self.food_repo().upsert_stub(summary, now).await
    }

    pub async fn upsert_food_full_detail(
        &self,
        detail: &FoodFullDetail,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.food_repo().upsert_full_detail(detail, now).await
    }

    pub async fn evict_stale_foods(&self, cutoff: DateTime<Utc>, batch_size: u64) -> Result<u64> {
        self.food_repo().evict_stale(cutoff, batch_size).await
    }

    // Search terms

    pub async fn get_search_term(
        &self,
        term: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SearchTermEntry>> {
        self.search_repo().get(term, now).await
    }

    pub async fn peek_search_term(&self, term: &str) -> Result<Option<SearchTermEntry>> {
        self.search_repo().peek(term).await
    }

    pub async fn put_search_term(
        &self,
        term: &str,
        food_ids: &[FoodId],
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.search_repo().put(term, food_ids, now).await
    }

    pub async fn evict_stale_search_terms(
        &self,
        cutoff: DateTime<Utc>,
        batch_size: u64,
    ) -> Result<u64> {
        self.search_repo().evict_stale(cutoff, batch_size).await
    }

    // Autocomplete

    pub async fn get_autocomplete(
        &self,
        query: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AutocompleteEntry>> {
        self.autocomplete_repo().get(query, now).await
    }

    pub async fn peek_autocomplete(&self, query: &str) -> Result<Option<AutocompleteEntry>> {
        self.autocomplete_repo().peek(query).await
    }

    pub async fn put_autocomplete(
        &self,
        query: &str,
        suggestions: &[String],
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.autocomplete_repo().put(query, suggestions, now).await
    }

    pub async fn evict_stale_autocomplete(
        &self,
        cutoff: DateTime<Utc>,
        batch_size: u64,
    ) -> Result<u64> {
        self.autocomplete_repo().evict_stale(cutoff, batch_size).await
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        let food = self.food_repo();
        let search = self.search_repo();
        let autocomplete = self.autocomplete_repo();
        let (food_entries, hydrated_food_entries, search_terms, autocomplete_entries) = tokio::try_join!(
            food.count(),
            food.count_hydrated(),
            search.count(),
            autocomplete.count()
        )?;

        Ok(CacheStats {
            food_entries,
            hydrated_food_entries,
            search_terms,
            autocomplete_entries,
        })
    }
}
