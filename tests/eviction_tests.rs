//! Recency sweep and upsert rules, driven with explicit clocks.

use chrono::{DateTime, Duration, TimeZone, Utc};
use foodcache::clients::{FoodProvider, ProviderError};
use foodcache::db::Store;
use foodcache::domain::{FoodFullDetail, FoodId, FoodSummary, Measure};
use foodcache::services::{CacheCoordinator, FoodService, RetentionPolicy};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Provider that must never be reached by a sweep.
struct OfflineProvider;

#[async_trait::async_trait]
impl FoodProvider for OfflineProvider {
    async fn search_by_text(&self, _text: &str) -> Result<Vec<FoodSummary>, ProviderError> {
        Err(ProviderError::Unavailable("offline".to_string()))
    }

    async fn fetch_detail(&self, _food_id: &FoodId) -> Result<FoodFullDetail, ProviderError> {
        Err(ProviderError::Unavailable("offline".to_string()))
    }

    async fn autocomplete_suggestions(&self, _prefix: &str) -> Result<Vec<String>, ProviderError> {
        Err(ProviderError::Unavailable("offline".to_string()))
    }
}

async fn open_store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("foodcache-eviction-test-{}.db", uuid::Uuid::new_v4()));

    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open store")
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
}

fn summary(id: &str) -> FoodSummary {
    let mut summary = FoodSummary::new(id, format!("Food {id}"));
    summary.nutrients.insert("ENERC_KCAL".to_string(), 100.0);
    summary
}

fn detail(id: &str, measures: Vec<Measure>) -> FoodFullDetail {
    FoodFullDetail {
        food_id: FoodId::from(id),
        label: Some(format!("detail {id}")),
        nutrients: [("ENERC_KCAL".to_string(), 250.0)].into_iter().collect(),
        measures,
        health_labels: BTreeSet::new(),
        diet_labels: ["LOW_CARB".to_string()].into_iter().collect(),
        payload: serde_json::json!({ "calories": 250 }),
    }
}

#[tokio::test]
async fn sweep_removes_exactly_the_stale_rows() {
    let store = open_store().await;
    let cache = CacheCoordinator::new(
        store.clone(),
        Arc::new(OfflineProvider),
        RetentionPolicy::default(),
    );

    // Never used, ages from insertion.
    store.upsert_food_stub(&summary("old"), t0()).await.unwrap();
    // Inserted at the same time but read recently.
    store.upsert_food_stub(&summary("used"), t0()).await.unwrap();
    store
        .get_food(&FoodId::from("used"), t0() + Duration::days(80))
        .await
        .unwrap()
        .expect("used row");
    // Heavily used long ago; usage counts do not protect it.
    store
        .upsert_food_full_detail(&detail("popular", Vec::new()), t0())
        .await
        .unwrap();
    for _ in 0..50 {
        store
            .get_food(&FoodId::from("popular"), t0() + Duration::days(1))
            .await
            .unwrap();
    }

    store
        .put_search_term("chicken", &[FoodId::from("old")], t0() + Duration::days(90))
        .await
        .unwrap();
    store
        .put_search_term("rice", &[FoodId::from("used")], t0() + Duration::days(99))
        .await
        .unwrap();
    store
        .put_autocomplete("chi", &["chicken".to_string()], t0() + Duration::days(98))
        .await
        .unwrap();
    store
        .put_autocomplete("ric", &["rice".to_string()], t0() + Duration::hours(2388))
        .await
        .unwrap();

    let now = t0() + Duration::days(100);
    let report = cache.evict_stale(now).await.unwrap();

    assert_eq!(report.food_entries, 2);
    assert_eq!(report.search_terms, 1);
    assert_eq!(report.autocomplete_entries, 1);

    assert!(store.peek_food(&FoodId::from("old")).await.unwrap().is_none());
    assert!(store.peek_food(&FoodId::from("popular")).await.unwrap().is_none());
    assert!(store.peek_food(&FoodId::from("used")).await.unwrap().is_some());
    assert!(store.peek_search_term("chicken").await.unwrap().is_none());
    assert!(store.peek_search_term("rice").await.unwrap().is_some());
    assert!(store.peek_autocomplete("chi").await.unwrap().is_none());
    assert!(store.peek_autocomplete("ric").await.unwrap().is_some());

    let again = cache.evict_stale(now).await.unwrap();
    assert_eq!(again.total(), 0);
}

#[tokio::test]
async fn sweep_drains_in_batches() {
    let store = open_store().await;

    for i in 0..7 {
        store
            .upsert_food_stub(&summary(&format!("F{i}")), t0() + Duration::minutes(i))
            .await
            .unwrap();
    }
    store
        .upsert_food_stub(&summary("fresh"), t0() + Duration::days(95))
        .await
        .unwrap();

    let cutoff = t0() + Duration::days(10);
    let removed = store.evict_stale_foods(cutoff, 3).await.unwrap();

    assert_eq!(removed, 7);
    assert_eq!(store.stats().await.unwrap().food_entries, 1);
}

#[tokio::test]
async fn stub_upsert_keeps_hydrated_detail() {
    let store = open_store().await;
    let id = FoodId::from("F1");

    let mut first = summary("F1");
    first.measures = vec![Measure {
        uri: None,
        label: "Cup".to_string(),
        weight: 240.0,
        qualifiers: vec!["chopped".to_string()],
    }];
    store.upsert_food_stub(&first, t0()).await.unwrap();
    store
        .upsert_food_full_detail(&detail("F1", Vec::new()), t0() + Duration::hours(1))
        .await
        .unwrap();

    let mut renamed = summary("F1");
    renamed.name = "Renamed Food".to_string();
    renamed.nutrients.insert("ENERC_KCAL".to_string(), 1.0);
    store
        .upsert_food_stub(&renamed, t0() + Duration::hours(2))
        .await
        .unwrap();

    let food = store.peek_food(&id).await.unwrap().expect("food row");
    assert!(food.has_full_details());
    assert_eq!(food.name, "Renamed Food");
    assert_eq!(food.calories(), Some(250.0));
    assert_eq!(food.measures.len(), 1);
    assert_eq!(food.qualifiers, vec!["chopped"]);
    assert!(food.diet_labels.contains("LOW_CARB"));
    assert_eq!(food.created_at, t0());
    assert_eq!(food.updated_at, t0() + Duration::hours(2));
}

#[tokio::test]
async fn full_detail_with_measures_replaces_them() {
    let store = open_store().await;
    let id = FoodId::from("F1");

    let mut stub = summary("F1");
    stub.measures = vec![Measure {
        uri: None,
        label: "Cup".to_string(),
        weight: 240.0,
        qualifiers: Vec::new(),
    }];
    store.upsert_food_stub(&stub, t0()).await.unwrap();

    let measures = vec![Measure {
        uri: Some("http://www.edamam.com/ontologies/edamam.owl#Measure_gram".to_string()),
        label: "Gram".to_string(),
        weight: 1.0,
        qualifiers: vec!["raw".to_string()],
    }];
    store
        .upsert_food_full_detail(&detail("F1", measures), t0())
        .await
        .unwrap();

    let food = store.peek_food(&id).await.unwrap().unwrap();
    assert_eq!(food.name, "Food F1");
    assert_eq!(food.measures.len(), 1);
    assert_eq!(food.measures[0].label, "Gram");
    assert_eq!(food.qualifiers, vec!["raw"]);
}

#[tokio::test]
async fn misses_do_not_create_rows_or_touch_usage() {
    let store = open_store().await;

    assert!(
        store
            .get_food(&FoodId::from("nope"), t0())
            .await
            .unwrap()
            .is_none()
    );
    assert!(store.get_search_term("nope", t0()).await.unwrap().is_none());
    assert!(store.get_autocomplete("nope", t0()).await.unwrap().is_none());
    assert_eq!(store.stats().await.unwrap().food_entries, 0);
}
