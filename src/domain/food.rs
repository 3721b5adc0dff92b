use super::FoodId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Nutrient code (e.g. `ENERC_KCAL`, `PROCNT`) to amount per 100 g.
pub type Nutrients = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub uri: Option<String>,
    pub label: String,
    /// Weight of one unit of this measure, in grams.
    pub weight: f64,
    #[serde(default)]
    pub qualifiers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServingSize {
    pub uri: Option<String>,
    pub label: String,
    pub quantity: f64,
}

/// Abbreviated food record as it appears in a provider search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodSummary {
    pub food_id: FoodId,
    pub name: String,
    pub known_as: Option<String>,
    pub category: Option<String>,
    pub category_label: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub upc: Option<String>,
    pub food_contents_label: Option<String>,
    pub nutrients: Nutrients,
    pub measures: Vec<Measure>,
    pub serving_sizes: Vec<ServingSize>,
}

impl FoodSummary {
    /// Minimal summary carrying only an id and a display name.
    #[must_use]
    pub fn new(food_id: impl Into<FoodId>, name: impl Into<String>) -> Self {
        Self {
            food_id: food_id.into(),
            name: name.into(),
            known_as: None,
            category: None,
            category_label: None,
            brand: None,
            image_url: None,
            upc: None,
            food_contents_label: None,
            nutrients: Nutrients::new(),
            measures: Vec::new(),
            serving_sizes: Vec::new(),
        }
    }

    /// Distinct qualifier labels across all measures, first occurrence wins.
    #[must_use]
    pub fn qualifiers(&self) -> Vec<String> {
        collect_qualifiers(&self.measures)
    }
}

/// Result of the provider's full-detail endpoint for one food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodFullDetail {
    pub food_id: FoodId,
    /// Display label reported by the detail endpoint, used only when the
    /// food has no row yet.
    pub label: Option<String>,
    pub nutrients: Nutrients,
    /// Empty when the detail endpoint carries no measure catalogue; the
    /// existing measures of the row are then kept.
    pub measures: Vec<Measure>,
    pub health_labels: BTreeSet<String>,
    pub diet_labels: BTreeSet<String>,
    /// Raw upstream response body.
    pub payload: serde_json::Value,
}

impl FoodFullDetail {
    #[must_use]
    pub fn qualifiers(&self) -> Vec<String> {
        collect_qualifiers(&self.measures)
    }
}

/// Detail level of a cached food.
///
/// A row only ever moves from `Stub` to `Hydrated`; the store never writes the
/// transition the other way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FoodDetail {
    Stub,
    Hydrated { payload: serde_json::Value },
}

impl FoodDetail {
    #[must_use]
    pub const fn is_hydrated(&self) -> bool {
        matches!(self, Self::Hydrated { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub food_id: FoodId,
    pub name: String,
    pub known_as: Option<String>,
    pub category: Option<String>,
    pub category_label: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub upc: Option<String>,
    pub food_contents_label: Option<String>,
    pub nutrients: Nutrients,
    pub measures: Vec<Measure>,
    pub serving_sizes: Vec<ServingSize>,
    pub health_labels: BTreeSet<String>,
    pub diet_labels: BTreeSet<String>,
    pub qualifiers: Vec<String>,
    pub detail: FoodDetail,
    pub last_api_update: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
    pub usage_count: i64,
}

impl FoodEntry {
    #[must_use]
    pub const fn has_full_details(&self) -> bool {
        self.detail.is_hydrated()
    }

    #[must_use]
    pub const fn full_details(&self) -> Option<&serde_json::Value> {
        match &self.detail {
            FoodDetail::Hydrated { payload } => Some(payload),
            FoodDetail::Stub => None,
        }
    }

    /// Applies a full-detail response on top of an optional existing row,
    /// following the same rules as the store's full-detail upsert.
    ///
    /// Used when the fresh data could not be persisted but still has to be
    /// returned to the caller.
    #[must_use]
    pub fn with_full_detail(
        existing: Option<Self>,
        detail: FoodFullDetail,
        now: DateTime<Utc>,
    ) -> Self {
        let qualifiers = detail.qualifiers();
        let mut entry = existing.unwrap_or_else(|| Self {
            food_id: detail.food_id.clone(),
            name: detail
                .label
                .clone()
                .unwrap_or_else(|| detail.food_id.to_string()),
            known_as: None,
            category: None,
            category_label: None,
            brand: None,
            image_url: None,
            upc: None,
            food_contents_label: None,
            nutrients: Nutrients::new(),
            measures: Vec::new(),
            serving_sizes: Vec::new(),
            health_labels: BTreeSet::new(),
            diet_labels: BTreeSet::new(),
            qualifiers: Vec::new(),
            detail: FoodDetail::Stub,
            last_api_update: now,
            created_at: now,
            updated_at: now,
            last_used: Some(now),
            usage_count: 1,
        });

        entry.nutrients = detail.nutrients;
        if !detail.measures.is_empty() {
            entry.measures = detail.measures;
            entry.qualifiers = qualifiers;
        }
        entry.health_labels = detail.health_labels;
        entry.diet_labels = detail.diet_labels;
        entry.detail = FoodDetail::Hydrated {
            payload: detail.payload,
        };
        entry.last_api_update = now;
        entry.updated_at = now;
        entry
    }

    /// Energy in kcal per 100 g, if the provider reported it.
    #[must_use]
    pub fn calories(&self) -> Option<f64> {
        self.nutrients.get("ENERC_KCAL").copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTermEntry {
    pub search_term: String,
    pub food_ids: Vec<FoodId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
    pub usage_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteEntry {
    pub query: String,
    pub suggestions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
    pub usage_count: i64,
}

/// Drops repeated ids, keeping the first occurrence and the provider's order.
#[must_use]
pub fn dedup_food_ids(ids: impl IntoIterator<Item = FoodId>) -> Vec<FoodId> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

fn collect_qualifiers(measures: &[Measure]) -> Vec<String> {
    let mut seen = HashSet::new();
    measures
        .iter()
        .flat_map(|m| m.qualifiers.iter())
        .filter(|q| seen.insert(q.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measure(label: &str, qualifiers: &[&str]) -> Measure {
        Measure {
            uri: None,
            label: label.to_string(),
            weight: 100.0,
            qualifiers: qualifiers.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let ids = ["F2", "F1", "F2", "F3", "F1"].map(FoodId::from);
        let deduped = dedup_food_ids(ids);
        assert_eq!(deduped, ["F2", "F1", "F3"].map(FoodId::from).to_vec());
    }

    #[test]
    fn qualifiers_are_distinct_across_measures() {
        let mut summary = FoodSummary::new("F1", "Egg");
        summary.measures = vec![
            measure("Whole", &["large", "raw"]),
            measure("Serving", &["large"]),
            measure("Gram", &[]),
        ];
        assert_eq!(summary.qualifiers(), vec!["large", "raw"]);
    }

    #[test]
    fn full_detail_promotes_stub_and_keeps_measures_when_absent() {
        let now = Utc::now();
        let mut summary = FoodSummary::new("F1", "Chicken Breast");
        summary.measures = vec![measure("Breast", &["large"])];
        summary.nutrients.insert("ENERC_KCAL".to_string(), 120.0);

        let stub = FoodEntry::with_full_detail(
            None,
            FoodFullDetail {
                food_id: FoodId::from("F1"),
                label: None,
                nutrients: Nutrients::new(),
                measures: Vec::new(),
                health_labels: BTreeSet::new(),
                diet_labels: BTreeSet::new(),
                payload: serde_json::Value::Null,
            },
            now,
        );
        assert_eq!(stub.name, "F1");

        let mut existing = stub;
        existing.name = summary.name.clone();
        existing.measures = summary.measures.clone();
        existing.qualifiers = summary.qualifiers();
        existing.detail = FoodDetail::Stub;

        let detail = FoodFullDetail {
            food_id: FoodId::from("F1"),
            label: Some("chicken breast".to_string()),
            nutrients: [("ENERC_KCAL".to_string(), 165.0)].into_iter().collect(),
            measures: Vec::new(),
            health_labels: ["HIGH_PROTEIN".to_string()].into_iter().collect(),
            diet_labels: BTreeSet::new(),
            payload: serde_json::json!({"calories": 165}),
        };

        let hydrated = FoodEntry::with_full_detail(Some(existing), detail, now);
        assert!(hydrated.has_full_details());
        assert_eq!(hydrated.name, "Chicken Breast");
        assert_eq!(hydrated.calories(), Some(165.0));
        assert_eq!(hydrated.measures.len(), 1);
        assert_eq!(hydrated.qualifiers, vec!["large"]);
        assert_eq!(hydrated.full_details().unwrap()["calories"], 165);
    }

    #[test]
    fn detail_state_serializes_tagged() {
        let stub = serde_json::to_value(FoodDetail::Stub).unwrap();
        assert_eq!(stub["state"], "stub");

        let hydrated = FoodDetail::Hydrated {
            payload: serde_json::json!({"calories": 165}),
        };
        assert!(hydrated.is_hydrated());
        let value = serde_json::to_value(&hydrated).unwrap();
        assert_eq!(value["state"], "hydrated");
        assert_eq!(value["payload"]["calories"], 165);
    }
}
