use crate::clients::provider::{FoodProvider, ProviderError};
use crate::config::ProviderConfig;
use crate::domain::food::Nutrients;
use crate::domain::{FoodFullDetail, FoodId, FoodSummary, Measure, ServingSize};
use anyhow::Result;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Duration;
use tracing::debug;

const MEASURE_GRAM_URI: &str = "http://www.edamam.com/ontologies/edamam.owl#Measure_gram";

/// Nutrient detail is always requested for this many grams, matching the
/// per-100 g amounts in search responses.
const DETAIL_QUANTITY_GRAMS: f64 = 100.0;

#[derive(Debug, Deserialize)]
struct ParserResponse {
    #[serde(default)]
    hints: Vec<Hint>,
}

#[derive(Debug, Deserialize)]
struct Hint {
    food: EdamamFood,
    #[serde(default)]
    measures: Vec<EdamamMeasure>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EdamamFood {
    food_id: String,
    label: String,
    known_as: Option<String>,
    #[serde(default)]
    nutrients: Nutrients,
    category: Option<String>,
    category_label: Option<String>,
    brand: Option<String>,
    image: Option<String>,
    upc: Option<String>,
    food_contents_label: Option<String>,
    #[serde(default)]
    serving_sizes: Vec<EdamamServingSize>,
}

#[derive(Debug, Deserialize)]
struct EdamamMeasure {
    uri: Option<String>,
    label: Option<String>,
    weight: Option<f64>,
    #[serde(default)]
    qualified: Vec<QualifiedMeasure>,
}

#[derive(Debug, Deserialize)]
struct QualifiedMeasure {
    #[serde(default)]
    qualifiers: Vec<Qualifier>,
}

#[derive(Debug, Deserialize)]
struct Qualifier {
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EdamamServingSize {
    uri: Option<String>,
    label: String,
    quantity: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NutrientsRequest<'a> {
    ingredients: [IngredientRequest<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IngredientRequest<'a> {
    quantity: f64,
    #[serde(rename = "measureURI")]
    measure_uri: &'a str,
    food_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NutrientsResponse {
    #[serde(default)]
    health_labels: BTreeSet<String>,
    #[serde(default)]
    diet_labels: BTreeSet<String>,
    #[serde(default)]
    total_nutrients: BTreeMap<String, NutrientAmount>,
    #[serde(default)]
    ingredients: Vec<IngredientResult>,
}

#[derive(Debug, Deserialize)]
struct NutrientAmount {
    quantity: f64,
}

#[derive(Debug, Deserialize)]
struct IngredientResult {
    #[serde(default)]
    parsed: Vec<ParsedIngredient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParsedIngredient {
    food: Option<String>,
    status: Option<String>,
}

/// Client for the Edamam food database API.
#[derive(Clone)]
pub struct EdamamClient {
    client: Client,
    base_url: String,
    app_id: String,
    app_key: String,
    search_limit: usize,
    autocomplete_limit: usize,
}

impl EdamamClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(u64::from(config.request_timeout_seconds)))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            app_key: config.app_key.clone(),
            search_limit: config.search_limit,
            autocomplete_limit: config.autocomplete_limit,
        })
    }

    fn credentials(&self) -> String {
        format!(
            "app_id={}&app_key={}",
            urlencoding::encode(&self.app_id),
            urlencoding::encode(&self.app_key)
        )
    }

    async fn check(response: Response, subject: &str) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::NOT_FOUND => Err(ProviderError::NotFound(subject.to_string())),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(ProviderError::RateLimited { retry_after })
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(ProviderError::Unavailable(format!(
                    "Edamam API error: {status} - {body}"
                )))
            }
        }
    }
}

#[async_trait::async_trait]
impl FoodProvider for EdamamClient {
    async fn search_by_text(&self, text: &str) -> Result<Vec<FoodSummary>, ProviderError> {
        let url = format!(
            "{}/api/food-database/v2/parser?{}&ingr={}",
            self.base_url,
            self.credentials(),
            urlencoding::encode(text)
        );
        debug!(query = %text, "Edamam food search");

        let response = self.client.get(&url).send().await?;
        let response = Self::check(response, text).await?;

        let body: ParserResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("invalid search response: {e}")))?;

        Ok(map_hints(body.hints, self.search_limit))
    }

    async fn fetch_detail(&self, food_id: &FoodId) -> Result<FoodFullDetail, ProviderError> {
        let url = format!(
            "{}/api/food-database/v2/nutrients?{}",
            self.base_url,
            self.credentials()
        );
        debug!(food_id = %food_id, "Edamam nutrient detail");

        let request = NutrientsRequest {
            ingredients: [IngredientRequest {
                quantity: DETAIL_QUANTITY_GRAMS,
                measure_uri: MEASURE_GRAM_URI,
                food_id: food_id.as_str(),
            }],
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let response = Self::check(response, food_id.as_str()).await?;

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("invalid detail response: {e}")))?;

        map_detail(food_id, payload)
    }

    async fn autocomplete_suggestions(
        &self,
        prefix: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let url = format!(
            "{}/auto-complete?{}&q={}&limit={}",
            self.base_url,
            self.credentials(),
            urlencoding::encode(prefix),
            self.autocomplete_limit
        );

        let response = self.client.get(&url).send().await?;
        let response = Self::check(response, prefix).await?;

        response.json().await.map_err(|e| {
            ProviderError::Unavailable(format!("invalid autocomplete response: {e}"))
        })
    }
}

/// Converts search hints to summaries, keeping provider order and dropping
/// repeated food ids.
fn map_hints(hints: Vec<Hint>, limit: usize) -> Vec<FoodSummary> {
    let mut seen = HashSet::new();

    hints
        .into_iter()
        .filter(|hint| seen.insert(hint.food.food_id.clone()))
        .take(limit)
        .map(|hint| {
            let food = hint.food;
            FoodSummary {
                food_id: FoodId::new(food.food_id),
                name: food.label,
                known_as: food.known_as,
                category: food.category,
                category_label: food.category_label,
                brand: food.brand,
                image_url: food.image,
                upc: food.upc,
                food_contents_label: food.food_contents_label,
                nutrients: food.nutrients,
                measures: hint.measures.into_iter().filter_map(map_measure).collect(),
                serving_sizes: food
                    .serving_sizes
                    .into_iter()
                    .map(|s| ServingSize {
                        uri: s.uri,
                        label: s.label,
                        quantity: s.quantity,
                    })
                    .collect(),
            }
        })
        .collect()
}

fn map_measure(measure: EdamamMeasure) -> Option<Measure> {
    let label = measure.label?;
    let qualifiers = measure
        .qualified
        .into_iter()
        .flat_map(|q| q.qualifiers)
        .filter_map(|q| q.label)
        .collect();

    Some(Measure {
        uri: measure.uri,
        label,
        weight: measure.weight.unwrap_or_default(),
        qualifiers,
    })
}

fn map_detail(
    food_id: &FoodId,
    payload: serde_json::Value,
) -> Result<FoodFullDetail, ProviderError> {
    let body: NutrientsResponse = serde_json::from_value(payload.clone())
        .map_err(|e| ProviderError::Unavailable(format!("invalid detail response: {e}")))?;

    let parsed = body
        .ingredients
        .into_iter()
        .flat_map(|i| i.parsed)
        .next()
        .filter(|p| !p.status.as_deref().is_some_and(|s| s.eq_ignore_ascii_case("MISSING")))
        .ok_or_else(|| ProviderError::NotFound(food_id.to_string()))?;

    Ok(FoodFullDetail {
        food_id: food_id.clone(),
        label: parsed.food,
        nutrients: body
            .total_nutrients
            .into_iter()
            .map(|(code, amount)| (code, amount.quantity))
            .collect(),
        measures: Vec::new(),
        health_labels: body.health_labels,
        diet_labels: body.diet_labels,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_hints_map_to_summaries_in_order() {
        let body: ParserResponse = serde_json::from_value(json!({
            "text": "chicken breast",
            "hints": [
                {
                    "food": {
                        "foodId": "F1",
                        "label": "Chicken Breast",
                        "knownAs": "chicken breast",
                        "nutrients": {"ENERC_KCAL": 120.0, "PROCNT": 22.5},
                        "category": "Generic foods",
                        "categoryLabel": "food",
                        "image": "https://example.com/f1.jpg"
                    },
                    "measures": [
                        {"uri": "m#Serving", "label": "Serving", "weight": 174.0},
                        {"uri": "m#Breast", "label": "Breast", "weight": 190.0,
                         "qualified": [{"qualifiers": [{"uri": "q#large", "label": "large"}], "weight": 230.0}]},
                        {"uri": "m#Unlabeled", "weight": 1.0}
                    ]
                },
                {"food": {"foodId": "F2", "label": "Breaded Chicken Breast", "brand": "Acme"}},
                {"food": {"foodId": "F1", "label": "Chicken Breast duplicate"}}
            ]
        }))
        .unwrap();

        let summaries = map_hints(body.hints, 10);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].food_id, FoodId::from("F1"));
        assert_eq!(summaries[0].name, "Chicken Breast");
        assert_eq!(summaries[0].nutrients.get("PROCNT"), Some(&22.5));
        assert_eq!(summaries[0].measures.len(), 2);
        assert_eq!(summaries[0].measures[1].qualifiers, vec!["large"]);
        assert_eq!(summaries[0].image_url.as_deref(), Some("https://example.com/f1.jpg"));
        assert_eq!(summaries[1].brand.as_deref(), Some("Acme"));
    }

    #[test]
    fn search_hints_respect_limit() {
        let hints = (0..5)
            .map(|i| Hint {
                food: serde_json::from_value(json!({"foodId": format!("F{i}"), "label": "x"}))
                    .unwrap(),
                measures: Vec::new(),
            })
            .collect();
        assert_eq!(map_hints(hints, 3).len(), 3);
    }

    #[test]
    fn detail_maps_total_nutrients_and_labels() {
        let payload = json!({
            "calories": 120,
            "healthLabels": ["HIGH_PROTEIN", "GLUTEN_FREE"],
            "dietLabels": ["LOW_CARB"],
            "totalNutrients": {
                "ENERC_KCAL": {"label": "Energy", "quantity": 120.0, "unit": "kcal"},
                "FAT": {"label": "Fat", "quantity": 2.6, "unit": "g"}
            },
            "ingredients": [{"parsed": [{"food": "chicken breast", "foodId": "F1", "status": "OK"}]}]
        });

        let detail = map_detail(&FoodId::from("F1"), payload.clone()).unwrap();
        assert_eq!(detail.label.as_deref(), Some("chicken breast"));
        assert_eq!(detail.nutrients.get("FAT"), Some(&2.6));
        assert!(detail.health_labels.contains("HIGH_PROTEIN"));
        assert!(detail.diet_labels.contains("LOW_CARB"));
        assert!(detail.measures.is_empty());
        assert_eq!(detail.payload, payload);
    }

    #[test]
    fn detail_without_parsed_food_is_not_found() {
        let empty = json!({"ingredients": [{"parsed": []}]});
        assert!(matches!(
            map_detail(&FoodId::from("ZZZ"), empty),
            Err(ProviderError::NotFound(id)) if id == "ZZZ"
        ));

        let missing = json!({"ingredients": [{"parsed": [{"foodId": "ZZZ", "status": "MISSING"}]}]});
        assert!(matches!(
            map_detail(&FoodId::from("ZZZ"), missing),
            Err(ProviderError::NotFound(_))
        ));
    }

    #[test]
    fn nutrients_request_uses_gram_measure() {
        let request = NutrientsRequest {
            ingredients: [IngredientRequest {
                quantity: DETAIL_QUANTITY_GRAMS,
                measure_uri: MEASURE_GRAM_URI,
                food_id: "F1",
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["ingredients"][0]["measureURI"], MEASURE_GRAM_URI);
        assert_eq!(value["ingredients"][0]["foodId"], "F1");
        assert_eq!(value["ingredients"][0]["quantity"], 100.0);
    }
}
