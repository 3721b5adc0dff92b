//! Lookup command handler

use super::source_label;
use crate::domain::FoodId;
use crate::services::{FoodService, LookupError};

pub async fn cmd_lookup(service: &dyn FoodService, id: &str, full: bool) -> anyhow::Result<()> {
    let food_id = FoodId::new(id);

    let resolved = match service.lookup_food(&food_id, full).await {
        Ok(resolved) => resolved,
        Err(LookupError::NotFound(_)) => {
            println!("No food with id {food_id}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let food = &resolved.value;

    println!("{} ({})", food.name, source_label(&resolved));
    println!("{:-<60}", "");
    println!("ID:        {}", food.food_id);
    if let Some(brand) = &food.brand {
        println!("Brand:     {brand}");
    }
    if let Some(category) = &food.category {
        println!("Category:  {category}");
    }
    println!(
        "Detail:    {}",
        if food.has_full_details() { "full" } else { "summary" }
    );
    if let Some(kcal) = food.calories() {
        println!("Energy:    {kcal:.0} kcal / 100 g");
    }

    if !food.nutrients.is_empty() {
        println!();
        println!("Nutrients (per 100 g):");
        for (code, amount) in &food.nutrients {
            println!("  {code:<12} {amount:>10.2}");
        }
    }

    if !food.measures.is_empty() {
        println!();
        println!("Measures:");
        for measure in &food.measures {
            println!("  {:<20} {:>8.1} g", measure.label, measure.weight);
        }
    }

    if !food.health_labels.is_empty() {
        println!();
        let labels: Vec<&str> = food.health_labels.iter().map(String::as_str).collect();
        println!("Health:    {}", labels.join(", "));
    }

    println!();
    println!("Used {} time(s)", food.usage_count);

    Ok(())
}
