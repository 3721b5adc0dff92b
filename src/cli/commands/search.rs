use super::source_label;
use crate::services::FoodService;

pub async fn cmd_search(service: &dyn FoodService, query: &str, details: bool) -> anyhow::Result<()> {
    println!("Searching for: {query}");

    if details {
        let resolved = service.search_food_entries(query).await?;
        if resolved.value.is_empty() {
            println!("No foods found matching '{query}'");
            return Ok(());
        }

        println!();
        println!("Search Results ({}):", source_label(&resolved));
        println!("{:-<60}", "");

        for food in &resolved.value {
            let kcal = food
                .calories()
                .map_or_else(|| "? kcal".to_string(), |k| format!("{k:.0} kcal"));
            println!("• {} ({kcal})", food.name);
            if let Some(brand) = &food.brand {
                println!("  Brand: {brand}");
            }
            println!("  ID: {}", food.food_id);
            println!();
        }
    } else {
        let resolved = service.search_foods(query).await?;
        if resolved.value.is_empty() {
            println!("No foods found matching '{query}'");
            return Ok(());
        }

        println!();
        println!("Search Results ({}):", source_label(&resolved));
        println!("{:-<60}", "");

        for id in &resolved.value {
            println!("• {id}");
        }
        println!();
    }

    println!("For full detail: foodcache lookup <id> --full");

    Ok(())
}
