use crate::services::FoodService;

pub async fn cmd_stats(service: &dyn FoodService) -> anyhow::Result<()> {
    let stats = service.stats().await?;

    println!("Cache Statistics");
    println!("{:-<40}", "");
    println!(
        "Foods:         {} ({} with full detail)",
        stats.food_entries, stats.hydrated_food_entries
    );
    println!("Search terms:  {}", stats.search_terms);
    println!("Autocomplete:  {}", stats.autocomplete_entries);

    Ok(())
}
