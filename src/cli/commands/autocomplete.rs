use super::source_label;
use crate::services::FoodService;

pub async fn cmd_autocomplete(service: &dyn FoodService, prefix: &str) -> anyhow::Result<()> {
    let resolved = service.autocomplete(prefix).await?;

    if resolved.value.is_empty() {
        println!("No suggestions for '{prefix}'");
        return Ok(());
    }

    println!("Suggestions ({}):", source_label(&resolved));
    for suggestion in &resolved.value {
        println!("  {suggestion}");
    }

    Ok(())
}
