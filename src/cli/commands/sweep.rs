//! Manual eviction sweep

use crate::services::Scheduler;

pub async fn cmd_sweep(scheduler: &Scheduler) -> anyhow::Result<()> {
    println!("Evicting stale cache rows...");

    let report = scheduler.run_once().await?;

    println!("✓ Removed {} row(s)", report.total());
    println!("  Foods:         {}", report.food_entries);
    println!("  Search terms:  {}", report.search_terms);
    println!("  Autocomplete:  {}", report.autocomplete_entries);

    Ok(())
}
