use sectorscope_core::format::format_market_cap;
use sectorscope_core::{FilteredStats, MarketApi, ScreenerController};

use crate::cli::FilterArgs;
use crate::error::CliError;
use crate::output::Table;

use super::stocks::apply_filters;
use super::CommandResult;

pub async fn run<A: MarketApi>(args: &FilterArgs, api: A) -> Result<CommandResult, CliError> {
    let mut screener = ScreenerController::new(api);
    apply_filters(&mut screener, args)?;

    let pending = screener.begin_stats();
    let result = screener.api().filtered_stats(pending.query).await;
    screener.apply_stats(pending.ticket, result);

    let stats = screener.stats().data();
    let data = serde_json::to_value(stats)?;
    let mut result = CommandResult::ok(data).with_slot_error(screener.stats());
    if let Some(stats) = stats {
        result = result.with_table(stats_table(stats));
    }
    Ok(result)
}

fn stats_table(stats: &FilteredStats) -> Table {
    let mut table = Table::new(["Metric", "Value"]);
    let rows = [
        ("Companies", stats.total_companies.to_string()),
        ("Total market cap", format_market_cap(stats.total_market_cap)),
        ("Sectors", stats.unique_sectors.to_string()),
        ("Industries", stats.unique_industries.to_string()),
        ("Exchanges", stats.unique_exchanges.to_string()),
    ];
    for (metric, value) in rows {
        table.push_row(vec![metric.to_owned(), value]);
    }
    for sector in &stats.sector_breakdown {
        table.push_row(vec![
            format!("  {}", sector.sector_name.as_deref().unwrap_or("Unknown")),
            sector.count.to_string(),
        ]);
    }
    table
}
