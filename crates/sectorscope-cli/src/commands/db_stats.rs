use sectorscope_core::{DatabaseStats, MarketApi};

use crate::error::CliError;
use crate::output::Table;

use super::{CommandResult, ErrorRecord};

pub async fn run<A: MarketApi>(api: A) -> Result<CommandResult, CliError> {
    match api.database_stats().await {
        Ok(stats) => {
            let table = stats_table(&stats);
            Ok(CommandResult::ok(serde_json::to_value(stats)?).with_table(table))
        }
        Err(error) => {
            tracing::warn!(code = error.code(), "database stats request failed");
            Ok(CommandResult::ok(serde_json::Value::Null)
                .with_errors(vec![ErrorRecord::from(&error)]))
        }
    }
}

fn stats_table(stats: &DatabaseStats) -> Table {
    let mut table = Table::new(["Table", "Rows"]);
    let rows = [
        ("Exchanges", stats.exchanges),
        ("Sectors", stats.sectors),
        ("Industries", stats.industries),
        ("Countries", stats.countries),
        ("Stocks", stats.stocks),
        ("Stocks with price", stats.stocks_with_price),
        ("Stocks with market cap", stats.stocks_with_market_cap),
    ];
    for (name, count) in rows {
        table.push_row(vec![name.to_owned(), count.to_string()]);
    }
    table
}
