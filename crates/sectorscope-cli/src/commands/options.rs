use sectorscope_core::{FilterOptions, IndustryOption, MarketApi, ScreenerController};
use serde::Serialize;

use crate::cli::OptionsArgs;
use crate::error::CliError;
use crate::output::Table;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct OptionsResponseData<'a> {
    options: Option<&'a FilterOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestions: Option<Vec<&'a IndustryOption>>,
}

pub async fn run<A: MarketApi>(args: &OptionsArgs, api: A) -> Result<CommandResult, CliError> {
    let mut screener = ScreenerController::new(api);
    screener.load_options().await;

    let suggestions = args
        .industry_search
        .as_deref()
        .map(|text| screener.industry_suggestions(text));
    let table = match (&suggestions, screener.options().data()) {
        (Some(suggestions), _) => suggestion_table(suggestions),
        (None, Some(options)) => summary_table(options),
        (None, None) => Table::new(["Kind", "Count"]),
    };

    let data = serde_json::to_value(OptionsResponseData {
        options: screener.options().data(),
        suggestions,
    })?;
    Ok(CommandResult::ok(data)
        .with_table(table)
        .with_slot_error(screener.options()))
}

fn summary_table(options: &FilterOptions) -> Table {
    let mut table = Table::new(["Kind", "Count"]);
    let counts = [
        ("Exchanges", options.exchanges.len()),
        ("Sectors", options.sectors.len()),
        ("Industries", options.industries.len()),
        ("Countries", options.countries.len()),
    ];
    for (kind, count) in counts {
        table.push_row(vec![kind.to_owned(), count.to_string()]);
    }
    table
}

fn suggestion_table(suggestions: &[&IndustryOption]) -> Table {
    let mut table = Table::new(["Industry", "Sector"]);
    for industry in suggestions {
        table.push_row(vec![
            industry.name.clone(),
            industry.sector_name.clone().unwrap_or_default(),
        ]);
    }
    table
}
