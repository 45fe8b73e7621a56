use sectorscope_core::format::{format_compact, format_decimal, format_market_cap};
use sectorscope_core::{
    ClassifierController, CompanyKey, HistoryRequest, HistoryWindow, MarketApi, PriceHistory,
    PricePoint, StockProfile,
};
use serde::Serialize;

use crate::cli::{CompanyArgs, HistoryArgs};
use crate::error::CliError;
use crate::output::Table;

use super::{CommandResult, ErrorRecord};

#[derive(Debug, Serialize)]
struct ChartWindow {
    label: &'static str,
    points: usize,
    first_close: Option<f64>,
    last_close: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ProfileResponseData<'a> {
    profile: Option<&'a StockProfile>,
    history_points: usize,
    chart_windows: Vec<ChartWindow>,
}

pub async fn run_profile<A: MarketApi>(
    args: &CompanyArgs,
    api: A,
) -> Result<CommandResult, CliError> {
    let company = CompanyKey::new(&args.ticker, args.exchange.as_deref())?;
    let mut classifier = ClassifierController::new(api);
    classifier.open_company(company).await;

    let profile = classifier.profile().data();
    let history = classifier.history().data();
    let chart_windows = history.map(chart_windows).unwrap_or_default();
    let data = serde_json::to_value(ProfileResponseData {
        profile,
        history_points: history.map_or(0, |history| history.results.len()),
        chart_windows,
    })?;

    let mut result = CommandResult::ok(data)
        .with_slot_error(classifier.profile())
        .with_slot_error(classifier.history());
    if let Some(profile) = profile {
        result = result.with_table(profile_table(profile));
    }
    Ok(result)
}

pub async fn run_history<A: MarketApi>(
    args: &HistoryArgs,
    api: A,
) -> Result<CommandResult, CliError> {
    let company = CompanyKey::new(&args.company.ticker, args.company.exchange.as_deref())?;
    let window = HistoryWindow::parse(&args.window)?;
    let mut request = HistoryRequest::new(company).with_window(window);
    if let Some(limit) = args.limit {
        request = request.with_limit(limit);
    }

    match api.stock_history(request).await {
        Ok(history) => {
            let table = history_table(&history.results);
            Ok(CommandResult::ok(serde_json::to_value(&history)?).with_table(table))
        }
        Err(error) => {
            tracing::warn!(code = error.code(), "price history request failed");
            Ok(CommandResult::ok(serde_json::Value::Null)
                .with_errors(vec![ErrorRecord::from(&error)]))
        }
    }
}

fn chart_windows(history: &PriceHistory) -> Vec<ChartWindow> {
    HistoryWindow::PRESETS
        .iter()
        .map(|&(label, window)| {
            let points = history.trailing(window);
            ChartWindow {
                label,
                points: points.len(),
                first_close: points.first().and_then(PricePoint::chart_close),
                last_close: points.last().and_then(PricePoint::chart_close),
            }
        })
        .collect()
}

fn profile_table(profile: &StockProfile) -> Table {
    let stock = &profile.stock;
    let mut table = Table::new(["Field", "Value"]);
    let rows = [
        ("Ticker", stock.ticker.clone()),
        ("Company", stock.company_name.clone().unwrap_or_default()),
        ("Exchange", stock.exchange_code.clone().unwrap_or_default()),
        ("Sector", stock.sector_name.clone().unwrap_or_default()),
        ("Industry", stock.industry_name.clone().unwrap_or_default()),
        ("Price", format_decimal(stock.price)),
        ("Market Cap", format_market_cap(stock.market_cap)),
        ("P/E", format_decimal(stock.pe_ratio)),
        (
            "Latest Close",
            format_decimal(profile.latest_price.as_ref().and_then(|p| p.close_price)),
        ),
        ("Change %", format_decimal(profile.price_change.percent)),
        (
            "Volume",
            format_compact(
                profile
                    .latest_price
                    .as_ref()
                    .and_then(|p| p.volume)
                    .map(|volume| volume as f64),
            ),
        ),
    ];
    for (field, value) in rows {
        table.push_row(vec![field.to_owned(), value]);
    }
    table
}

fn history_table(points: &[PricePoint]) -> Table {
    let mut table = Table::new(["Date", "Open", "High", "Low", "Close", "Volume"]);
    for point in points {
        table.push_row(vec![
            point.date.to_string(),
            format_decimal(point.open_price),
            format_decimal(point.high_price),
            format_decimal(point.low_price),
            format_decimal(point.chart_close()),
            point.volume.map(|volume| volume.to_string()).unwrap_or_default(),
        ]);
    }
    table
}
