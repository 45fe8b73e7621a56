use sectorscope_core::format::{format_decimal, format_market_cap};
use sectorscope_core::{
    Applied, CapUnit, FilterKey, MarketApi, PageSize, PriceFilter, ScreenerController, SortOrder,
    StockRecord, ValidationError,
};
use serde::Serialize;

use crate::cli::{FilterArgs, ListingArgs};
use crate::error::CliError;
use crate::output::Table;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct StocksResponseData<'a> {
    page: u32,
    page_size: u32,
    total_pages: u32,
    count: u64,
    first_row: Option<u64>,
    last_row: Option<u64>,
    ordering: &'a str,
    sort: Option<SortOrder>,
    results: &'a [StockRecord],
}

pub async fn run<A: MarketApi>(args: &ListingArgs, api: A) -> Result<CommandResult, CliError> {
    let mut screener = ScreenerController::new(api);
    let warnings = load_page(&mut screener, args).await?;

    let pagination = screener.pagination();
    let range = pagination.visible_range();
    let data = serde_json::to_value(StocksResponseData {
        page: pagination.page(),
        page_size: pagination.page_size().get(),
        total_pages: pagination.total_pages(),
        count: pagination.count(),
        first_row: range.map(|(first, _)| first),
        last_row: range.map(|(_, last)| last),
        ordering: &screener.filters().ordering,
        sort: screener.sort_indicator(),
        results: screener.records(),
    })?;

    Ok(CommandResult::ok(data)
        .with_table(stock_table(screener.records()))
        .with_warnings(warnings)
        .with_slot_error(screener.listing()))
}

/// Applies the screener filters. Price buckets and cap units are checked
/// here so typos fail instead of silently widening the query.
pub(super) fn apply_filters<A: MarketApi>(
    screener: &mut ScreenerController<A>,
    filters: &FilterArgs,
) -> Result<(), CliError> {
    let text = [
        (FilterKey::Search, &filters.search),
        (FilterKey::Exchange, &filters.exchange),
        (FilterKey::Sector, &filters.sector),
        (FilterKey::Industry, &filters.industry),
        (FilterKey::Country, &filters.country),
        (FilterKey::MarketCapMin, &filters.cap_min),
        (FilterKey::MarketCapMax, &filters.cap_max),
    ];
    for (key, value) in text {
        if let Some(value) = value {
            screener.set_filter(key, value);
        }
    }

    if let Some(price) = &filters.price {
        let price = PriceFilter::parse(price)?;
        screener.set_filter(FilterKey::PriceFilter, &price.to_string());
    }
    let units = [
        (FilterKey::MarketCapMinUnit, &filters.cap_min_unit),
        (FilterKey::MarketCapMaxUnit, &filters.cap_max_unit),
    ];
    for (key, unit) in units {
        if let Some(unit) = unit {
            let unit = CapUnit::parse(unit)?;
            screener.set_filter(key, unit.as_str());
        }
    }
    Ok(())
}

/// Loads the requested page. The total is only known after the first
/// response, so pages past the first take a second request; a page past
/// the end lands on the last page with a warning.
pub(super) async fn load_page<A: MarketApi>(
    screener: &mut ScreenerController<A>,
    args: &ListingArgs,
) -> Result<Vec<String>, CliError> {
    apply_filters(screener, &args.filters)?;
    if let Some(ordering) = &args.ordering {
        if ordering.trim().is_empty() {
            return Err(ValidationError::EmptyOrdering.into());
        }
        screener.set_filter(FilterKey::Ordering, ordering);
    }
    for column in &args.sort {
        screener.toggle_sort(column);
    }
    screener.set_page_size(PageSize::new(args.page_size)?);

    let mut warnings = Vec::new();
    let (listing, _) = screener.refresh().await;
    if args.page > 1 && listing == Applied::Updated {
        let landed = screener.go_to_page(args.page);
        if landed != args.page {
            warnings.push(format!(
                "page {} is past the last page, showing page {landed}",
                args.page
            ));
        }
        if landed > 1 {
            screener.refresh_listing().await;
        }
    }
    Ok(warnings)
}

pub(super) fn stock_table(records: &[StockRecord]) -> Table {
    let mut table = Table::new([
        "Id", "Ticker", "Company", "Exchange", "Sector", "Price", "Market Cap", "P/E",
    ]);
    for record in records {
        table.push_row(vec![
            record.id.to_string(),
            record.ticker.clone(),
            record.company_name.clone().unwrap_or_default(),
            record.exchange_code.clone().unwrap_or_default(),
            record.sector_name.clone().unwrap_or_default(),
            format_decimal(record.price),
            format_market_cap(record.market_cap),
            format_decimal(record.pe_ratio),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sectorscope_core::{ClientConfig, RestApi, ScriptedHttpClient, ScriptedReply};

    use super::*;

    fn listing(page: u32, sort: &[&str]) -> ListingArgs {
        ListingArgs {
            filters: FilterArgs::default(),
            page,
            page_size: 30,
            ordering: None,
            sort: sort.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    fn screener(client: &ScriptedHttpClient) -> ScreenerController<RestApi> {
        ScreenerController::new(RestApi::with_http_client(
            ClientConfig::default(),
            Arc::new(client.clone()),
        ))
    }

    #[test]
    fn rejects_unknown_price_bucket() {
        let mut screener = screener(&ScriptedHttpClient::new());
        let filters = FilterArgs {
            price: Some(String::from("Under $6")),
            ..FilterArgs::default()
        };

        let error = apply_filters(&mut screener, &filters).expect_err("not in catalog");
        assert_eq!(error.exit_code(), 2);
    }

    #[tokio::test]
    async fn page_past_the_end_lands_on_last_page() {
        let client = ScriptedHttpClient::new()
            .route(
                "/stocks/",
                ScriptedReply::json(200, r#"{"count": 45, "results": [{"id": 1, "ticker": "A"}]}"#),
            )
            .route("/filtered-stats/", ScriptedReply::json(200, "{}"));
        let mut screener = screener(&client);

        let warnings = load_page(&mut screener, &listing(9, &[]))
            .await
            .expect("valid arguments");

        assert_eq!(screener.pagination().page(), 2);
        assert_eq!(warnings.len(), 1);
        assert_eq!(client.request_count("/stocks/"), 2);
    }

    #[tokio::test]
    async fn repeated_sort_flag_flips_direction() {
        let client = ScriptedHttpClient::new()
            .route("/stocks/", ScriptedReply::json(200, r#"{"count": 0, "results": []}"#))
            .route("/filtered-stats/", ScriptedReply::json(200, "{}"));
        let mut screener = screener(&client);

        load_page(&mut screener, &listing(1, &["price", "price"]))
            .await
            .expect("valid arguments");

        assert_eq!(screener.filters().ordering, "-price");
        let url = client
            .requests()
            .into_iter()
            .find(|request| request.path().ends_with("/stocks/"))
            .map(|request| request.url)
            .unwrap_or_default();
        assert!(url.contains("ordering=-price"), "{url}");
    }
}
