//! Behavior-driven tests for the screener view
//!
//! These tests verify HOW filter edits, sorting, paging and selection
//! translate into backend queries and visible state.

use std::sync::Arc;
use std::time::Duration;

use sectorscope_core::{
    query::{listing_query, stats_query},
    Applied, ClientConfig, FilterKey, FilterStore, MarketApi, PageSize, PaginationState, RecordId, RestApi,
    ScreenerController, ScriptedHttpClient, ScriptedReply, SelectionSet, StockPage,
};

fn screener(client: &ScriptedHttpClient) -> ScreenerController<RestApi> {
    ScreenerController::new(RestApi::with_http_client(
        ClientConfig::default(),
        Arc::new(client.clone()),
    ))
}

fn page_with_count(screener: &mut ScreenerController<RestApi>, count: u64) {
    let pending = screener.begin_listing();
    screener.apply_listing(
        pending.ticket,
        Ok(StockPage {
            results: Vec::new(),
            count,
        }),
    );
}

fn listing_body(tickers: &[&str]) -> String {
    let rows: Vec<String> = tickers
        .iter()
        .enumerate()
        .map(|(i, t)| format!(r#"{{"id": {}, "ticker": "{t}"}}"#, i + 1))
        .collect();
    format!(r#"{{"count": {}, "results": [{}]}}"#, tickers.len(), rows.join(","))
}

// =============================================================================
// Filters: Page Reset
// =============================================================================

#[test]
fn when_any_filter_changes_system_returns_to_first_page() {
    // Given: A screener on page 3 of 10
    let client = ScriptedHttpClient::new();
    let mut screener = screener(&client);
    page_with_count(&mut screener, 300);

    for key in [
        FilterKey::Search,
        FilterKey::Exchange,
        FilterKey::Sector,
        FilterKey::Industry,
        FilterKey::Country,
        FilterKey::PriceFilter,
        FilterKey::MarketCapMin,
        FilterKey::MarketCapMax,
        FilterKey::MarketCapMinUnit,
        FilterKey::MarketCapMaxUnit,
        FilterKey::Ordering,
    ] {
        screener.go_to_page(3);

        // When: The user edits the filter
        screener.set_filter(key, "B");

        // Then: The page is reset
        assert_eq!(screener.pagination().page(), 1, "{key} did not reset the page");
    }
}

#[test]
fn when_only_the_page_changes_system_keeps_filters() {
    // Given: A filtered screener
    let client = ScriptedHttpClient::new();
    let mut screener = screener(&client);
    screener.set_filter(FilterKey::Exchange, "NASDAQ");
    page_with_count(&mut screener, 100);

    // When: The user pages forward
    assert!(screener.next_page());

    // Then: The page moves and the filters stay
    assert_eq!(screener.pagination().page(), 2);
    assert_eq!(screener.filters().exchange, "NASDAQ");
}

// =============================================================================
// Query Builder: Price and Market Cap
// =============================================================================

#[test]
fn when_price_bucket_is_chosen_system_sends_exactly_one_bound() {
    let mut store = FilterStore::new();

    for bucket in ["Under $1", "Under $15", "Under $400", "Over $1", "Over $50", "Over $400"] {
        // When: Any catalog bucket is applied
        store.set(FilterKey::PriceFilter, bucket);
        let params = stats_query(store.get());

        // Then: Exactly one of the price keys is present
        let min = params.contains_key("price_min");
        let max = params.contains_key("price_max");
        assert!(min ^ max, "{bucket} produced min={min} max={max}");
    }

    store.set(FilterKey::PriceFilter, "Any");
    let params = stats_query(store.get());
    assert!(!params.contains_key("price_min") && !params.contains_key("price_max"));
}

#[test]
fn when_market_cap_text_is_blank_or_invalid_system_omits_the_key() {
    let mut store = FilterStore::new();

    for raw in ["", "   ", "abc", "1e", "-", "1.2.3"] {
        // When: The min field holds unusable text and max is valid
        store.set(FilterKey::MarketCapMin, raw);
        store.set(FilterKey::MarketCapMax, "2");
        store.set(FilterKey::MarketCapMaxUnit, "B");
        let params = stats_query(store.get());

        // Then: The min key is omitted rather than sent as zero
        assert!(!params.contains_key("market_cap_min"), "'{raw}' leaked into the query");
        assert_eq!(params.get("market_cap_max"), Some("2000000000"));
    }
}

// =============================================================================
// Sorting
// =============================================================================

#[test]
fn when_same_column_is_toggled_twice_system_returns_to_original_ordering() {
    // Given: The listing is ordered by market cap
    let client = ScriptedHttpClient::new();
    let mut screener = screener(&client);
    screener.set_filter(FilterKey::Ordering, "market_cap");

    // When: The same column header is toggled twice
    screener.toggle_sort("market_cap");
    let after_first = screener.filters().ordering.clone();
    screener.toggle_sort("market_cap");

    // Then: The ordering flips to descending and back
    assert_eq!(after_first, "-market_cap");
    assert_eq!(screener.filters().ordering, "market_cap");
}

#[test]
fn when_filters_are_reset_system_restores_default_ordering() {
    let client = ScriptedHttpClient::new();
    let mut screener = screener(&client);
    screener.toggle_sort("price");
    assert!(screener.sort_indicator().is_some());

    screener.reset_filters();

    assert_eq!(screener.filters().ordering, "ticker");
    assert!(screener.sort_indicator().is_none());
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn when_select_all_is_pressed_on_a_fully_selected_page_system_clears() {
    // Given: Every record on the page is selected
    let page: Vec<RecordId> = (1..=4).map(RecordId::from).collect();
    let mut selection = SelectionSet::new();
    selection.select_all_visible(&page);
    assert_eq!(selection.len(), 4);

    // When: Select-all is pressed again
    selection.select_all_visible(&page);

    // Then: The selection is cleared, never grown beyond the page
    assert!(selection.is_empty());
}

#[tokio::test]
async fn when_select_all_follows_an_off_page_pick_system_keeps_only_the_page() {
    let client = ScriptedHttpClient::new()
        .route("/stocks/", ScriptedReply::json(200, listing_body(&["AAA", "BBB"])))
        .route("/filtered-stats/", ScriptedReply::json(200, "{}"));
    let mut screener = screener(&client);
    screener.refresh().await;
    screener.toggle_selection(RecordId::from(77));

    screener.select_all_visible();

    assert_eq!(screener.selection().len(), 2);
    assert!(!screener.selection().is_selected(&RecordId::from(77)));
}

// =============================================================================
// Pagination
// =============================================================================

#[test]
fn when_server_reports_145_rows_system_shows_five_pages_and_clamps_page_six() {
    // Given: Page size 30 and an exchange filter
    let mut store = FilterStore::new();
    store.set(FilterKey::Exchange, "NASDAQ");
    let mut pagination = PaginationState::new(PageSize::new(30).expect("menu size"));

    // When: The server reports 145 matches and page 6 is requested
    pagination.set_count(145);
    let landed = pagination.go_to_page(6);

    // Then: There are five pages and the request lands on the last one
    assert_eq!(pagination.total_pages(), 5);
    assert_eq!(landed, 5);
    let params = listing_query(store.get(), &pagination);
    assert_eq!(params.get("page"), Some("5"));
    assert_eq!(params.get("exchange"), Some("NASDAQ"));
    assert_eq!(pagination.visible_range(), Some((121, 145)));
}

#[test]
fn when_page_size_changes_system_returns_to_first_page() {
    let client = ScriptedHttpClient::new();
    let mut screener = screener(&client);
    page_with_count(&mut screener, 1_000);
    screener.go_to_page(7);

    screener.set_page_size(PageSize::new(100).expect("menu size"));

    assert_eq!(screener.pagination().page(), 1);
    assert!(PageSize::new(25).is_err());
}

// =============================================================================
// Fetch Ordering
// =============================================================================

#[tokio::test]
async fn when_an_older_listing_resolves_last_system_keeps_the_newer_result() {
    // Given: Q1 is slow and Q2 is fast
    let client = ScriptedHttpClient::new();
    client.enqueue(
        "/stocks/",
        ScriptedReply::json(200, listing_body(&["OLD"])).delayed(Duration::from_millis(60)),
    );
    client.enqueue(
        "/stocks/",
        ScriptedReply::json(200, listing_body(&["NEW"])).delayed(Duration::from_millis(5)),
    );
    let mut screener = screener(&client);

    // When: Q1 is issued, the filter changes and Q2 is issued before Q1 resolves
    let q1 = screener.begin_listing();
    screener.set_filter(FilterKey::Exchange, "NASDAQ");
    let q2 = screener.begin_listing();
    assert_ne!(q1.query, q2.query);

    let api = screener.api();
    let (first, second) = tokio::join!(api.list_stocks(q1.query), api.list_stocks(q2.query));

    // Then: Q2 applies as it arrives and the late Q1 is discarded
    assert_eq!(screener.apply_listing(q2.ticket, second), Applied::Updated);
    assert_eq!(screener.apply_listing(q1.ticket, first), Applied::Stale);
    assert_eq!(screener.records()[0].ticker, "NEW");
    assert!(!screener.listing().loading());
}
