//! Screener view controller.
//!
//! Owns the filter store, pagination, selection and the listing, statistics
//! and filter-option slots. Every filter mutation returns the view to page
//! one. Fetches are two-phase: `begin_*` issues a ticket and the query,
//! `apply_*` applies the result if the ticket is still current, so callers
//! may run requests concurrently without a slow response winning.

use std::sync::Arc;

use time::Date;

use crate::api::MarketApi;
use crate::csv_export::{CsvExport, ExportError};
use crate::fetch::{Applied, FetchError, FetchKind, FetchSlot, Ticket};
use crate::query::{listing_query, stats_query, QueryParams};
use crate::{
    FilterKey, FilterOptions, FilterState, FilterStore, FilteredStats, IndustryOption, PageSize,
    PaginationState, RecordId, SelectionSet, SortOrder, StockPage, StockRecord,
};

/// Ticket and query for a request that has been issued but not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub ticket: Ticket,
    pub query: QueryParams,
}

pub struct ScreenerController<A: MarketApi> {
    api: Arc<A>,
    filters: FilterStore,
    pagination: PaginationState,
    selection: SelectionSet,
    listing: FetchSlot<StockPage>,
    stats: FetchSlot<FilteredStats>,
    options: FetchSlot<FilterOptions>,
    page_clamped: bool,
}

impl<A: MarketApi> ScreenerController<A> {
    pub fn new(api: A) -> Self {
        Self::with_shared_api(Arc::new(api))
    }

    pub fn with_shared_api(api: Arc<A>) -> Self {
        Self {
            api,
            filters: FilterStore::new(),
            pagination: PaginationState::default(),
            selection: SelectionSet::new(),
            listing: FetchSlot::new(FetchKind::Listing),
            stats: FetchSlot::new(FetchKind::Stats),
            options: FetchSlot::new(FetchKind::FilterOptions),
            page_clamped: false,
        }
    }

    pub fn api(&self) -> Arc<A> {
        Arc::clone(&self.api)
    }

    pub fn filters(&self) -> &FilterState {
        self.filters.get()
    }

    pub fn sort_indicator(&self) -> Option<SortOrder> {
        self.filters.sort_indicator()
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn listing(&self) -> &FetchSlot<StockPage> {
        &self.listing
    }

    pub fn stats(&self) -> &FetchSlot<FilteredStats> {
        &self.stats
    }

    pub fn options(&self) -> &FetchSlot<FilterOptions> {
        &self.options
    }

    /// Records of the current page, empty before the first successful load.
    pub fn records(&self) -> &[StockRecord] {
        self.listing
            .data()
            .map_or(&[][..], |page| page.results.as_slice())
    }

    pub fn set_filter(&mut self, key: FilterKey, value: &str) {
        self.filters.set(key, value);
        self.pagination.reset_page();
    }

    pub fn reset_filters(&mut self) {
        self.filters.reset();
        self.pagination.reset_page();
    }

    pub fn toggle_sort(&mut self, column: &str) -> SortOrder {
        let order = self.filters.toggle_sort(column);
        self.pagination.reset_page();
        order
    }

    pub fn apply_industry_suggestion(&mut self, industry: &str) {
        self.filters.apply_industry_suggestion(industry);
        self.pagination.reset_page();
    }

    /// Industry suggestions for `text` from the loaded filter options.
    pub fn industry_suggestions(&self, text: &str) -> Vec<&IndustryOption> {
        self.options
            .data()
            .map(|options| crate::industry_suggestions(options, text))
            .unwrap_or_default()
    }

    pub fn go_to_page(&mut self, page: u32) -> u32 {
        self.pagination.go_to_page(page)
    }

    pub fn next_page(&mut self) -> bool {
        self.pagination.next_page()
    }

    pub fn previous_page(&mut self) -> bool {
        self.pagination.previous_page()
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.pagination.set_page_size(page_size);
    }

    pub fn toggle_selection(&mut self, id: RecordId) -> bool {
        self.selection.toggle(id)
    }

    /// Select-all control for the current page.
    pub fn select_all_visible(&mut self) {
        let visible: Vec<RecordId> = self.records().iter().map(|r| r.id.clone()).collect();
        self.selection.select_all_visible(&visible);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Leaves the screener view: drops the selection and any pending results.
    pub fn leave(&mut self) {
        self.selection.clear();
        self.listing.invalidate();
        self.stats.invalidate();
    }

    pub fn begin_listing(&mut self) -> PendingFetch {
        PendingFetch {
            ticket: self.listing.begin(),
            query: listing_query(self.filters.get(), &self.pagination),
        }
    }

    /// Applies a listing result. A new total that pushes the current page
    /// out of range clamps the page and flags a refetch.
    pub fn apply_listing(
        &mut self,
        ticket: Ticket,
        result: Result<StockPage, FetchError>,
    ) -> Applied {
        let count = result.as_ref().ok().map(|page| page.count);
        let applied = self.listing.apply(ticket, result);
        if let (Applied::Updated, Some(count)) = (applied, count) {
            if self.pagination.set_count(count) {
                tracing::debug!(
                    count,
                    page = self.pagination.page(),
                    "page out of range after count change, clamped"
                );
                self.page_clamped = true;
            }
        }
        applied
    }

    pub fn begin_stats(&mut self) -> PendingFetch {
        PendingFetch {
            ticket: self.stats.begin(),
            query: stats_query(self.filters.get()),
        }
    }

    pub fn apply_stats(
        &mut self,
        ticket: Ticket,
        result: Result<FilteredStats, FetchError>,
    ) -> Applied {
        self.stats.apply(ticket, result)
    }

    /// Loads the filter vocabulary once; later calls are no-ops unless the
    /// first load failed.
    pub async fn load_options(&mut self) -> Applied {
        if self.options.data().is_some() {
            return Applied::Updated;
        }
        let ticket = self.options.begin();
        let api = self.api();
        let result = api.filter_options().await;
        self.options.apply(ticket, result)
    }

    /// Fetches the current page and the filtered statistics concurrently.
    pub async fn refresh(&mut self) -> (Applied, Applied) {
        let listing = self.begin_listing();
        let stats = self.begin_stats();
        let api = self.api();

        let (page, aggregates) = tokio::join!(
            api.list_stocks(listing.query),
            api.filtered_stats(stats.query)
        );

        let listing_applied = self.apply_listing(listing.ticket, page);
        let stats_applied = self.apply_stats(stats.ticket, aggregates);

        if std::mem::take(&mut self.page_clamped) {
            let retry = self.begin_listing();
            let page = api.list_stocks(retry.query).await;
            return (self.apply_listing(retry.ticket, page), stats_applied);
        }
        (listing_applied, stats_applied)
    }

    /// Fetches the current page only.
    pub async fn refresh_listing(&mut self) -> Applied {
        let api = self.api();
        let pending = self.begin_listing();
        let page = api.list_stocks(pending.query).await;
        let applied = self.apply_listing(pending.ticket, page);

        if std::mem::take(&mut self.page_clamped) {
            let retry = self.begin_listing();
            let page = api.list_stocks(retry.query).await;
            return self.apply_listing(retry.ticket, page);
        }
        applied
    }

    /// Selected records of the current page rendered as CSV.
    pub fn export_selected(&self, prefix: &str, date: Date) -> Result<CsvExport, ExportError> {
        let records = self.selection.selected_from(self.records());
        CsvExport::portfolio(&records, prefix, date)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::http_client::{ScriptedHttpClient, ScriptedReply};
    use crate::{ClientConfig, RestApi};

    fn page_json(count: u64, ids: &[u64]) -> String {
        let rows: Vec<String> = ids
            .iter()
            .map(|id| format!(r#"{{"id": {id}, "ticker": "T{id}", "company_name": "Co {id}"}}"#))
            .collect();
        format!(r#"{{"count": {count}, "results": [{}]}}"#, rows.join(","))
    }

    fn controller(client: &ScriptedHttpClient) -> ScreenerController<RestApi> {
        ScreenerController::new(RestApi::with_http_client(
            ClientConfig::default(),
            Arc::new(client.clone()),
        ))
    }

    #[test]
    fn filter_mutations_return_to_first_page() {
        let client = ScriptedHttpClient::new();
        let mut screener = controller(&client);
        let ticket = screener.begin_listing().ticket;
        screener.apply_listing(ticket, Ok(StockPage { results: Vec::new(), count: 300 }));
        screener.go_to_page(4);

        screener.set_filter(FilterKey::Country, "Israel");
        assert_eq!(screener.pagination().page(), 1);

        screener.go_to_page(3);
        screener.toggle_sort("price");
        assert_eq!(screener.pagination().page(), 1);

        screener.go_to_page(2);
        screener.reset_filters();
        assert_eq!(screener.pagination().page(), 1);
    }

    #[tokio::test]
    async fn refresh_loads_listing_and_stats() {
        let client = ScriptedHttpClient::new()
            .route("/stocks/", ScriptedReply::json(200, page_json(2, &[1, 2])))
            .route(
                "/filtered-stats/",
                ScriptedReply::json(200, r#"{"total_companies": 2}"#),
            );
        let mut screener = controller(&client);

        let (listing, stats) = screener.refresh().await;

        assert_eq!(listing, Applied::Updated);
        assert_eq!(stats, Applied::Updated);
        assert_eq!(screener.records().len(), 2);
        assert_eq!(screener.stats().data().map(|s| s.total_companies), Some(2));
    }

    #[tokio::test]
    async fn shrinking_total_clamps_page_and_refetches() {
        let client = ScriptedHttpClient::new()
            .route("/stocks/", ScriptedReply::json(200, page_json(40, &[1])))
            .route("/filtered-stats/", ScriptedReply::json(200, "{}"));
        let mut screener = controller(&client);
        let ticket = screener.begin_listing().ticket;
        screener.apply_listing(ticket, Ok(StockPage { results: Vec::new(), count: 145 }));
        screener.go_to_page(5);

        screener.refresh().await;

        assert_eq!(screener.pagination().page(), 2);
        assert_eq!(client.request_count("/stocks/"), 2);
        let last = client.requests().last().map(|r| r.url.clone()).unwrap_or_default();
        assert!(last.contains("page=2"), "{last}");
    }

    #[tokio::test]
    async fn options_load_once() {
        let client = ScriptedHttpClient::new().route(
            "/stocks/filter_options/",
            ScriptedReply::json(
                200,
                r#"{"industries": [{"id": 1, "name": "Software", "sector__name": "IT"}]}"#,
            ),
        );
        let mut screener = controller(&client);

        screener.load_options().await;
        screener.load_options().await;

        assert_eq!(client.request_count("/stocks/filter_options/"), 1);
        assert_eq!(screener.industry_suggestions("soft").len(), 1);
    }

    #[tokio::test]
    async fn select_all_then_export_selected_rows() {
        let client = ScriptedHttpClient::new()
            .route("/stocks/", ScriptedReply::json(200, page_json(3, &[1, 2, 3])))
            .route("/filtered-stats/", ScriptedReply::json(200, "{}"));
        let mut screener = controller(&client);
        screener.refresh().await;

        screener.select_all_visible();
        screener.toggle_selection(RecordId::from(2));

        let export = screener
            .export_selected("portfolio", date!(2024 - 06 - 30))
            .expect("two rows selected");
        assert_eq!(export.rows, 2);
        assert!(export.contents.contains("T1,\"Co 1\""));
        assert!(!export.contents.contains("T2,"));

        screener.leave();
        assert!(screener.selection().is_empty());
        assert!(screener
            .export_selected("portfolio", date!(2024 - 06 - 30))
            .is_err());
    }
}
