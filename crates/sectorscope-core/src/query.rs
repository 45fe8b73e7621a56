//! Pure translation of filter and pagination state into backend query
//! parameters.
//!
//! Every builder returns a [`QueryParams`]; parameters are kept sorted so the
//! same state always encodes to the same query string (and cache key).
//!
//! | Builder | Endpoint |
//! |---------|----------|
//! | [`listing_query`] | `GET /stocks/` |
//! | [`stats_query`] | `GET /filtered-stats/` |
//! | [`sector_counts_query`] | `GET /stocks/sector-industry-counts/` |
//! | [`sector_detail_query`], [`industry_detail_query`], [`companies_query`] | `GET /filtered-stats/` |
//! | [`profile_query`], [`history_query`] | `GET /stocks/profile/`, `GET /stocks/history/` |

use std::collections::BTreeMap;

use crate::{
    market_cap_value, CapUnit, ClassifierFilters, CompanyKey, FilterState, HistoryRequest,
    PaginationState, PriceFilter,
};

/// Page size used when a view needs every company in a scope at once.
pub const COMPANY_LIST_PAGE_SIZE: u32 = 5_000;

/// Sorted query parameters for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_owned(), value.into());
    }

    /// Inserts `value` unless it is blank.
    pub fn insert_non_empty(&mut self, key: &str, value: &str) {
        if !value.trim().is_empty() {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Adds `dataset=<key>` when a dataset is configured.
    pub fn with_dataset(mut self, dataset: Option<&str>) -> Self {
        if let Some(dataset) = dataset {
            self.insert_non_empty("dataset", dataset);
        }
        self
    }

    /// Percent-encoded `k=v&k=v` string, without a leading `?`.
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Market caps are whole dollars; rounding drops float noise such as
/// `1.1 * 1e9 = 1100000000.0000002`.
fn dollars(value: f64) -> String {
    value.round().to_string()
}

fn insert_market_cap(
    params: &mut QueryParams,
    min: (&str, CapUnit),
    max: (&str, CapUnit),
) {
    if let Some(value) = market_cap_value(min.0, min.1) {
        params.insert("market_cap_min", dollars(value));
    }
    if let Some(value) = market_cap_value(max.0, max.1) {
        params.insert("market_cap_max", dollars(value));
    }
}

fn insert_price(params: &mut QueryParams, price: PriceFilter) {
    if let Some(min) = price.min_price() {
        params.insert("price_min", min.to_string());
    }
    if let Some(max) = price.max_price() {
        params.insert("price_max", max.to_string());
    }
}

/// Filter parameters for the aggregate statistics request. Carries no
/// pagination or ordering keys.
pub fn stats_query(filters: &FilterState) -> QueryParams {
    let mut params = QueryParams::new();
    params.insert_non_empty("search", &filters.search);
    params.insert_non_empty("exchange", &filters.exchange);
    params.insert_non_empty("sector", &filters.sector);
    params.insert_non_empty("industry", &filters.industry);
    params.insert_non_empty("country", &filters.country);
    insert_price(&mut params, filters.price_filter);
    insert_market_cap(
        &mut params,
        (&filters.market_cap_min, filters.market_cap_min_unit),
        (&filters.market_cap_max, filters.market_cap_max_unit),
    );
    params
}

/// Filter, ordering and page parameters for the record listing.
pub fn listing_query(filters: &FilterState, pagination: &PaginationState) -> QueryParams {
    let mut params = stats_query(filters);
    params.insert_non_empty("ordering", &filters.ordering);
    params.insert("page", pagination.page().to_string());
    params.insert("page_size", pagination.page_size().get().to_string());
    params
}

pub fn sector_counts_query(exchange: &str) -> QueryParams {
    let mut params = QueryParams::new();
    params.insert_non_empty("exchange", exchange);
    params
}

fn scoped_query(sector: &str, scope: &ClassifierFilters) -> QueryParams {
    let mut params = QueryParams::new();
    params.insert("sector", sector);
    params.insert_non_empty("exchange", &scope.exchange);
    insert_market_cap(
        &mut params,
        (&scope.market_cap_min, scope.market_cap_min_unit),
        (&scope.market_cap_max, scope.market_cap_max_unit),
    );
    params
}

/// Aggregates for one sector under the scoped filters.
pub fn sector_detail_query(sector: &str, scope: &ClassifierFilters) -> QueryParams {
    scoped_query(sector, scope)
}

/// Aggregates for one industry under the scoped filters.
pub fn industry_detail_query(sector: &str, industry: &str, scope: &ClassifierFilters) -> QueryParams {
    let mut params = scoped_query(sector, scope);
    params.insert("industry", industry);
    params
}

/// Full company list for a sector, or for one industry when `industry` is
/// given. Without an explicit industry the scoped industry filter applies.
pub fn companies_query(
    sector: &str,
    industry: Option<&str>,
    scope: &ClassifierFilters,
) -> QueryParams {
    let mut params = scoped_query(sector, scope);
    params.insert_non_empty("industry", industry.unwrap_or(scope.industry.as_str()));
    params.insert("page_size", COMPANY_LIST_PAGE_SIZE.to_string());
    params.insert("include_companies", "true");
    params
}

pub fn profile_query(company: &CompanyKey) -> QueryParams {
    let mut params = QueryParams::new();
    params.insert("ticker", company.ticker.as_str());
    if let Some(exchange) = &company.exchange {
        params.insert_non_empty("exchange", exchange);
    }
    params
}

/// History parameters. An explicit start date replaces the window.
pub fn history_query(request: &HistoryRequest) -> QueryParams {
    let mut params = profile_query(&request.company);
    match request.start {
        Some(start) => params.insert("start", start.to_string()),
        None => params.insert("window", request.window.to_string()),
    }
    if let Some(end) = request.end {
        params.insert("end", end.to_string());
    }
    if let Some(limit) = request.limit {
        params.insert("limit", limit.to_string());
    }
    params
}
