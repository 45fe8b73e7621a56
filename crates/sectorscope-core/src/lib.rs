//! # Sectorscope Core
//!
//! Headless client for a stock screener and sector classifier backed by a
//! read-only REST API.
//!
//! ## Overview
//!
//! - **Filter state** for the screener and the classifier's scoped views
//! - **Pure query building** from filters and pagination
//! - **Fetch coordination** with generation tickets so stale responses never win
//! - **Selection and CSV export** of listing rows
//! - **Drill-down navigation** from sectors to fund parameters
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | `MarketApi` trait and the REST implementation |
//! | [`cache`] | Optional response cache keyed by URL |
//! | [`classifier`] | Drill-down controller |
//! | [`config`] | Client configuration from the environment |
//! | [`csv_export`] | Portfolio CSV encoder and file export |
//! | [`domain`] | Backend payloads and value types |
//! | [`error`] | Validation and configuration errors |
//! | [`fetch`] | Failure taxonomy, tickets and fetch slots |
//! | [`filter_store`] | Screener and scoped filter state |
//! | [`format`] | Display helpers for tables |
//! | [`fund_params`] | Fund parameter model, presets and validation |
//! | [`http_client`] | Transport abstraction (reqwest and scripted) |
//! | [`pagination`] | Page size and page clamping |
//! | [`query`] | Query parameter builders |
//! | [`screener`] | Screener controller |
//! | [`selection`] | Selected record ids |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sectorscope_core::{ClientConfig, FilterKey, RestApi, ScreenerController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = RestApi::from_config(ClientConfig::from_env()?);
//!     let mut screener = ScreenerController::new(api);
//!
//!     screener.set_filter(FilterKey::PriceFilter, "Under $5");
//!     screener.refresh().await;
//!
//!     for record in screener.records() {
//!         println!("{} {:?}", record.ticker, record.price);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐   ┌──────────────────────┐
//! │ ScreenerController   │   │ ClassifierController │
//! └──────────┬───────────┘   └──────────┬───────────┘
//!            │  filters → query builder │
//!            ▼                          ▼
//! ┌─────────────────────────────────────────────────┐
//! │ FetchSlot (ticket per request, latest wins)     │
//! └──────────────────────┬──────────────────────────┘
//!                        ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ MarketApi       │────▶│ HttpClient       │
//! │ (RestApi)       │     │ (reqwest/script) │
//! └─────────────────┘     └──────────────────┘
//! ```

pub mod api;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod csv_export;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod filter_store;
pub mod format;
pub mod fund_params;
pub mod http_client;
pub mod pagination;
pub mod query;
pub mod screener;
pub mod selection;

// Backend access
pub use api::{ApiFuture, MarketApi, RestApi};
pub use cache::ResponseCache;
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
    ScriptedHttpClient, ScriptedReply,
};

// Controllers
pub use classifier::{ClassifierController, DrillDownState, Transition};
pub use screener::{PendingFetch, ScreenerController};

// State containers
pub use filter_store::{
    industry_suggestions, ClassifierFilters, FilterKey, FilterState, FilterStore, ScopeFilterKey,
    DEFAULT_ORDERING,
};
pub use pagination::{PageSize, PaginationState, DEFAULT_PAGE_SIZE, PAGE_SIZES};
pub use selection::SelectionSet;

// Fetch coordination
pub use fetch::{Applied, FetchError, FetchKind, FetchSlot, RequestGate, Ticket};

// Domain models
pub use domain::{
    market_cap_value, CapUnit, CompanyKey, CompanySummary, CountryBreakdown, DatabaseStats,
    DateRange, ExchangeBreakdown, ExchangeOption, FilterOptions, FilteredStats, FundStrategy,
    HistoryRequest, HistorySpan, HistoryWindow, IndustryBreakdown, IndustryCount, IndustryDetail,
    IndustryOption, IndustrySort, IndustrySortKey, LatestPrice, PriceChange, PriceFilter,
    PriceHistory, PricePoint, ProfileMetadata, RecordId, SectorBreakdown, SectorCounts,
    SectorDetail, SectorIndustries, SectorIndustry, SectorOption, SortDirection, SortOrder,
    StockPage, StockProfile, StockRecord, StrategyInfo, StrategySelection, Ticker,
    COMPANIES_PER_FUND, MAX_STRATEGIES, OVER_PRICE_STEPS, UNDER_PRICE_STEPS,
};

// Export and fund parameters
pub use csv_export::{
    export_filename, portfolio_columns, CsvColumn, CsvEncoder, CsvExport, CsvValue, ExportError,
    QuotePolicy, DEFAULT_EXPORT_PREFIX,
};
pub use fund_params::{
    parse_currency, smart_weights, FundParameters, Preset, Rebalancing, SmartWeights, Validation,
    ValidationIssue,
};

// Configuration and errors
pub use config::{ClientConfig, DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_MS, MAX_CACHE_TTL_SECS};
pub use error::{ConfigError, ValidationError};
