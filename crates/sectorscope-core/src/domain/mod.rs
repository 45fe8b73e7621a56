//! # Domain Models
//!
//! Typed payloads exchanged with the screener backend plus the small value
//! types the controllers are built from.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PriceFilter`] | `Any`, `Under $N` or `Over $N` price bucket |
//! | [`CapUnit`] | Market cap multiplier (M or B) |
//! | [`SortOrder`] | Decoded `ordering` parameter |
//! | [`StockRecord`] | One listing row |
//! | [`FilteredStats`] | Aggregates over the filtered set |
//! | [`SectorDetail`] / [`IndustryDetail`] | Drill-down headline figures |
//! | [`FilterOptions`] | Categorical filter vocabulary |
//! | [`StockProfile`] / [`PriceHistory`] | Company detail payloads |
//! | [`FundStrategy`] / [`StrategySelection`] | Fund construction choices |
//! | [`Ticker`] | Normalized ticker for lookups |
//!
//! Numeric fields are optional throughout: the backend returns `null` for
//! missing data and serializes some decimal columns as strings.

mod filters;
mod options;
mod profile;
mod records;
mod stats;
mod strategy;
mod ticker;

pub use filters::{
    market_cap_value, CapUnit, PriceFilter, SortDirection, SortOrder, OVER_PRICE_STEPS,
    UNDER_PRICE_STEPS,
};
pub use options::{ExchangeOption, FilterOptions, IndustryOption, SectorOption};
pub use profile::{
    CompanyKey, DateRange, HistoryRequest, HistorySpan, HistoryWindow, LatestPrice, PriceChange,
    PriceHistory, PricePoint, ProfileMetadata, StockProfile,
};
pub use records::{CompanySummary, RecordId, StockPage, StockRecord};
pub use stats::{
    CountryBreakdown, DatabaseStats, ExchangeBreakdown, FilteredStats, IndustryBreakdown,
    IndustryCount, IndustryDetail, IndustrySort, IndustrySortKey, SectorBreakdown, SectorCounts,
    SectorDetail, SectorIndustries, SectorIndustry, COMPANIES_PER_FUND,
};
pub use strategy::{FundStrategy, StrategyInfo, StrategySelection, MAX_STRATEGIES};
pub use ticker::Ticker;
