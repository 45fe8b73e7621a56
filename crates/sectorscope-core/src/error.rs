use thiserror::Error;

/// Validation errors for user-supplied screener and fund inputs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("page size {value} is not allowed, expected one of 10, 20, 30, 50, 100, 200")]
    InvalidPageSize { value: u32 },

    #[error("invalid price filter '{value}', expected 'Any', 'Under $N' or 'Over $N' from the catalog")]
    InvalidPriceFilter { value: String },
    #[error("market cap unit must be M or B: '{value}'")]
    InvalidCapUnit { value: String },
    #[error("unknown filter key '{value}'")]
    UnknownFilterKey { value: String },
    #[error("ordering cannot be empty")]
    EmptyOrdering,
    #[error("invalid industry sort '{value}', expected <count|total_market_cap|name>-<asc|desc>")]
    InvalidIndustrySort { value: String },

    #[error("unknown fund strategy '{value}'")]
    UnknownStrategy { value: String },
    #[error("unknown preset '{value}', expected conservative, balanced or aggressive")]
    UnknownPreset { value: String },
    #[error("unknown rebalancing frequency '{value}'")]
    UnknownRebalancing { value: String },

    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("invalid ticker character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },
    #[error("history window must be 'max' or a positive number of days: '{value}'")]
    InvalidHistoryWindow { value: String },
}

/// Errors raised while loading client configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("api base url cannot be empty")]
    EmptyBaseUrl,
    #[error("api base url must start with http:// or https://: '{value}'")]
    UnsupportedScheme { value: String },
    #[error("environment variable {name} must be a non-negative integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("cache ttl of {value}s exceeds the {max}s maximum")]
    CacheTtlTooLarge { value: u64, max: u64 },
}
