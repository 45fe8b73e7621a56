use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use super::records::{lenient_number, StockRecord};
use super::ticker::Ticker;
use crate::ValidationError;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestPrice {
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(default, deserialize_with = "lenient_number")]
    pub close_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub open_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub high_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub low_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub adjusted_close: Option<f64>,
    #[serde(default)]
    pub volume: Option<u64>,
}

/// Change between the two most recent closes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    #[serde(default)]
    pub absolute: Option<f64>,
    #[serde(default)]
    pub percent: Option<f64>,
}

/// Extent of the stored price history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySpan {
    #[serde(default, with = "iso_date::option")]
    pub available_from: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub latest_date: Option<Date>,
    #[serde(default)]
    pub high_close: Option<f64>,
    #[serde(default)]
    pub low_close: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    #[serde(default)]
    pub prices_last_synced_at: Option<String>,
}

/// Enriched company profile (`GET /stocks/profile/`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockProfile {
    pub stock: StockRecord,
    #[serde(default)]
    pub latest_price: Option<LatestPrice>,
    #[serde(default)]
    pub price_change: PriceChange,
    #[serde(default)]
    pub history: HistorySpan,
    #[serde(default)]
    pub metadata: ProfileMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(default, deserialize_with = "lenient_number")]
    pub open_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub high_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub low_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub close_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub adjusted_close: Option<f64>,
    #[serde(default)]
    pub volume: Option<u64>,
}

impl PricePoint {
    /// Close used for charting, falling back to the adjusted close.
    pub fn chart_close(&self) -> Option<f64> {
        self.close_price.or(self.adjusted_close)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(with = "iso_date")]
    pub start: Date,
    #[serde(with = "iso_date")]
    pub end: Date,
}

/// Daily price series (`GET /stocks/history/`), oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    #[serde(default)]
    pub stock: String,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub results: Vec<PricePoint>,
    #[serde(default)]
    pub range: Option<DateRange>,
}

impl PriceHistory {
    /// Points no older than `window` days before the last point.
    pub fn trailing(&self, window: HistoryWindow) -> &[PricePoint] {
        let HistoryWindow::Days(days) = window else {
            return &self.results;
        };
        let Some(last) = self.results.last() else {
            return &self.results;
        };
        let start = last.date - Duration::days(i64::from(days));
        let first_inside = self.results.partition_point(|point| point.date < start);
        &self.results[first_inside..]
    }
}

/// Span of history requested from the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HistoryWindow {
    #[default]
    Max,
    Days(u32),
}

impl HistoryWindow {
    /// Chart presets: 1M, 3M, 6M, 1Y, 5Y and MAX.
    pub const PRESETS: [(&'static str, Self); 6] = [
        ("1M", Self::Days(30)),
        ("3M", Self::Days(90)),
        ("6M", Self::Days(180)),
        ("1Y", Self::Days(365)),
        ("5Y", Self::Days(1825)),
        ("MAX", Self::Max),
    ];

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("max") {
            return Ok(Self::Max);
        }
        if let Some((_, window)) = Self::PRESETS
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(trimmed))
        {
            return Ok(*window);
        }
        match trimmed.parse::<u32>() {
            Ok(days) if days > 0 => Ok(Self::Days(days)),
            _ => Err(ValidationError::InvalidHistoryWindow {
                value: input.to_owned(),
            }),
        }
    }
}

impl Display for HistoryWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Max => f.write_str("max"),
            Self::Days(days) => write!(f, "{days}"),
        }
    }
}

impl FromStr for HistoryWindow {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HistoryWindow {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HistoryWindow> for String {
    fn from(value: HistoryWindow) -> Self {
        value.to_string()
    }
}

/// Lookup key for profile and history requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompanyKey {
    pub ticker: Ticker,
    pub exchange: Option<String>,
}

impl CompanyKey {
    pub fn new(ticker: &str, exchange: Option<&str>) -> Result<Self, ValidationError> {
        Ok(Self {
            ticker: Ticker::parse(ticker)?,
            exchange: exchange
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_owned),
        })
    }
}

/// Parameters of a history request. An explicit `start` wins over `window`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub company: CompanyKey,
    pub window: HistoryWindow,
    pub start: Option<Date>,
    pub end: Option<Date>,
    pub limit: Option<u32>,
}

impl HistoryRequest {
    pub fn new(company: CompanyKey) -> Self {
        Self {
            company,
            window: HistoryWindow::Max,
            start: None,
            end: None,
            limit: None,
        }
    }

    pub fn with_window(mut self, window: HistoryWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_start(mut self, start: Date) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: Date) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit).filter(|limit| *limit > 0);
        self
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn parses_profile_payload() {
        let profile: StockProfile = serde_json::from_str(
            r#"{
                "stock": {"id": 1, "ticker": "NVMI", "company_name": "Nova Ltd"},
                "latest_price": {"date": "2024-05-03", "close_price": 181.2, "volume": 120000},
                "price_change": {"absolute": 2.5, "percent": 1.4},
                "history": {"available_from": "2019-01-02", "latest_date": "2024-05-03",
                            "high_close": 190.0, "low_close": 20.1},
                "metadata": {"prices_last_synced_at": "2024-05-04T02:00:00Z"}
            }"#,
        )
        .expect("profile should parse");

        let latest = profile.latest_price.expect("latest price");
        assert_eq!(latest.date, date!(2024 - 05 - 03));
        assert_eq!(profile.history.available_from, Some(date!(2019 - 01 - 02)));
        assert_eq!(profile.price_change.percent, Some(1.4));
    }

    #[test]
    fn empty_history_payload_parses() {
        let history: PriceHistory =
            serde_json::from_str(r#"{"stock": "NVMI", "exchange": null, "results": [], "count": 0}"#)
                .expect("history should parse");
        assert!(history.results.is_empty());
        assert!(history.range.is_none());
    }

    #[test]
    fn trailing_window_counts_back_from_last_point() {
        let history: PriceHistory = serde_json::from_str(
            r#"{
                "stock": "X",
                "count": 3,
                "results": [
                    {"date": "2024-01-01", "close_price": 1.0},
                    {"date": "2024-03-01", "close_price": 2.0},
                    {"date": "2024-03-20", "close_price": 3.0}
                ]
            }"#,
        )
        .expect("history should parse");

        assert_eq!(history.trailing(HistoryWindow::Days(30)).len(), 2);
        assert_eq!(history.trailing(HistoryWindow::Max).len(), 3);
    }

    #[test]
    fn window_accepts_presets_days_and_max() {
        assert_eq!(HistoryWindow::parse("MAX").expect("max"), HistoryWindow::Max);
        assert_eq!(HistoryWindow::parse("1y").expect("preset"), HistoryWindow::Days(365));
        assert_eq!(HistoryWindow::parse("45").expect("days"), HistoryWindow::Days(45));
        assert!(HistoryWindow::parse("0").is_err());
        assert!(HistoryWindow::parse("forever").is_err());
    }
}
