use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Opaque record identifier assigned by the backend.
///
/// The backend emits integer primary keys; string keys are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(number) => Ok(Self(number.to_string())),
            Value::String(text) if !text.is_empty() => Ok(Self(text)),
            other => Err(D::Error::custom(format!(
                "record id must be a number or non-empty string, got {other}"
            ))),
        }
    }
}

/// Accepts `12.5`, `"12.5"` or `null` for decimal fields.
///
/// Decimal columns the backend does not convert explicitly arrive as strings.
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => Ok(number.as_f64()),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid decimal '{text}'")))
        }
        Some(other) => Err(D::Error::custom(format!("expected decimal, got {other}"))),
    }
}

/// One row of the screener listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: RecordId,
    pub ticker: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub market_cap: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub pe_ratio: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub peg_ratio: Option<f64>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub exchange_name: Option<String>,
    #[serde(default)]
    pub exchange_code: Option<String>,
    #[serde(default)]
    pub sector_name: Option<String>,
    #[serde(default)]
    pub industry_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub fair_value: Option<f64>,
    #[serde(default)]
    pub fair_value_label: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub fair_value_upside: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub analyst_target: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub analyst_upside: Option<f64>,
    #[serde(default)]
    pub health_label: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price_change_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub dividend_yield: Option<f64>,
}

impl StockRecord {
    /// Minimal record, mostly useful for fixtures.
    pub fn new(id: impl Into<RecordId>, ticker: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ticker: ticker.into(),
            company_name: None,
            market_cap: None,
            price: None,
            pe_ratio: None,
            peg_ratio: None,
            country: None,
            exchange_name: None,
            exchange_code: None,
            sector_name: None,
            industry_name: None,
            fair_value: None,
            fair_value_label: None,
            fair_value_upside: None,
            analyst_target: None,
            analyst_upside: None,
            health_label: None,
            price_change_percent: None,
            dividend_yield: None,
        }
    }

    pub fn with_company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self
    }

    pub fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.market_cap = Some(market_cap);
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }
}

/// Paginated listing payload from `GET /stocks/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockPage {
    #[serde(default)]
    pub results: Vec<StockRecord>,
    #[serde(default)]
    pub count: u64,
}

/// Company row embedded in aggregate responses when `include_companies=true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub ticker: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub market_cap: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub pe_ratio: Option<f64>,
    #[serde(default)]
    pub health_label: Option<String>,
    #[serde(default)]
    pub exchange_name: Option<String>,
    #[serde(default)]
    pub exchange_code: Option<String>,
    #[serde(default)]
    pub sector_name: Option<String>,
    #[serde(default)]
    pub industry_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl CompanySummary {
    /// Exchange identifier for profile lookups, preferring the code.
    pub fn exchange_key(&self) -> Option<&str> {
        self.exchange_code
            .as_deref()
            .or(self.exchange_name.as_deref())
            .filter(|value| !value.is_empty())
    }
}
