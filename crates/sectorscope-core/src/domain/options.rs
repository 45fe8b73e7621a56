use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeOption {
    #[serde(default)]
    pub id: Value,
    pub code: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorOption {
    #[serde(default)]
    pub id: Value,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryOption {
    #[serde(default)]
    pub id: Value,
    pub name: String,
    #[serde(rename = "sector__name", default)]
    pub sector_name: Option<String>,
}

/// Vocabulary for the categorical filters (`GET /stocks/filter_options/`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(default)]
    pub exchanges: Vec<ExchangeOption>,
    #[serde(default)]
    pub sectors: Vec<SectorOption>,
    #[serde(default)]
    pub industries: Vec<IndustryOption>,
    #[serde(default)]
    pub countries: Vec<String>,
}

impl FilterOptions {
    /// Display name for an exchange code, falling back to the code itself.
    pub fn exchange_label<'a>(&'a self, code: &'a str) -> &'a str {
        self.exchanges
            .iter()
            .find(|exchange| exchange.code == code)
            .map(|exchange| exchange.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(code)
    }

    /// Industries belonging to `sector`, in vocabulary order.
    pub fn industries_in<'a>(&'a self, sector: &'a str) -> impl Iterator<Item = &'a IndustryOption> {
        self.industries
            .iter()
            .filter(move |industry| industry.sector_name.as_deref() == Some(sector))
    }
}
