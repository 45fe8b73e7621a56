use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::records::{lenient_number, CompanySummary};
use crate::ValidationError;

/// Companies per simulated fund when sizing a sector or industry.
pub const COMPANIES_PER_FUND: u64 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorBreakdown {
    #[serde(rename = "sector__name", default)]
    pub sector_name: Option<String>,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryBreakdown {
    #[serde(rename = "industry__name", default)]
    pub industry_name: Option<String>,
    #[serde(rename = "sector__name", default)]
    pub sector_name: Option<String>,
    #[serde(default)]
    pub count: u64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_market_cap: Option<f64>,
}

impl IndustryBreakdown {
    pub fn display_name(&self) -> &str {
        self.industry_name.as_deref().unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeBreakdown {
    #[serde(rename = "exchange__name", default)]
    pub exchange_name: Option<String>,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryBreakdown {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub count: u64,
}

/// Aggregate statistics over the full filtered set (`GET /filtered-stats/`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredStats {
    #[serde(default)]
    pub total_companies: u64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_market_cap: Option<f64>,
    #[serde(default)]
    pub unique_sectors: u64,
    #[serde(default)]
    pub unique_industries: u64,
    #[serde(default)]
    pub unique_exchanges: u64,
    #[serde(default)]
    pub sector_breakdown: Vec<SectorBreakdown>,
    #[serde(default)]
    pub industry_breakdown: Vec<IndustryBreakdown>,
    #[serde(default)]
    pub exchange_breakdown: Vec<ExchangeBreakdown>,
    #[serde(default)]
    pub country_breakdown: Vec<CountryBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_filters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companies: Option<Vec<CompanySummary>>,
}

/// Per-sector company and industry counts (`GET /stocks/sector-industry-counts/`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorCounts {
    pub name: String,
    #[serde(default)]
    pub total_companies: u64,
    #[serde(default)]
    pub industries: Vec<IndustryCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryCount {
    pub name: String,
    #[serde(default)]
    pub count: u64,
}

/// Industry vocabulary of one sector (`GET /sectors/<name>/industries/`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorIndustries {
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industries: Vec<SectorIndustry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorIndustry {
    pub id: Value,
    pub name: String,
}

/// Catalog-wide record counts (`GET /stats/`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseStats {
    #[serde(default)]
    pub exchanges: u64,
    #[serde(default)]
    pub sectors: u64,
    #[serde(default)]
    pub industries: u64,
    #[serde(default)]
    pub stocks: u64,
    #[serde(default)]
    pub countries: u64,
    #[serde(default)]
    pub stocks_with_price: u64,
    #[serde(default)]
    pub stocks_with_market_cap: u64,
}

fn fund_count(companies: u64) -> u64 {
    companies.div_ceil(COMPANIES_PER_FUND)
}

/// Headline figures shown for a selected sector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorDetail {
    pub sector_name: String,
    pub companies: u64,
    pub industries: u64,
    pub funds: u64,
    pub total_market_cap: f64,
    pub exchanges: u64,
    pub countries: usize,
    pub country_breakdown: Vec<CountryBreakdown>,
}

impl SectorDetail {
    pub fn from_stats(sector_name: &str, stats: &FilteredStats) -> Self {
        Self {
            sector_name: sector_name.to_owned(),
            companies: stats.total_companies,
            industries: stats.unique_industries,
            funds: fund_count(stats.total_companies),
            total_market_cap: stats.total_market_cap.unwrap_or(0.0),
            exchanges: stats.unique_exchanges,
            countries: stats.country_breakdown.len(),
            country_breakdown: stats.country_breakdown.clone(),
        }
    }

    /// Companies covered by the country breakdown.
    pub fn country_total(&self) -> u64 {
        self.country_breakdown.iter().map(|entry| entry.count).sum()
    }
}

/// Headline figures shown for a selected industry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndustryDetail {
    pub industry_name: String,
    pub sector_name: String,
    pub companies: u64,
    pub funds: u64,
    pub total_market_cap: f64,
    pub exchanges: u64,
    pub countries: usize,
}

impl IndustryDetail {
    /// Countries come from the server breakdown when present, otherwise from
    /// the distinct countries of any embedded company rows.
    pub fn from_stats(sector_name: &str, industry_name: &str, stats: &FilteredStats) -> Self {
        let countries = if stats.country_breakdown.is_empty() {
            distinct_countries(stats.companies.as_deref().unwrap_or_default())
        } else {
            stats.country_breakdown.len()
        };

        Self {
            industry_name: industry_name.to_owned(),
            sector_name: sector_name.to_owned(),
            companies: stats.total_companies,
            funds: fund_count(stats.total_companies),
            total_market_cap: stats.total_market_cap.unwrap_or(0.0),
            exchanges: stats.unique_exchanges,
            countries,
        }
    }
}

fn distinct_countries(companies: &[CompanySummary]) -> usize {
    companies
        .iter()
        .filter_map(|company| company.country.as_deref())
        .map(str::trim)
        .filter(|country| !country.is_empty())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Column an industry breakdown table is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndustrySortKey {
    Count,
    TotalMarketCap,
    Name,
}

/// Ordering of a sector's industry breakdown, written `count-desc`,
/// `total_market_cap-asc`, `name-asc`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustrySort {
    pub key: IndustrySortKey,
    pub descending: bool,
}

impl Default for IndustrySort {
    fn default() -> Self {
        Self {
            key: IndustrySortKey::Count,
            descending: true,
        }
    }
}

impl IndustrySort {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidIndustrySort {
            value: input.to_owned(),
        };
        let (key, order) = input.trim().rsplit_once('-').ok_or_else(invalid)?;
        let key = match key {
            "count" => IndustrySortKey::Count,
            "total_market_cap" => IndustrySortKey::TotalMarketCap,
            "name" => IndustrySortKey::Name,
            _ => return Err(invalid()),
        };
        let descending = match order {
            "desc" => true,
            "asc" => false,
            _ => return Err(invalid()),
        };
        Ok(Self { key, descending })
    }

    /// Filters `industries` by a case-insensitive name search and orders the
    /// rest. Ties on a numeric key fall back to the name.
    pub fn apply<'a>(
        &self,
        industries: &'a [IndustryBreakdown],
        search: &str,
    ) -> Vec<&'a IndustryBreakdown> {
        let needle = search.trim().to_lowercase();
        let mut rows: Vec<&IndustryBreakdown> = industries
            .iter()
            .filter(|row| needle.is_empty() || row.display_name().to_lowercase().contains(&needle))
            .collect();

        rows.sort_by(|a, b| {
            let by_name = || {
                a.display_name()
                    .to_lowercase()
                    .cmp(&b.display_name().to_lowercase())
            };
            let ordering = match self.key {
                IndustrySortKey::Name => by_name(),
                IndustrySortKey::Count => a.count.cmp(&b.count).then_with(by_name),
                IndustrySortKey::TotalMarketCap => {
                    let left = a.total_market_cap.unwrap_or(0.0);
                    let right = b.total_market_cap.unwrap_or(0.0);
                    left.partial_cmp(&right)
                        .unwrap_or(Ordering::Equal)
                        .then_with(by_name)
                }
            };
            if self.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(json: &str) -> FilteredStats {
        serde_json::from_str(json).expect("stats fixture should parse")
    }

    #[test]
    fn sector_detail_rounds_funds_up() {
        let stats = stats(
            r#"{
                "total_companies": 41,
                "unique_industries": 6,
                "unique_exchanges": 2,
                "total_market_cap": 5.5e11,
                "country_breakdown": [
                    {"country": "USA", "count": 30},
                    {"country": "Israel", "count": 11}
                ]
            }"#,
        );
        let detail = SectorDetail::from_stats("Information Technology", &stats);

        assert_eq!(detail.funds, 3);
        assert_eq!(detail.countries, 2);
        assert_eq!(detail.country_total(), 41);
        assert_eq!(detail.industries, 6);
    }

    #[test]
    fn industry_countries_fall_back_to_company_rows() {
        let stats = stats(
            r#"{
                "total_companies": 3,
                "companies": [
                    {"ticker": "A", "country": "USA"},
                    {"ticker": "B", "country": "USA"},
                    {"ticker": "C", "country": "Japan"},
                    {"ticker": "D", "country": ""}
                ]
            }"#,
        );
        let detail = IndustryDetail::from_stats("Tech", "Software", &stats);
        assert_eq!(detail.countries, 2);
        assert_eq!(detail.funds, 1);
    }

    #[test]
    fn industry_countries_prefer_server_breakdown() {
        let stats = stats(
            r#"{
                "total_companies": 2,
                "country_breakdown": [{"country": "USA", "count": 2}],
                "companies": [
                    {"ticker": "A", "country": "USA"},
                    {"ticker": "B", "country": "Canada"}
                ]
            }"#,
        );
        assert_eq!(IndustryDetail::from_stats("S", "I", &stats).countries, 1);
    }

    #[test]
    fn industry_sort_orders_and_filters() {
        let rows = vec![
            IndustryBreakdown {
                industry_name: Some("Semiconductors".into()),
                sector_name: None,
                count: 10,
                total_market_cap: Some(3e12),
            },
            IndustryBreakdown {
                industry_name: Some("Software".into()),
                sector_name: None,
                count: 10,
                total_market_cap: Some(5e12),
            },
            IndustryBreakdown {
                industry_name: Some("Hardware".into()),
                sector_name: None,
                count: 4,
                total_market_cap: None,
            },
        ];

        let by_count = IndustrySort::default().apply(&rows, "");
        let names: Vec<_> = by_count.iter().map(|row| row.display_name()).collect();
        assert_eq!(names, ["Software", "Semiconductors", "Hardware"]);

        let sort = IndustrySort::parse("total_market_cap-asc").expect("valid sort");
        let names: Vec<_> = sort
            .apply(&rows, "S")
            .iter()
            .map(|row| row.display_name())
            .collect();
        assert_eq!(names, ["Semiconductors", "Software"]);

        assert!(IndustrySort::parse("volume-desc").is_err());
    }
}
