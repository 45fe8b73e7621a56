//! Canonical filter state for the screener and the classifier drill-down.
//!
//! [`FilterStore`] holds the top-level screener filters. [`ClassifierFilters`]
//! is the narrower set scoped to a sector or industry view. Neither type
//! validates beyond what is needed to store a value; the query builder
//! decides what reaches the backend.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CapUnit, FilterOptions, IndustryOption, PriceFilter, SortOrder, ValidationError};

/// Ordering applied when no column has been chosen.
pub const DEFAULT_ORDERING: &str = "ticker";
/// Maximum number of industry suggestions offered for a search text.
pub const MAX_INDUSTRY_SUGGESTIONS: usize = 8;

/// Addressable screener filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    Search,
    Exchange,
    Sector,
    Industry,
    Country,
    PriceFilter,
    MarketCapMin,
    MarketCapMax,
    MarketCapMinUnit,
    MarketCapMaxUnit,
    Ordering,
}

impl FilterKey {
    pub const ALL: [Self; 11] = [
        Self::Search,
        Self::Exchange,
        Self::Sector,
        Self::Industry,
        Self::Country,
        Self::PriceFilter,
        Self::MarketCapMin,
        Self::MarketCapMax,
        Self::MarketCapMinUnit,
        Self::MarketCapMaxUnit,
        Self::Ordering,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Exchange => "exchange",
            Self::Sector => "sector",
            Self::Industry => "industry",
            Self::Country => "country",
            Self::PriceFilter => "price_filter",
            Self::MarketCapMin => "market_cap_min",
            Self::MarketCapMax => "market_cap_max",
            Self::MarketCapMinUnit => "market_cap_min_unit",
            Self::MarketCapMaxUnit => "market_cap_max_unit",
            Self::Ordering => "ordering",
        }
    }
}

impl Display for FilterKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKey {
    type Err = ValidationError;

    /// Accepts snake_case, kebab-case and camelCase spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|ch| *ch != '_' && *ch != '-')
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().replace('_', "") == normalized)
            .ok_or_else(|| ValidationError::UnknownFilterKey { value: s.to_owned() })
    }
}

/// Active screener filters. Empty strings mean "any".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub search: String,
    pub exchange: String,
    pub sector: String,
    pub industry: String,
    pub country: String,
    pub price_filter: PriceFilter,
    pub market_cap_min: String,
    pub market_cap_max: String,
    pub market_cap_min_unit: CapUnit,
    pub market_cap_max_unit: CapUnit,
    pub ordering: String,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            exchange: String::new(),
            sector: String::new(),
            industry: String::new(),
            country: String::new(),
            price_filter: PriceFilter::Any,
            market_cap_min: String::new(),
            market_cap_max: String::new(),
            market_cap_min_unit: CapUnit::Millions,
            market_cap_max_unit: CapUnit::Millions,
            ordering: String::from(DEFAULT_ORDERING),
        }
    }
}

impl FilterState {
    /// Current value of `key` in its text form.
    pub fn value(&self, key: FilterKey) -> String {
        match key {
            FilterKey::Search => self.search.clone(),
            FilterKey::Exchange => self.exchange.clone(),
            FilterKey::Sector => self.sector.clone(),
            FilterKey::Industry => self.industry.clone(),
            FilterKey::Country => self.country.clone(),
            FilterKey::PriceFilter => self.price_filter.to_string(),
            FilterKey::MarketCapMin => self.market_cap_min.clone(),
            FilterKey::MarketCapMax => self.market_cap_max.clone(),
            FilterKey::MarketCapMinUnit => self.market_cap_min_unit.to_string(),
            FilterKey::MarketCapMaxUnit => self.market_cap_max_unit.to_string(),
            FilterKey::Ordering => self.ordering.clone(),
        }
    }

    /// Decoded ordering, falling back to the default column.
    pub fn sort_order(&self) -> SortOrder {
        SortOrder::parse(&self.ordering).unwrap_or_else(|_| SortOrder::ascending(DEFAULT_ORDERING))
    }
}

/// Owner of the screener [`FilterState`].
///
/// `sort_active` tracks whether a sort indicator should be shown; the
/// indicator itself is always derived from `ordering`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStore {
    state: FilterState,
    sort_active: bool,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: FilterState) -> Self {
        Self {
            state,
            sort_active: false,
        }
    }

    pub fn get(&self) -> &FilterState {
        &self.state
    }

    /// Stores `value` under `key`.
    ///
    /// A price filter outside the catalog is stored as `Any`, an unknown
    /// unit as millions and an empty ordering as the default column.
    pub fn set(&mut self, key: FilterKey, value: &str) {
        let state = &mut self.state;
        match key {
            FilterKey::Search => state.search = value.to_owned(),
            FilterKey::Exchange => state.exchange = value.to_owned(),
            FilterKey::Sector => state.sector = value.to_owned(),
            FilterKey::Industry => state.industry = value.to_owned(),
            FilterKey::Country => state.country = value.to_owned(),
            FilterKey::PriceFilter => {
                state.price_filter = PriceFilter::parse(value).unwrap_or_default();
            }
            FilterKey::MarketCapMin => state.market_cap_min = value.to_owned(),
            FilterKey::MarketCapMax => state.market_cap_max = value.to_owned(),
            FilterKey::MarketCapMinUnit => {
                state.market_cap_min_unit = CapUnit::parse(value).unwrap_or_default();
            }
            FilterKey::MarketCapMaxUnit => {
                state.market_cap_max_unit = CapUnit::parse(value).unwrap_or_default();
            }
            FilterKey::Ordering => {
                state.ordering = match SortOrder::parse(value) {
                    Ok(order) => order.to_ordering(),
                    Err(_) => String::from(DEFAULT_ORDERING),
                };
                self.sort_active = true;
            }
        }
    }

    /// Restores every filter to its default and hides the sort indicator.
    pub fn reset(&mut self) {
        self.state = FilterState::default();
        self.sort_active = false;
    }

    /// Flips an ascending sort on `column` to descending, otherwise sorts
    /// `column` ascending. Returns the new ordering.
    ///
    /// Without an active indicator the first toggle always sorts ascending.
    /// On the default `ticker` ordering, toggling `ticker` therefore keeps
    /// the ordering and only turns the indicator on.
    pub fn toggle_sort(&mut self, column: &str) -> SortOrder {
        let next = match self.sort_indicator() {
            Some(current) => current.toggled(column),
            None => SortOrder::ascending(column),
        };
        self.state.ordering = next.to_ordering();
        self.sort_active = true;
        next
    }

    /// Column and direction to highlight, if a sort was chosen explicitly.
    pub fn sort_indicator(&self) -> Option<SortOrder> {
        self.sort_active.then(|| self.state.sort_order())
    }

    /// Sets `industry` from a suggestion and clears the search text.
    pub fn apply_industry_suggestion(&mut self, industry: &str) {
        self.state.industry = industry.to_owned();
        self.state.search.clear();
    }
}

/// Industries whose name contains `text`, case-insensitively, capped at
/// [`MAX_INDUSTRY_SUGGESTIONS`]. Blank text yields nothing.
pub fn industry_suggestions<'a>(options: &'a FilterOptions, text: &str) -> Vec<&'a IndustryOption> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    options
        .industries
        .iter()
        .filter(|industry| industry.name.to_lowercase().contains(&needle))
        .take(MAX_INDUSTRY_SUGGESTIONS)
        .collect()
}

/// Scoped filter key inside a sector or industry view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeFilterKey {
    Exchange,
    Industry,
    MarketCapMin,
    MarketCapMax,
    MarketCapMinUnit,
    MarketCapMaxUnit,
}

impl FromStr for ScopeFilterKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match FilterKey::from_str(s)? {
            FilterKey::Exchange => Ok(Self::Exchange),
            FilterKey::Industry => Ok(Self::Industry),
            FilterKey::MarketCapMin => Ok(Self::MarketCapMin),
            FilterKey::MarketCapMax => Ok(Self::MarketCapMax),
            FilterKey::MarketCapMinUnit => Ok(Self::MarketCapMinUnit),
            FilterKey::MarketCapMaxUnit => Ok(Self::MarketCapMaxUnit),
            _ => Err(ValidationError::UnknownFilterKey { value: s.to_owned() }),
        }
    }
}

/// Filters applied within the classifier's sector and industry views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierFilters {
    pub exchange: String,
    pub industry: String,
    pub market_cap_min: String,
    pub market_cap_max: String,
    pub market_cap_min_unit: CapUnit,
    pub market_cap_max_unit: CapUnit,
}

impl ClassifierFilters {
    /// Defaults with the exchange inherited from the top-level view.
    pub fn inheriting(exchange: &str) -> Self {
        Self {
            exchange: exchange.to_owned(),
            ..Self::default()
        }
    }

    pub fn set(&mut self, key: ScopeFilterKey, value: &str) {
        match key {
            ScopeFilterKey::Exchange => self.exchange = value.to_owned(),
            ScopeFilterKey::Industry => self.industry = value.to_owned(),
            ScopeFilterKey::MarketCapMin => self.market_cap_min = value.to_owned(),
            ScopeFilterKey::MarketCapMax => self.market_cap_max = value.to_owned(),
            ScopeFilterKey::MarketCapMinUnit => {
                self.market_cap_min_unit = CapUnit::parse(value).unwrap_or_default();
            }
            ScopeFilterKey::MarketCapMaxUnit => {
                self.market_cap_max_unit = CapUnit::parse(value).unwrap_or_default();
            }
        }
    }
}
