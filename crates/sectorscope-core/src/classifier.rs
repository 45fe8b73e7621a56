//! Classifier drill-down controller.
//!
//! Navigation runs `Sectors → SectorDetail → IndustryDetail →
//! FundConstruction → FundParameters`. Guards are synchronous and never
//! fail: a transition that does not apply in the current view returns
//! [`Transition::Ignored`] and changes nothing. Loading is separate and
//! async; each data set has its own [`FetchSlot`], and leaving a view
//! invalidates the slots scoped to it so late results are dropped.

use std::sync::Arc;

use serde::Serialize;

use crate::api::MarketApi;
use crate::fetch::{Applied, FetchKind, FetchSlot};
use crate::query::{
    companies_query, industry_detail_query, sector_counts_query, sector_detail_query,
};
use crate::{
    ClassifierFilters, CompanyKey, CompanySummary, FilterOptions, FilteredStats, FundParameters,
    FundStrategy, HistoryRequest, HistoryWindow, IndustryBreakdown, IndustryDetail,
    IndustrySort, PriceHistory, ScopeFilterKey, SectorCounts, SectorDetail, SectorIndustries,
    StockProfile, StrategySelection,
};

/// Current classifier view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum DrillDownState {
    #[default]
    Sectors,
    SectorDetail {
        sector: String,
    },
    IndustryDetail {
        sector: String,
        industry: String,
    },
    /// `industry` is set when construction started from an industry.
    FundConstruction {
        sector: String,
        industry: Option<String>,
    },
    FundParameters {
        sector: String,
        industry: Option<String>,
        strategies: StrategySelection,
    },
}

impl DrillDownState {
    pub fn sector(&self) -> Option<&str> {
        match self {
            Self::Sectors => None,
            Self::SectorDetail { sector }
            | Self::IndustryDetail { sector, .. }
            | Self::FundConstruction { sector, .. }
            | Self::FundParameters { sector, .. } => Some(sector),
        }
    }

    pub fn industry(&self) -> Option<&str> {
        match self {
            Self::IndustryDetail { industry, .. } => Some(industry),
            Self::FundConstruction { industry, .. } | Self::FundParameters { industry, .. } => {
                industry.as_deref()
            }
            Self::Sectors | Self::SectorDetail { .. } => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sectors => "sectors",
            Self::SectorDetail { .. } => "sector_detail",
            Self::IndustryDetail { .. } => "industry_detail",
            Self::FundConstruction { .. } => "fund_construction",
            Self::FundParameters { .. } => "fund_parameters",
        }
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved,
    Ignored,
}

impl Transition {
    pub const fn moved(self) -> bool {
        matches!(self, Self::Moved)
    }
}

pub struct ClassifierController<A: MarketApi> {
    api: Arc<A>,
    state: DrillDownState,
    exchange: String,
    scope: ClassifierFilters,
    show_sector_companies: bool,
    show_industry_companies: bool,
    strategies: StrategySelection,
    fund_parameters: FundParameters,
    industry_sort: IndustrySort,
    company: Option<CompanyKey>,

    options: FetchSlot<FilterOptions>,
    sectors: FetchSlot<Vec<SectorCounts>>,
    sector_detail: FetchSlot<FilteredStats>,
    sector_industries: FetchSlot<SectorIndustries>,
    sector_companies: FetchSlot<FilteredStats>,
    industry_detail: FetchSlot<FilteredStats>,
    industry_companies: FetchSlot<FilteredStats>,
    profile: FetchSlot<StockProfile>,
    history: FetchSlot<PriceHistory>,
}

impl<A: MarketApi> ClassifierController<A> {
    pub fn new(api: A) -> Self {
        Self::with_shared_api(Arc::new(api))
    }

    pub fn with_shared_api(api: Arc<A>) -> Self {
        Self {
            api,
            state: DrillDownState::Sectors,
            exchange: String::new(),
            scope: ClassifierFilters::default(),
            show_sector_companies: false,
            show_industry_companies: false,
            strategies: StrategySelection::new(),
            fund_parameters: FundParameters::default(),
            industry_sort: IndustrySort::default(),
            company: None,
            options: FetchSlot::new(FetchKind::FilterOptions),
            sectors: FetchSlot::new(FetchKind::SectorCounts),
            sector_detail: FetchSlot::new(FetchKind::SectorDetail),
            sector_industries: FetchSlot::new(FetchKind::SectorIndustries),
            sector_companies: FetchSlot::new(FetchKind::SectorCompanies),
            industry_detail: FetchSlot::new(FetchKind::IndustryDetail),
            industry_companies: FetchSlot::new(FetchKind::IndustryCompanies),
            profile: FetchSlot::new(FetchKind::CompanyProfile),
            history: FetchSlot::new(FetchKind::CompanyHistory),
        }
    }

    pub fn state(&self) -> &DrillDownState {
        &self.state
    }

    /// Top-level exchange filter of the sectors view.
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn scope(&self) -> &ClassifierFilters {
        &self.scope
    }

    pub const fn show_sector_companies(&self) -> bool {
        self.show_sector_companies
    }

    pub const fn show_industry_companies(&self) -> bool {
        self.show_industry_companies
    }

    pub fn strategies(&self) -> &StrategySelection {
        &self.strategies
    }

    pub fn fund_parameters(&self) -> &FundParameters {
        &self.fund_parameters
    }

    pub fn fund_parameters_mut(&mut self) -> &mut FundParameters {
        &mut self.fund_parameters
    }

    pub fn industry_sort(&self) -> IndustrySort {
        self.industry_sort
    }

    pub fn set_industry_sort(&mut self, sort: IndustrySort) {
        self.industry_sort = sort;
    }

    pub fn options(&self) -> &FetchSlot<FilterOptions> {
        &self.options
    }

    pub fn sectors(&self) -> &FetchSlot<Vec<SectorCounts>> {
        &self.sectors
    }

    pub fn sector_detail(&self) -> &FetchSlot<FilteredStats> {
        &self.sector_detail
    }

    pub fn sector_industries(&self) -> &FetchSlot<SectorIndustries> {
        &self.sector_industries
    }

    pub fn sector_companies(&self) -> &FetchSlot<FilteredStats> {
        &self.sector_companies
    }

    pub fn industry_detail(&self) -> &FetchSlot<FilteredStats> {
        &self.industry_detail
    }

    pub fn industry_companies(&self) -> &FetchSlot<FilteredStats> {
        &self.industry_companies
    }

    pub fn profile(&self) -> &FetchSlot<StockProfile> {
        &self.profile
    }

    pub fn history(&self) -> &FetchSlot<PriceHistory> {
        &self.history
    }

    /// Company whose profile is open, if any.
    pub fn open_company_key(&self) -> Option<&CompanyKey> {
        self.company.as_ref()
    }

    /// Headline figures for the selected sector.
    pub fn sector_summary(&self) -> Option<SectorDetail> {
        let sector = self.state.sector()?;
        self.sector_detail
            .data()
            .map(|stats| SectorDetail::from_stats(sector, stats))
    }

    pub fn industry_summary(&self) -> Option<IndustryDetail> {
        let sector = self.state.sector()?;
        let industry = self.state.industry()?;
        self.industry_detail
            .data()
            .map(|stats| IndustryDetail::from_stats(sector, industry, stats))
    }

    /// Industry breakdown of the selected sector, searched and ordered by
    /// the current [`IndustrySort`].
    pub fn industry_rows(&self, search: &str) -> Vec<&IndustryBreakdown> {
        self.sector_detail
            .data()
            .map(|stats| self.industry_sort.apply(&stats.industry_breakdown, search))
            .unwrap_or_default()
    }

    /// Company rows of the visible company list for the current view.
    pub fn visible_companies(&self) -> &[CompanySummary] {
        let slot = match self.state {
            DrillDownState::SectorDetail { .. } if self.show_sector_companies => {
                &self.sector_companies
            }
            DrillDownState::IndustryDetail { .. } if self.show_industry_companies => {
                &self.industry_companies
            }
            _ => return &[],
        };
        slot.data()
            .and_then(|stats| stats.companies.as_deref())
            .unwrap_or_default()
    }

    // Navigation guards.

    /// `Sectors → SectorDetail`. The scoped exchange inherits the top-level
    /// exchange and any strategy selection is dropped.
    pub fn enter_sector(&mut self, sector: &str) -> Transition {
        if !matches!(self.state, DrillDownState::Sectors) || sector.trim().is_empty() {
            return Transition::Ignored;
        }
        self.scope.exchange = self.exchange.clone();
        self.strategies.clear();
        self.show_sector_companies = false;
        self.show_industry_companies = false;
        self.reset_sector_slots();
        self.reset_industry_slots();
        self.move_to(DrillDownState::SectorDetail {
            sector: sector.to_owned(),
        });
        Transition::Moved
    }

    /// `SectorDetail → IndustryDetail`, with the industry company list shown.
    pub fn enter_industry(&mut self, industry: &str) -> Transition {
        let DrillDownState::SectorDetail { sector } = &self.state else {
            return Transition::Ignored;
        };
        if industry.trim().is_empty() {
            return Transition::Ignored;
        }
        let sector = sector.clone();
        self.reset_industry_slots();
        self.show_industry_companies = true;
        self.move_to(DrillDownState::IndustryDetail {
            sector,
            industry: industry.to_owned(),
        });
        Transition::Moved
    }

    /// `IndustryDetail → FundConstruction(sector, industry)` or
    /// `SectorDetail → FundConstruction(sector)`.
    pub fn build_funds(&mut self) -> Transition {
        let next = match &self.state {
            DrillDownState::SectorDetail { sector } => DrillDownState::FundConstruction {
                sector: sector.clone(),
                industry: None,
            },
            DrillDownState::IndustryDetail { sector, industry } => {
                DrillDownState::FundConstruction {
                    sector: sector.clone(),
                    industry: Some(industry.clone()),
                }
            }
            _ => return Transition::Ignored,
        };
        self.move_to(next);
        Transition::Moved
    }

    /// Adds or removes a strategy while constructing a fund. Adding beyond
    /// the limit is ignored.
    pub fn toggle_strategy(&mut self, strategy: FundStrategy) -> Transition {
        if !matches!(
            self.state,
            DrillDownState::FundConstruction { .. } | DrillDownState::FundParameters { .. }
        ) {
            return Transition::Ignored;
        }
        if !self.strategies.toggle(strategy) {
            tracing::debug!(strategy = %strategy, "strategy selection full, toggle ignored");
            return Transition::Ignored;
        }
        if let DrillDownState::FundParameters { strategies, .. } = &mut self.state {
            *strategies = self.strategies.clone();
        }
        Transition::Moved
    }

    /// `FundConstruction → FundParameters` once a strategy is selected.
    pub fn continue_to_parameters(&mut self) -> Transition {
        let DrillDownState::FundConstruction { sector, industry } = &self.state else {
            return Transition::Ignored;
        };
        if self.strategies.is_empty() {
            return Transition::Ignored;
        }
        let next = DrillDownState::FundParameters {
            sector: sector.clone(),
            industry: industry.clone(),
            strategies: self.strategies.clone(),
        };
        self.move_to(next);
        Transition::Moved
    }

    /// Steps back one view, clearing data scoped to the view being left.
    pub fn back(&mut self) -> Transition {
        let next = match &self.state {
            DrillDownState::Sectors => return Transition::Ignored,
            DrillDownState::SectorDetail { .. } => {
                self.scope = ClassifierFilters::default();
                self.strategies.clear();
                self.show_sector_companies = false;
                self.show_industry_companies = false;
                self.reset_sector_slots();
                self.reset_industry_slots();
                DrillDownState::Sectors
            }
            DrillDownState::IndustryDetail { sector, .. } => {
                let sector = sector.clone();
                self.show_industry_companies = false;
                self.reset_industry_slots();
                DrillDownState::SectorDetail { sector }
            }
            DrillDownState::FundConstruction { sector, industry } => match industry {
                Some(industry) => DrillDownState::IndustryDetail {
                    sector: sector.clone(),
                    industry: industry.clone(),
                },
                None => DrillDownState::SectorDetail {
                    sector: sector.clone(),
                },
            },
            DrillDownState::FundParameters {
                sector,
                industry,
                strategies,
            } => {
                self.strategies = strategies.clone();
                DrillDownState::FundConstruction {
                    sector: sector.clone(),
                    industry: industry.clone(),
                }
            }
        };
        self.move_to(next);
        Transition::Moved
    }

    /// Sets the top-level exchange. In a sector view the scoped exchange
    /// follows it and loaded company lists go stale. Returns whether the
    /// scoped filters changed.
    pub fn set_exchange(&mut self, exchange: &str) -> bool {
        self.exchange = exchange.to_owned();
        if matches!(self.state, DrillDownState::SectorDetail { .. }) {
            self.set_scope_filter(ScopeFilterKey::Exchange, exchange);
            return true;
        }
        false
    }

    pub fn set_scope_filter(&mut self, key: ScopeFilterKey, value: &str) {
        self.scope.set(key, value);
        self.sector_companies.mark_stale();
        self.industry_companies.mark_stale();
    }

    fn move_to(&mut self, next: DrillDownState) {
        tracing::debug!(from = self.state.name(), to = next.name(), "classifier navigation");
        self.state = next;
    }

    fn reset_sector_slots(&mut self) {
        self.sector_detail.reset();
        self.sector_industries.reset();
        self.sector_companies.reset();
    }

    fn reset_industry_slots(&mut self) {
        self.industry_detail.reset();
        self.industry_companies.reset();
    }

    fn api(&self) -> Arc<A> {
        Arc::clone(&self.api)
    }

    // Loading.

    pub async fn load_filter_options(&mut self) -> Applied {
        let ticket = self.options.begin();
        let api = self.api();
        let result = api.filter_options().await;
        self.options.apply(ticket, result)
    }

    /// Sector list with company and industry counts for the top-level exchange.
    pub async fn load_sectors(&mut self) -> Applied {
        let ticket = self.sectors.begin();
        let query = sector_counts_query(&self.exchange);
        let api = self.api();
        let result = api.sector_counts(query).await;
        self.sectors.apply(ticket, result)
    }

    /// Enters `sector` and loads its statistics and industry list concurrently.
    pub async fn select_sector(&mut self, sector: &str) -> Transition {
        let transition = self.enter_sector(sector);
        if transition.moved() {
            self.load_sector_view().await;
        }
        transition
    }

    /// Enters `industry` and loads its statistics and company list concurrently.
    pub async fn select_industry(&mut self, industry: &str) -> Transition {
        let transition = self.enter_industry(industry);
        if transition.moved() {
            self.load_industry_view().await;
        }
        transition
    }

    /// Shows or hides the sector company list, loading it when shown and
    /// not already loaded for the current filters. Returns the new flag.
    pub async fn toggle_sector_companies(&mut self) -> bool {
        if !matches!(self.state, DrillDownState::SectorDetail { .. }) {
            return self.show_sector_companies;
        }
        self.show_sector_companies = !self.show_sector_companies;
        if self.show_sector_companies {
            self.load_sector_companies().await;
        }
        self.show_sector_companies
    }

    pub async fn toggle_industry_companies(&mut self) -> bool {
        if !matches!(self.state, DrillDownState::IndustryDetail { .. }) {
            return self.show_industry_companies;
        }
        self.show_industry_companies = !self.show_industry_companies;
        if self.show_industry_companies {
            self.load_industry_companies().await;
        }
        self.show_industry_companies
    }

    /// Changes the top-level exchange, reloads the sector list and, inside a
    /// sector view, the sector data.
    pub async fn change_exchange(&mut self, exchange: &str) {
        let scoped = self.set_exchange(exchange);
        self.load_sectors().await;
        if scoped {
            self.refresh().await;
        }
    }

    /// Reloads whatever the current view shows.
    pub async fn refresh(&mut self) {
        match self.state {
            DrillDownState::Sectors => {
                self.load_sectors().await;
            }
            DrillDownState::SectorDetail { .. } => {
                self.load_sector_view().await;
                if self.show_sector_companies {
                    self.load_sector_companies().await;
                }
            }
            DrillDownState::IndustryDetail { .. } => self.load_industry_view().await,
            DrillDownState::FundConstruction { .. } | DrillDownState::FundParameters { .. } => {}
        }
    }

    /// Opens a company profile, loading the profile and its full price
    /// history concurrently.
    pub async fn open_company(&mut self, company: CompanyKey) -> (Applied, Applied) {
        self.profile.reset();
        self.history.reset();
        self.company = Some(company.clone());

        let profile_ticket = self.profile.begin();
        let history_ticket = self.history.begin();
        let request = HistoryRequest::new(company.clone()).with_window(HistoryWindow::Max);
        let api = self.api();

        let (profile, history) =
            tokio::join!(api.stock_profile(company), api.stock_history(request));

        (
            self.profile.apply(profile_ticket, profile),
            self.history.apply(history_ticket, history),
        )
    }

    pub fn close_company(&mut self) {
        self.company = None;
        self.profile.invalidate();
        self.history.invalidate();
    }

    async fn load_sector_view(&mut self) {
        let Some(sector) = self.state.sector().map(str::to_owned) else {
            return;
        };
        let detail_ticket = self.sector_detail.begin();
        let industries_ticket = self.sector_industries.begin();
        let query = sector_detail_query(&sector, &self.scope);
        let api = self.api();

        let (detail, industries) =
            tokio::join!(api.filtered_stats(query), api.sector_industries(sector));

        self.sector_detail.apply(detail_ticket, detail);
        self.sector_industries.apply(industries_ticket, industries);
    }

    async fn load_industry_view(&mut self) {
        let DrillDownState::IndustryDetail { sector, industry } = &self.state else {
            return;
        };
        let detail_query = industry_detail_query(sector, industry, &self.scope);
        let companies_query = companies_query(sector, Some(industry), &self.scope);
        let key = companies_query.to_query_string();

        let detail_ticket = self.industry_detail.begin();
        let companies_ticket = self.industry_companies.begin_keyed(key);
        let api = self.api();

        let (detail, companies) = tokio::join!(
            api.filtered_stats(detail_query),
            api.filtered_stats(companies_query)
        );

        self.industry_detail.apply(detail_ticket, detail);
        self.industry_companies.apply(companies_ticket, companies);
    }

    async fn load_sector_companies(&mut self) -> Option<Applied> {
        let sector = self.state.sector()?;
        let query = companies_query(sector, None, &self.scope);
        let key = query.to_query_string();
        if self.sector_companies.is_loaded_for(&key) {
            return None;
        }
        let ticket = self.sector_companies.begin_keyed(key);
        let api = self.api();
        let result = api.filtered_stats(query).await;
        Some(self.sector_companies.apply(ticket, result))
    }

    async fn load_industry_companies(&mut self) -> Option<Applied> {
        let sector = self.state.sector()?;
        let industry = self.state.industry()?;
        let query = companies_query(sector, Some(industry), &self.scope);
        let key = query.to_query_string();
        if self.industry_companies.is_loaded_for(&key) {
            return None;
        }
        let ticket = self.industry_companies.begin_keyed(key);
        let api = self.api();
        let result = api.filtered_stats(query).await;
        Some(self.industry_companies.apply(ticket, result))
    }
}
