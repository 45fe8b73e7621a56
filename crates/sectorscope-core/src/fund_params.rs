//! Fund parameter model: general settings, weight constraints, per-strategy
//! configuration, presets and validation.
//!
//! Validation mirrors what the build step requires:
//!
//! | Id | Level | Condition |
//! |----|-------|-----------|
//! | `constraint-max-min` | error | max weight ≤ min weight |
//! | `constraint-max-total` | error | holdings × max weight < 100 |
//! | `constraint-min-total` | error | holdings × min weight > 100 |
//! | `strategy-empty` | error | no strategy selected |
//! | `factor-coverage` | warning | factor strategy, qualifying companies < holdings |
//! | `cluster-total` | warning | cluster strategy, cluster total ≠ holdings |
//! | `cluster-count` | error | cluster strategy, fewer than one cluster |
//! | `investment-min` | error | initial investment < 10 000 |

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{FundStrategy, StrategySelection, ValidationError};

pub const MIN_INITIAL_INVESTMENT: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rebalancing {
    Monthly,
    #[default]
    Quarterly,
    SemiAnnual,
    Annual,
}

impl Rebalancing {
    pub const ALL: [Self; 4] = [Self::Monthly, Self::Quarterly, Self::SemiAnnual, Self::Annual];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::SemiAnnual => "semi-annual",
            Self::Annual => "annual",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
            Self::SemiAnnual => "Semi-Annually",
            Self::Annual => "Annually",
        }
    }
}

impl Display for Rebalancing {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rebalancing {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|option| option.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownRebalancing {
                value: s.to_owned(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralParams {
    pub num_holdings: u32,
    /// Years.
    pub investment_horizon: u32,
    pub initial_investment: f64,
    pub rebalancing_frequency: Rebalancing,
}

impl Default for GeneralParams {
    fn default() -> Self {
        Self {
            num_holdings: 25,
            investment_horizon: 4,
            initial_investment: 100_000.0,
            rebalancing_frequency: Rebalancing::Quarterly,
        }
    }
}

/// Per-stock weight bounds, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub max_weight_per_stock: f64,
    pub min_weight_per_stock: f64,
    pub strict_constraints: bool,
    pub allow_deviations: bool,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_weight_per_stock: 5.0,
            min_weight_per_stock: 3.0,
            strict_constraints: true,
            allow_deviations: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Growth,
    Value,
    Quality,
    Momentum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthThresholds {
    pub revenue_growth: f64,
    pub earnings_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueThresholds {
    pub pe_ratio: f64,
    pub pb_ratio: f64,
    pub dividend_yield: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub roe: f64,
    pub profit_margin: f64,
    pub debt_to_equity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumThresholds {
    pub return_6m: f64,
    pub relative_strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorConfig {
    pub primary_factor: Factor,
    /// `None` blends only the primary factor.
    pub secondary_factor: Option<Factor>,
    /// Primary/secondary split in percent.
    pub factor_split: [u32; 2],
    pub growth_thresholds: GrowthThresholds,
    pub value_thresholds: ValueThresholds,
    pub quality_thresholds: QualityThresholds,
    pub momentum_thresholds: MomentumThresholds,
    pub qualifying_companies: u32,
}

impl Default for FactorConfig {
    fn default() -> Self {
        Self {
            primary_factor: Factor::Growth,
            secondary_factor: Some(Factor::Quality),
            factor_split: [70, 30],
            growth_thresholds: GrowthThresholds {
                revenue_growth: 20.0,
                earnings_growth: 15.0,
            },
            value_thresholds: ValueThresholds {
                pe_ratio: 20.0,
                pb_ratio: 5.0,
                dividend_yield: 2.0,
            },
            quality_thresholds: QualityThresholds {
                roe: 15.0,
                profit_margin: 10.0,
                debt_to_equity: 1.0,
            },
            momentum_thresholds: MomentumThresholds {
                return_6m: 10.0,
                relative_strength: 50.0,
            },
            qualifying_companies: 45,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskObjective {
    MinVol,
    #[default]
    MaxSharpe,
    TargetReturn,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub objective: RiskObjective,
    pub target_return: f64,
    pub return_weight: u32,
    pub risk_weight: u32,
    pub allow_short: bool,
    pub transaction_costs: bool,
    pub tax_efficiency: bool,
    pub risk_free_rate: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            objective: RiskObjective::MaxSharpe,
            target_return: 12.0,
            return_weight: 60,
            risk_weight: 40,
            allow_short: false,
            transaction_costs: false,
            tax_efficiency: false,
            risk_free_rate: 4.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityFilter {
    pub enabled: bool,
    pub min_market_cap: f64,
    pub max_debt_to_equity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqualWeightConfig {
    pub selection_method: String,
    pub quality_filter: QualityFilter,
    /// Percent drift tolerated before rebalancing.
    pub rebalancing_tolerance: f64,
}

impl Default for EqualWeightConfig {
    fn default() -> Self {
        Self {
            selection_method: String::from("random"),
            quality_filter: QualityFilter {
                enabled: false,
                min_market_cap: 1_000_000_000.0,
                max_debt_to_equity: 2.0,
            },
            rebalancing_tolerance: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMethod {
    #[default]
    BusinessModel,
    MarketCap,
    Geographic,
    Ml,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterDistribution {
    #[default]
    Equal,
    Weighted,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierAllocation {
    pub mega: u32,
    pub large: u32,
    pub mid: u32,
    pub small: u32,
}

impl TierAllocation {
    pub fn total(&self) -> u32 {
        [self.mega, self.large, self.mid, self.small]
            .into_iter()
            .fold(0, u32::saturating_add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionAllocation {
    pub us: u32,
    pub china: u32,
    pub europe: u32,
    pub israel: u32,
    pub apac: u32,
}

impl RegionAllocation {
    pub fn total(&self) -> u32 {
        [self.us, self.china, self.europe, self.israel, self.apac]
            .into_iter()
            .fold(0, u32::saturating_add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub method: ClusterMethod,
    pub selection_criteria: String,
    pub distribution: ClusterDistribution,
    pub num_clusters: u32,
    pub companies_per_cluster: u32,
    pub tier_allocation: TierAllocation,
    pub region_allocation: RegionAllocation,
    pub ml_company_target: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            method: ClusterMethod::BusinessModel,
            selection_criteria: String::from("market_cap"),
            distribution: ClusterDistribution::Equal,
            num_clusters: 8,
            companies_per_cluster: 3,
            tier_allocation: TierAllocation {
                mega: 6,
                large: 8,
                mid: 6,
                small: 5,
            },
            region_allocation: RegionAllocation {
                us: 8,
                china: 4,
                europe: 4,
                israel: 3,
                apac: 6,
            },
            ml_company_target: 8,
        }
    }
}

impl ClusterConfig {
    /// Companies the configured clustering would select, saturating at
    /// `u32::MAX`.
    pub fn total_companies(&self) -> u32 {
        match self.method {
            ClusterMethod::BusinessModel => {
                self.num_clusters.saturating_mul(self.companies_per_cluster)
            }
            ClusterMethod::MarketCap => self.tier_allocation.total(),
            ClusterMethod::Geographic => self.region_allocation.total(),
            ClusterMethod::Ml => self.num_clusters.saturating_mul(self.ml_company_target),
        }
    }
}

/// Named holdings/rebalancing/weight combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Conservative,
    Balanced,
    Aggressive,
}

impl Preset {
    pub const ALL: [Self; 3] = [Self::Conservative, Self::Balanced, Self::Aggressive];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Balanced => "balanced",
            Self::Aggressive => "aggressive",
        }
    }

    pub const fn num_holdings(self) -> u32 {
        match self {
            Self::Conservative => 30,
            Self::Balanced => 25,
            Self::Aggressive => 20,
        }
    }

    pub const fn rebalancing(self) -> Rebalancing {
        match self {
            Self::Aggressive => Rebalancing::Monthly,
            Self::Conservative | Self::Balanced => Rebalancing::Quarterly,
        }
    }

    /// `(max, min)` weight per stock.
    pub const fn weights(self) -> (f64, f64) {
        match self {
            Self::Conservative => (3.0, 2.0),
            Self::Balanced => (5.0, 3.0),
            Self::Aggressive => (8.0, 4.0),
        }
    }

    fn matches(self, general: &GeneralParams, constraints: &Constraints) -> bool {
        let (max, min) = self.weights();
        general.num_holdings == self.num_holdings()
            && general.rebalancing_frequency == self.rebalancing()
            && constraints.max_weight_per_stock == max
            && constraints.min_weight_per_stock == min
    }
}

impl Display for Preset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownPreset {
                value: s.to_owned(),
            })
    }
}

/// Suggested weight bounds for a holdings count, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SmartWeights {
    pub suggested_min: f64,
    pub suggested_max: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `None` when `holdings` is zero.
pub fn smart_weights(holdings: u32) -> Option<SmartWeights> {
    if holdings == 0 {
        return None;
    }
    let holdings = f64::from(holdings);
    Some(SmartWeights {
        suggested_min: round2(100.0 / (holdings * 1.5)).max(1.0),
        suggested_max: round2(100.0 / (holdings * 0.7)).min(20.0),
    })
}

/// Keeps digits and dots only: `"$12,500"` → `12500`. `None` when nothing
/// numeric remains.
pub fn parse_currency(input: &str) -> Option<f64> {
    let sanitized: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if sanitized.is_empty() {
        return None;
    }
    sanitized.parse().ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub id: &'static str,
    pub title: &'static str,
    pub message: String,
}

impl ValidationIssue {
    fn new(id: &'static str, title: &'static str, message: impl Into<String>) -> Self {
        Self {
            id,
            title,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub is_valid: bool,
}

impl Validation {
    pub fn has_error(&self, id: &str) -> bool {
        self.errors.iter().any(|issue| issue.id == id)
    }

    pub fn has_warning(&self, id: &str) -> bool {
        self.warnings.iter().any(|issue| issue.id == id)
    }

    /// True when any weight-constraint error is present.
    pub fn has_constraint_error(&self) -> bool {
        self.errors.iter().any(|issue| issue.id.starts_with("constraint"))
    }
}

/// Everything configured on the fund parameters page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundParameters {
    pub general: GeneralParams,
    pub constraints: Constraints,
    pub factor: FactorConfig,
    pub risk: RiskConfig,
    pub equal_weight: EqualWeightConfig,
    pub cluster: ClusterConfig,
    pub active_preset: Option<Preset>,
}

impl Default for FundParameters {
    fn default() -> Self {
        Self {
            general: GeneralParams::default(),
            constraints: Constraints::default(),
            factor: FactorConfig::default(),
            risk: RiskConfig::default(),
            equal_weight: EqualWeightConfig::default(),
            cluster: ClusterConfig::default(),
            active_preset: Some(Preset::Balanced),
        }
    }
}

impl FundParameters {
    pub fn apply_preset(&mut self, preset: Preset) {
        let (max, min) = preset.weights();
        self.general.num_holdings = preset.num_holdings();
        self.general.rebalancing_frequency = preset.rebalancing();
        self.constraints.max_weight_per_stock = max;
        self.constraints.min_weight_per_stock = min;
        self.active_preset = Some(preset);
    }

    /// Preset whose values equal the current general settings and weights.
    pub fn matching_preset(&self) -> Option<Preset> {
        Preset::ALL
            .into_iter()
            .find(|preset| preset.matches(&self.general, &self.constraints))
    }

    /// Recomputes `active_preset` after a manual edit.
    pub fn sync_preset(&mut self) {
        self.active_preset = self.matching_preset();
    }

    /// Sets the initial investment from user text such as `$12,500`.
    /// Unparsable text clears it to zero.
    pub fn set_initial_investment(&mut self, input: &str) {
        self.general.initial_investment = parse_currency(input).unwrap_or(0.0);
        self.sync_preset();
    }

    pub fn smart_weights(&self) -> Option<SmartWeights> {
        smart_weights(self.general.num_holdings)
    }

    pub fn validate(&self, strategies: &StrategySelection) -> Validation {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let holdings = self.general.num_holdings;
        let max = self.constraints.max_weight_per_stock;
        let min = self.constraints.min_weight_per_stock;

        if max <= min {
            errors.push(ValidationIssue::new(
                "constraint-max-min",
                "Max must exceed Min",
                "Max weight per stock must be greater than min weight.",
            ));
        }
        if f64::from(holdings) * max < 100.0 {
            errors.push(ValidationIssue::new(
                "constraint-max-total",
                "Max weight too low",
                "Increase max weight or holdings to reach at least 100% allocation.",
            ));
        }
        if f64::from(holdings) * min > 100.0 {
            errors.push(ValidationIssue::new(
                "constraint-min-total",
                "Min weight too high",
                "Decrease min weight or holdings so coverage stays below 100%.",
            ));
        }
        if strategies.is_empty() {
            errors.push(ValidationIssue::new(
                "strategy-empty",
                "No strategies selected",
                "Please select at least one strategy before building funds.",
            ));
        }

        if strategies.contains(FundStrategy::FactorBased) {
            let qualifying = self.factor.qualifying_companies;
            if qualifying < holdings {
                warnings.push(ValidationIssue::new(
                    "factor-coverage",
                    "Factor coverage low",
                    format!("Only {qualifying} companies meet factor criteria (need {holdings})."),
                ));
            }
        }

        if strategies.contains(FundStrategy::ClusterBased) {
            let total = self.cluster.total_companies();
            if total != holdings {
                warnings.push(ValidationIssue::new(
                    "cluster-total",
                    "Cluster total mismatch",
                    format!(
                        "Cluster selections total {total} companies but general holdings target {holdings}."
                    ),
                ));
            }
            if self.cluster.num_clusters < 1 {
                errors.push(ValidationIssue::new(
                    "cluster-count",
                    "Cluster count invalid",
                    "Each cluster configuration needs at least one cluster.",
                ));
            }
        }

        if self.general.initial_investment < MIN_INITIAL_INVESTMENT {
            errors.push(ValidationIssue::new(
                "investment-min",
                "Initial investment too low",
                "Initial investment must be at least $10,000.",
            ));
        }

        Validation {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(strategies: &[FundStrategy]) -> StrategySelection {
        strategies.iter().copied().collect()
    }

    #[test]
    fn defaults_are_valid_balanced_settings() {
        let params = FundParameters::default();
        assert_eq!(params.matching_preset(), Some(Preset::Balanced));

        let validation = params.validate(&selection(&[FundStrategy::MarketCapWeighted]));
        assert!(validation.is_valid, "{validation:?}");
        assert!(validation.warnings.is_empty());
    }

    #[test]
    fn presets_apply_and_match() {
        let mut params = FundParameters::default();
        params.apply_preset(Preset::Aggressive);

        assert_eq!(params.general.num_holdings, 20);
        assert_eq!(params.general.rebalancing_frequency, Rebalancing::Monthly);
        assert_eq!(params.constraints.max_weight_per_stock, 8.0);
        assert_eq!(params.matching_preset(), Some(Preset::Aggressive));

        params.general.num_holdings = 21;
        params.sync_preset();
        assert_eq!(params.active_preset, None);
    }

    #[test]
    fn inverted_and_undersized_weights_are_errors() {
        let mut params = FundParameters::default();
        params.constraints.max_weight_per_stock = 3.0;
        params.constraints.min_weight_per_stock = 3.0;

        let validation = params.validate(&selection(&[FundStrategy::EqualWeighted]));
        assert!(validation.has_error("constraint-max-min"));
        assert!(validation.has_error("constraint-max-total"));
        assert!(validation.has_constraint_error());
        assert!(!validation.is_valid);
    }

    #[test]
    fn oversized_minimum_is_an_error() {
        let mut params = FundParameters::default();
        params.constraints.min_weight_per_stock = 4.5;
        let validation = params.validate(&selection(&[FundStrategy::EqualWeighted]));
        assert!(validation.has_error("constraint-min-total"));
    }

    #[test]
    fn empty_strategy_list_and_low_investment_are_errors() {
        let mut params = FundParameters::default();
        params.set_initial_investment("$9,999");

        let validation = params.validate(&StrategySelection::new());
        assert!(validation.has_error("strategy-empty"));
        assert!(validation.has_error("investment-min"));
        assert_eq!(
            validation.errors.last().map(|issue| issue.title),
            Some("Initial investment too low")
        );
    }

    #[test]
    fn factor_and_cluster_checks_only_run_when_selected() {
        let mut params = FundParameters::default();
        params.factor.qualifying_companies = 10;
        params.cluster.num_clusters = 0;

        let without = params.validate(&selection(&[FundStrategy::MarketCapWeighted]));
        assert!(without.warnings.is_empty());
        assert!(without.is_valid);

        let with = params.validate(&selection(&[
            FundStrategy::FactorBased,
            FundStrategy::ClusterBased,
        ]));
        assert!(with.has_warning("factor-coverage"));
        assert!(with.has_warning("cluster-total"));
        assert!(with.has_error("cluster-count"));
        assert_eq!(
            with.warnings[0].message,
            "Only 10 companies meet factor criteria (need 25)."
        );
    }

    #[test]
    fn cluster_total_depends_on_method() {
        let mut cluster = ClusterConfig::default();
        assert_eq!(cluster.total_companies(), 24);
        cluster.method = ClusterMethod::MarketCap;
        assert_eq!(cluster.total_companies(), 25);
        cluster.method = ClusterMethod::Geographic;
        assert_eq!(cluster.total_companies(), 25);
        cluster.method = ClusterMethod::Ml;
        assert_eq!(cluster.total_companies(), 64);
    }

    #[test]
    fn oversized_cluster_totals_saturate() {
        let mut cluster = ClusterConfig {
            num_clusters: 70_000,
            companies_per_cluster: 70_000,
            ml_company_target: 70_000,
            ..ClusterConfig::default()
        };
        assert_eq!(cluster.total_companies(), u32::MAX);
        cluster.method = ClusterMethod::Ml;
        assert_eq!(cluster.total_companies(), u32::MAX);
        cluster.tier_allocation.mega = u32::MAX;
        cluster.method = ClusterMethod::MarketCap;
        assert_eq!(cluster.total_companies(), u32::MAX);
        cluster.region_allocation.us = u32::MAX;
        cluster.method = ClusterMethod::Geographic;
        assert_eq!(cluster.total_companies(), u32::MAX);
    }

    #[test]
    fn oversized_cluster_is_a_total_mismatch_warning() {
        let mut params = FundParameters::default();
        params.cluster.num_clusters = 70_000;
        params.cluster.companies_per_cluster = 70_000;

        let validation = params.validate(&selection(&[FundStrategy::ClusterBased]));

        assert!(validation.has_warning("cluster-total"));
        assert!(validation.is_valid);
    }

    #[test]
    fn smart_weights_are_clamped() {
        let weights = smart_weights(25).expect("suggestion");
        assert_eq!(weights.suggested_min, 2.67);
        assert_eq!(weights.suggested_max, 5.71);

        let few = smart_weights(2).expect("suggestion");
        assert_eq!(few.suggested_max, 20.0);

        let many = smart_weights(200).expect("suggestion");
        assert_eq!(many.suggested_min, 1.0);

        assert!(smart_weights(0).is_none());
    }

    #[test]
    fn currency_parsing_strips_formatting() {
        assert_eq!(parse_currency("$12,500"), Some(12_500.0));
        assert_eq!(parse_currency("1,000.50 USD"), Some(1_000.5));
        assert_eq!(parse_currency("abc"), None);
    }

    #[test]
    fn rebalancing_and_presets_parse() {
        assert_eq!("semi_annual".parse::<Rebalancing>(), Ok(Rebalancing::SemiAnnual));
        assert_eq!("Conservative".parse::<Preset>(), Ok(Preset::Conservative));
        assert!("weekly".parse::<Rebalancing>().is_err());
        assert!("yolo".parse::<Preset>().is_err());
    }
}
