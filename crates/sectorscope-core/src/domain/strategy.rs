use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Maximum number of strategies a fund build may combine.
pub const MAX_STRATEGIES: usize = 5;

/// Fund construction approaches offered by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FundStrategy {
    MarketCapWeighted,
    EqualWeighted,
    FactorBased,
    RiskOptimized,
    ClusterBased,
}

/// Descriptive catalog entry for a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrategyInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub subtitle: &'static str,
    pub description: &'static str,
    pub risk: &'static str,
}

impl FundStrategy {
    pub const ALL: [Self; 5] = [
        Self::MarketCapWeighted,
        Self::EqualWeighted,
        Self::FactorBased,
        Self::RiskOptimized,
        Self::ClusterBased,
    ];

    /// Parses any of the spellings used for strategy identifiers
    /// (`market-cap`, `market_cap_weighted`, `equal_weight`, ...).
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_lowercase().replace('-', "_");
        let strategy = match normalized.as_str() {
            "market_cap" | "market_cap_weighted" | "market_capitalization" => {
                Self::MarketCapWeighted
            }
            "equal_weight" | "equal_weighted" => Self::EqualWeighted,
            "factor_based" | "factor" => Self::FactorBased,
            "risk_optimized" | "risk" => Self::RiskOptimized,
            "cluster_based" | "cluster" => Self::ClusterBased,
            _ => {
                return Err(ValidationError::UnknownStrategy {
                    value: input.to_owned(),
                })
            }
        };
        Ok(strategy)
    }

    pub const fn key(self) -> &'static str {
        self.info().key
    }

    pub const fn info(self) -> StrategyInfo {
        match self {
            Self::MarketCapWeighted => StrategyInfo {
                key: "market-cap",
                name: "Market-Cap Weighted",
                subtitle: "Top companies by size",
                description: "Scale allocations in proportion to company size for high-liquidity exposure.",
                risk: "Low-Moderate",
            },
            Self::EqualWeighted => StrategyInfo {
                key: "equal-weighted",
                name: "Equal Weighted",
                subtitle: "Balanced allocation",
                description: "Assign the same weight to every selection for a diversified exposure.",
                risk: "Moderate",
            },
            Self::FactorBased => StrategyInfo {
                key: "factor-based",
                name: "Factor-Based",
                subtitle: "Growth, Value, Quality, Momentum",
                description: "Blend academic factors to tilt toward growth, value, quality, or momentum leaders.",
                risk: "Variable by factor mix",
            },
            Self::RiskOptimized => StrategyInfo {
                key: "risk-optimized",
                name: "Risk-Optimized",
                subtitle: "Min volatility / Max Sharpe",
                description: "Run optimizations to minimize volatility or maximize Sharpe against sector universe.",
                risk: "Low-Moderate",
            },
            Self::ClusterBased => StrategyInfo {
                key: "cluster-based",
                name: "Cluster-Based",
                subtitle: "Sub-sector diversification",
                description: "Choose representatives from each sub-sector cluster for broad coverage.",
                risk: "Moderate",
            },
        }
    }
}

impl Display for FundStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FundStrategy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Ordered, capacity-bounded strategy selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategySelection {
    strategies: Vec<FundStrategy>,
    #[serde(skip)]
    limit: usize,
}

impl Default for StrategySelection {
    fn default() -> Self {
        Self::with_limit(MAX_STRATEGIES)
    }
}

impl StrategySelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection holding at most `limit` strategies (clamped to the catalog size).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            strategies: Vec::new(),
            limit: limit.min(MAX_STRATEGIES),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Adds or removes `strategy`. Returns `false` when the toggle was
    /// refused because the selection is full.
    pub fn toggle(&mut self, strategy: FundStrategy) -> bool {
        if let Some(position) = self.strategies.iter().position(|s| *s == strategy) {
            self.strategies.remove(position);
            return true;
        }
        if self.is_full() {
            return false;
        }
        self.strategies.push(strategy);
        true
    }

    /// Adds `strategy` if it is absent and capacity remains.
    pub fn insert(&mut self, strategy: FundStrategy) -> bool {
        if self.contains(strategy) || self.is_full() {
            return false;
        }
        self.strategies.push(strategy);
        true
    }

    pub fn contains(&self, strategy: FundStrategy) -> bool {
        self.strategies.contains(&strategy)
    }

    pub fn as_slice(&self) -> &[FundStrategy] {
        &self.strategies
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.strategies.len() >= self.limit
    }

    pub fn clear(&mut self) {
        self.strategies.clear();
    }
}

impl FromIterator<FundStrategy> for StrategySelection {
    fn from_iter<I: IntoIterator<Item = FundStrategy>>(iter: I) -> Self {
        let mut selection = Self::new();
        for strategy in iter {
            selection.insert(strategy);
        }
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_spelling() {
        for (raw, expected) in [
            ("market-cap", FundStrategy::MarketCapWeighted),
            ("market_cap_weighted", FundStrategy::MarketCapWeighted),
            ("equal_weight", FundStrategy::EqualWeighted),
            ("Equal-Weighted", FundStrategy::EqualWeighted),
            ("factor-based", FundStrategy::FactorBased),
            ("risk_optimized", FundStrategy::RiskOptimized),
            ("cluster-based", FundStrategy::ClusterBased),
        ] {
            assert_eq!(FundStrategy::parse(raw).expect(raw), expected);
        }
        assert!(FundStrategy::parse("momentum").is_err());
    }

    #[test]
    fn toggle_preserves_selection_order() {
        let mut selection = StrategySelection::new();
        selection.toggle(FundStrategy::ClusterBased);
        selection.toggle(FundStrategy::EqualWeighted);
        selection.toggle(FundStrategy::FactorBased);
        selection.toggle(FundStrategy::EqualWeighted);

        assert_eq!(
            selection.as_slice(),
            &[FundStrategy::ClusterBased, FundStrategy::FactorBased]
        );
    }

    #[test]
    fn toggle_at_capacity_is_refused_without_change() {
        let mut selection = StrategySelection::with_limit(2);
        assert!(selection.toggle(FundStrategy::MarketCapWeighted));
        assert!(selection.toggle(FundStrategy::RiskOptimized));

        assert!(!selection.toggle(FundStrategy::ClusterBased));
        assert_eq!(selection.len(), 2);
        assert!(!selection.contains(FundStrategy::ClusterBased));
    }

    #[test]
    fn catalog_keys_parse_back() {
        for strategy in FundStrategy::ALL {
            assert_eq!(FundStrategy::parse(strategy.key()).expect("key"), strategy);
        }
    }
}
