use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Thresholds offered by the "Under $N" price filter.
pub const UNDER_PRICE_STEPS: [u32; 15] = [1, 2, 3, 4, 5, 7, 10, 15, 20, 30, 40, 50, 100, 200, 400];
/// Thresholds offered by the "Over $N" price filter.
pub const OVER_PRICE_STEPS: [u32; 10] = [1, 2, 3, 5, 10, 20, 50, 100, 200, 400];

/// Price bucket filter. Each bucket constrains exactly one side of the price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PriceFilter {
    #[default]
    Any,
    Under(u32),
    Over(u32),
}

impl PriceFilter {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("any") {
            return Ok(Self::Any);
        }

        let invalid = || ValidationError::InvalidPriceFilter {
            value: input.to_owned(),
        };

        if let Some(rest) = trimmed.strip_prefix("Under $") {
            let value = rest.trim().parse::<u32>().map_err(|_| invalid())?;
            if UNDER_PRICE_STEPS.contains(&value) {
                return Ok(Self::Under(value));
            }
        } else if let Some(rest) = trimmed.strip_prefix("Over $") {
            let value = rest.trim().parse::<u32>().map_err(|_| invalid())?;
            if OVER_PRICE_STEPS.contains(&value) {
                return Ok(Self::Over(value));
            }
        }

        Err(invalid())
    }

    /// Every selectable bucket in display order.
    pub fn catalog() -> Vec<Self> {
        std::iter::once(Self::Any)
            .chain(UNDER_PRICE_STEPS.iter().map(|value| Self::Under(*value)))
            .chain(OVER_PRICE_STEPS.iter().map(|value| Self::Over(*value)))
            .collect()
    }

    /// Lower price bound implied by this bucket.
    pub const fn min_price(self) -> Option<u32> {
        match self {
            Self::Over(value) => Some(value),
            _ => None,
        }
    }

    /// Upper price bound implied by this bucket.
    pub const fn max_price(self) -> Option<u32> {
        match self {
            Self::Under(value) => Some(value),
            _ => None,
        }
    }
}

impl Display for PriceFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Under(value) => write!(f, "Under ${value}"),
            Self::Over(value) => write!(f, "Over ${value}"),
        }
    }
}

impl FromStr for PriceFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PriceFilter {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PriceFilter> for String {
    fn from(value: PriceFilter) -> Self {
        value.to_string()
    }
}

/// Multiplier applied to a market cap text field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapUnit {
    #[default]
    #[serde(rename = "M")]
    Millions,
    #[serde(rename = "B")]
    Billions,
}

impl CapUnit {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim() {
            "M" | "m" => Ok(Self::Millions),
            "B" | "b" => Ok(Self::Billions),
            _ => Err(ValidationError::InvalidCapUnit {
                value: input.to_owned(),
            }),
        }
    }

    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Millions => 1e6,
            Self::Billions => 1e9,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Millions => "M",
            Self::Billions => "B",
        }
    }
}

impl Display for CapUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parses a market cap text field into an absolute dollar value.
///
/// Empty or non-numeric input yields `None`, which callers treat as "no bound".
pub fn market_cap_value(raw: &str, unit: CapUnit) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = trimmed.parse::<f64>().ok().filter(|value| value.is_finite())?;
    Some(value * unit.multiplier())
}

/// Sort direction of the active ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Decoded `ordering` value: a field name plus direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: String,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Decodes `"-market_cap"` style ordering strings.
    pub fn parse(ordering: &str) -> Result<Self, ValidationError> {
        let trimmed = ordering.trim();
        let (field, direction) = match trimmed.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Descending),
            None => (trimmed, SortDirection::Ascending),
        };
        if field.is_empty() {
            return Err(ValidationError::EmptyOrdering);
        }
        Ok(Self {
            field: field.to_owned(),
            direction,
        })
    }

    /// Encodes back to the backend `ordering` parameter.
    pub fn to_ordering(&self) -> String {
        match self.direction {
            SortDirection::Ascending => self.field.clone(),
            SortDirection::Descending => format!("-{}", self.field),
        }
    }

    /// Ordering after a click on `column`: flips an ascending sort on the same
    /// column, otherwise starts ascending on `column`.
    pub fn toggled(&self, column: &str) -> Self {
        if self.field == column && self.direction == SortDirection::Ascending {
            Self::descending(column)
        } else {
            Self::ascending(column)
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_ordering())
    }
}
