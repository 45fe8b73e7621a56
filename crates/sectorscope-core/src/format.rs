//! Display helpers for table output.

use crate::csv_export::MISSING_VALUE;

/// `$1.50T`, `$2.25B`, `$3.00M`, `$4.00K` or `$12.34`; `N/A` when missing.
pub fn format_market_cap(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(value) => format!("${}", scaled(value, true)),
        None => String::from(MISSING_VALUE),
    }
}

/// Like [`format_market_cap`] without the currency sign or the `T` tier.
pub fn format_compact(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(value) => scaled(value, false),
        None => String::from(MISSING_VALUE),
    }
}

/// Two decimals, `N/A` when missing.
pub fn format_decimal(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map_or_else(|| String::from(MISSING_VALUE), |v| format!("{v:.2}"))
}

fn scaled(value: f64, trillions: bool) -> String {
    if trillions && value >= 1e12 {
        format!("{:.2}T", value / 1e12)
    } else if value >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_cap_tiers() {
        assert_eq!(format_market_cap(Some(1.5e12)), "$1.50T");
        assert_eq!(format_market_cap(Some(2_250_000_000.0)), "$2.25B");
        assert_eq!(format_market_cap(Some(3_000_000.0)), "$3.00M");
        assert_eq!(format_market_cap(Some(4_000.0)), "$4.00K");
        assert_eq!(format_market_cap(Some(12.5)), "$12.50");
        assert_eq!(format_market_cap(None), "N/A");
    }

    #[test]
    fn compact_numbers_stop_at_billions() {
        assert_eq!(format_compact(Some(1.5e12)), "1500.00B");
        assert_eq!(format_compact(Some(999.0)), "999.00");
        assert_eq!(format_decimal(Some(1.0 / 3.0)), "0.33");
        assert_eq!(format_decimal(None), "N/A");
    }
}
