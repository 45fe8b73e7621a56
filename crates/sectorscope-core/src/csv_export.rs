//! CSV rendering of selected listing rows.
//!
//! Columns are declared as `(header, accessor, quote policy)` triples and
//! rendered by a small RFC 4180 encoder. Missing values render as `N/A`;
//! numbers render as their literal value without currency formatting.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use time::Date;

use crate::StockRecord;

/// Placeholder for missing values.
pub const MISSING_VALUE: &str = "N/A";
pub const DEFAULT_EXPORT_PREFIX: &str = "portfolio";

/// One cell before encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum CsvValue {
    Text(String),
    Number(f64),
    Missing,
}

impl CsvValue {
    fn text(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(text) if !text.is_empty() => Self::Text(text.to_owned()),
            _ => Self::Missing,
        }
    }

    fn number(value: Option<f64>) -> Self {
        value.filter(|v| v.is_finite()).map_or(Self::Missing, Self::Number)
    }

    fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(number) => number.to_string(),
            Self::Missing => String::from(MISSING_VALUE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotePolicy {
    /// Quote only fields containing a delimiter, quote or line break.
    WhenNeeded,
    Always,
}

/// Header, accessor and quoting for one output column.
#[derive(Clone, Copy)]
pub struct CsvColumn {
    pub header: &'static str,
    pub value: fn(&StockRecord) -> CsvValue,
    pub quote: QuotePolicy,
}

impl CsvColumn {
    pub const fn new(header: &'static str, value: fn(&StockRecord) -> CsvValue) -> Self {
        Self {
            header,
            value,
            quote: QuotePolicy::WhenNeeded,
        }
    }

    pub const fn always_quoted(mut self) -> Self {
        self.quote = QuotePolicy::Always;
        self
    }
}

/// The eighteen portfolio columns, Ticker through Dividend Yield.
pub fn portfolio_columns() -> Vec<CsvColumn> {
    vec![
        CsvColumn::new("Ticker", |r| CsvValue::text(Some(&r.ticker))),
        CsvColumn::new("Company Name", |r| CsvValue::text(r.company_name.as_deref()))
            .always_quoted(),
        CsvColumn::new("Market Cap", |r| CsvValue::number(r.market_cap)),
        CsvColumn::new("Price", |r| CsvValue::number(r.price)),
        CsvColumn::new("P/E Ratio", |r| CsvValue::number(r.pe_ratio)),
        CsvColumn::new("PEG Ratio", |r| CsvValue::number(r.peg_ratio)),
        CsvColumn::new("Country", |r| CsvValue::text(r.country.as_deref())),
        CsvColumn::new("Exchange", |r| CsvValue::text(r.exchange_name.as_deref())),
        CsvColumn::new("Sector", |r| CsvValue::text(r.sector_name.as_deref())),
        CsvColumn::new("Industry", |r| CsvValue::text(r.industry_name.as_deref())),
        CsvColumn::new("Fair Value", |r| CsvValue::number(r.fair_value)),
        CsvColumn::new("Fair Value Label", |r| {
            CsvValue::text(r.fair_value_label.as_deref())
        }),
        CsvColumn::new("Fair Value Upside", |r| CsvValue::number(r.fair_value_upside)),
        CsvColumn::new("Analyst Target", |r| CsvValue::number(r.analyst_target)),
        CsvColumn::new("Analyst Upside", |r| CsvValue::number(r.analyst_upside)),
        CsvColumn::new("Health Label", |r| CsvValue::text(r.health_label.as_deref())),
        CsvColumn::new("Price Change Percent", |r| {
            CsvValue::number(r.price_change_percent)
        }),
        CsvColumn::new("Dividend Yield", |r| CsvValue::number(r.dividend_yield)),
    ]
}

fn needs_quotes(field: &str) -> bool {
    field.contains([',', '"', '\r', '\n'])
}

fn encode_field(field: &str, policy: QuotePolicy) -> String {
    if policy == QuotePolicy::Always || needs_quotes(field) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

/// Renders records through a fixed column set.
pub struct CsvEncoder {
    columns: Vec<CsvColumn>,
}

impl CsvEncoder {
    pub fn new(columns: Vec<CsvColumn>) -> Self {
        Self { columns }
    }

    pub fn portfolio() -> Self {
        Self::new(portfolio_columns())
    }

    pub fn header(&self) -> String {
        self.columns
            .iter()
            .map(|column| encode_field(column.header, QuotePolicy::WhenNeeded))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn row(&self, record: &StockRecord) -> String {
        self.columns
            .iter()
            .map(|column| encode_field(&(column.value)(record).render(), column.quote))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Header plus one line per record, `\n`-terminated.
    pub fn encode<'a, I>(&self, records: I) -> String
    where
        I: IntoIterator<Item = &'a StockRecord>,
    {
        let mut out = self.header();
        out.push('\n');
        for record in records {
            out.push_str(&self.row(record));
            out.push('\n');
        }
        out
    }
}

/// `<prefix>_<YYYY-MM-DD>.csv`
pub fn export_filename(prefix: &str, date: Date) -> String {
    format!("{prefix}_{date}.csv")
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Please select at least one stock to save to portfolio")]
    EmptySelection,
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    /// Empty selections are reported as warnings rather than failures.
    pub const fn is_warning(&self) -> bool {
        matches!(self, Self::EmptySelection)
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptySelection => "export.empty_selection",
            Self::Io { .. } => "export.io",
        }
    }
}

/// Rendered export, not yet written anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvExport {
    pub file_name: String,
    pub rows: usize,
    #[serde(skip)]
    pub contents: String,
}

impl CsvExport {
    /// Encodes `records` with the portfolio columns. Fails when there is
    /// nothing to export.
    pub fn portfolio(
        records: &[&StockRecord],
        prefix: &str,
        date: Date,
    ) -> Result<Self, ExportError> {
        if records.is_empty() {
            tracing::warn!("export requested with an empty selection");
            return Err(ExportError::EmptySelection);
        }
        let contents = CsvEncoder::portfolio().encode(records.iter().copied());
        Ok(Self {
            file_name: export_filename(prefix, date),
            rows: records.len(),
            contents,
        })
    }

    /// Writes the file into `dir` and returns its path.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.contents).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), rows = self.rows, "exported selection to CSV");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn sample() -> StockRecord {
        StockRecord::new(1, "ABC")
            .with_company_name("A, B Co")
            .with_market_cap(1_000_000.0)
            .with_price(12.5)
    }

    #[test]
    fn header_lists_portfolio_columns_in_order() {
        let header = CsvEncoder::portfolio().header();
        assert!(header.starts_with("Ticker,Company Name,Market Cap,Price,P/E Ratio"));
        assert!(header.ends_with("Price Change Percent,Dividend Yield"));
        assert_eq!(portfolio_columns().len(), 18);
    }

    #[test]
    fn company_name_is_quoted_and_numbers_are_literal() {
        let row = CsvEncoder::portfolio().row(&sample());
        assert!(row.starts_with("ABC,\"A, B Co\",1000000,12.5,N/A,N/A,N/A"));
        assert!(!row.contains('$'));
    }

    #[test]
    fn embedded_quotes_and_newlines_are_escaped() {
        let record = StockRecord {
            health_label: Some(String::from("say \"hi\"")),
            country: Some(String::from("line\nbreak")),
            ..StockRecord::new(2, "XYZ").with_company_name("Plain")
        };
        let row = CsvEncoder::portfolio().row(&record);
        assert!(row.contains(",\"Plain\","));
        assert!(row.contains(",\"say \"\"hi\"\"\","));
        assert!(row.contains(",\"line\nbreak\","));
    }

    #[test]
    fn missing_company_name_is_quoted_placeholder() {
        let row = CsvEncoder::portfolio().row(&StockRecord::new(3, "NIL"));
        assert!(row.starts_with("NIL,\"N/A\",N/A"));
    }

    #[test]
    fn filename_uses_export_date() {
        assert_eq!(
            export_filename("portfolio", date!(2024 - 03 - 07)),
            "portfolio_2024-03-07.csv"
        );
    }

    #[test]
    fn empty_selection_is_a_warning() {
        let error = CsvExport::portfolio(&[], DEFAULT_EXPORT_PREFIX, date!(2024 - 01 - 01))
            .expect_err("empty export must fail");
        assert!(error.is_warning());
    }

    #[test]
    fn write_to_dir_persists_contents() {
        let dir = tempfile::tempdir().expect("temp dir");
        let record = sample();
        let export = CsvExport::portfolio(&[&record], "picks", date!(2024 - 05 - 01))
            .expect("export should render");

        let path = export.write_to_dir(dir.path()).expect("file written");
        let written = fs::read_to_string(&path).expect("file readable");

        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("picks_2024-05-01.csv"));
        assert_eq!(written.lines().count(), 2);
        assert_eq!(export.rows, 1);
    }
}
