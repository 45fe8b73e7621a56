//! CLI argument definitions for sectorscope.
//!
//! The CLI drives the headless screener and classifier against a running
//! backend. Every command prints one JSON document (or a table) describing
//! what was loaded, plus any warnings and fetch errors.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `options` | Filter vocabulary (exchanges, sectors, industries, countries) |
//! | `stocks` | One page of the filtered stock listing |
//! | `stats` | Aggregate statistics for a filter set |
//! | `export` | Save selected listing rows to a portfolio CSV |
//! | `sectors` | Sector list with company and industry counts |
//! | `sector` | Sector detail with its industry breakdown |
//! | `industry` | Industry detail with its companies |
//! | `profile` | Company profile and chart windows |
//! | `history` | Daily price history for a company |
//! | `fund-check` | Validate fund parameters and strategies |
//! | `db-stats` | Database coverage counts |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--api-url` | `$SECTORSCOPE_API_BASE_URL` or `http://localhost:8000/api` | Backend base URL |
//! | `--dataset` | `$SECTORSCOPE_DATASET` | Dataset key added to every request |
//! | `--timeout-ms` | `$SECTORSCOPE_TIMEOUT_MS` or `10000` | Request timeout |
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings as errors |
//!
//! # Examples
//!
//! ```bash
//! # First page of NASDAQ stocks under $5, largest first
//! sectorscope stocks --exchange NASDAQ --price "Under \$5" --sort market_cap --sort market_cap
//!
//! # Export two rows of page 3
//! sectorscope export --page 3 --select 1841 --select 1907 --output-dir ./out
//!
//! # Industries of a sector, ordered by market cap
//! sectorscope sector Technology --industry-sort total_market_cap-desc --format table
//! ```

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

/// Stock screener and sector classifier client.
#[derive(Debug, Parser)]
#[command(
    name = "sectorscope",
    author,
    version,
    about = "Stock screener and sector classifier client",
    long_about = "sectorscope queries a read-only stock screener backend. It lists and \
filters stocks, aggregates statistics, drills down from sectors to industries and \
companies, validates fund parameters and exports selected rows to CSV.\n\
\n\
Use 'sectorscope <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Backend base URL, e.g. http://localhost:8000/api.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Dataset key sent with every request.
    #[arg(long, global = true)]
    pub dataset: Option<String>,

    /// Request timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table for terminal display.
    Table,
    /// Single JSON object output.
    Json,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the filter vocabulary.
    ///
    /// # Examples
    ///
    ///   sectorscope options
    ///   sectorscope options --industry-search semi
    Options(OptionsArgs),

    /// Fetch one page of the filtered stock listing.
    ///
    /// `--sort COLUMN` toggles the sort on a column; repeat it to flip the
    /// direction.
    ///
    /// # Examples
    ///
    ///   sectorscope stocks --sector Technology --page 2
    ///   sectorscope stocks --cap-min 2 --cap-min-unit B --sort price
    Stocks(ListingArgs),

    /// Fetch aggregate statistics for a filter set.
    Stats(FilterArgs),

    /// Export selected rows of a listing page to CSV.
    ///
    /// # Examples
    ///
    ///   sectorscope export --all --exchange TASE
    ///   sectorscope export --select 12 --select 15 --prefix picks
    Export(ExportArgs),

    /// List sectors with company and industry counts.
    Sectors(SectorsArgs),

    /// Show one sector and its industry breakdown.
    Sector(SectorArgs),

    /// Show one industry and its companies.
    Industry(IndustryArgs),

    /// Show a company profile with its chart windows.
    Profile(CompanyArgs),

    /// Fetch daily price history for a company.
    History(HistoryArgs),

    /// Validate fund parameters for a strategy selection.
    ///
    /// # Examples
    ///
    ///   sectorscope fund-check --strategy factor-based --preset aggressive
    ///   sectorscope fund-check --strategy equal-weight --holdings 40 --max-weight 3
    FundCheck(FundCheckArgs),

    /// Fetch database coverage counts.
    DbStats,
}

#[derive(Debug, Args)]
pub struct OptionsArgs {
    /// Also list industry suggestions matching this text.
    #[arg(long)]
    pub industry_search: Option<String>,
}

/// Screener filters shared by `stocks`, `stats` and `export`.
#[derive(Debug, Default, Args)]
pub struct FilterArgs {
    /// Ticker or company name search text.
    #[arg(long)]
    pub search: Option<String>,

    /// Exchange code (e.g. NASDAQ, TASE).
    #[arg(long)]
    pub exchange: Option<String>,

    #[arg(long)]
    pub sector: Option<String>,

    #[arg(long)]
    pub industry: Option<String>,

    #[arg(long)]
    pub country: Option<String>,

    /// Price bucket: "Any", "Under $N" or "Over $N".
    #[arg(long)]
    pub price: Option<String>,

    /// Minimum market cap in `--cap-min-unit`.
    #[arg(long)]
    pub cap_min: Option<String>,

    /// Maximum market cap in `--cap-max-unit`.
    #[arg(long)]
    pub cap_max: Option<String>,

    /// Unit of `--cap-min`: M or B.
    #[arg(long)]
    pub cap_min_unit: Option<String>,

    /// Unit of `--cap-max`: M or B.
    #[arg(long)]
    pub cap_max_unit: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListingArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// One-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Rows per page: 10, 20, 30, 50, 100 or 200.
    #[arg(long, default_value_t = 30)]
    pub page_size: u32,

    /// Explicit ordering, e.g. `-market_cap`.
    #[arg(long)]
    pub ordering: Option<String>,

    /// Toggle the sort on a column. Repeatable.
    #[arg(long = "sort", value_name = "COLUMN")]
    pub sort: Vec<String>,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("selection").required(true).args(["select", "all"])))]
pub struct ExportArgs {
    #[command(flatten)]
    pub listing: ListingArgs,

    /// Record id to select. Repeatable.
    #[arg(long = "select", value_name = "ID")]
    pub select: Vec<String>,

    /// Select every row on the page.
    #[arg(long, default_value_t = false)]
    pub all: bool,

    /// Directory the CSV file is written to.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// File name prefix; the export date is appended.
    #[arg(long, default_value = "portfolio")]
    pub prefix: String,
}

#[derive(Debug, Args)]
pub struct SectorsArgs {
    /// Restrict counts to one exchange.
    #[arg(long)]
    pub exchange: Option<String>,
}

/// Filters scoped to a sector or industry view.
#[derive(Debug, Default, Args)]
pub struct ScopeArgs {
    /// Exchange inherited by the sector view.
    #[arg(long)]
    pub exchange: Option<String>,

    #[arg(long)]
    pub cap_min: Option<String>,

    #[arg(long)]
    pub cap_max: Option<String>,

    #[arg(long)]
    pub cap_min_unit: Option<String>,

    #[arg(long)]
    pub cap_max_unit: Option<String>,
}

#[derive(Debug, Args)]
pub struct SectorArgs {
    /// Sector name.
    pub name: String,

    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Restrict the company list to one industry.
    #[arg(long)]
    pub industry: Option<String>,

    /// Load the sector's company list.
    #[arg(long, default_value_t = false)]
    pub companies: bool,

    /// Only show industries whose name contains this text.
    #[arg(long, default_value = "")]
    pub industry_search: String,

    /// Industry ordering: <count|total_market_cap|name>-<asc|desc>.
    #[arg(long, default_value = "count-desc")]
    pub industry_sort: String,
}

#[derive(Debug, Args)]
pub struct IndustryArgs {
    /// Sector name.
    pub sector: String,

    /// Industry name.
    pub industry: String,

    #[command(flatten)]
    pub scope: ScopeArgs,
}

#[derive(Debug, Args)]
pub struct CompanyArgs {
    /// Ticker symbol.
    pub ticker: String,

    /// Exchange disambiguating the ticker.
    #[arg(long)]
    pub exchange: Option<String>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub company: CompanyArgs,

    /// `max`, a chart preset (1M, 3M, 6M, 1Y, 5Y) or a number of days.
    #[arg(long, default_value = "max")]
    pub window: String,

    /// Maximum number of points to return.
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Debug, Args)]
pub struct FundCheckArgs {
    /// Strategy to include. Repeatable.
    #[arg(long = "strategy", value_name = "STRATEGY")]
    pub strategies: Vec<String>,

    /// Start from a preset: conservative, balanced or aggressive.
    #[arg(long)]
    pub preset: Option<String>,

    /// Number of holdings.
    #[arg(long)]
    pub holdings: Option<u32>,

    /// Maximum weight per stock, in percent.
    #[arg(long)]
    pub max_weight: Option<f64>,

    /// Minimum weight per stock, in percent.
    #[arg(long)]
    pub min_weight: Option<f64>,

    /// Initial investment, e.g. "$250,000".
    #[arg(long)]
    pub investment: Option<String>,

    /// Rebalancing frequency: monthly, quarterly, semi-annual or annual.
    #[arg(long)]
    pub rebalancing: Option<String>,
}
