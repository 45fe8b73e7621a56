mod classifier;
mod db_stats;
mod export;
mod fund_check;
mod options;
mod profile;
mod stats;
mod stocks;

use sectorscope_core::{ClientConfig, FetchError, FetchSlot, RestApi};
use serde::Serialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::Table;

/// Failure reported alongside partial data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub code: String,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&FetchError> for ErrorRecord {
    fn from(error: &FetchError) -> Self {
        Self::new(error.code(), error.banner_message())
    }
}

#[derive(Debug)]
pub struct CommandResult {
    pub data: Value,
    pub table: Option<Table>,
    pub warnings: Vec<String>,
    pub errors: Vec<ErrorRecord>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            table: None,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<ErrorRecord>) -> Self {
        self.errors.extend(errors);
        self
    }

    /// Adds the error held by `slot`, if any.
    pub fn with_slot_error<T>(mut self, slot: &FetchSlot<T>) -> Self {
        if let Some(error) = slot.error() {
            self.errors.push(ErrorRecord::from(error));
        }
        self
    }
}

/// Everything printed for one invocation.
#[derive(Debug, Serialize)]
pub struct Report {
    pub command: &'static str,
    pub base_url: String,
    pub generated_at: String,
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<ErrorRecord>,
    #[serde(skip)]
    pub table: Option<Table>,
}

pub async fn run(cli: &Cli) -> Result<Report, CliError> {
    let config = client_config(cli)?;
    let base_url = config.base_url().to_owned();
    let api = RestApi::from_config(config);

    let command_result = match &cli.command {
        Command::Options(args) => options::run(args, api).await?,
        Command::Stocks(args) => stocks::run(args, api).await?,
        Command::Stats(args) => stats::run(args, api).await?,
        Command::Export(args) => export::run(args, api).await?,
        Command::Sectors(args) => classifier::run_sectors(args, api).await?,
        Command::Sector(args) => classifier::run_sector(args, api).await?,
        Command::Industry(args) => classifier::run_industry(args, api).await?,
        Command::Profile(args) => profile::run_profile(args, api).await?,
        Command::History(args) => profile::run_history(args, api).await?,
        Command::FundCheck(args) => fund_check::run(args)?,
        Command::DbStats => db_stats::run(api).await?,
    };

    let CommandResult {
        data,
        table,
        warnings,
        errors,
    } = command_result;

    let generated_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|error| CliError::Command(error.to_string()))?;

    Ok(Report {
        command: command_name(&cli.command),
        base_url,
        generated_at,
        data,
        warnings,
        errors,
        table,
    })
}

/// Environment configuration with the global flags applied on top.
fn client_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url)?;
    }
    if let Some(dataset) = &cli.dataset {
        config = config.with_dataset(dataset.as_str());
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_timeout_ms(timeout_ms);
    }
    Ok(config)
}

const fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Options(_) => "options",
        Command::Stocks(_) => "stocks",
        Command::Stats(_) => "stats",
        Command::Export(_) => "export",
        Command::Sectors(_) => "sectors",
        Command::Sector(_) => "sector",
        Command::Industry(_) => "industry",
        Command::Profile(_) => "profile",
        Command::History(_) => "history",
        Command::FundCheck(_) => "fund-check",
        Command::DbStats => "db-stats",
    }
}
