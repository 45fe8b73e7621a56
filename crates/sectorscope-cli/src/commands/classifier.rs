use sectorscope_core::format::{format_decimal, format_market_cap};
use sectorscope_core::{
    CapUnit, ClassifierController, ClassifierFilters, CompanySummary, IndustryBreakdown,
    IndustryDetail, IndustrySort, MarketApi, ScopeFilterKey, SectorCounts, SectorDetail,
};
use serde::Serialize;

use crate::cli::{IndustryArgs, ScopeArgs, SectorArgs, SectorsArgs};
use crate::error::CliError;
use crate::output::Table;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct SectorResponseData<'a> {
    view: &'static str,
    scope: &'a ClassifierFilters,
    summary: Option<SectorDetail>,
    industries: Vec<&'a IndustryBreakdown>,
    industry_names: Vec<&'a str>,
    companies: &'a [CompanySummary],
}

#[derive(Debug, Serialize)]
struct IndustryResponseData<'a> {
    view: &'static str,
    scope: &'a ClassifierFilters,
    summary: Option<IndustryDetail>,
    companies: &'a [CompanySummary],
}

pub async fn run_sectors<A: MarketApi>(
    args: &SectorsArgs,
    api: A,
) -> Result<CommandResult, CliError> {
    let mut classifier = ClassifierController::new(api);
    if let Some(exchange) = &args.exchange {
        classifier.set_exchange(exchange);
    }
    classifier.load_sectors().await;

    let sectors = classifier.sectors().data().map(Vec::as_slice).unwrap_or_default();
    let data = serde_json::to_value(sectors)?;
    Ok(CommandResult::ok(data)
        .with_table(sectors_table(sectors))
        .with_slot_error(classifier.sectors()))
}

pub async fn run_sector<A: MarketApi>(
    args: &SectorArgs,
    api: A,
) -> Result<CommandResult, CliError> {
    let mut classifier = ClassifierController::new(api);
    classifier.set_industry_sort(IndustrySort::parse(&args.industry_sort)?);
    enter_sector(&mut classifier, &args.name, &args.scope)?;
    if let Some(industry) = &args.industry {
        classifier.set_scope_filter(ScopeFilterKey::Industry, industry);
    }

    classifier.refresh().await;
    if args.companies {
        classifier.toggle_sector_companies().await;
    }

    let industries = classifier.industry_rows(&args.industry_search);
    let table = if args.companies {
        company_table(classifier.visible_companies())
    } else {
        industry_table(&industries)
    };
    let industry_names: Vec<&str> = classifier
        .sector_industries()
        .data()
        .map(|list| list.industries.iter().map(|row| row.name.as_str()).collect())
        .unwrap_or_default();

    let data = serde_json::to_value(SectorResponseData {
        view: classifier.state().name(),
        scope: classifier.scope(),
        summary: classifier.sector_summary(),
        industries,
        industry_names,
        companies: classifier.visible_companies(),
    })?;

    Ok(CommandResult::ok(data)
        .with_table(table)
        .with_slot_error(classifier.sector_detail())
        .with_slot_error(classifier.sector_industries())
        .with_slot_error(classifier.sector_companies()))
}

pub async fn run_industry<A: MarketApi>(
    args: &IndustryArgs,
    api: A,
) -> Result<CommandResult, CliError> {
    let mut classifier = ClassifierController::new(api);
    enter_sector(&mut classifier, &args.sector, &args.scope)?;
    if !classifier.enter_industry(&args.industry).moved() {
        return Err(CliError::Command(String::from("industry name must not be empty")));
    }
    classifier.refresh().await;

    let data = serde_json::to_value(IndustryResponseData {
        view: classifier.state().name(),
        scope: classifier.scope(),
        summary: classifier.industry_summary(),
        companies: classifier.visible_companies(),
    })?;

    Ok(CommandResult::ok(data)
        .with_table(company_table(classifier.visible_companies()))
        .with_slot_error(classifier.industry_detail())
        .with_slot_error(classifier.industry_companies()))
}

/// Enters the sector view and applies the scoped filters. The exchange is
/// set first so the sector view inherits it.
fn enter_sector<A: MarketApi>(
    classifier: &mut ClassifierController<A>,
    sector: &str,
    scope: &ScopeArgs,
) -> Result<(), CliError> {
    if let Some(exchange) = &scope.exchange {
        classifier.set_exchange(exchange);
    }
    if !classifier.enter_sector(sector).moved() {
        return Err(CliError::Command(String::from("sector name must not be empty")));
    }

    let bounds = [
        (ScopeFilterKey::MarketCapMin, &scope.cap_min),
        (ScopeFilterKey::MarketCapMax, &scope.cap_max),
    ];
    for (key, value) in bounds {
        if let Some(value) = value {
            classifier.set_scope_filter(key, value);
        }
    }
    let units = [
        (ScopeFilterKey::MarketCapMinUnit, &scope.cap_min_unit),
        (ScopeFilterKey::MarketCapMaxUnit, &scope.cap_max_unit),
    ];
    for (key, unit) in units {
        if let Some(unit) = unit {
            let unit = CapUnit::parse(unit)?;
            classifier.set_scope_filter(key, unit.as_str());
        }
    }
    Ok(())
}

fn sectors_table(sectors: &[SectorCounts]) -> Table {
    let mut table = Table::new(["Sector", "Companies", "Industries"]);
    for sector in sectors {
        table.push_row(vec![
            sector.name.clone(),
            sector.total_companies.to_string(),
            sector.industries.len().to_string(),
        ]);
    }
    table
}

fn industry_table(industries: &[&IndustryBreakdown]) -> Table {
    let mut table = Table::new(["Industry", "Companies", "Market Cap"]);
    for industry in industries {
        table.push_row(vec![
            industry.display_name().to_owned(),
            industry.count.to_string(),
            format_market_cap(industry.total_market_cap),
        ]);
    }
    table
}

fn company_table(companies: &[CompanySummary]) -> Table {
    let mut table = Table::new(["Ticker", "Company", "Exchange", "Country", "Price", "Market Cap"]);
    for company in companies {
        table.push_row(vec![
            company.ticker.clone(),
            company.company_name.clone().unwrap_or_default(),
            company.exchange_key().unwrap_or_default().to_owned(),
            company.country.clone().unwrap_or_default(),
            format_decimal(company.price),
            format_market_cap(company.market_cap),
        ]);
    }
    table
}
