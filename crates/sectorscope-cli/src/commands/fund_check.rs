use sectorscope_core::{
    FundParameters, FundStrategy, Preset, Rebalancing, SmartWeights, StrategySelection, Validation,
};
use serde::Serialize;

use crate::cli::FundCheckArgs;
use crate::error::CliError;
use crate::output::Table;

use super::{CommandResult, ErrorRecord};

#[derive(Debug, Serialize)]
struct FundCheckResponseData<'a> {
    strategies: &'a StrategySelection,
    parameters: &'a FundParameters,
    smart_weights: Option<SmartWeights>,
    validation: &'a Validation,
}

/// Validates fund parameters offline. Blocking issues are reported as
/// errors, advisory ones as warnings.
pub fn run(args: &FundCheckArgs) -> Result<CommandResult, CliError> {
    let strategies = args
        .strategies
        .iter()
        .map(|raw| FundStrategy::parse(raw))
        .collect::<Result<StrategySelection, _>>()?;
    let parameters = build_parameters(args)?;
    let validation = parameters.validate(&strategies);

    let data = serde_json::to_value(FundCheckResponseData {
        strategies: &strategies,
        parameters: &parameters,
        smart_weights: parameters.smart_weights(),
        validation: &validation,
    })?;

    let errors = validation
        .errors
        .iter()
        .map(|issue| {
            ErrorRecord::new(
                format!("fund.{}", issue.id),
                format!("{}: {}", issue.title, issue.message),
            )
        })
        .collect();
    let warnings = validation
        .warnings
        .iter()
        .map(|issue| format!("{}: {}", issue.title, issue.message))
        .collect();

    Ok(CommandResult::ok(data)
        .with_table(summary_table(&parameters, &validation))
        .with_warnings(warnings)
        .with_errors(errors))
}

/// Starts from the preset (balanced by default), then applies manual edits.
fn build_parameters(args: &FundCheckArgs) -> Result<FundParameters, CliError> {
    let mut parameters = FundParameters::default();
    if let Some(preset) = &args.preset {
        parameters.apply_preset(preset.parse::<Preset>()?);
    }
    if let Some(holdings) = args.holdings {
        parameters.general.num_holdings = holdings;
    }
    if let Some(max) = args.max_weight {
        parameters.constraints.max_weight_per_stock = max;
    }
    if let Some(min) = args.min_weight {
        parameters.constraints.min_weight_per_stock = min;
    }
    if let Some(rebalancing) = &args.rebalancing {
        parameters.general.rebalancing_frequency = rebalancing.parse::<Rebalancing>()?;
    }
    parameters.sync_preset();
    if let Some(investment) = &args.investment {
        parameters.set_initial_investment(investment);
    }
    Ok(parameters)
}

fn summary_table(parameters: &FundParameters, validation: &Validation) -> Table {
    let mut table = Table::new(["Parameter", "Value"]);
    let preset = parameters
        .active_preset
        .map_or_else(|| String::from("custom"), |preset| preset.to_string());
    let rows = [
        ("Preset", preset),
        ("Holdings", parameters.general.num_holdings.to_string()),
        ("Max weight %", parameters.constraints.max_weight_per_stock.to_string()),
        ("Min weight %", parameters.constraints.min_weight_per_stock.to_string()),
        ("Rebalancing", parameters.general.rebalancing_frequency.as_str().to_owned()),
        ("Initial investment", parameters.general.initial_investment.to_string()),
        ("Valid", validation.is_valid.to_string()),
    ];
    for (name, value) in rows {
        table.push_row(vec![name.to_owned(), value]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(strategies: &[&str]) -> FundCheckArgs {
        FundCheckArgs {
            strategies: strategies.iter().map(|s| (*s).to_owned()).collect(),
            preset: None,
            holdings: None,
            max_weight: None,
            min_weight: None,
            investment: None,
            rebalancing: None,
        }
    }

    #[test]
    fn balanced_defaults_pass_with_one_strategy() {
        let result = run(&args(&["market-cap"])).expect("valid arguments");

        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.data["validation"]["is_valid"], true);
        assert_eq!(result.data["parameters"]["active_preset"], "balanced");
    }

    #[test]
    fn weight_constraints_are_reported_as_errors() {
        let mut args = args(&[]);
        args.max_weight = Some(3.0);

        let result = run(&args).expect("valid arguments");
        let codes: Vec<&str> = result.errors.iter().map(|error| error.code.as_str()).collect();

        assert!(codes.contains(&"fund.constraint-max-min"), "{codes:?}");
        assert!(codes.contains(&"fund.constraint-max-total"), "{codes:?}");
        assert!(codes.contains(&"fund.strategy-empty"), "{codes:?}");
    }

    #[test]
    fn manual_edit_clears_the_preset() {
        let mut args = args(&["equal-weight"]);
        args.preset = Some(String::from("aggressive"));
        args.holdings = Some(21);

        let parameters = build_parameters(&args).expect("valid arguments");

        assert_eq!(parameters.general.num_holdings, 21);
        assert_eq!(parameters.active_preset, None);
    }

    #[test]
    fn unknown_rebalancing_is_rejected() {
        let mut args = args(&["factor"]);
        args.rebalancing = Some(String::from("weekly"));

        let error = run(&args).expect_err("not a frequency");
        assert_eq!(error.exit_code(), 2);
    }
}
