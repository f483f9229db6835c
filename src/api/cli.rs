use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{ConfigError, ConfigOverrides, HouseBuyingConfig, SweepValue};
use crate::core::{CoreError, PaymentLedger, SweepRun, run_sweep};
use crate::report::render_run;

use super::SweepResponse;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliLedger {
    Reference,
    Corrected,
}

impl From<CliLedger> for PaymentLedger {
    fn from(value: CliLedger) -> Self {
        match value {
            CliLedger::Reference => PaymentLedger::Reference,
            CliLedger::Corrected => PaymentLedger::Corrected,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "house-buying",
    about = "Liquid cash projection while paying off a fixed-rate home loan",
    after_help = "Run `house-buying serve [port]` to start the HTTP API instead."
)]
struct Cli {
    #[arg(long, help = "TOML config file; the flags below override its values")]
    config: Option<PathBuf>,
    #[arg(long, help = "How many months to project, independent of the loan term")]
    months_to_forecast: Option<u32>,
    #[arg(long, allow_negative_numbers = true, help = "Money on account before buying")]
    starting_money: Option<f64>,
    #[arg(long, help = "Monthly return on the liquid balance, e.g. 0.005 for 0.5%")]
    investment_monthly_interest: Option<f64>,
    #[arg(long, help = "Net monthly income")]
    liquid_salary: Option<f64>,
    #[arg(long, help = "Monthly expenses other than the house payment")]
    fixed_monthly_expenses: Option<f64>,
    #[arg(long, value_delimiter = ',', help = "House price; comma separated values are swept")]
    house_price: Vec<f64>,
    #[arg(long, value_delimiter = ',', help = "Down payment; comma separated values are swept")]
    down_payment: Vec<f64>,
    #[arg(long, value_delimiter = ',', help = "Loan term in months; comma separated values are swept")]
    months_to_pay: Vec<u32>,
    #[arg(long, help = "Monthly loan interest, e.g. 0.008 for 0.8%")]
    house_monthly_interest: Option<f64>,
    #[arg(
        long,
        value_enum,
        help = "Payment booking: reference (historical double deduction) or corrected"
    )]
    ledger: Option<CliLedger>,
    #[arg(long, help = "Print runs as JSON instead of text summaries")]
    json: bool,
}

fn sweep_value<T>(mut values: Vec<T>) -> Option<SweepValue<T>> {
    match values.len() {
        0 => None,
        1 => values.pop().map(SweepValue::Scalar),
        _ => Some(SweepValue::Sweep(values)),
    }
}

fn overrides_from_cli(cli: &Cli) -> ConfigOverrides {
    ConfigOverrides {
        months_to_forecast: cli.months_to_forecast,
        ledger: cli.ledger.map(Into::into),
        starting_money: cli.starting_money,
        investment_monthly_interest: cli.investment_monthly_interest,
        liquid_salary: cli.liquid_salary,
        fixed_monthly_expenses: cli.fixed_monthly_expenses,
        house_price: sweep_value(cli.house_price.clone()),
        down_payment: sweep_value(cli.down_payment.clone()),
        months_to_pay: sweep_value(cli.months_to_pay.clone()),
        house_monthly_interest: cli.house_monthly_interest,
    }
}

fn build_config(cli: &Cli) -> Result<HouseBuyingConfig, String> {
    let mut config = match &cli.config {
        Some(path) => HouseBuyingConfig::load(path).map_err(|e| format!("--config: {e}"))?,
        None => HouseBuyingConfig::default(),
    };

    config.apply_overrides(&overrides_from_cli(cli));
    config
        .validate()
        .map_err(|e| format!("{}: {e}", flag_for_error(&e)))?;
    Ok(config)
}

/// Flag that sets the value a validation error complains about.
fn flag_for_error(err: &ConfigError) -> &'static str {
    let field = match err {
        ConfigError::Validation { field, .. } => field.as_str(),
        ConfigError::Core(CoreError::InvalidArgument { field, .. }) => field.as_str(),
        ConfigError::Io { .. } | ConfigError::Parse { .. } => return "--config",
    };
    match field {
        "simulation.months_to_forecast" => "--months-to-forecast",
        "starting_balance" => "--starting-money",
        "monthly_income" => "--liquid-salary",
        "monthly_expenses" => "--fixed-monthly-expenses",
        "investment_monthly_rate" => "--investment-monthly-interest",
        "house_price" | "house.house_price" => "--house-price",
        "down_payment" | "house.down_payment" => "--down-payment",
        "principal" | "house" => "--house-price/--down-payment",
        "monthly_rate" => "--house-monthly-interest",
        "house.months_to_pay" => "--months-to-pay",
        _ => "--config",
    }
}

fn render_runs(runs: &[SweepRun], json: bool) -> Result<String, String> {
    if json {
        let response = SweepResponse::from_runs(runs);
        return serde_json::to_string_pretty(&response)
            .map_err(|e| format!("failed to encode runs as JSON: {e}"));
    }

    Ok(runs
        .iter()
        .map(render_run)
        .collect::<Vec<_>>()
        .join("\n\n"))
}

/// Parses `args` (program name first), runs every configured combination and
/// prints the result to stdout.
pub fn run_cli<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let config = build_config(&cli)?;

    let plan = config.sweep_plan();
    let runs = run_sweep(&config.base_parameters(), &plan);
    for run in runs.iter().filter(|run| !run.output.payment_converged) {
        tracing::warn!(run = %run.artifact_stem(), "monthly payment is approximate");
    }

    println!("{}", render_runs(&runs, cli.json)?);
    Ok(())
}
