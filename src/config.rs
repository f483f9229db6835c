//! TOML configuration for a projection run.
//!
//! The file is read once into an immutable [`HouseBuyingConfig`] which is then
//! handed to the core by value. House price, down payment and loan term may be
//! lists, in which case every combination is simulated.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::core::{CashFlowParameters, CoreError, PaymentLedger, SolverSettings, SweepPlan};

/// Longest projection accepted, in months (60 years).
pub const MAX_FORECAST_MONTHS: u32 = 720;
/// Longest loan term accepted, in months (30 years).
pub const MAX_LOAN_TERM_MONTHS: u32 = 360;
/// Most price × down payment × term combinations a single config may expand to.
pub const MAX_SWEEP_RUNS: usize = 512;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid config value for {field}: {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// A field that is either one value or a list of values to sweep over.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SweepValue<T> {
    Scalar(T),
    Sweep(Vec<T>),
}

impl<T: Clone> SweepValue<T> {
    pub fn values(&self) -> Vec<T> {
        match self {
            SweepValue::Scalar(v) => vec![v.clone()],
            SweepValue::Sweep(vs) => vs.clone(),
        }
    }

    pub fn first(&self) -> Option<T> {
        match self {
            SweepValue::Scalar(v) => Some(v.clone()),
            SweepValue::Sweep(vs) => vs.first().cloned(),
        }
    }
}

impl<T> From<T> for SweepValue<T> {
    fn from(value: T) -> Self {
        SweepValue::Scalar(value)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationSection {
    pub months_to_forecast: u32,
    #[serde(default)]
    pub ledger: PaymentLedger,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuyerSection {
    pub starting_money: f64,
    pub investment_monthly_interest: f64,
    pub liquid_salary: f64,
    pub fixed_monthly_expenses: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HouseSection {
    pub house_price: SweepValue<f64>,
    pub down_payment: SweepValue<f64>,
    pub months_to_pay: SweepValue<u32>,
    pub house_monthly_interest: f64,
}

/// Values supplied on top of a config file, e.g. from CLI flags or an API request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub months_to_forecast: Option<u32>,
    pub ledger: Option<PaymentLedger>,
    pub starting_money: Option<f64>,
    pub investment_monthly_interest: Option<f64>,
    pub liquid_salary: Option<f64>,
    pub fixed_monthly_expenses: Option<f64>,
    pub house_price: Option<SweepValue<f64>>,
    pub down_payment: Option<SweepValue<f64>>,
    pub months_to_pay: Option<SweepValue<u32>>,
    pub house_monthly_interest: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HouseBuyingConfig {
    pub simulation: SimulationSection,
    pub buyer: BuyerSection,
    pub house: HouseSection,
    #[serde(default)]
    pub solver: SolverSettings,
}

impl Default for HouseBuyingConfig {
    fn default() -> Self {
        HouseBuyingConfig {
            simulation: SimulationSection {
                months_to_forecast: 120,
                ledger: PaymentLedger::Reference,
            },
            buyer: BuyerSection {
                starting_money: 600_000.0,
                investment_monthly_interest: 0.01,
                liquid_salary: 20_000.0,
                fixed_monthly_expenses: 7_000.0,
            },
            house: HouseSection {
                house_price: SweepValue::Scalar(600_000.0),
                down_payment: SweepValue::Scalar(150_000.0),
                months_to_pay: SweepValue::Scalar(120),
                house_monthly_interest: 0.01,
            },
            solver: SolverSettings::default(),
        }
    }
}

impl HouseBuyingConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::parse(&content, &path.display().to_string())?;
        tracing::debug!(path = %path.display(), runs = config.sweep_plan().len(), "config loaded");
        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Self::parse(toml_str, "<string>")
    }

    fn parse(toml_str: &str, path: &str) -> Result<Self, ConfigError> {
        let config: HouseBuyingConfig =
            toml::from_str(toml_str).map_err(|e| ConfigError::Parse {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(v) = overrides.months_to_forecast {
            self.simulation.months_to_forecast = v;
        }
        if let Some(v) = overrides.ledger {
            self.simulation.ledger = v;
        }
        if let Some(v) = overrides.starting_money {
            self.buyer.starting_money = v;
        }
        if let Some(v) = overrides.investment_monthly_interest {
            self.buyer.investment_monthly_interest = v;
        }
        if let Some(v) = overrides.liquid_salary {
            self.buyer.liquid_salary = v;
        }
        if let Some(v) = overrides.fixed_monthly_expenses {
            self.buyer.fixed_monthly_expenses = v;
        }
        if let Some(v) = &overrides.house_price {
            self.house.house_price = v.clone();
        }
        if let Some(v) = &overrides.down_payment {
            self.house.down_payment = v.clone();
        }
        if let Some(v) = &overrides.months_to_pay {
            self.house.months_to_pay = v.clone();
        }
        if let Some(v) = overrides.house_monthly_interest {
            self.house.house_monthly_interest = v;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.months_to_forecast > MAX_FORECAST_MONTHS {
            return Err(ConfigError::Validation {
                field: "simulation.months_to_forecast".to_string(),
                message: format!("must be <= {MAX_FORECAST_MONTHS}"),
            });
        }

        let plan = self.sweep_plan();
        for (field, empty) in [
            ("house.house_price", plan.house_prices.is_empty()),
            ("house.down_payment", plan.down_payments.is_empty()),
            ("house.months_to_pay", plan.loan_terms.is_empty()),
        ] {
            if empty {
                return Err(ConfigError::Validation {
                    field: field.to_string(),
                    message: "list must contain at least one value".to_string(),
                });
            }
        }

        if plan.len() > MAX_SWEEP_RUNS {
            return Err(ConfigError::Validation {
                field: "house".to_string(),
                message: format!(
                    "sweep expands to {} runs, at most {MAX_SWEEP_RUNS} are allowed",
                    plan.len()
                ),
            });
        }
        if plan.loan_terms.iter().any(|&term| term > MAX_LOAN_TERM_MONTHS) {
            return Err(ConfigError::Validation {
                field: "house.months_to_pay".to_string(),
                message: format!("must be <= {MAX_LOAN_TERM_MONTHS}"),
            });
        }

        for params in plan.expand(&self.base_parameters()) {
            params.validate()?;
            // A zero-month term never amortizes anything; the solver would
            // only drift to its upper bound.
            if params.loan_term_months == 0 && params.loan().principal > 0.0 {
                return Err(ConfigError::Validation {
                    field: "house.months_to_pay".to_string(),
                    message: "must be > 0 when a loan is financed".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn sweep_plan(&self) -> SweepPlan {
        SweepPlan {
            house_prices: self.house.house_price.values(),
            down_payments: self.house.down_payment.values(),
            loan_terms: self.house.months_to_pay.values(),
        }
    }

    /// Parameters shared by every run; swept fields hold their first value.
    pub fn base_parameters(&self) -> CashFlowParameters {
        CashFlowParameters {
            forecast_months: self.simulation.months_to_forecast,
            starting_balance: self.buyer.starting_money,
            down_payment: self.house.down_payment.first().unwrap_or_default(),
            house_price: self.house.house_price.first().unwrap_or_default(),
            house_monthly_rate: self.house.house_monthly_interest,
            loan_term_months: self.house.months_to_pay.first().unwrap_or_default(),
            monthly_income: self.buyer.liquid_salary,
            monthly_expenses: self.buyer.fixed_monthly_expenses,
            investment_monthly_rate: self.buyer.investment_monthly_interest,
            ledger: self.simulation.ledger,
            solver: self.solver,
        }
    }
}
