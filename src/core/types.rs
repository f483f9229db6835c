use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid argument: {field} ({reason})")]
    InvalidArgument { field: String, reason: String },
}

impl CoreError {
    pub(crate) fn invalid(field: &str, reason: &str) -> Self {
        CoreError::InvalidArgument {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Fixed-rate, fixed-term loan as seen by the solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanTerms {
    pub principal: f64,
    pub monthly_rate: f64,
    pub term_months: u32,
}

impl LoanTerms {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.principal.is_finite() || self.principal < 0.0 {
            return Err(CoreError::invalid("principal", "must be finite and >= 0"));
        }
        if !self.monthly_rate.is_finite() || self.monthly_rate < 0.0 {
            return Err(CoreError::invalid("monthly_rate", "must be finite and >= 0"));
        }
        Ok(())
    }
}

/// Knobs of the payment binary search.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub tolerance: f64,
    pub max_iterations: u32,
    pub payment_upper_bound: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            tolerance: 0.001,
            max_iterations: 10_000,
            payment_upper_bound: 100_000.0,
        }
    }
}

impl SolverSettings {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(CoreError::invalid("tolerance", "must be > 0"));
        }
        if self.max_iterations == 0 {
            return Err(CoreError::invalid("max_iterations", "must be > 0"));
        }
        if !self.payment_upper_bound.is_finite() || self.payment_upper_bound <= 0.0 {
            return Err(CoreError::invalid("payment_upper_bound", "must be > 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentSolution {
    pub payment: f64,
    /// Signed loan balance left when `payment` is applied for the whole term.
    pub residual: f64,
    pub iterations: u32,
    pub converged: bool,
}

/// How the monthly loan payment is booked against the liquid balance.
///
/// `Reference` reproduces the historical ledger exactly: during the loan term
/// the payment is deducted twice per month (once before growth, once inside
/// the net cash flow), and the term check is inclusive so the first deduction
/// runs for `loan_term_months + 1` months. The unconditional deduction also
/// keeps running after the loan is paid off.
///
/// `Corrected` deducts the payment once per month for exactly
/// `loan_term_months` months.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentLedger {
    #[default]
    Reference,
    Corrected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowParameters {
    pub forecast_months: u32,
    pub starting_balance: f64,
    pub down_payment: f64,
    pub house_price: f64,
    pub house_monthly_rate: f64,
    pub loan_term_months: u32,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub investment_monthly_rate: f64,
    pub ledger: PaymentLedger,
    pub solver: SolverSettings,
}

impl CashFlowParameters {
    /// The financed part of the house price.
    pub fn loan(&self) -> LoanTerms {
        LoanTerms {
            principal: self.house_price - self.down_payment,
            monthly_rate: self.house_monthly_rate,
            term_months: self.loan_term_months,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        for (field, value) in [
            ("starting_balance", self.starting_balance),
            ("monthly_income", self.monthly_income),
            ("monthly_expenses", self.monthly_expenses),
            ("investment_monthly_rate", self.investment_monthly_rate),
        ] {
            if !value.is_finite() {
                return Err(CoreError::invalid(field, "must be finite"));
            }
        }
        for (field, value) in [
            ("down_payment", self.down_payment),
            ("house_price", self.house_price),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::invalid(field, "must be finite and >= 0"));
            }
        }
        if self.down_payment > self.house_price {
            return Err(CoreError::invalid(
                "down_payment",
                "cannot exceed house_price",
            ));
        }
        if self.investment_monthly_rate <= -1.0 {
            return Err(CoreError::invalid("investment_monthly_rate", "must be > -1"));
        }
        self.loan().validate()?;
        self.solver.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationOutput {
    /// Liquid balance per month; index 0 is the balance right after the down payment.
    pub balances: Vec<f64>,
    pub monthly_payment: f64,
    pub payment_converged: bool,
}
