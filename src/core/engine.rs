use super::solver::solve_payment;
use super::types::{CashFlowParameters, CoreError, PaymentLedger, SimulationOutput};

/// Month-by-month liquid balance after buying the house.
///
/// `balances[0]` is the balance right after the down payment and the series
/// has `forecast_months + 1` entries. Negative balances are kept as they are.
pub fn simulate(params: &CashFlowParameters) -> SimulationOutput {
    let solution = solve_payment(&params.loan(), &params.solver);
    let monthly_payment = solution.payment;

    let mut balances = Vec::with_capacity(params.forecast_months as usize + 1);
    let mut balance = params.starting_balance - params.down_payment;
    balances.push(balance);

    for month in 0..params.forecast_months {
        balance = match params.ledger {
            PaymentLedger::Reference => reference_month(params, balance, month, monthly_payment),
            PaymentLedger::Corrected => corrected_month(params, balance, month, monthly_payment),
        };
        balances.push(balance);
    }

    tracing::debug!(
        forecast_months = params.forecast_months,
        monthly_payment,
        converged = solution.converged,
        ledger = ?params.ledger,
        "cash flow simulated"
    );

    SimulationOutput {
        balances,
        monthly_payment,
        payment_converged: solution.converged,
    }
}

pub fn try_simulate(params: &CashFlowParameters) -> Result<SimulationOutput, CoreError> {
    params.validate()?;
    Ok(simulate(params))
}

// NOTE: the payment leaves the balance twice per month while the loan runs:
// once here when `month <= loan_term_months` (one month past the term), and
// once more inside the net cash flow, which never stops. This must match the
// historical projections bit for bit; `PaymentLedger::Corrected` books it once.
fn reference_month(params: &CashFlowParameters, balance: f64, month: u32, payment: f64) -> f64 {
    let mut balance = balance;
    if month <= params.loan_term_months {
        balance -= payment;
    }

    balance * (1.0 + params.investment_monthly_rate)
        + (params.monthly_income - params.monthly_expenses - payment)
}

fn corrected_month(params: &CashFlowParameters, balance: f64, month: u32, payment: f64) -> f64 {
    let mut balance = balance;
    if month < params.loan_term_months {
        balance -= payment;
    }

    balance * (1.0 + params.investment_monthly_rate)
        + (params.monthly_income - params.monthly_expenses)
}
