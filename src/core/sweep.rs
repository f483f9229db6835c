use serde::Serialize;

use super::engine::simulate;
use super::types::{CashFlowParameters, SimulationOutput};

/// Values to enumerate for each swept house field.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    pub house_prices: Vec<f64>,
    pub down_payments: Vec<f64>,
    pub loan_terms: Vec<u32>,
}

impl SweepPlan {
    /// A plan with a single combination taken from `base`.
    pub fn single(base: &CashFlowParameters) -> Self {
        SweepPlan {
            house_prices: vec![base.house_price],
            down_payments: vec![base.down_payment],
            loan_terms: vec![base.loan_term_months],
        }
    }

    pub fn len(&self) -> usize {
        self.house_prices
            .len()
            .saturating_mul(self.down_payments.len())
            .saturating_mul(self.loan_terms.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cartesian product, price-major, then down payment, then term.
    pub fn expand(&self, base: &CashFlowParameters) -> Vec<CashFlowParameters> {
        let mut combos = Vec::with_capacity(self.len());
        for &house_price in &self.house_prices {
            for &down_payment in &self.down_payments {
                for &loan_term_months in &self.loan_terms {
                    combos.push(CashFlowParameters {
                        house_price,
                        down_payment,
                        loan_term_months,
                        ..base.clone()
                    });
                }
            }
        }
        combos
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepRun {
    pub house_price: f64,
    pub down_payment: f64,
    pub loan_term_months: u32,
    pub output: SimulationOutput,
}

impl SweepRun {
    /// File-name friendly label encoding the swept values.
    pub fn artifact_stem(&self) -> String {
        format!(
            "price-{}_down-{}_term-{}",
            self.house_price, self.down_payment, self.loan_term_months
        )
    }
}

pub fn run_sweep(base: &CashFlowParameters, plan: &SweepPlan) -> Vec<SweepRun> {
    tracing::info!(combinations = plan.len(), "running sweep");
    plan.expand(base)
        .into_iter()
        .map(|params| SweepRun {
            house_price: params.house_price,
            down_payment: params.down_payment,
            loan_term_months: params.loan_term_months,
            output: simulate(&params),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{PaymentLedger, SolverSettings};

    fn base() -> CashFlowParameters {
        CashFlowParameters {
            forecast_months: 24,
            starting_balance: 800_000.0,
            down_payment: 100_000.0,
            house_price: 400_000.0,
            house_monthly_rate: 0.01,
            loan_term_months: 120,
            monthly_income: 20_000.0,
            monthly_expenses: 7_000.0,
            investment_monthly_rate: 0.01,
            ledger: PaymentLedger::Reference,
            solver: SolverSettings::default(),
        }
    }

    #[test]
    fn expand_enumerates_cartesian_product_in_order() {
        let plan = SweepPlan {
            house_prices: vec![400_000.0, 500_000.0],
            down_payments: vec![100_000.0, 150_000.0],
            loan_terms: vec![120, 240, 360],
        };
        let combos = plan.expand(&base());
        assert_eq!(plan.len(), 12);
        assert_eq!(combos.len(), 12);

        let keys: Vec<(f64, f64, u32)> = combos
            .iter()
            .map(|p| (p.house_price, p.down_payment, p.loan_term_months))
            .collect();
        assert_eq!(keys[0], (400_000.0, 100_000.0, 120));
        assert_eq!(keys[1], (400_000.0, 100_000.0, 240));
        assert_eq!(keys[3], (400_000.0, 150_000.0, 120));
        assert_eq!(keys[11], (500_000.0, 150_000.0, 360));
        assert!(combos.iter().all(|p| p.forecast_months == 24));
    }

    #[test]
    fn single_plan_reproduces_plain_simulation() {
        let params = base();
        let runs = run_sweep(&params, &SweepPlan::single(&params));
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].output, simulate(&params));
    }

    #[test]
    fn runs_are_independent_of_their_neighbours() {
        let params = base();
        let plan = SweepPlan {
            house_prices: vec![300_000.0, 400_000.0],
            down_payments: vec![100_000.0],
            loan_terms: vec![120],
        };
        let runs = run_sweep(&params, &plan);
        let alone = simulate(&CashFlowParameters {
            house_price: 400_000.0,
            ..params
        });
        assert_eq!(runs[1].output, alone);
        assert!(runs[0].output.monthly_payment < runs[1].output.monthly_payment);
    }

    #[test]
    fn empty_axis_yields_no_runs() {
        let plan = SweepPlan {
            house_prices: vec![],
            down_payments: vec![100_000.0],
            loan_terms: vec![120],
        };
        assert!(plan.is_empty());
        assert!(run_sweep(&base(), &plan).is_empty());
    }

    #[test]
    fn artifact_stem_encodes_swept_values() {
        let params = base();
        let runs = run_sweep(&params, &SweepPlan::single(&params));
        assert_eq!(runs[0].artifact_stem(), "price-400000_down-100000_term-120");
    }
}
