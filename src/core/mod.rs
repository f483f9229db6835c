mod engine;
mod solver;
mod sweep;
mod types;

pub use engine::{simulate, try_simulate};
pub use solver::{residual, solve_monthly_payment, solve_payment, try_solve_payment};
pub use sweep::{SweepPlan, SweepRun, run_sweep};
pub use types::{
    CashFlowParameters, CoreError, LoanTerms, PaymentLedger, PaymentSolution, SimulationOutput,
    SolverSettings,
};
