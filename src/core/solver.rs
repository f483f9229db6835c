use super::types::{CoreError, LoanTerms, PaymentSolution, SolverSettings};

/// Signed loan balance left after paying `monthly_payment` for `term_months`.
///
/// Interest for the first month is charged upfront. Afterwards interest only
/// accrues while the balance is still positive, so an overpaid loan carries
/// its surplus as a negative value without earning anything on it.
pub fn residual(monthly_payment: f64, principal: f64, monthly_rate: f64, term_months: u32) -> f64 {
    let mut left = principal * (1.0 + monthly_rate);

    for _ in 0..term_months {
        left -= monthly_payment;

        if left > 0.0 {
            left *= 1.0 + monthly_rate;
        }
    }

    left
}

/// Monthly payment for a loan using the default search settings.
pub fn solve_monthly_payment(principal: f64, monthly_rate: f64, term_months: u32) -> f64 {
    let loan = LoanTerms {
        principal,
        monthly_rate,
        term_months,
    };
    solve_payment(&loan, &SolverSettings::default()).payment
}

/// Binary search for the payment whose residual is within `tolerance` of zero.
///
/// Never fails: when the iteration budget runs out the last midpoint is
/// returned with `converged == false`. A zero-month term makes the residual
/// independent of the payment, so a nonzero principal drifts to
/// `payment_upper_bound` in that case.
pub fn solve_payment(loan: &LoanTerms, settings: &SolverSettings) -> PaymentSolution {
    let mut a = 0.0;
    let mut b = settings.payment_upper_bound;
    let mut c = (a + b) / 2.0;
    let mut last_residual = f64::NAN;

    for it in 0..settings.max_iterations {
        let current_error = residual(c, loan.principal, loan.monthly_rate, loan.term_months);
        last_residual = current_error;

        if current_error.abs() < settings.tolerance {
            tracing::debug!(
                payment = c,
                iterations = it + 1,
                principal = loan.principal,
                "payment search converged"
            );
            return PaymentSolution {
                payment: c,
                residual: current_error,
                iterations: it + 1,
                converged: true,
            };
        }

        if current_error > 0.0 {
            a = c;
        } else {
            b = c;
        }

        c = (a + b) / 2.0;
    }

    tracing::warn!(
        payment = c,
        last_residual,
        max_iterations = settings.max_iterations,
        principal = loan.principal,
        term_months = loan.term_months,
        "payment search hit the iteration cap; returning best estimate"
    );
    PaymentSolution {
        payment: c,
        residual: last_residual,
        iterations: settings.max_iterations,
        converged: false,
    }
}

pub fn try_solve_payment(
    loan: &LoanTerms,
    settings: &SolverSettings,
) -> Result<PaymentSolution, CoreError> {
    loan.validate()?;
    settings.validate()?;
    Ok(solve_payment(loan, settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn annuity_payment(principal: f64, rate: f64, months: u32) -> f64 {
        if rate == 0.0 {
            return principal / months as f64;
        }
        let growth = (1.0 + rate).powi(months as i32);
        principal * rate * growth / (growth - 1.0)
    }

    #[test]
    fn residual_without_payment_or_interest_keeps_principal() {
        assert_eq!(residual(0.0, 400_000.0, 0.0, 10), 400_000.0);
        assert_eq!(residual(0.0, 328_929.0, 0.0, 10), 328_929.0);
    }

    #[test]
    fn residual_without_interest_pays_off_exactly() {
        assert_eq!(residual(10_000.0, 300_000.0, 0.0, 30), 0.0);
        assert_eq!(residual(20_000.0, 300_000.0, 0.0, 15), 0.0);
    }

    #[test]
    fn residual_reports_remaining_debt_and_overpayment() {
        assert_eq!(residual(150.0, 1_000.0, 0.0, 5), 250.0);
        assert_eq!(residual(300.0, 1_000.0, 0.0, 5), -500.0);
    }

    #[test]
    fn residual_compounds_interest_while_balance_is_positive() {
        // 1100 -> 800 -> 880 -> 580 -> 638 -> 338 -> 371.8
        assert_close(residual(300.0, 1_000.0, 0.1, 3), 371.8, 0.001);
    }

    #[test]
    fn residual_stops_charging_interest_once_overpaid() {
        // 1100 -> 500 -> 550 -> -50, then no interest on the surplus.
        assert_close(residual(600.0, 1_000.0, 0.1, 3), -650.0, 1e-9);
    }

    #[test]
    fn zero_interest_solution_is_principal_over_term() {
        let payment = solve_monthly_payment(300_000.0, 0.0, 30);
        assert_close(payment, 10_000.0, 1e-3);
    }

    #[test]
    fn solution_matches_closed_form_annuity() {
        let payment = solve_monthly_payment(350_000.0, 0.008, 360);
        assert_close(payment, annuity_payment(350_000.0, 0.008, 360), 1e-3);
        assert_close(payment, 2_968.559_897, 1e-5);
    }

    #[test]
    fn zero_principal_converges_to_zero_payment() {
        let loan = LoanTerms {
            principal: 0.0,
            monthly_rate: 0.01,
            term_months: 120,
        };
        let solution = solve_payment(&loan, &SolverSettings::default());
        assert!(solution.converged);
        assert_close(solution.payment, 0.0, 1e-4);
    }

    #[test]
    fn zero_term_drifts_to_upper_bound_without_converging() {
        let loan = LoanTerms {
            principal: 1_000.0,
            monthly_rate: 0.01,
            term_months: 0,
        };
        let settings = SolverSettings::default();
        let solution = solve_payment(&loan, &settings);
        assert!(!solution.converged);
        assert_eq!(solution.iterations, settings.max_iterations);
        assert_close(solution.payment, settings.payment_upper_bound, 1e-6);
        assert_close(solution.residual, 1_010.0, 1e-9);
    }

    #[test]
    fn exhausted_budget_returns_last_midpoint() {
        let loan = LoanTerms {
            principal: 350_000.0,
            monthly_rate: 0.008,
            term_months: 360,
        };
        let settings = SolverSettings {
            max_iterations: 3,
            ..SolverSettings::default()
        };
        // Midpoints: 50_000 (overpays), 25_000 (overpays), 12_500 (overpays) -> 6_250.
        let solution = solve_payment(&loan, &settings);
        assert!(!solution.converged);
        assert_eq!(solution.payment, 6_250.0);
    }

    #[test]
    fn try_solve_rejects_negative_inputs() {
        let settings = SolverSettings::default();
        let negative_principal = LoanTerms {
            principal: -1.0,
            monthly_rate: 0.01,
            term_months: 12,
        };
        let err = try_solve_payment(&negative_principal, &settings).expect_err("must reject");
        assert!(matches!(err, CoreError::InvalidArgument { ref field, .. } if field == "principal"));

        let negative_rate = LoanTerms {
            principal: 1_000.0,
            monthly_rate: -0.01,
            term_months: 12,
        };
        let err = try_solve_payment(&negative_rate, &settings).expect_err("must reject");
        assert!(matches!(err, CoreError::InvalidArgument { ref field, .. } if field == "monthly_rate"));
    }

    #[test]
    fn try_solve_rejects_broken_settings() {
        let loan = LoanTerms {
            principal: 1_000.0,
            monthly_rate: 0.01,
            term_months: 12,
        };
        let settings = SolverSettings {
            tolerance: 0.0,
            ..SolverSettings::default()
        };
        assert!(try_solve_payment(&loan, &settings).is_err());

        let settings = SolverSettings {
            max_iterations: 0,
            ..SolverSettings::default()
        };
        assert!(try_solve_payment(&loan, &settings).is_err());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_residual_without_payment_or_interest_keeps_principal(
            principal in proptest::prelude::any::<u32>(),
            term in 0u32..480
        ) {
            let principal = principal as f64;
            prop_assert!(residual(0.0, principal, 0.0, term) == principal);
        }

        #[test]
        fn prop_residual_is_non_increasing_in_payment(
            principal in 0u32..800_000,
            rate_bp in 0u32..200,
            term in 0u32..480,
            low in 0u32..20_000,
            step in 0u32..20_000
        ) {
            let rate = rate_bp as f64 / 10_000.0;
            let low = low as f64;
            let high = low + step as f64;
            let principal = principal as f64;
            prop_assert!(residual(high, principal, rate, term) <= residual(low, principal, rate, term));
        }

        #[test]
        fn prop_larger_principal_never_needs_smaller_payment(
            principal in 0u32..400_000,
            extra in 1u32..100_000,
            rate_bp in 0u32..150,
            term in 12u32..480
        ) {
            let rate = rate_bp as f64 / 10_000.0;
            let small = solve_monthly_payment(principal as f64, rate, term);
            let large = solve_monthly_payment((principal + extra) as f64, rate, term);
            prop_assert!(large >= small, "small={small} large={large}");
        }

        #[test]
        fn prop_converged_payment_amortizes_within_tolerance(
            principal in 0u32..500_000,
            rate_bp in 0u32..150,
            term in 1u32..480
        ) {
            let loan = LoanTerms {
                principal: principal as f64,
                monthly_rate: rate_bp as f64 / 10_000.0,
                term_months: term,
            };
            let settings = SolverSettings::default();
            let solution = solve_payment(&loan, &settings);
            prop_assert!(solution.converged);
            prop_assert!(solution.payment >= 0.0);
            prop_assert!(solution.residual.abs() < settings.tolerance);
        }
    }
}
