use serde::Serialize;

use crate::core::{SimulationOutput, SweepRun};

const ONE_YEAR: usize = 12;
const FIVE_YEARS: usize = 5 * 12;

/// Headline numbers shown next to a balance chart.
///
/// Month `n` is `balances[n]`, i.e. the balance after `n` full months, so the
/// one- and five-year marks read indices 12 and 60.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub initial_balance: f64,
    pub monthly_payment: f64,
    pub payment_converged: bool,
    pub after_one_year: Option<f64>,
    pub after_five_years: Option<f64>,
    pub forecast_months: usize,
    pub final_balance: f64,
}

impl Summary {
    pub fn from_output(output: &SimulationOutput) -> Self {
        let initial_balance = output.balances.first().copied().unwrap_or_default();
        Summary {
            initial_balance,
            monthly_payment: output.monthly_payment,
            payment_converged: output.payment_converged,
            after_one_year: output.balances.get(ONE_YEAR).copied(),
            after_five_years: output.balances.get(FIVE_YEARS).copied(),
            forecast_months: output.balances.len().saturating_sub(1),
            final_balance: output.balances.last().copied().unwrap_or(initial_balance),
        }
    }
}

pub fn format_with_thousands_separator(num: f64) -> String {
    if num.is_nan() {
        return "NaN".to_string();
    }
    if num.is_infinite() {
        return if num < 0.0 { "-inf" } else { "inf" }.to_string();
    }

    // Rounded to cents first so the sign is dropped when it rounds to zero.
    let fixed = format!("{:.2}", num.abs());
    let (int_str, decimals) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if num < 0.0 && fixed != "0.00" { "-" } else { "" };

    let digits: Vec<char> = int_str.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }

    format!("{sign}{grouped}.{decimals}")
}

fn format_optional(value: Option<f64>) -> String {
    match value {
        Some(v) => format_with_thousands_separator(v),
        None => "n/a".to_string(),
    }
}

pub fn render_summary(summary: &Summary) -> String {
    let mut lines = vec![
        format!(
            "Initial Money:          {}",
            format_with_thousands_separator(summary.initial_balance)
        ),
        format!(
            "Monthly Payment:        {}",
            format_with_thousands_separator(summary.monthly_payment)
        ),
        format!(
            "Money After 1 Year:     {}",
            format_optional(summary.after_one_year)
        ),
        format!(
            "Money After 5 Years:    {}",
            format_optional(summary.after_five_years)
        ),
        format!(
            "Money at End ({} months): {}",
            summary.forecast_months,
            format_with_thousands_separator(summary.final_balance)
        ),
    ];
    if !summary.payment_converged {
        lines.push("warning: payment search did not converge; value is approximate".to_string());
    }
    lines.join("\n")
}

pub fn render_run(run: &SweepRun) -> String {
    format!(
        "== {} ==\nHouse Price: {} | Down Payment: {} | Months To Pay: {}\n{}",
        run.artifact_stem(),
        format_with_thousands_separator(run.house_price),
        format_with_thousands_separator(run.down_payment),
        run.loan_term_months,
        render_summary(&Summary::from_output(&run.output))
    )
}
