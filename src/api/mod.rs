pub mod cli;

use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::{ConfigOverrides, HouseBuyingConfig, SweepValue};
use crate::core::{PaymentLedger, SimulationOutput, SweepRun, run_sweep, simulate};
use crate::report::Summary;

/// Query/body of `/api/simulate`: one combination, every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    months_to_forecast: Option<u32>,
    ledger: Option<PaymentLedger>,
    starting_money: Option<f64>,
    investment_monthly_interest: Option<f64>,
    liquid_salary: Option<f64>,
    fixed_monthly_expenses: Option<f64>,
    house_price: Option<f64>,
    down_payment: Option<f64>,
    months_to_pay: Option<u32>,
    house_monthly_interest: Option<f64>,
}

/// Body of `/api/sweep`: like [`SimulatePayload`] but the house fields accept lists.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SweepPayload {
    months_to_forecast: Option<u32>,
    ledger: Option<PaymentLedger>,
    starting_money: Option<f64>,
    investment_monthly_interest: Option<f64>,
    liquid_salary: Option<f64>,
    fixed_monthly_expenses: Option<f64>,
    house_price: Option<SweepValue<f64>>,
    down_payment: Option<SweepValue<f64>>,
    months_to_pay: Option<SweepValue<u32>>,
    house_monthly_interest: Option<f64>,
}

impl From<SimulatePayload> for SweepPayload {
    fn from(value: SimulatePayload) -> Self {
        SweepPayload {
            months_to_forecast: value.months_to_forecast,
            ledger: value.ledger,
            starting_money: value.starting_money,
            investment_monthly_interest: value.investment_monthly_interest,
            liquid_salary: value.liquid_salary,
            fixed_monthly_expenses: value.fixed_monthly_expenses,
            house_price: value.house_price.map(SweepValue::Scalar),
            down_payment: value.down_payment.map(SweepValue::Scalar),
            months_to_pay: value.months_to_pay.map(SweepValue::Scalar),
            house_monthly_interest: value.house_monthly_interest,
        }
    }
}

impl From<SweepPayload> for ConfigOverrides {
    fn from(value: SweepPayload) -> Self {
        ConfigOverrides {
            months_to_forecast: value.months_to_forecast,
            ledger: value.ledger,
            starting_money: value.starting_money,
            investment_monthly_interest: value.investment_monthly_interest,
            liquid_salary: value.liquid_salary,
            fixed_monthly_expenses: value.fixed_monthly_expenses,
            house_price: value.house_price,
            down_payment: value.down_payment,
            months_to_pay: value.months_to_pay,
            house_monthly_interest: value.house_monthly_interest,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    monthly_payment: f64,
    payment_converged: bool,
    balances: Vec<f64>,
    summary: Summary,
}

impl SimulateResponse {
    fn from_output(output: SimulationOutput) -> Self {
        let summary = Summary::from_output(&output);
        SimulateResponse {
            monthly_payment: output.monthly_payment,
            payment_converged: output.payment_converged,
            balances: output.balances,
            summary,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SweepRunResponse {
    artifact: String,
    house_price: f64,
    down_payment: f64,
    months_to_pay: u32,
    monthly_payment: f64,
    payment_converged: bool,
    balances: Vec<f64>,
    summary: Summary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SweepResponse {
    runs: Vec<SweepRunResponse>,
}

impl SweepResponse {
    pub(crate) fn from_runs(runs: &[SweepRun]) -> Self {
        SweepResponse {
            runs: runs
                .iter()
                .map(|run| SweepRunResponse {
                    artifact: run.artifact_stem(),
                    house_price: run.house_price,
                    down_payment: run.down_payment,
                    months_to_pay: run.loan_term_months,
                    monthly_payment: run.output.monthly_payment,
                    payment_converged: run.output.payment_converged,
                    balances: run.output.balances.clone(),
                    summary: Summary::from_output(&run.output),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "house buying HTTP API listening");
    tracing::info!("local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, router()).await
}

fn router() -> Router {
    Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/sweep", post(sweep_handler))
        .fallback(not_found_handler)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(
    payload: Result<Query<SimulatePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => simulate_handler_impl(payload),
        Err(rejection) => rejected(&rejection.body_text()),
    }
}

async fn simulate_post_handler(payload: Result<Json<SimulatePayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => simulate_handler_impl(payload),
        Err(rejection) => rejected(&rejection.body_text()),
    }
}

fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let config = match config_from_payload(payload.into()) {
        Ok(config) => config,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let output = simulate(&config.base_parameters());
    tracing::info!(
        monthly_payment = output.monthly_payment,
        months = output.balances.len().saturating_sub(1),
        "simulate request served"
    );
    json_response(StatusCode::OK, SimulateResponse::from_output(output))
}

async fn sweep_handler(payload: Result<Json<SweepPayload>, JsonRejection>) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return rejected(&rejection.body_text()),
    };
    let config = match config_from_payload(payload) {
        Ok(config) => config,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let runs = run_sweep(&config.base_parameters(), &config.sweep_plan());
    tracing::info!(runs = runs.len(), "sweep request served");
    json_response(StatusCode::OK, SweepResponse::from_runs(&runs))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

/// Malformed bodies and query strings get the same 400 JSON error as invalid values.
fn rejected(detail: &str) -> Response {
    tracing::debug!(detail, "request payload rejected");
    error_response(StatusCode::BAD_REQUEST, &format!("Invalid request payload: {detail}"))
}

fn config_from_payload(payload: SweepPayload) -> Result<HouseBuyingConfig, String> {
    let mut config = HouseBuyingConfig::default();
    config.apply_overrides(&payload.into());
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

#[cfg(test)]
fn config_from_json(json: &str) -> Result<HouseBuyingConfig, String> {
    let payload = serde_json::from_str::<SweepPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    config_from_payload(payload)
}
