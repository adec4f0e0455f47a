use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use isa_invest_core::Investment;
use metrics::counter;
use serde::Deserialize;
use tracing::{error, info};

use crate::problem::ProblemResponse;
use crate::router::AppState;

/// Body of `POST /investments`.
///
/// Absent fields fall back to empty/zero so the engine reports which one is missing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CreateInvestmentRequest {
    customer_id: String,
    fund_id: String,
    amount: f64,
}

pub async fn create(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Investment>), ProblemResponse> {
    counter!("investment_requests_total", "endpoint" => "/investments", "method" => "POST")
        .increment(1);

    let request: CreateInvestmentRequest = serde_json::from_slice(&body).map_err(|err| {
        counter!("investment_creation_failures_total", "reason" => "invalid_json").increment(1);
        ProblemResponse::new(
            StatusCode::BAD_REQUEST,
            "invalid_json",
            format!("error reading JSON: {err}"),
        )
    })?;

    match state
        .engine()
        .create_investment(&request.customer_id, &request.fund_id, request.amount)
    {
        Ok(investment) => {
            counter!("investment_created_total").increment(1);
            counter!("investment_validation_events_total").increment(1);
            info!(stage = "http", investment_id = %investment.id, "investment accepted");
            Ok((StatusCode::CREATED, Json(investment)))
        }
        Err(err) => {
            counter!("investment_creation_failures_total", "reason" => err.kind()).increment(1);
            if !err.is_client_error() {
                error!(stage = "http", error = %err, "investment creation failed");
            }
            Err(err.into())
        }
    }
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Investment>, ProblemResponse> {
    counter!("investment_requests_total", "endpoint" => "/investments/:id", "method" => "GET")
        .increment(1);

    let investment = state.engine().get_investment_by_id(&id)?;
    Ok(Json(investment))
}

pub async fn list_by_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<Vec<Investment>>, ProblemResponse> {
    counter!(
        "investment_requests_total",
        "endpoint" => "/investments/customer/:customer_id",
        "method" => "GET"
    )
    .increment(1);

    let investments = state.engine().get_investments_by_customer_id(&customer_id)?;
    Ok(Json(investments))
}
