//! HTTP API for the Forfettario Engine.
//!
//! This module exposes the engine over a small REST API built with
//! [`axum`](https://crates.io/crates/axum).  Handlers validate the
//! request, call the pure computation functions and wrap the outcome
//! in a JSON envelope.  Every failure is answered with
//! `{ "error": "<message>" }`.
//!
//! | Method | Path                          | Operation |
//! |--------|-------------------------------|-----------|
//! | `GET`  | `/api/health`                 | liveness  |
//! | `POST` | `/api/tax/compute-year`       | [`compute_fiscal_year`] |
//! | `POST` | `/api/tax/compute-multi-year` | [`compute_multi_year`] |
//! | `POST` | `/api/tax/set-aside`          | [`compute_set_aside`] |
//! | `POST` | `/api/tax/set-aside/ledger`   | [`compute_invoice_ledger`] |

use crate::config::{ServerConfig, TaxConfig};
use crate::engine::{compute_fiscal_year, compute_multi_year};
use crate::error::EngineError;
use crate::models::{
    FiscalYearInput, FiscalYearResult, InvoiceEntry, InvoiceLedgerResult, InvoiceSetAsideResult,
    SetAsideContext, TaxProfile, YearRevenue,
};
use crate::set_aside::{compute_invoice_ledger, compute_set_aside};
use crate::validation;
use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across requests.  The tax configuration is
/// loaded once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<TaxConfig>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed body or out-of-range values (400).
    #[error("{0}")]
    BadRequest(String),
    /// Well-formed profile the regime does not allow (422).
    #[error("{0}")]
    UnsupportedConfiguration(String),
    /// Anything else (500).  The message is logged, not returned.
    #[error("{0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidInput(_) => ApiError::BadRequest(err.to_string()),
            EngineError::UnsupportedConfiguration(_) => {
                ApiError::UnsupportedConfiguration(err.to_string())
            }
            EngineError::ConfigLoad { .. } | EngineError::ConfigParse { .. } => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(error = %msg, "rejected request");
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            ApiError::UnsupportedConfiguration(msg) => {
                tracing::warn!(error = %msg, "unsupported configuration");
                (StatusCode::UNPROCESSABLE_ENTITY, msg.clone())
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeYearRequest {
    pub profile: TaxProfile,
    pub year_input: FiscalYearInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiYearRequest {
    pub profile: TaxProfile,
    /// Chamber of Commerce fee applied to every year.
    #[serde(rename = "ccIAA")]
    pub annual_fee: f64,
    pub years: Vec<YearRevenue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAsideRequest {
    pub context: SetAsideContext,
    pub invoice_amount: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRequest {
    pub context: SetAsideContext,
    pub invoices: Vec<InvoiceEntry>,
}

#[derive(Debug, Serialize)]
pub struct ResultEnvelope<T> {
    pub result: T,
}

#[derive(Debug, Serialize)]
pub struct MultiYearEnvelope {
    pub anni: Vec<FiscalYearResult>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the API router around an already loaded tax configuration.
pub fn build_router(config: TaxConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/tax/compute-year", post(compute_year_handler))
        .route("/api/tax/compute-multi-year", post(compute_multi_year_handler))
        .route("/api/tax/set-aside", post(set_aside_handler))
        .route("/api/tax/set-aside/ledger", post(ledger_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "forfettario-engine",
    })
}

/// Handler for POST /api/tax/compute-year
async fn compute_year_handler(
    State(state): State<AppState>,
    payload: Result<Json<ComputeYearRequest>, JsonRejection>,
) -> Result<Json<ResultEnvelope<FiscalYearResult>>, ApiError> {
    let Json(req) = payload?;
    validation::validate_profile(&state.config, &req.profile)?;
    validation::validate_year_input(&req.year_input)?;

    let result = compute_fiscal_year(&state.config, &req.profile, &req.year_input);
    ensure_finite(result.total_burden(), "fiscal year totals")?;
    tracing::debug!(year = result.year, "computed single year");
    Ok(Json(ResultEnvelope { result }))
}

/// Handler for POST /api/tax/compute-multi-year
async fn compute_multi_year_handler(
    State(state): State<AppState>,
    payload: Result<Json<MultiYearRequest>, JsonRejection>,
) -> Result<Json<MultiYearEnvelope>, ApiError> {
    let Json(req) = payload?;
    validation::validate_profile(&state.config, &req.profile)?;
    validation::validate_years(&req.years)?;
    validation::validate_amount("ccIAA", req.annual_fee)?;

    let anni = compute_multi_year(&state.config, &req.profile, &req.years, req.annual_fee);
    for year in &anni {
        ensure_finite(year.total_burden(), "multi-year totals")?;
    }
    tracing::debug!(years = anni.len(), "computed multi-year projection");
    Ok(Json(MultiYearEnvelope { anni }))
}

/// Handler for POST /api/tax/set-aside
async fn set_aside_handler(
    State(state): State<AppState>,
    payload: Result<Json<SetAsideRequest>, JsonRejection>,
) -> Result<Json<ResultEnvelope<InvoiceSetAsideResult>>, ApiError> {
    let Json(req) = payload?;
    validation::validate_set_aside_context(&state.config, &req.context)?;
    validation::validate_finite("invoiceAmount", req.invoice_amount)?;

    let result = compute_set_aside(&state.config, &req.context, req.invoice_amount);
    ensure_finite(result.suggested_set_aside, "set-aside")?;
    Ok(Json(ResultEnvelope { result }))
}

/// Handler for POST /api/tax/set-aside/ledger
async fn ledger_handler(
    State(state): State<AppState>,
    payload: Result<Json<LedgerRequest>, JsonRejection>,
) -> Result<Json<ResultEnvelope<InvoiceLedgerResult>>, ApiError> {
    let Json(req) = payload?;
    validation::validate_set_aside_context(&state.config, &req.context)?;
    validation::validate_invoices(&req.invoices)?;

    let result = compute_invoice_ledger(&state.config, &req.context, &req.invoices);
    ensure_finite(result.total_set_aside, "ledger totals")?;
    tracing::debug!(invoices = result.entries.len(), "computed invoice ledger");
    Ok(Json(ResultEnvelope { result }))
}

fn ensure_finite(value: f64, what: &str) -> Result<(), ApiError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ApiError::Internal(format!("{what} are not finite")))
    }
}

/// Launch the API server.  Loads the tax configuration, binds to the
/// configured address and runs until interrupted.
pub async fn serve(server: ServerConfig) -> Result<()> {
    let config = TaxConfig::load_or_default(server.tax_config_path.as_deref())
        .context("loading tax configuration")?;
    let router = build_router(config);

    let listener = tokio::net::TcpListener::bind(&server.bind_addr)
        .await
        .with_context(|| format!("binding {}", server.bind_addr))?;
    tracing::info!(addr = %server.bind_addr, "server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running HTTP server")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
