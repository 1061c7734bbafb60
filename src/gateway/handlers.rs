//! HTTP handlers

use axum::Json;
use axum::extract::{Path, State};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::state::AppState;
use super::types::{ApiError, ApiResult, error_codes, ok};
use crate::interest::InterestAccrual;
use crate::transfer::{TransferRequest, TransferResult};
use crate::txlog::TransactionLog;
use crate::wallet::Wallet;

/// Execute an idempotent wallet-to-wallet transfer
///
/// POST /wallet/transfer
#[utoipa::path(
    post,
    path = "/wallet/transfer",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer completed (or replayed)", body = TransferResult),
        (status = 400, description = "Invalid request or insufficient funds"),
        (status = 404, description = "Source or destination wallet not found"),
        (status = 409, description = "Concurrent attempt or version conflict")
    ),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<TransferResult> {
    let result = state.coordinator.transfer(req).await?;
    ok(result)
}

/// Fetch the transaction log row for an idempotency key
///
/// GET /wallet/transfer/{key}
#[utoipa::path(
    get,
    path = "/wallet/transfer/{key}",
    params(("key" = String, Path, description = "Idempotency key")),
    responses(
        (status = 200, description = "Transaction log row", body = TransactionLog),
        (status = 404, description = "No transfer recorded for this key")
    ),
    tag = "Transfer"
)]
pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<TransactionLog> {
    let log = state
        .logs
        .get_by_key(&key)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| {
            ApiError::not_found(error_codes::TRANSFER_NOT_FOUND, "Transfer not found")
        })?;
    ok(log)
}

/// Read a wallet snapshot (no lock)
///
/// GET /wallet/{id}
#[utoipa::path(
    get,
    path = "/wallet/{id}",
    params(("id" = Uuid, Path, description = "Wallet id")),
    responses(
        (status = 200, description = "Wallet snapshot", body = Wallet),
        (status = 404, description = "Wallet not found")
    ),
    tag = "Wallet"
)]
pub async fn get_wallet(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Wallet> {
    let wallet = state
        .wallets
        .get(id)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found(error_codes::WALLET_NOT_FOUND, "Wallet not found"))?;
    ok(wallet)
}

/// Request body for a daily interest accrual.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AccrueInterestRequest {
    pub wallet_id: Uuid,
    /// Annual rate as a decimal-fraction string, e.g. "0.045" for 4.5%.
    pub annual_rate: String,
    /// Defaults to today (UTC).
    pub accrual_date: Option<NaiveDate>,
}

/// Run one daily interest calculation for a wallet
///
/// POST /interest/daily
#[utoipa::path(
    post,
    path = "/interest/daily",
    request_body = AccrueInterestRequest,
    responses(
        (status = 200, description = "Audit row for the calculation", body = InterestAccrual),
        (status = 400, description = "Invalid rate"),
        (status = 404, description = "Wallet not found")
    ),
    tag = "Interest"
)]
pub async fn accrue_interest(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AccrueInterestRequest>,
) -> ApiResult<InterestAccrual> {
    let rate = Decimal::from_str(&req.annual_rate)
        .map_err(|e| ApiError::bad_request(format!("annual_rate: {}", e)))?;
    let date = req.accrual_date.unwrap_or_else(|| Utc::now().date_naive());

    let accrual = state.interest.accrue_daily(req.wallet_id, rate, date).await?;
    ok(accrual)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthData {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness probe with a database ping
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthData),
        (status = 500, description = "Database unreachable")
    ),
    tag = "Ops"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult<HealthData> {
    state
        .db
        .health_check()
        .await
        .map_err(|e| ApiError::internal(format!("database unreachable: {}", e)))?;

    ok(HealthData {
        status: "ok",
        version: env!("GIT_HASH"),
    })
}
