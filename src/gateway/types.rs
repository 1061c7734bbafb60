//! Gateway response types and error mapping
//!
//! All responses use one envelope: `code` is 0 on success and a stable
//! negative number otherwise, `msg` is human-readable, `data` carries the
//! payload. String error codes from the core map onto the numeric space
//! here and nowhere else.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::interest::InterestError;
use crate::transfer::TransferError;

/// Unified API response wrapper.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }
}

pub mod error_codes {
    pub const INVALID_REQUEST: i32 = -1001;
    pub const CURRENCY_MISMATCH: i32 = -1002;
    pub const INSUFFICIENT_FUNDS: i32 = -2001;
    pub const WALLET_NOT_FOUND: i32 = -2002;
    pub const INACTIVE_WALLET: i32 = -2003;
    pub const CONCURRENT_IN_PROGRESS: i32 = -3001;
    pub const VERSION_CONFLICT: i32 = -3002;
    pub const TRANSFER_NOT_FOUND: i32 = -4001;
    pub const INTERNAL_ERROR: i32 = -5001;
}

/// Error half of every handler result.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap a payload in the success envelope.
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_REQUEST, msg)
    }

    pub fn not_found(code: i32, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            msg,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body: ApiResponse<()> = ApiResponse {
            code: self.code,
            msg: self.msg,
            data: None,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = match e.code() {
            "INVALID_REQUEST" => error_codes::INVALID_REQUEST,
            "CURRENCY_MISMATCH" => error_codes::CURRENCY_MISMATCH,
            "INSUFFICIENT_FUNDS" => error_codes::INSUFFICIENT_FUNDS,
            "WALLET_NOT_FOUND" => error_codes::WALLET_NOT_FOUND,
            "INACTIVE_WALLET" => error_codes::INACTIVE_WALLET,
            "CONCURRENT_IN_PROGRESS" => error_codes::CONCURRENT_IN_PROGRESS,
            "VERSION_CONFLICT" => error_codes::VERSION_CONFLICT,
            _ => error_codes::INTERNAL_ERROR,
        };
        Self::new(status, code, e.to_string())
    }
}

impl From<InterestError> for ApiError {
    fn from(e: InterestError) -> Self {
        match &e {
            InterestError::WalletNotFound(_) => {
                Self::not_found(error_codes::WALLET_NOT_FOUND, e.to_string())
            }
            InterestError::NegativeRate | InterestError::Overflow => {
                Self::bad_request(e.to_string())
            }
            InterestError::Database(_) => Self::internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use uuid::Uuid;

    #[test]
    fn transfer_errors_map_to_contract_statuses() {
        let cases: Vec<(TransferError, StatusCode, i32)> = vec![
            (
                TransferError::InvalidRequest("x".into()),
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_REQUEST,
            ),
            (
                TransferError::InsufficientFunds {
                    available: Money::ZERO,
                    required: Money::parse("1.00").unwrap(),
                },
                StatusCode::BAD_REQUEST,
                error_codes::INSUFFICIENT_FUNDS,
            ),
            (
                TransferError::WalletNotFound(Uuid::nil()),
                StatusCode::NOT_FOUND,
                error_codes::WALLET_NOT_FOUND,
            ),
            (
                TransferError::ConcurrentInProgress,
                StatusCode::CONFLICT,
                error_codes::CONCURRENT_IN_PROGRESS,
            ),
            (
                TransferError::VersionConflict,
                StatusCode::CONFLICT,
                error_codes::VERSION_CONFLICT,
            ),
            (
                TransferError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
            ),
        ];

        for (err, status, code) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status, status);
            assert_eq!(api.code, code);
        }
    }

    #[test]
    fn interest_errors_map_sensibly() {
        let api: ApiError = InterestError::WalletNotFound(Uuid::nil()).into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);

        let api: ApiError = InterestError::NegativeRate.into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
    }
}
