//! Transfer error taxonomy
//!
//! Each business failure is a tagged variant with a stable external code.
//! `code()` and `http_status()` drive the gateway mapping.

use thiserror::Error;
use uuid::Uuid;

use crate::cache::CacheError;
use crate::money::Money;

/// Postgres serialization_failure: a SERIALIZABLE transaction lost the race
/// and must be retried by the caller.
const SERIALIZATION_FAILURE: &str = "40001";
/// Postgres deadlock_detected: surfaced the same way, the caller retries.
const DEADLOCK_DETECTED: &str = "40P01";

#[derive(Debug, Error)]
pub enum TransferError {
    // === Pre-validation (no side effects yet) ===
    #[error("invalid transfer request: {0}")]
    InvalidRequest(String),

    #[error("currency {requested} does not match wallet currency {wallet}")]
    CurrencyMismatch { requested: String, wallet: String },

    // === Wallet checks (inside the serializable section) ===
    #[error("wallet not found: {0}")]
    WalletNotFound(Uuid),

    #[error("wallet {0} is not active")]
    InactiveWallet(Uuid),

    #[error("insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: Money, required: Money },

    // === Concurrency ===
    #[error("a transfer with this idempotency key is already in progress")]
    ConcurrentInProgress,

    #[error("wallet was modified concurrently, retry the transfer")]
    VersionConflict,

    // === Infrastructure ===
    #[error("internal error: {0}")]
    Internal(String),
}

impl TransferError {
    /// Stable external code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidRequest(_) => "INVALID_REQUEST",
            TransferError::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            TransferError::WalletNotFound(_) => "WALLET_NOT_FOUND",
            TransferError::InactiveWallet(_) => "INACTIVE_WALLET",
            TransferError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            TransferError::ConcurrentInProgress => "CONCURRENT_IN_PROGRESS",
            TransferError::VersionConflict => "VERSION_CONFLICT",
            TransferError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code suggestion.
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::InvalidRequest(_)
            | TransferError::CurrencyMismatch { .. }
            | TransferError::InactiveWallet(_)
            | TransferError::InsufficientFunds { .. } => 400,
            TransferError::WalletNotFound(_) => 404,
            TransferError::ConcurrentInProgress | TransferError::VersionConflict => 409,
            TransferError::Internal(_) => 500,
        }
    }

    /// Whether the caller may retry with the same idempotency key.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransferError::ConcurrentInProgress
                | TransferError::VersionConflict
                | TransferError::Internal(_)
        )
    }
}

impl From<sqlx::Error> for TransferError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            let code = db.code();
            let code = code.as_deref();
            if code == Some(SERIALIZATION_FAILURE) || code == Some(DEADLOCK_DETECTED) {
                return TransferError::VersionConflict;
            }
        }
        TransferError::Internal(e.to_string())
    }
}

impl From<CacheError> for TransferError {
    fn from(e: CacheError) -> Self {
        TransferError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            TransferError::InvalidRequest("x".into()).code(),
            "INVALID_REQUEST"
        );
        assert_eq!(
            TransferError::ConcurrentInProgress.code(),
            "CONCURRENT_IN_PROGRESS"
        );
        assert_eq!(TransferError::VersionConflict.code(), "VERSION_CONFLICT");
    }

    #[test]
    fn http_mapping() {
        assert_eq!(TransferError::InvalidRequest("x".into()).http_status(), 400);
        assert_eq!(
            TransferError::InsufficientFunds {
                available: Money::parse("50.00").unwrap(),
                required: Money::parse("100.00").unwrap(),
            }
            .http_status(),
            400
        );
        assert_eq!(TransferError::WalletNotFound(Uuid::nil()).http_status(), 404);
        assert_eq!(TransferError::ConcurrentInProgress.http_status(), 409);
        assert_eq!(TransferError::VersionConflict.http_status(), 409);
        assert_eq!(TransferError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn retryability() {
        assert!(TransferError::ConcurrentInProgress.is_retryable());
        assert!(TransferError::VersionConflict.is_retryable());
        assert!(!TransferError::InvalidRequest("x".into()).is_retryable());
        assert!(
            !TransferError::InsufficientFunds {
                available: Money::ZERO,
                required: Money::parse("1.00").unwrap(),
            }
            .is_retryable()
        );
    }

    #[test]
    fn insufficient_funds_carries_amounts() {
        let err = TransferError::InsufficientFunds {
            available: Money::parse("50.00").unwrap(),
            required: Money::parse("100.00").unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds: available 50.00, required 100.00"
        );
    }
}
