//! Transfer request/result types and pre-validation
//!
//! Amounts arrive as strings and stay strings until validation converts
//! them to [`Money`]. Validation is fail-fast: it runs before any external
//! I/O, so a rejected request leaves no trace anywhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::TransferError;
use crate::money::Money;
use crate::txlog::TxStatus;

const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// Operational bounds for the coordinator, sourced from configuration.
#[derive(Debug, Clone)]
pub struct TransferLimits {
    pub max_amount: Money,
    pub default_currency: String,
    pub idempotency_ttl: Duration,
    pub lease_ttl: Duration,
}

impl Default for TransferLimits {
    fn default() -> Self {
        Self {
            max_amount: Money::parse("1000000000").expect("constant parses"),
            default_currency: "NGN".to_string(),
            idempotency_ttl: Duration::from_secs(86_400),
            lease_ttl: Duration::from_secs(30),
        }
    }
}

/// Incoming transfer request, exactly as deserialized from the wire.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransferRequest {
    /// Caller-chosen key identifying this logical transfer attempt.
    pub idempotency_key: String,
    pub from: Uuid,
    pub to: Uuid,
    /// Amount as a decimal string (never a float).
    pub amount: String,
    /// Three-letter uppercase code; defaults to the configured currency.
    pub currency: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
}

/// Request after fail-fast validation: amount parsed, currency resolved.
#[derive(Debug, Clone)]
pub struct ValidatedTransfer {
    pub idempotency_key: String,
    pub from: Uuid,
    pub to: Uuid,
    pub amount: Money,
    pub currency: String,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Validate a raw request against the configured limits.
pub fn validate(
    req: TransferRequest,
    limits: &TransferLimits,
) -> Result<ValidatedTransfer, TransferError> {
    let key = req.idempotency_key;
    if key.is_empty() {
        return Err(TransferError::InvalidRequest(
            "idempotency_key must not be empty".to_string(),
        ));
    }
    if key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(TransferError::InvalidRequest(format!(
            "idempotency_key exceeds {} characters",
            MAX_IDEMPOTENCY_KEY_LEN
        )));
    }
    if !key
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err(TransferError::InvalidRequest(
            "idempotency_key may only contain [A-Za-z0-9_-]".to_string(),
        ));
    }

    if req.from == req.to {
        return Err(TransferError::InvalidRequest(
            "source and destination wallets must differ".to_string(),
        ));
    }

    let amount = Money::parse(&req.amount)
        .map_err(|e| TransferError::InvalidRequest(format!("amount: {}", e)))?;
    if !amount.is_positive() {
        return Err(TransferError::InvalidRequest(
            "amount must be greater than zero".to_string(),
        ));
    }
    if amount > limits.max_amount {
        return Err(TransferError::InvalidRequest(format!(
            "amount exceeds the maximum of {}",
            limits.max_amount
        )));
    }

    let currency = match req.currency {
        Some(c) => {
            if c.len() != 3 || !c.bytes().all(|b| b.is_ascii_uppercase()) {
                return Err(TransferError::InvalidRequest(
                    "currency must be three uppercase letters".to_string(),
                ));
            }
            c
        }
        None => limits.default_currency.clone(),
    };

    Ok(ValidatedTransfer {
        idempotency_key: key,
        from: req.from,
        to: req.to,
        amount,
        currency,
        description: req.description,
        metadata: req.metadata,
    })
}

/// One side of a completed transfer as seen by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletDelta {
    pub id: Uuid,
    pub new_balance: Money,
}

/// The durable outcome of a transfer. Cached verbatim, so replays with the
/// same idempotency key return byte-identical payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub success: bool,
    pub transaction_id: Uuid,
    pub status: TxStatus,
    pub from: WalletDelta,
    pub to: WalletDelta,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(key: &str, amount: &str) -> TransferRequest {
        TransferRequest {
            idempotency_key: key.to_string(),
            from: Uuid::new_v4(),
            to: Uuid::new_v4(),
            amount: amount.to_string(),
            currency: None,
            description: None,
            metadata: None,
        }
    }

    #[test]
    fn valid_request_passes() {
        let v = validate(request("t1", "100.00"), &TransferLimits::default()).unwrap();
        assert_eq!(v.amount.to_string(), "100.00");
        assert_eq!(v.currency, "NGN");
    }

    #[test]
    fn explicit_currency_is_kept() {
        let mut req = request("t1", "100.00");
        req.currency = Some("USD".to_string());
        let v = validate(req, &TransferLimits::default()).unwrap();
        assert_eq!(v.currency, "USD");
    }

    #[test]
    fn rejects_bad_idempotency_keys() {
        let limits = TransferLimits::default();

        for key in ["", "has space", "emoji🙂", "semi;colon", "dot.dot"] {
            let err = validate(request(key, "1.00"), &limits).unwrap_err();
            assert!(
                matches!(err, TransferError::InvalidRequest(_)),
                "key {:?} should be invalid",
                key
            );
        }

        let long_key = "k".repeat(256);
        assert!(validate(request(&long_key, "1.00"), &limits).is_err());

        // the boundary itself is fine
        let max_key = "k".repeat(255);
        assert!(validate(request(&max_key, "1.00"), &limits).is_ok());
    }

    #[test]
    fn rejects_same_wallet_transfer() {
        let mut req = request("t1", "1.00");
        req.to = req.from;
        let err = validate(req, &TransferLimits::default()).unwrap_err();
        assert!(matches!(err, TransferError::InvalidRequest(_)));
    }

    #[test]
    fn rejects_non_positive_and_oversized_amounts() {
        let limits = TransferLimits::default();

        for amount in ["0", "0.00", "-1.00"] {
            assert!(
                validate(request("t1", amount), &limits).is_err(),
                "amount {:?} should be invalid",
                amount
            );
        }

        assert!(validate(request("t1", "1000000000.01"), &limits).is_err());
        assert!(validate(request("t1", "1000000000.00"), &limits).is_ok());
        assert!(validate(request("t1", "not-a-number"), &limits).is_err());
    }

    #[test]
    fn rejects_malformed_currency() {
        let limits = TransferLimits::default();
        for currency in ["ngn", "NG", "NGNX", "N1N", ""] {
            let mut req = request("t1", "1.00");
            req.currency = Some(currency.to_string());
            assert!(
                validate(req, &limits).is_err(),
                "currency {:?} should be invalid",
                currency
            );
        }
    }

    #[test]
    fn result_serializes_camel_case() {
        let result = TransferResult {
            success: true,
            transaction_id: Uuid::nil(),
            status: TxStatus::Completed,
            from: WalletDelta {
                id: Uuid::nil(),
                new_balance: Money::parse("900.00").unwrap(),
            },
            to: WalletDelta {
                id: Uuid::nil(),
                new_balance: Money::parse("600.00").unwrap(),
            },
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(r#""transactionId""#));
        assert!(json.contains(r#""newBalance":"900.00""#));
        assert!(json.contains(r#""status":"COMPLETED""#));

        let back: TransferResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
