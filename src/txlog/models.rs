use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::money::Money;

/// Kind of value movement. The transfer coordinator only writes TRANSFER;
/// the remaining kinds are recorded by adjacent services sharing the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxType {
    Transfer,
    Deposit,
    Withdrawal,
    Refund,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Transfer => "TRANSFER",
            TxType::Deposit => "DEPOSIT",
            TxType::Withdrawal => "WITHDRAWAL",
            TxType::Refund => "REFUND",
        }
    }
}

impl FromStr for TxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRANSFER" => Ok(TxType::Transfer),
            "DEPOSIT" => Ok(TxType::Deposit),
            "WITHDRAWAL" => Ok(TxType::Withdrawal),
            "REFUND" => Ok(TxType::Refund),
            other => Err(format!("unknown transaction type: {}", other)),
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status machine:
///
/// ```text
///            insert
///     (none) ──────► PENDING
///                      │  enter serializable txn
///                      ▼
///                  PROCESSING ──commit──► COMPLETED (terminal)
///                      │
///                      └──error──► FAILED (terminal)
/// ```
///
/// ROLLED_BACK is reserved; the coordinator never writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    RolledBack,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Pending => "PENDING",
            TxStatus::Processing => "PROCESSING",
            TxStatus::Completed => "COMPLETED",
            TxStatus::Failed => "FAILED",
            TxStatus::RolledBack => "ROLLED_BACK",
        }
    }

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TxStatus::Completed | TxStatus::Failed | TxStatus::RolledBack
        )
    }
}

impl FromStr for TxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TxStatus::Pending),
            "PROCESSING" => Ok(TxStatus::Processing),
            "COMPLETED" => Ok(TxStatus::Completed),
            "FAILED" => Ok(TxStatus::Failed),
            "ROLLED_BACK" => Ok(TxStatus::RolledBack),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value copy of a `transaction_logs` row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionLog {
    pub id: Uuid,
    pub idempotency_key: String,
    pub tx_type: TxType,
    pub from_wallet_id: Uuid,
    pub to_wallet_id: Uuid,
    pub amount: Money,
    pub currency: String,
    pub status: TxStatus,
    pub description: Option<String>,
    pub error_message: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        for s in [
            TxStatus::Pending,
            TxStatus::Processing,
            TxStatus::Completed,
            TxStatus::Failed,
            TxStatus::RolledBack,
        ] {
            assert_eq!(s.as_str().parse::<TxStatus>().unwrap(), s);
        }
        assert!("DONE".parse::<TxStatus>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(TxStatus::Completed.is_terminal());
        assert!(TxStatus::Failed.is_terminal());
        assert!(TxStatus::RolledBack.is_terminal());

        assert!(!TxStatus::Pending.is_terminal());
        assert!(!TxStatus::Processing.is_terminal());
    }

    #[test]
    fn tx_type_roundtrip() {
        for t in [
            TxType::Transfer,
            TxType::Deposit,
            TxType::Withdrawal,
            TxType::Refund,
        ] {
            assert_eq!(t.as_str().parse::<TxType>().unwrap(), t);
        }
    }
}
