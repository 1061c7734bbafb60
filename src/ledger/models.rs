use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::money::Money;

/// Side of a double-entry pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntrySide {
    Debit,
    Credit,
}

impl EntrySide {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntrySide::Debit => "DEBIT",
            EntrySide::Credit => "CREDIT",
        }
    }
}

impl FromStr for EntrySide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEBIT" => Ok(EntrySide::Debit),
            "CREDIT" => Ok(EntrySide::Credit),
            other => Err(format!("unknown ledger entry side: {}", other)),
        }
    }
}

impl fmt::Display for EntrySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One half of a pair, before insertion.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub transaction_id: Uuid,
    pub wallet_id: Uuid,
    pub side: EntrySide,
    pub amount: Money,
    pub currency: String,
    /// The wallet's committed balance immediately after this entry applies.
    pub balance_after: Money,
    pub description: Option<String>,
}

/// Value copy of a `ledger_entries` row. Entries are never mutated.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub wallet_id: Uuid,
    pub side: EntrySide,
    pub amount: Money,
    pub currency: String,
    pub balance_after: Money,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_roundtrip() {
        assert_eq!("DEBIT".parse::<EntrySide>().unwrap(), EntrySide::Debit);
        assert_eq!("CREDIT".parse::<EntrySide>().unwrap(), EntrySide::Credit);
        assert!("TRANSFER".parse::<EntrySide>().is_err());
        assert_eq!(EntrySide::Debit.to_string(), "DEBIT");
    }
}
