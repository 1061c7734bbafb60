use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::money::Money;

/// Wallet classification. POOL wallets fund system-originated credits
/// (e.g. interest payouts); USER and MERCHANT wallets belong to customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletType {
    Pool,
    User,
    Merchant,
}

impl WalletType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletType::Pool => "POOL",
            WalletType::User => "USER",
            WalletType::Merchant => "MERCHANT",
        }
    }
}

impl FromStr for WalletType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POOL" => Ok(WalletType::Pool),
            "USER" => Ok(WalletType::User),
            "MERCHANT" => Ok(WalletType::Merchant),
            other => Err(format!("unknown wallet type: {}", other)),
        }
    }
}

impl fmt::Display for WalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Only ACTIVE wallets may participate in a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletStatus {
    Active,
    Suspended,
    Closed,
}

impl WalletStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletStatus::Active => "ACTIVE",
            WalletStatus::Suspended => "SUSPENDED",
            WalletStatus::Closed => "CLOSED",
        }
    }
}

impl FromStr for WalletStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(WalletStatus::Active),
            "SUSPENDED" => Ok(WalletStatus::Suspended),
            "CLOSED" => Ok(WalletStatus::Closed),
            other => Err(format!("unknown wallet status: {}", other)),
        }
    }
}

impl fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value copy of a `wallets` row. Held only for the duration of one request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Wallet {
    pub id: Uuid,
    pub owner_id: String,
    pub wallet_type: WalletType,
    pub balance: Money,
    pub currency: String,
    pub status: WalletStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn is_active(&self) -> bool {
        self.status == WalletStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_type_roundtrip() {
        for t in [WalletType::Pool, WalletType::User, WalletType::Merchant] {
            assert_eq!(t.as_str().parse::<WalletType>().unwrap(), t);
        }
        assert!("SAVINGS".parse::<WalletType>().is_err());
    }

    #[test]
    fn wallet_status_roundtrip() {
        for s in [
            WalletStatus::Active,
            WalletStatus::Suspended,
            WalletStatus::Closed,
        ] {
            assert_eq!(s.as_str().parse::<WalletStatus>().unwrap(), s);
        }
        assert!("FROZEN".parse::<WalletStatus>().is_err());
    }

    #[test]
    fn only_active_wallets_transfer() {
        let mut wallet = Wallet {
            id: Uuid::new_v4(),
            owner_id: "owner-1".to_string(),
            wallet_type: WalletType::User,
            balance: Money::parse("10.00").unwrap(),
            currency: "NGN".to_string(),
            status: WalletStatus::Active,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(wallet.is_active());

        wallet.status = WalletStatus::Suspended;
        assert!(!wallet.is_active());
    }
}
