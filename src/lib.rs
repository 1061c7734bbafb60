//! wallet-service
//!
//! Financial primitives over PostgreSQL and a Redis-compatible cache:
//! idempotent wallet-to-wallet transfers with double-entry accounting, and
//! daily interest accrual with an audit row per calculation.
//!
//! # Modules
//!
//! - [`money`] - Fixed scale-2 decimal arithmetic
//! - [`cache`] - Distributed lease + result cache
//! - [`wallet`] - Wallet rows: locked reads, versioned updates
//! - [`txlog`] - Durable per-attempt transaction log
//! - [`ledger`] - Append-only double-entry ledger
//! - [`transfer`] - The transfer coordinator
//! - [`interest`] - Daily interest calculator
//! - [`gateway`] - HTTP surface

pub mod cache;
pub mod config;
pub mod db;
pub mod gateway;
pub mod interest;
pub mod ledger;
pub mod logging;
pub mod money;
pub mod transfer;
pub mod txlog;
pub mod wallet;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use money::Money;
pub use transfer::{TransferCoordinator, TransferError, TransferRequest, TransferResult};
