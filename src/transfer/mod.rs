//! Transfer coordinator
//!
//! Accepts a transfer request, enforces at-most-once execution under
//! concurrency, atomically moves value between two wallets and emits a
//! balanced ledger pair. Coordination layers, outermost first: the cache
//! lease, the unique idempotency key on the transaction log, and
//! serializable isolation around the balance mutation.

pub mod coordinator;
pub mod error;
pub mod types;

#[cfg(test)]
mod integration_tests;

pub use coordinator::TransferCoordinator;
pub use error::TransferError;
pub use types::{TransferLimits, TransferRequest, TransferResult, WalletDelta};
