//! Double-entry ledger
//!
//! Append-only. Every completed transfer owns exactly one DEBIT and one
//! CREDIT of equal amount, written atomically inside the transfer's
//! transaction.

pub mod models;
pub mod store;

pub use models::{EntrySide, LedgerEntry, NewLedgerEntry};
pub use store::{AppendPairError, LedgerStore, UnbalancedPair};
