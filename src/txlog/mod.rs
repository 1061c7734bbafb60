//! Transaction logs: the durable record of transfer attempts
//!
//! One row per idempotency key, inserted before any balance change and
//! advanced through the status machine by the coordinator. Rows are never
//! deleted.

pub mod models;
pub mod store;

pub use models::{TransactionLog, TxStatus, TxType};
pub use store::{InsertLogError, NewTransactionLog, StatusExtras, TxLogStore};
