//! Daily interest accrual
//!
//! A mostly-pure computation with an auditable record per calculation: each
//! (wallet, day) pair is computed at most once and lands as one
//! `interest_accruals` row. Crediting the accrued interest to the wallet is
//! a transfer from a POOL wallet and stays out of this module.

pub mod calc;
pub mod service;
pub mod store;

pub use calc::daily_interest;
pub use service::{InterestError, InterestService};
pub use store::{InterestAccrual, InterestStore};
