//! Wallets: value-bearing accounts
//!
//! Balances and versions are mutated exclusively by the transfer coordinator
//! under a row lock; everything else reads snapshots.

pub mod models;
pub mod store;

pub use models::{Wallet, WalletStatus, WalletType};
pub use store::WalletStore;
