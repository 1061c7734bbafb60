//! Shared application state
//!
//! Built once in the composition root; handlers receive it via axum's
//! `State` extractor.

use std::sync::Arc;

use crate::db::Database;
use crate::interest::InterestService;
use crate::transfer::TransferCoordinator;
use crate::txlog::TxLogStore;
use crate::wallet::WalletStore;

pub struct AppState {
    pub coordinator: Arc<TransferCoordinator>,
    pub wallets: Arc<WalletStore>,
    pub logs: Arc<TxLogStore>,
    pub interest: Arc<InterestService>,
    pub db: Arc<Database>,
}
