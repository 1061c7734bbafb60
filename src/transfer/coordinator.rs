//! Transfer Coordinator
//!
//! Drives the full transfer protocol: result-cache check, lease
//! acquisition, durable intent, the serializable balance mutation, and the
//! post-commit cache write. The database is the sole authority on balances;
//! the cache only accelerates replays and serializes attempts per key.

use chrono::{DurationRound, TimeDelta, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::TransferError;
use super::types::{
    TransferLimits, TransferRequest, TransferResult, ValidatedTransfer, WalletDelta, validate,
};
use crate::cache::Cache;
use crate::ledger::{AppendPairError, EntrySide, LedgerStore, NewLedgerEntry};
use crate::txlog::{
    InsertLogError, NewTransactionLog, StatusExtras, TransactionLog, TxLogStore, TxStatus, TxType,
};
use crate::wallet::{Wallet, WalletStore};

pub struct TransferCoordinator {
    pool: PgPool,
    wallets: Arc<WalletStore>,
    logs: Arc<TxLogStore>,
    ledger: Arc<LedgerStore>,
    cache: Arc<dyn Cache>,
    limits: TransferLimits,
}

fn result_key(idempotency_key: &str) -> String {
    format!("idempotency:{}", idempotency_key)
}

fn lease_key(idempotency_key: &str) -> String {
    format!("lock:{}", idempotency_key)
}

impl TransferCoordinator {
    pub fn new(
        pool: PgPool,
        wallets: Arc<WalletStore>,
        logs: Arc<TxLogStore>,
        ledger: Arc<LedgerStore>,
        cache: Arc<dyn Cache>,
        limits: TransferLimits,
    ) -> Self {
        Self {
            pool,
            wallets,
            logs,
            ledger,
            cache,
            limits,
        }
    }

    /// Execute a transfer with at-most-once semantics per idempotency key.
    pub async fn transfer(&self, req: TransferRequest) -> Result<TransferResult, TransferError> {
        let v = validate(req, &self.limits)?;
        let key = v.idempotency_key.clone();

        // Replay from the result cache before touching anything else.
        if let Some(cached) = self.cache.get(&result_key(&key)).await? {
            let result: TransferResult = serde_json::from_str(&cached)
                .map_err(|e| TransferError::Internal(format!("corrupt cached result: {}", e)))?;
            info!(idempotency_key = %key, transaction_id = %result.transaction_id,
                "Transfer replayed from result cache");
            return Ok(result);
        }

        // Cache miss but the key may still be settled in the database.
        if let Some(log) = self.logs.get_by_key(&key).await.map_err(TransferError::from)?
            && log.status == TxStatus::Completed
        {
            return self.replay_from_ledger(&log).await;
        }

        if !self
            .cache
            .try_acquire(&lease_key(&key), self.limits.lease_ttl)
            .await?
        {
            debug!(idempotency_key = %key, "Lease held by another worker");
            return Err(TransferError::ConcurrentInProgress);
        }

        let outcome = self.execute_leased(&v).await;

        // The lease is released on every path; its TTL only bounds crashes.
        if let Err(e) = self.cache.release(&lease_key(&key)).await {
            warn!(idempotency_key = %key, error = %e, "Failed to release transfer lease");
        }

        outcome
    }

    /// Everything that runs while this worker holds the per-key lease.
    async fn execute_leased(&self, v: &ValidatedTransfer) -> Result<TransferResult, TransferError> {
        // Durable intent: the PENDING row survives any later failure.
        let log = match self
            .logs
            .insert(NewTransactionLog {
                idempotency_key: v.idempotency_key.clone(),
                tx_type: TxType::Transfer,
                from_wallet_id: v.from,
                to_wallet_id: v.to,
                amount: v.amount,
                currency: v.currency.clone(),
                description: v.description.clone(),
                metadata: v.metadata.clone(),
            })
            .await
        {
            Ok(log) => log,
            Err(InsertLogError::DuplicateKey) => {
                // Lost a race (or the key's row predates an expired lease).
                let existing = self
                    .logs
                    .get_by_key(&v.idempotency_key)
                    .await
                    .map_err(TransferError::from)?
                    .ok_or_else(|| {
                        TransferError::Internal(
                            "duplicate idempotency key but no row found".to_string(),
                        )
                    })?;
                return if existing.status == TxStatus::Completed {
                    self.replay_from_ledger(&existing).await
                } else {
                    debug!(idempotency_key = %v.idempotency_key, status = %existing.status,
                        "Existing non-completed log row blocks this key");
                    Err(TransferError::ConcurrentInProgress)
                };
            }
            Err(InsertLogError::Database(e)) => return Err(e.into()),
        };

        match self.run_serializable(&log, v).await {
            Ok(result) => {
                self.cache_result(&v.idempotency_key, &result).await;
                info!(
                    transaction_id = %result.transaction_id,
                    idempotency_key = %v.idempotency_key,
                    amount = %v.amount,
                    "Transfer completed"
                );
                Ok(result)
            }
            Err(e) => {
                // Best-effort FAILED mark, outside the aborted transaction.
                if let Err(mark_err) = self
                    .logs
                    .update_status(
                        log.id,
                        TxStatus::Failed,
                        StatusExtras {
                            error_message: Some(e.to_string()),
                            completed_at: None,
                        },
                    )
                    .await
                {
                    warn!(
                        transaction_id = %log.id,
                        error = %mark_err,
                        "Failed to mark transaction log FAILED"
                    );
                }
                Err(e)
            }
        }
    }

    /// The serializable section: lock, check, move, record, commit.
    async fn run_serializable(
        &self,
        log: &TransactionLog,
        v: &ValidatedTransfer,
    ) -> Result<TransferResult, TransferError> {
        let mut tx = self.pool.begin().await.map_err(TransferError::from)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(TransferError::from)?;

        self.logs
            .update_status_tx(&mut tx, log.id, TxStatus::Processing, StatusExtras::default())
            .await
            .map_err(TransferError::from)?;

        let (source, dest) = self.lock_wallets(&mut tx, v.from, v.to).await?;

        if !source.is_active() {
            return Err(TransferError::InactiveWallet(source.id));
        }
        if !dest.is_active() {
            return Err(TransferError::InactiveWallet(dest.id));
        }

        for wallet in [&source, &dest] {
            if wallet.currency != v.currency {
                return Err(TransferError::CurrencyMismatch {
                    requested: v.currency.clone(),
                    wallet: wallet.currency.clone(),
                });
            }
        }

        if source.balance < v.amount {
            return Err(TransferError::InsufficientFunds {
                available: source.balance,
                required: v.amount,
            });
        }

        let new_source = source
            .balance
            .checked_sub(v.amount)
            .ok_or_else(|| TransferError::Internal("source balance underflow".to_string()))?;
        let new_dest = dest
            .balance
            .checked_add(v.amount)
            .ok_or_else(|| TransferError::Internal("destination balance overflow".to_string()))?;

        // Version predicate: redundant under SERIALIZABLE, kept as a second
        // line of defence against lost updates.
        let affected = self
            .wallets
            .update_versioned(&mut tx, source.id, new_source, source.version)
            .await
            .map_err(TransferError::from)?;
        if affected == 0 {
            return Err(TransferError::VersionConflict);
        }
        let affected = self
            .wallets
            .update_versioned(&mut tx, dest.id, new_dest, dest.version)
            .await
            .map_err(TransferError::from)?;
        if affected == 0 {
            return Err(TransferError::VersionConflict);
        }

        self.ledger
            .append_pair(
                &mut tx,
                NewLedgerEntry {
                    transaction_id: log.id,
                    wallet_id: source.id,
                    side: EntrySide::Debit,
                    amount: v.amount,
                    currency: v.currency.clone(),
                    balance_after: new_source,
                    description: v.description.clone(),
                },
                NewLedgerEntry {
                    transaction_id: log.id,
                    wallet_id: dest.id,
                    side: EntrySide::Credit,
                    amount: v.amount,
                    currency: v.currency.clone(),
                    balance_after: new_dest,
                    description: v.description.clone(),
                },
            )
            .await
            .map_err(|e| match e {
                AppendPairError::Unbalanced(u) => TransferError::Internal(u.to_string()),
                AppendPairError::Database(db) => db.into(),
            })?;

        // Truncate to the database's microsecond precision so a replay
        // reconstructed from the stored row is byte-identical.
        let completed_at = Utc::now()
            .duration_trunc(TimeDelta::microseconds(1))
            .map_err(|e| TransferError::Internal(e.to_string()))?;
        self.logs
            .update_status_tx(
                &mut tx,
                log.id,
                TxStatus::Completed,
                StatusExtras {
                    error_message: None,
                    completed_at: Some(completed_at),
                },
            )
            .await
            .map_err(TransferError::from)?;

        tx.commit().await.map_err(TransferError::from)?;

        Ok(TransferResult {
            success: true,
            transaction_id: log.id,
            status: TxStatus::Completed,
            from: WalletDelta {
                id: source.id,
                new_balance: new_source,
            },
            to: WalletDelta {
                id: dest.id,
                new_balance: new_dest,
            },
            timestamp: completed_at,
        })
    }

    /// Lock both wallets in ascending id order so concurrent A→B and B→A
    /// transfers cannot invert lock order, then hand back (source, dest).
    async fn lock_wallets(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        from: Uuid,
        to: Uuid,
    ) -> Result<(Wallet, Wallet), TransferError> {
        let (first_id, second_id) = if from < to { (from, to) } else { (to, from) };

        let first = self
            .wallets
            .lock_for_update(tx, first_id)
            .await
            .map_err(TransferError::from)?
            .ok_or(TransferError::WalletNotFound(first_id))?;
        let second = self
            .wallets
            .lock_for_update(tx, second_id)
            .await
            .map_err(TransferError::from)?
            .ok_or(TransferError::WalletNotFound(second_id))?;

        if first.id == from {
            Ok((first, second))
        } else {
            Ok((second, first))
        }
    }

    /// Rebuild the Result for a COMPLETED key from its ledger entries, so a
    /// replay reports the balances at commit time rather than today's.
    async fn replay_from_ledger(
        &self,
        log: &TransactionLog,
    ) -> Result<TransferResult, TransferError> {
        let entries = self
            .ledger
            .get_for_transaction(log.id)
            .await
            .map_err(TransferError::from)?;

        let debit = entries
            .iter()
            .find(|e| e.side == EntrySide::Debit)
            .ok_or_else(|| {
                TransferError::Internal(format!("completed transfer {} has no debit entry", log.id))
            })?;
        let credit = entries
            .iter()
            .find(|e| e.side == EntrySide::Credit)
            .ok_or_else(|| {
                TransferError::Internal(format!(
                    "completed transfer {} has no credit entry",
                    log.id
                ))
            })?;

        let completed_at = log.completed_at.ok_or_else(|| {
            TransferError::Internal(format!("completed transfer {} has no completed_at", log.id))
        })?;

        let result = TransferResult {
            success: true,
            transaction_id: log.id,
            status: TxStatus::Completed,
            from: WalletDelta {
                id: debit.wallet_id,
                new_balance: debit.balance_after,
            },
            to: WalletDelta {
                id: credit.wallet_id,
                new_balance: credit.balance_after,
            },
            timestamp: completed_at,
        };

        // Warm the cache so the next replay skips the database.
        self.cache_result(&log.idempotency_key, &result).await;
        info!(idempotency_key = %log.idempotency_key, transaction_id = %log.id,
            "Transfer replayed from ledger");
        Ok(result)
    }

    /// Post-commit cache write. Best-effort: the transfer is already
    /// durable, so a cache failure must not fail the request.
    async fn cache_result(&self, idempotency_key: &str, result: &TransferResult) {
        let payload = match serde_json::to_string(result) {
            Ok(p) => p,
            Err(e) => {
                warn!(idempotency_key, error = %e, "Failed to serialize transfer result");
                return;
            }
        };
        if let Err(e) = self
            .cache
            .put(&result_key(idempotency_key), &payload, self.limits.idempotency_ttl)
            .await
        {
            warn!(idempotency_key, error = %e, "Failed to cache transfer result");
        }
    }
}
