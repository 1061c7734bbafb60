//! Ledger store
//!
//! `append_pair` verifies the two entries balance before touching the
//! database. An unbalanced pair can only come from a coordinator bug, so it
//! is rejected outright rather than persisted.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use thiserror::Error;
use uuid::Uuid;

use super::models::{EntrySide, LedgerEntry, NewLedgerEntry};
use crate::money::Money;

/// Programming-error guard: the pair handed to `append_pair` did not
/// balance.
#[derive(Debug, Error)]
#[error("unbalanced ledger pair: {reason}")]
pub struct UnbalancedPair {
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum AppendPairError {
    #[error(transparent)]
    Unbalanced(#[from] UnbalancedPair),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub struct LedgerStore {
    pool: PgPool,
}

const ENTRY_COLUMNS: &str = "id, transaction_id, wallet_id, entry_type, amount, currency, \
     balance_after, description, created_at, updated_at";

impl LedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append the debit/credit pair for one transfer inside the caller's
    /// transaction.
    pub async fn append_pair(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        debit: NewLedgerEntry,
        credit: NewLedgerEntry,
    ) -> Result<(), AppendPairError> {
        verify_balanced(&debit, &credit)?;

        for entry in [&debit, &credit] {
            sqlx::query(
                r#"
                INSERT INTO ledger_entries
                    (transaction_id, wallet_id, entry_type, amount, currency,
                     balance_after, description)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(entry.transaction_id)
            .bind(entry.wallet_id)
            .bind(entry.side.as_str())
            .bind(entry.amount.as_decimal())
            .bind(&entry.currency)
            .bind(entry.balance_after.as_decimal())
            .bind(&entry.description)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    /// All entries for a transaction, debit first. Used to reconstruct a
    /// historical transfer result.
    pub async fn get_for_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<LedgerEntry>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM ledger_entries WHERE transaction_id = $1 ORDER BY entry_type DESC",
            ENTRY_COLUMNS
        ))
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }
}

fn verify_balanced(debit: &NewLedgerEntry, credit: &NewLedgerEntry) -> Result<(), UnbalancedPair> {
    if debit.side != EntrySide::Debit || credit.side != EntrySide::Credit {
        return Err(UnbalancedPair {
            reason: format!("sides are {} / {}", debit.side, credit.side),
        });
    }
    if debit.transaction_id != credit.transaction_id {
        return Err(UnbalancedPair {
            reason: "entries reference different transactions".to_string(),
        });
    }
    if debit.amount != credit.amount {
        return Err(UnbalancedPair {
            reason: format!("amounts differ: {} vs {}", debit.amount, credit.amount),
        });
    }
    if !debit.amount.is_positive() {
        return Err(UnbalancedPair {
            reason: format!("non-positive amount: {}", debit.amount),
        });
    }
    if debit.currency != credit.currency {
        return Err(UnbalancedPair {
            reason: format!("currencies differ: {} vs {}", debit.currency, credit.currency),
        });
    }
    if debit.wallet_id == credit.wallet_id {
        return Err(UnbalancedPair {
            reason: "both entries target the same wallet".to_string(),
        });
    }
    Ok(())
}

fn row_to_entry(row: &PgRow) -> Result<LedgerEntry, sqlx::Error> {
    let side: String = row.get("entry_type");
    let side = side
        .parse::<EntrySide>()
        .map_err(|e| sqlx::Error::Decode(e.into()))?;

    let currency: String = row.get("currency");

    Ok(LedgerEntry {
        id: row.get("id"),
        transaction_id: row.get("transaction_id"),
        wallet_id: row.get("wallet_id"),
        side,
        amount: Money::from_db(row.get("amount")),
        currency: currency.trim().to_string(),
        balance_after: Money::from_db(row.get("balance_after")),
        description: row.get("description"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
