use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    TransactionTrait, prelude::*,
};

use crate::{
    LedgerError, PostTransactionCmd, ResultLedger, Transaction, TransactionKind, transactions,
};
use crate::util::normalize_optional_text;

use super::{Ledger, with_tx};

/// Filters for listing shift transactions.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC and
/// applied to the business time (`occurred_at`).
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// If present, acts as an allow-list of kinds to return.
    pub kinds: Option<Vec<TransactionKind>>,
    /// If true, includes voided transactions (default: false).
    pub include_voided: bool,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultLedger<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(LedgerError::InvalidAmount(
            "invalid range: from must be < to".to_string(),
        ));
    }
    if filter.kinds.as_ref().is_some_and(|k| k.is_empty()) {
        return Err(LedgerError::InvalidAmount(
            "kinds must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TransactionsCursor {
    posted_at: DateTime<Utc>,
    transaction_id: String,
}

impl TransactionsCursor {
    fn encode(&self) -> ResultLedger<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| LedgerError::InvalidCursor("invalid transactions cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultLedger<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| LedgerError::InvalidCursor("invalid transactions cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| LedgerError::InvalidCursor("invalid transactions cursor".to_string()))
    }
}

impl Ledger {
    /// Appends a transaction to an open shift.
    ///
    /// The entry is immutable once posted; error correction goes through
    /// [`Ledger::void_transaction`]. When the command carries an idempotency
    /// key, re-submission (caller retry after a timeout) returns the id of
    /// the already-posted entry instead of double-posting.
    pub async fn post_transaction(&self, cmd: PostTransactionCmd) -> ResultLedger<Uuid> {
        with_tx!(self, |db_tx| {
            self.require_open_shift(&db_tx, cmd.shift_id).await?;
            self.require_user(&db_tx, &cmd.created_by).await?;

            let idempotency_key = normalize_optional_text(cmd.idempotency_key.as_deref());
            if let Some(key) = idempotency_key.as_deref()
                && let Some(existing_id) = self
                    .find_by_idempotency_key(&db_tx, cmd.shift_id, &cmd.created_by, key)
                    .await?
            {
                return Ok(existing_id);
            }

            let tx = Transaction::new(
                cmd.shift_id,
                cmd.kind,
                cmd.currency,
                cmd.amount_minor,
                cmd.secondary,
                normalize_optional_text(cmd.category.as_deref()),
                normalize_optional_text(cmd.reference.as_deref()),
                cmd.created_by.clone(),
                cmd.occurred_at,
                Utc::now(),
                idempotency_key.clone(),
            )?;

            if let Err(err) = transactions::ActiveModel::from(&tx).insert(&db_tx).await {
                // A racing retry may have landed between the lookup and the
                // insert; resolve it through the unique index.
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
                    && let Some(key) = idempotency_key.as_deref()
                    && let Some(existing_id) = self
                        .find_by_idempotency_key(&db_tx, cmd.shift_id, &cmd.created_by, key)
                        .await?
                {
                    return Ok(existing_id);
                }
                return Err(err.into());
            }

            Ok(tx.id)
        })
    }

    async fn find_by_idempotency_key(
        &self,
        db_tx: &DatabaseTransaction,
        shift_id: Uuid,
        created_by: &str,
        key: &str,
    ) -> ResultLedger<Option<Uuid>> {
        let existing = transactions::Entity::find()
            .filter(transactions::Column::ShiftId.eq(shift_id.to_string()))
            .filter(transactions::Column::CreatedBy.eq(created_by.to_string()))
            .filter(transactions::Column::IdempotencyKey.eq(key.to_string()))
            .one(db_tx)
            .await?;
        existing
            .map(|model| crate::util::parse_uuid(&model.id, "transaction"))
            .transpose()
    }

    /// Voids a transaction (soft delete).
    ///
    /// This sets `voided_at`/`voided_by` on the row and nothing else: the
    /// entry stays in the log for audit, and every balance read skips it.
    /// Voiding is only possible while the shift is still open; a closed
    /// shift's log is settled by its end balances.
    pub async fn void_transaction(
        &self,
        shift_id: Uuid,
        transaction_id: Uuid,
        user_id: &str,
        voided_at: DateTime<Utc>,
    ) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            self.require_open_shift(&db_tx, shift_id).await?;
            self.require_user(&db_tx, user_id).await?;

            let tx_model = transactions::Entity::find_by_id(transaction_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| LedgerError::KeyNotFound("transaction not exists".to_string()))?;
            if tx_model.shift_id != shift_id.to_string() {
                return Err(LedgerError::KeyNotFound(
                    "transaction not exists".to_string(),
                ));
            }
            if tx_model.voided_at.is_some() {
                return Err(LedgerError::InvalidAmount(
                    "transaction already voided".to_string(),
                ));
            }

            let tx_active = transactions::ActiveModel {
                id: ActiveValue::Set(transaction_id.to_string()),
                voided_at: ActiveValue::Set(Some(voided_at)),
                voided_by: ActiveValue::Set(Some(user_id.to_string())),
                ..Default::default()
            };
            tx_active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Lists a shift's transactions, newest first.
    pub async fn list_shift_transactions(
        &self,
        shift_id: Uuid,
        limit: u64,
        filter: &TransactionListFilter,
    ) -> ResultLedger<Vec<Transaction>> {
        let (items, _next) = self
            .list_shift_transactions_page(shift_id, limit, None, filter)
            .await?;
        Ok(items)
    }

    /// Lists a shift's transactions with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(posted_at DESC, id DESC)`, i.e. the
    /// reverse of audit insertion order.
    pub async fn list_shift_transactions_page(
        &self,
        shift_id: Uuid,
        limit: u64,
        cursor: Option<&str>,
        filter: &TransactionListFilter,
    ) -> ResultLedger<(Vec<Transaction>, Option<String>)> {
        with_tx!(self, |db_tx| {
            self.require_shift(&db_tx, shift_id).await?;
            validate_list_filter(filter)?;

            let limit_plus_one = limit.saturating_add(1);
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::ShiftId.eq(shift_id.to_string()))
                .order_by_desc(transactions::Column::PostedAt)
                .order_by_desc(transactions::Column::Id)
                .limit(limit_plus_one);

            if let Some(cursor) = cursor {
                let cursor = TransactionsCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(transactions::Column::PostedAt.lt(cursor.posted_at))
                        .add(
                            Condition::all()
                                .add(transactions::Column::PostedAt.eq(cursor.posted_at))
                                .add(transactions::Column::Id.lt(cursor.transaction_id)),
                        ),
                );
            }

            if let Some(from) = filter.from {
                query = query.filter(transactions::Column::OccurredAt.gte(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(transactions::Column::OccurredAt.lt(to));
            }
            if !filter.include_voided {
                query = query.filter(transactions::Column::VoidedAt.is_null());
            }
            if let Some(kinds) = &filter.kinds {
                let kinds: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();
                query = query.filter(transactions::Column::Kind.is_in(kinds));
            }

            let rows: Vec<transactions::Model> = query.all(&db_tx).await?;
            let has_more = rows.len() > limit as usize;

            let mut out: Vec<Transaction> = Vec::with_capacity(rows.len().min(limit as usize));
            for tx_model in rows.into_iter().take(limit as usize) {
                out.push(Transaction::try_from(tx_model)?);
            }

            let next_cursor = out.last().map(|tx| TransactionsCursor {
                posted_at: tx.posted_at,
                transaction_id: tx.id.to_string(),
            });
            let next_cursor = if has_more {
                next_cursor.map(|c| c.encode()).transpose()?
            } else {
                None
            };

            Ok((out, next_cursor))
        })
    }
}
