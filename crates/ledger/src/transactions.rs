//! Transaction primitives.
//!
//! A `Transaction` is one immutable entry in a shift's append-only cash log.
//! Entries are never updated in place; error correction goes through the
//! voided flag, which keeps the audit trail intact.
//!
//! An `Exchange` entry records both sides of a cash currency exchange inside
//! the same shift: the primary currency/amount leaves the drawer bucket and
//! the secondary currency/amount enters it.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, LedgerError, ResultLedger};
use crate::util::parse_uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    In,
    Out,
    Exchange,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::Exchange => "exchange",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            "exchange" => Ok(Self::Exchange),
            other => Err(LedgerError::InvalidId(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub shift_id: Uuid,
    pub kind: TransactionKind,
    pub currency: Currency,
    pub amount_minor: i64,
    /// The receiving side of an exchange; `None` for plain in/out.
    pub secondary_currency: Option<Currency>,
    pub secondary_amount_minor: Option<i64>,
    pub category: Option<String>,
    pub reference: Option<String>,
    pub created_by: String,
    /// Business time as stated by the cashier; may differ from `posted_at`.
    pub occurred_at: DateTime<Utc>,
    /// Insertion time, assigned by the ledger. Audit display order is
    /// `(posted_at, id)`.
    pub posted_at: DateTime<Utc>,
    pub voided_at: Option<DateTime<Utc>>,
    pub voided_by: Option<String>,
    pub idempotency_key: Option<String>,
}

impl Transaction {
    pub fn new(
        shift_id: Uuid,
        kind: TransactionKind,
        currency: Currency,
        amount_minor: i64,
        secondary: Option<(Currency, i64)>,
        category: Option<String>,
        reference: Option<String>,
        created_by: String,
        occurred_at: DateTime<Utc>,
        posted_at: DateTime<Utc>,
        idempotency_key: Option<String>,
    ) -> ResultLedger<Self> {
        if amount_minor <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }

        let (secondary_currency, secondary_amount_minor) = match (kind, secondary) {
            (TransactionKind::Exchange, Some((sec_currency, sec_amount))) => {
                if sec_currency == currency {
                    return Err(LedgerError::CurrencyMismatch(
                        "exchange legs must use different currencies".to_string(),
                    ));
                }
                if sec_amount <= 0 {
                    return Err(LedgerError::InvalidAmount(
                        "secondary_amount_minor must be > 0".to_string(),
                    ));
                }
                (Some(sec_currency), Some(sec_amount))
            }
            (TransactionKind::Exchange, None) => {
                return Err(LedgerError::InvalidAmount(
                    "exchange requires a secondary currency and amount".to_string(),
                ));
            }
            (_, Some(_)) => {
                return Err(LedgerError::InvalidAmount(
                    "secondary leg is only valid for exchange".to_string(),
                ));
            }
            (_, None) => (None, None),
        };

        Ok(Self {
            id: Uuid::new_v4(),
            shift_id,
            kind,
            currency,
            amount_minor,
            secondary_currency,
            secondary_amount_minor,
            category,
            reference,
            created_by,
            occurred_at,
            posted_at,
            voided_at: None,
            voided_by: None,
            idempotency_key,
        })
    }

    #[must_use]
    pub fn is_voided(&self) -> bool {
        self.voided_at.is_some()
    }

    /// Signed per-currency deltas this entry applies to the shift's cash
    /// position: `in` adds, `out` removes, `exchange` removes the primary leg
    /// and adds the secondary one.
    pub fn currency_deltas(&self) -> Vec<(Currency, i64)> {
        match self.kind {
            TransactionKind::In => vec![(self.currency, self.amount_minor)],
            TransactionKind::Out => vec![(self.currency, -self.amount_minor)],
            TransactionKind::Exchange => {
                let mut deltas = vec![(self.currency, -self.amount_minor)];
                if let (Some(sec_currency), Some(sec_amount)) =
                    (self.secondary_currency, self.secondary_amount_minor)
                {
                    deltas.push((sec_currency, sec_amount));
                }
                deltas
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub shift_id: String,
    pub kind: String,
    pub currency: String,
    pub amount_minor: i64,
    pub secondary_currency: Option<String>,
    pub secondary_amount_minor: Option<i64>,
    pub category: Option<String>,
    pub reference: Option<String>,
    pub created_by: String,
    pub occurred_at: DateTimeUtc,
    pub posted_at: DateTimeUtc,
    pub voided_at: Option<DateTimeUtc>,
    pub voided_by: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shifts::Entity",
        from = "Column::ShiftId",
        to = "super::shifts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Shifts,
}

impl Related<super::shifts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shifts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            shift_id: ActiveValue::Set(tx.shift_id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            currency: ActiveValue::Set(tx.currency.code().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            secondary_currency: ActiveValue::Set(
                tx.secondary_currency.map(|c| c.code().to_string()),
            ),
            secondary_amount_minor: ActiveValue::Set(tx.secondary_amount_minor),
            category: ActiveValue::Set(tx.category.clone()),
            reference: ActiveValue::Set(tx.reference.clone()),
            created_by: ActiveValue::Set(tx.created_by.clone()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            posted_at: ActiveValue::Set(tx.posted_at),
            voided_at: ActiveValue::Set(tx.voided_at),
            voided_by: ActiveValue::Set(tx.voided_by.clone()),
            idempotency_key: ActiveValue::Set(tx.idempotency_key.clone()),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            shift_id: parse_uuid(&model.shift_id, "shift")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            currency: Currency::try_from(model.currency.as_str())?,
            amount_minor: model.amount_minor,
            secondary_currency: model
                .secondary_currency
                .as_deref()
                .map(Currency::try_from)
                .transpose()?,
            secondary_amount_minor: model.secondary_amount_minor,
            category: model.category,
            reference: model.reference,
            created_by: model.created_by,
            occurred_at: model.occurred_at,
            posted_at: model.posted_at,
            voided_at: model.voided_at,
            voided_by: model.voided_by,
            idempotency_key: model.idempotency_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;

    fn at() -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(0, 0).unwrap()
    }

    #[test]
    fn exchange_requires_different_currencies() {
        let err = Transaction::new(
            Uuid::new_v4(),
            TransactionKind::Exchange,
            Currency::Uzs,
            100,
            Some((Currency::Uzs, 100)),
            None,
            None,
            "alice".to_string(),
            at(),
            at(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::CurrencyMismatch(_)));
    }

    #[test]
    fn exchange_deltas_cover_both_legs() {
        let tx = Transaction::new(
            Uuid::new_v4(),
            TransactionKind::Exchange,
            Currency::Usd,
            100_00,
            Some((Currency::Uzs, 1_250_000_00)),
            None,
            None,
            "alice".to_string(),
            at(),
            at(),
            None,
        )
        .unwrap();

        let deltas = tx.currency_deltas();
        assert_eq!(deltas.len(), 2);
        assert!(deltas.contains(&(Currency::Usd, -100_00)));
        assert!(deltas.contains(&(Currency::Uzs, 1_250_000_00)));
    }

    #[test]
    fn plain_entry_rejects_secondary_leg() {
        let err = Transaction::new(
            Uuid::new_v4(),
            TransactionKind::In,
            Currency::Uzs,
            100,
            Some((Currency::Usd, 1)),
            None,
            None,
            "alice".to_string(),
            at(),
            at(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
    }
}
