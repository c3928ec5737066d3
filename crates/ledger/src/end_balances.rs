//! Per-currency closing snapshot of a shift.
//!
//! `expected_minor` is computed from the raw transaction log at close time,
//! nowhere else, and `discrepancy_minor = counted_minor - expected_minor`.
//! Rows are written once per `(shift, currency)` at close; retries upsert on
//! that pair.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, LedgerError};
use crate::util::parse_uuid;

/// One reconciled currency of a closed shift, as returned to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndBalanceLine {
    pub currency: Currency,
    pub expected_minor: i64,
    pub counted_minor: i64,
    pub discrepancy_minor: i64,
    /// True when |discrepancy| exceeds the configured tolerance.
    pub flagged: bool,
    pub reason: Option<String>,
}

/// The result of closing a shift: one line per reconciled currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndBalanceReport {
    pub shift_id: Uuid,
    pub closed_at: chrono::DateTime<chrono::Utc>,
    pub lines: Vec<EndBalanceLine>,
}

impl EndBalanceReport {
    /// Whether any currency was flagged for review.
    #[must_use]
    pub fn has_discrepancy(&self) -> bool {
        self.lines.iter().any(|line| line.flagged)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndBalance {
    pub shift_id: Uuid,
    pub currency: Currency,
    pub expected_minor: i64,
    pub counted_minor: i64,
    pub discrepancy_minor: i64,
    pub reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "end_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub shift_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub currency: String,
    pub expected_minor: i64,
    pub counted_minor: i64,
    pub discrepancy_minor: i64,
    pub reason: Option<String>,
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

impl From<&EndBalance> for ActiveModel {
    fn from(balance: &EndBalance) -> Self {
        Self {
            shift_id: ActiveValue::Set(balance.shift_id.to_string()),
            currency: ActiveValue::Set(balance.currency.code().to_string()),
            expected_minor: ActiveValue::Set(balance.expected_minor),
            counted_minor: ActiveValue::Set(balance.counted_minor),
            discrepancy_minor: ActiveValue::Set(balance.discrepancy_minor),
            reason: ActiveValue::Set(balance.reason.clone()),
        }
    }
}

impl TryFrom<Model> for EndBalance {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            shift_id: parse_uuid(&model.shift_id, "shift")?,
            currency: Currency::try_from(model.currency.as_str())?,
            expected_minor: model.expected_minor,
            counted_minor: model.counted_minor,
            discrepancy_minor: model.discrepancy_minor,
            reason: model.reason,
        })
    }
}
