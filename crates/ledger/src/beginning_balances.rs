//! Per-currency opening snapshot of a shift.
//!
//! Exactly one row per `(shift, currency)` actually used, created at
//! shift-open time and never mutated afterwards.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, LedgerError};
use crate::util::parse_uuid;

/// Where an opening amount came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSource {
    /// Explicit amount supplied by the opener.
    Manual,
    /// Seeded from the drawer's carry-forward template.
    CarryForward,
}

impl BalanceSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::CarryForward => "carry_forward",
        }
    }
}

impl TryFrom<&str> for BalanceSource {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "manual" => Ok(Self::Manual),
            "carry_forward" => Ok(Self::CarryForward),
            other => Err(LedgerError::InvalidId(format!(
                "invalid balance source: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeginningBalance {
    pub shift_id: Uuid,
    pub currency: Currency,
    pub amount_minor: i64,
    pub source: BalanceSource,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "beginning_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub shift_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub currency: String,
    pub amount_minor: i64,
    pub source: String,
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

impl From<&BeginningBalance> for ActiveModel {
    fn from(balance: &BeginningBalance) -> Self {
        Self {
            shift_id: ActiveValue::Set(balance.shift_id.to_string()),
            currency: ActiveValue::Set(balance.currency.code().to_string()),
            amount_minor: ActiveValue::Set(balance.amount_minor),
            source: ActiveValue::Set(balance.source.as_str().to_string()),
        }
    }
}

impl TryFrom<Model> for BeginningBalance {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            shift_id: parse_uuid(&model.shift_id, "shift")?,
            currency: Currency::try_from(model.currency.as_str())?,
            amount_minor: model.amount_minor,
            source: BalanceSource::try_from(model.source.as_str())?,
        })
    }
}
