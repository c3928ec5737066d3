//! Shift primitives.
//!
//! A `Shift` is one cashier's bounded work session against one drawer. It is
//! the scope of the append-only transaction log and of the per-currency
//! opening/closing balance snapshots.
//!
//! Lifecycle: `open` → `closed`, exactly once. A closed shift carries an
//! approval sub-state (`pending` → `approved` | `rejected`). Shifts are
//! financial records and are never deleted.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;
use crate::util::parse_uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Open,
    Closed,
}

impl ShiftStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl TryFrom<&str> for ShiftStatus {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(LedgerError::InvalidId(format!(
                "invalid shift status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for ApprovalState {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(LedgerError::InvalidId(format!(
                "invalid approval state: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: Uuid,
    pub drawer_id: Uuid,
    pub cashier_id: String,
    pub status: ShiftStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Identity that supplied the counted amounts at close.
    pub closed_by: Option<String>,
    pub notes: Option<String>,
    /// `None` while the shift is open; `Pending` right after close.
    pub approval: Option<ApprovalState>,
    pub decided_by: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decision_notes: Option<String>,
}

impl Shift {
    pub fn new(
        drawer_id: Uuid,
        cashier_id: String,
        opened_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            drawer_id,
            cashier_id,
            status: ShiftStatus::Open,
            opened_at,
            closed_at: None,
            closed_by: None,
            notes,
            approval: None,
            decided_by: None,
            decided_at: None,
            decision_notes: None,
        }
    }

    /// Whether transactions may still be posted to this shift.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shifts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub drawer_id: String,
    pub cashier_id: String,
    pub status: String,
    pub opened_at: DateTimeUtc,
    pub closed_at: Option<DateTimeUtc>,
    pub closed_by: Option<String>,
    pub notes: Option<String>,
    pub approval_status: Option<String>,
    pub decided_by: Option<String>,
    pub decided_at: Option<DateTimeUtc>,
    pub decision_notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::drawers::Entity",
        from = "Column::DrawerId",
        to = "super::drawers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Drawers,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::drawers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Drawers.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Shift> for ActiveModel {
    fn from(shift: &Shift) -> Self {
        Self {
            id: ActiveValue::Set(shift.id.to_string()),
            drawer_id: ActiveValue::Set(shift.drawer_id.to_string()),
            cashier_id: ActiveValue::Set(shift.cashier_id.clone()),
            status: ActiveValue::Set(shift.status.as_str().to_string()),
            opened_at: ActiveValue::Set(shift.opened_at),
            closed_at: ActiveValue::Set(shift.closed_at),
            closed_by: ActiveValue::Set(shift.closed_by.clone()),
            notes: ActiveValue::Set(shift.notes.clone()),
            approval_status: ActiveValue::Set(
                shift.approval.map(|a| a.as_str().to_string()),
            ),
            decided_by: ActiveValue::Set(shift.decided_by.clone()),
            decided_at: ActiveValue::Set(shift.decided_at),
            decision_notes: ActiveValue::Set(shift.decision_notes.clone()),
        }
    }
}

impl TryFrom<Model> for Shift {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "shift")?,
            drawer_id: parse_uuid(&model.drawer_id, "drawer")?,
            cashier_id: model.cashier_id,
            status: ShiftStatus::try_from(model.status.as_str())?,
            opened_at: model.opened_at,
            closed_at: model.closed_at,
            closed_by: model.closed_by,
            notes: model.notes,
            approval: model
                .approval_status
                .as_deref()
                .map(ApprovalState::try_from)
                .transpose()?,
            decided_by: model.decided_by,
            decided_at: model.decided_at,
            decision_notes: model.decision_notes,
        })
    }
}
