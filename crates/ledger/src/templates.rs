//! Carry-forward templates.
//!
//! After every close, the counted amount per `(drawer, currency)` is upserted
//! here so the next shift on the same drawer can start from it. A template
//! whose source shift was flagged keeps `has_discrepancy = true`; the opener
//! must explicitly confirm or override it instead of silently reusing the
//! amount.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, LedgerError};
use crate::util::parse_uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftTemplate {
    pub drawer_id: Uuid,
    pub currency: Currency,
    pub amount_minor: i64,
    /// The closing shift this carry-forward was derived from.
    pub derived_from_shift_id: Uuid,
    pub has_discrepancy: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shift_templates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub drawer_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub currency: String,
    pub amount_minor: i64,
    pub derived_from_shift_id: String,
    pub has_discrepancy: bool,
    pub updated_at: DateTimeUtc,
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
}

impl Related<super::drawers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Drawers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ShiftTemplate> for ActiveModel {
    fn from(template: &ShiftTemplate) -> Self {
        Self {
            drawer_id: ActiveValue::Set(template.drawer_id.to_string()),
            currency: ActiveValue::Set(template.currency.code().to_string()),
            amount_minor: ActiveValue::Set(template.amount_minor),
            derived_from_shift_id: ActiveValue::Set(template.derived_from_shift_id.to_string()),
            has_discrepancy: ActiveValue::Set(template.has_discrepancy),
            updated_at: ActiveValue::Set(template.updated_at),
        }
    }
}

impl TryFrom<Model> for ShiftTemplate {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            drawer_id: parse_uuid(&model.drawer_id, "drawer")?,
            currency: Currency::try_from(model.currency.as_str())?,
            amount_minor: model.amount_minor,
            derived_from_shift_id: parse_uuid(&model.derived_from_shift_id, "shift")?,
            has_discrepancy: model.has_discrepancy,
            updated_at: model.updated_at,
        })
    }
}
