//! The module contains the `Drawer` struct and its persistence model.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;
use crate::util::parse_uuid;

/// A physical or logical cash register tied to a location.
///
/// Drawers are long-lived and never deleted while shifts reference them;
/// retiring a drawer flips `active` off.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drawer {
    /// Stable identifier, generated once and persisted so the drawer can be
    /// renamed without breaking references.
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Drawer {
    pub fn new(name: String, location: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            location,
            active: true,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "drawers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub location: String,
    pub active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::shifts::Entity")]
    Shifts,
}

impl Related<super::shifts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shifts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Drawer> for ActiveModel {
    fn from(drawer: &Drawer) -> Self {
        Self {
            id: ActiveValue::Set(drawer.id.to_string()),
            name: ActiveValue::Set(drawer.name.clone()),
            location: ActiveValue::Set(drawer.location.clone()),
            active: ActiveValue::Set(drawer.active),
            created_at: ActiveValue::Set(drawer.created_at),
        }
    }
}

impl TryFrom<Model> for Drawer {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "drawer")?,
            name: model.name,
            location: model.location,
            active: model.active,
            created_at: model.created_at,
        })
    }
}
