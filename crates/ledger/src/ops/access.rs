use sea_orm::{DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger, Role, drawers, shifts, users};

use super::Ledger;

impl Ledger {
    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultLedger<users::Model> {
        users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .ok_or_else(|| LedgerError::KeyNotFound("user not exists".to_string()))
    }

    /// Reporting authorization: the caller must exist and hold a role that
    /// may view reports. Unknown callers get `Unauthorized`, not
    /// `KeyNotFound`, so the reporting boundary leaks nothing.
    pub(super) async fn require_manager(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultLedger<users::Model> {
        let model = users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .ok_or_else(|| LedgerError::Unauthorized(format!("unknown caller: {username}")))?;
        let role = Role::try_from(model.role.as_str())?;
        if !role.can_view_reports() {
            return Err(LedgerError::Unauthorized(format!(
                "caller is not a manager: {username}"
            )));
        }
        Ok(model)
    }

    pub(super) async fn require_drawer(
        &self,
        db: &DatabaseTransaction,
        drawer_id: Uuid,
    ) -> ResultLedger<drawers::Model> {
        drawers::Entity::find_by_id(drawer_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| LedgerError::KeyNotFound("drawer not exists".to_string()))
    }

    /// A drawer that can take a new shift: must exist and be active.
    pub(super) async fn require_active_drawer(
        &self,
        db: &DatabaseTransaction,
        drawer_id: Uuid,
    ) -> ResultLedger<drawers::Model> {
        let model = self.require_drawer(db, drawer_id).await?;
        if !model.active {
            return Err(LedgerError::DrawerUnavailable(model.name));
        }
        Ok(model)
    }

    pub(super) async fn require_shift(
        &self,
        db: &DatabaseTransaction,
        shift_id: Uuid,
    ) -> ResultLedger<shifts::Model> {
        shifts::Entity::find_by_id(shift_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| LedgerError::KeyNotFound("shift not exists".to_string()))
    }

    pub(super) async fn require_open_shift(
        &self,
        db: &DatabaseTransaction,
        shift_id: Uuid,
    ) -> ResultLedger<shifts::Model> {
        let model = self.require_shift(db, shift_id).await?;
        if model.status != crate::ShiftStatus::Open.as_str() {
            return Err(LedgerError::ShiftNotOpen(shift_id.to_string()));
        }
        Ok(model)
    }
}
