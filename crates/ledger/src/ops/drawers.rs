use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Currency, Drawer, LedgerError, ResultLedger, Shift, ShiftStatus, drawers, shifts,
};
use crate::util::{normalize_required_name, parse_uuid};

use super::{Ledger, with_tx};

impl Ledger {
    /// Register a new cash drawer at a location.
    pub async fn create_drawer(
        &self,
        name: &str,
        location: &str,
        created_at: DateTime<Utc>,
    ) -> ResultLedger<Uuid> {
        let name = normalize_required_name(name, "drawer")?;
        let location = normalize_required_name(location, "location")?;

        with_tx!(self, |db_tx| {
            let duplicate = drawers::Entity::find()
                .filter(drawers::Column::Name.eq(name.clone()))
                .one(&db_tx)
                .await?;
            if duplicate.is_some() {
                return Err(LedgerError::ExistingKey(name));
            }

            let drawer = Drawer::new(name, location, created_at);
            let id = drawer.id;
            drawers::ActiveModel::from(&drawer).insert(&db_tx).await?;
            Ok(id)
        })
    }

    /// Activate or retire a drawer.
    ///
    /// Retiring a drawer that still has an open shift is rejected; the shift
    /// must be closed first.
    pub async fn set_drawer_active(&self, drawer_id: Uuid, active: bool) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_drawer(&db_tx, drawer_id).await?;

            if !active {
                let open = shifts::Entity::find()
                    .filter(shifts::Column::DrawerId.eq(drawer_id.to_string()))
                    .filter(shifts::Column::Status.eq(ShiftStatus::Open.as_str()))
                    .one(&db_tx)
                    .await?;
                if open.is_some() {
                    return Err(LedgerError::DrawerHasOpenShift(model.name));
                }
            }

            let mut drawer: drawers::ActiveModel = model.into();
            drawer.active = sea_orm::ActiveValue::Set(active);
            drawer.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Look up a drawer by id.
    pub async fn drawer(&self, drawer_id: Uuid) -> ResultLedger<Drawer> {
        with_tx!(self, |db_tx| {
            let model = self.require_drawer(&db_tx, drawer_id).await?;
            Drawer::try_from(model)
        })
    }

    /// All drawers currently accepting shifts, ordered by name.
    pub async fn list_active_drawers(&self) -> ResultLedger<Vec<Drawer>> {
        let models: Vec<drawers::Model> = drawers::Entity::find()
            .filter(drawers::Column::Active.eq(true))
            .order_by_asc(drawers::Column::Name)
            .all(&self.database)
            .await?;

        models.into_iter().map(Drawer::try_from).collect()
    }

    /// Shifts currently open against a drawer.
    ///
    /// The one-open-shift invariant holds per `(drawer, cashier)` pair, so a
    /// drawer shared by several cashiers can legitimately have more than one.
    pub async fn open_shifts_for_drawer(&self, drawer_id: Uuid) -> ResultLedger<Vec<Shift>> {
        with_tx!(self, |db_tx| {
            self.require_drawer(&db_tx, drawer_id).await?;
            let models: Vec<shifts::Model> = shifts::Entity::find()
                .filter(shifts::Column::DrawerId.eq(drawer_id.to_string()))
                .filter(shifts::Column::Status.eq(ShiftStatus::Open.as_str()))
                .order_by_asc(shifts::Column::OpenedAt)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Shift::try_from).collect()
        })
    }

    /// The open shift for a `(drawer, cashier)` pair, if any.
    pub async fn current_open_shift(
        &self,
        drawer_id: Uuid,
        cashier_id: &str,
    ) -> ResultLedger<Option<Shift>> {
        let model = shifts::Entity::find()
            .filter(shifts::Column::DrawerId.eq(drawer_id.to_string()))
            .filter(shifts::Column::CashierId.eq(cashier_id.to_string()))
            .filter(shifts::Column::Status.eq(ShiftStatus::Open.as_str()))
            .one(&self.database)
            .await?;

        model.map(Shift::try_from).transpose()
    }

    /// Advisory per-currency cash position of a drawer: the live balances of
    /// every currently-open shift summed together. Recomputed from the
    /// transaction log on each call; never persisted.
    pub async fn drawer_balance(&self, drawer_id: Uuid) -> ResultLedger<HashMap<Currency, i64>> {
        with_tx!(self, |db_tx| {
            self.require_drawer(&db_tx, drawer_id).await?;

            let open_models: Vec<shifts::Model> = shifts::Entity::find()
                .filter(shifts::Column::DrawerId.eq(drawer_id.to_string()))
                .filter(shifts::Column::Status.eq(ShiftStatus::Open.as_str()))
                .all(&db_tx)
                .await?;

            let mut totals: HashMap<Currency, i64> = HashMap::new();
            for model in open_models {
                let shift_id = parse_uuid(&model.id, "shift")?;
                let balances = self.balances_from_log(&db_tx, shift_id).await?;
                for (currency, amount_minor) in balances {
                    *totals.entry(currency).or_insert(0) += amount_minor;
                }
            }
            Ok(totals)
        })
    }
}
