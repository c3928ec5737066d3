use sea_orm::{QueryFilter, SqlErr, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    BalanceSource, BeginningBalance, LedgerError, OpenShiftCmd, ResultLedger, Shift,
    ShiftTemplate, beginning_balances, shifts, templates,
};
use crate::util::{model_currency, normalize_optional_text};

use super::super::{Ledger, with_tx};

impl Ledger {
    /// Opens a shift for a cashier on a drawer.
    ///
    /// At most one shift may be open per `(drawer, cashier)` pair. The check
    /// is not read-then-write: the insert itself races against the partial
    /// unique index on open shifts, so two concurrent opens resolve to
    /// exactly one winner and one `ShiftAlreadyOpen`.
    ///
    /// Opening balances are seeded per currency:
    /// - explicit amounts from the command (must be non-negative)
    /// - otherwise the drawer's carry-forward template, unless the template
    ///   is flagged with a discrepancy and the command did not confirm it.
    pub async fn open_shift(&self, cmd: OpenShiftCmd) -> ResultLedger<Uuid> {
        for (currency, amount_minor) in &cmd.opening_balances {
            if *amount_minor < 0 {
                return Err(LedgerError::InvalidAmount(format!(
                    "opening balance for {currency} must be >= 0"
                )));
            }
        }

        with_tx!(self, |db_tx| {
            self.require_active_drawer(&db_tx, cmd.drawer_id).await?;
            self.require_user(&db_tx, &cmd.cashier_id).await?;

            let shift = Shift::new(
                cmd.drawer_id,
                cmd.cashier_id.clone(),
                cmd.opened_at,
                normalize_optional_text(cmd.notes.as_deref()),
            );

            if let Err(err) = shifts::ActiveModel::from(&shift).insert(&db_tx).await {
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Err(LedgerError::ShiftAlreadyOpen(format!(
                        "drawer {} / cashier {}",
                        cmd.drawer_id, cmd.cashier_id
                    )));
                }
                return Err(err.into());
            }

            for (currency, amount_minor) in &cmd.opening_balances {
                let row = BeginningBalance {
                    shift_id: shift.id,
                    currency: *currency,
                    amount_minor: *amount_minor,
                    source: BalanceSource::Manual,
                };
                beginning_balances::ActiveModel::from(&row)
                    .insert(&db_tx)
                    .await?;
            }

            let template_models: Vec<templates::Model> = templates::Entity::find()
                .filter(templates::Column::DrawerId.eq(cmd.drawer_id.to_string()))
                .all(&db_tx)
                .await?;
            for model in template_models {
                let currency = model_currency(&model.currency)?;
                if cmd.opening_balances.contains_key(&currency) {
                    continue;
                }
                // A flagged carry-forward is withheld unless the opener
                // explicitly confirmed it.
                if model.has_discrepancy && !cmd.accept_flagged_carry_forward {
                    continue;
                }
                let row = BeginningBalance {
                    shift_id: shift.id,
                    currency,
                    amount_minor: model.amount_minor,
                    source: BalanceSource::CarryForward,
                };
                beginning_balances::ActiveModel::from(&row)
                    .insert(&db_tx)
                    .await?;
            }

            Ok(shift.id)
        })
    }

    /// The drawer's carry-forward templates, one per currency.
    ///
    /// Callers use this to show the proposed opening amounts, and to prompt
    /// for confirmation on currencies whose last close was flagged, before
    /// building an [`OpenShiftCmd`].
    pub async fn carry_forward_preview(&self, drawer_id: Uuid) -> ResultLedger<Vec<ShiftTemplate>> {
        with_tx!(self, |db_tx| {
            self.require_drawer(&db_tx, drawer_id).await?;
            let models: Vec<templates::Model> = templates::Entity::find()
                .filter(templates::Column::DrawerId.eq(drawer_id.to_string()))
                .all(&db_tx)
                .await?;
            models.into_iter().map(ShiftTemplate::try_from).collect()
        })
    }
}
