use sea_orm::{ActiveValue, TransactionTrait, prelude::*, sea_query::OnConflict};

use crate::{
    ApprovalState, CloseShiftCmd, EndBalance, EndBalanceLine, EndBalanceReport, LedgerError,
    ResultLedger, ShiftStatus, ShiftTemplate, end_balances, shifts, templates,
};
use crate::util::{normalize_optional_text, parse_uuid};

use super::super::{Ledger, with_tx};

impl Ledger {
    /// Closes an open shift against physically counted amounts.
    ///
    /// The reconciled currency set is every currency with an opening row or
    /// any non-voided transaction activity; each of those must have a counted
    /// amount or the whole close fails with `MissingCurrencyCount` and the
    /// shift stays open. `expected` is recomputed here from the raw log;
    /// this is the only place it is computed, never read from a cache.
    ///
    /// End-balance rows are upserted on `(shift, currency)` so a retried
    /// close converges instead of failing. Side effect: the drawer's
    /// carry-forward templates are refreshed from the counted amounts, each
    /// flagged when its |discrepancy| exceeds the configured tolerance.
    pub async fn close_shift(&self, cmd: CloseShiftCmd) -> ResultLedger<EndBalanceReport> {
        for (currency, counted_minor) in &cmd.counted_balances {
            if *counted_minor < 0 {
                return Err(LedgerError::InvalidAmount(format!(
                    "counted balance for {currency} must be >= 0"
                )));
            }
        }

        with_tx!(self, |db_tx| {
            let shift_model = self.require_open_shift(&db_tx, cmd.shift_id).await?;
            self.require_user(&db_tx, &cmd.closed_by).await?;
            let drawer_id = parse_uuid(&shift_model.drawer_id, "drawer")?;

            let expected = self.balances_from_log(&db_tx, cmd.shift_id).await?;

            for currency in expected.keys() {
                if !cmd.counted_balances.contains_key(currency) {
                    return Err(LedgerError::MissingCurrencyCount(currency.code().to_string()));
                }
            }

            // Counted currencies without activity are legitimate (cash found
            // in an untracked bucket): they reconcile against expected 0.
            let mut lines: Vec<EndBalanceLine> = Vec::with_capacity(cmd.counted_balances.len());
            for (currency, counted_minor) in &cmd.counted_balances {
                let expected_minor = expected.get(currency).copied().unwrap_or(0);
                let discrepancy_minor = counted_minor - expected_minor;
                lines.push(EndBalanceLine {
                    currency: *currency,
                    expected_minor,
                    counted_minor: *counted_minor,
                    discrepancy_minor,
                    flagged: self.is_flagged(discrepancy_minor),
                    reason: normalize_optional_text(
                        cmd.reasons.get(currency).map(String::as_str),
                    ),
                });
            }
            lines.sort_by_key(|line| line.currency);

            for line in &lines {
                let row = EndBalance {
                    shift_id: cmd.shift_id,
                    currency: line.currency,
                    expected_minor: line.expected_minor,
                    counted_minor: line.counted_minor,
                    discrepancy_minor: line.discrepancy_minor,
                    reason: line.reason.clone(),
                };
                end_balances::Entity::insert(end_balances::ActiveModel::from(&row))
                    .on_conflict(
                        OnConflict::columns([
                            end_balances::Column::ShiftId,
                            end_balances::Column::Currency,
                        ])
                        .update_columns([
                            end_balances::Column::ExpectedMinor,
                            end_balances::Column::CountedMinor,
                            end_balances::Column::DiscrepancyMinor,
                            end_balances::Column::Reason,
                        ])
                        .to_owned(),
                    )
                    .exec(&db_tx)
                    .await?;
            }

            let mut shift_active: shifts::ActiveModel = shift_model.into();
            shift_active.status = ActiveValue::Set(ShiftStatus::Closed.as_str().to_string());
            shift_active.closed_at = ActiveValue::Set(Some(cmd.closed_at));
            shift_active.closed_by = ActiveValue::Set(Some(cmd.closed_by.clone()));
            shift_active.approval_status =
                ActiveValue::Set(Some(ApprovalState::Pending.as_str().to_string()));
            if let Some(notes) = normalize_optional_text(cmd.notes.as_deref()) {
                shift_active.notes = ActiveValue::Set(Some(notes));
            }
            shift_active.update(&db_tx).await?;

            for line in &lines {
                let template = ShiftTemplate {
                    drawer_id,
                    currency: line.currency,
                    amount_minor: line.counted_minor,
                    derived_from_shift_id: cmd.shift_id,
                    has_discrepancy: line.flagged,
                    updated_at: cmd.closed_at,
                };
                templates::Entity::insert(templates::ActiveModel::from(&template))
                    .on_conflict(
                        OnConflict::columns([
                            templates::Column::DrawerId,
                            templates::Column::Currency,
                        ])
                        .update_columns([
                            templates::Column::AmountMinor,
                            templates::Column::DerivedFromShiftId,
                            templates::Column::HasDiscrepancy,
                            templates::Column::UpdatedAt,
                        ])
                        .to_owned(),
                    )
                    .exec(&db_tx)
                    .await?;
            }

            Ok(EndBalanceReport {
                shift_id: cmd.shift_id,
                closed_at: cmd.closed_at,
                lines,
            })
        })
    }
}
