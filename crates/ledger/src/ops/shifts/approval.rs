use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{ApprovalState, LedgerError, ResultLedger, shifts};
use crate::util::{normalize_optional_text, normalize_required_name};

use super::super::{Ledger, with_tx};

impl Ledger {
    /// Approves a closed shift's reconciliation. Terminal; valid only from
    /// the pending sub-state.
    pub async fn approve_shift(
        &self,
        shift_id: Uuid,
        approver: &str,
        notes: Option<&str>,
        decided_at: DateTime<Utc>,
    ) -> ResultLedger<()> {
        self.decide_shift(
            shift_id,
            approver,
            ApprovalState::Approved,
            normalize_optional_text(notes),
            decided_at,
        )
        .await
    }

    /// Rejects a closed shift's reconciliation with a mandatory reason.
    /// Terminal; valid only from the pending sub-state.
    pub async fn reject_shift(
        &self,
        shift_id: Uuid,
        rejecter: &str,
        reason: &str,
        decided_at: DateTime<Utc>,
    ) -> ResultLedger<()> {
        let reason = normalize_required_name(reason, "rejection reason")?;
        self.decide_shift(
            shift_id,
            rejecter,
            ApprovalState::Rejected,
            Some(reason),
            decided_at,
        )
        .await
    }

    async fn decide_shift(
        &self,
        shift_id: Uuid,
        decided_by: &str,
        decision: ApprovalState,
        decision_notes: Option<String>,
        decided_at: DateTime<Utc>,
    ) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let shift_model = self.require_shift(&db_tx, shift_id).await?;
            self.require_user(&db_tx, decided_by).await?;

            if shift_model.approval_status.as_deref() != Some(ApprovalState::Pending.as_str()) {
                return Err(LedgerError::ShiftNotPendingApproval(shift_id.to_string()));
            }

            let mut shift_active: shifts::ActiveModel = shift_model.into();
            shift_active.approval_status =
                ActiveValue::Set(Some(decision.as_str().to_string()));
            shift_active.decided_by = ActiveValue::Set(Some(decided_by.to_string()));
            shift_active.decided_at = ActiveValue::Set(Some(decided_at));
            shift_active.decision_notes = ActiveValue::Set(decision_notes);
            shift_active.update(&db_tx).await?;
            Ok(())
        })
    }
}
