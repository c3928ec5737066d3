use std::collections::HashMap;

use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Currency, ResultLedger, Transaction, beginning_balances, transactions};
use crate::util::model_currency;

use super::{Ledger, with_tx};

impl Ledger {
    /// Folds a shift's cash position from its opening snapshot and the
    /// non-voided transaction log.
    ///
    /// This is the single balance implementation in the ledger: `close_shift`
    /// uses it for `expected`, and the live/advisory reads use it unchanged.
    /// There is no cached balance column anywhere, so recomputing from the
    /// raw log always reproduces the stored expected values.
    pub(super) async fn balances_from_log(
        &self,
        db_tx: &DatabaseTransaction,
        shift_id: Uuid,
    ) -> ResultLedger<HashMap<Currency, i64>> {
        let mut balances: HashMap<Currency, i64> = HashMap::new();

        let beginning_models: Vec<beginning_balances::Model> = beginning_balances::Entity::find()
            .filter(beginning_balances::Column::ShiftId.eq(shift_id.to_string()))
            .all(db_tx)
            .await?;
        for model in beginning_models {
            let currency = model_currency(&model.currency)?;
            *balances.entry(currency).or_insert(0) += model.amount_minor;
        }

        let tx_models: Vec<transactions::Model> = transactions::Entity::find()
            .filter(transactions::Column::ShiftId.eq(shift_id.to_string()))
            .filter(transactions::Column::VoidedAt.is_null())
            .all(db_tx)
            .await?;
        for model in tx_models {
            let tx = Transaction::try_from(model)?;
            for (currency, delta_minor) in tx.currency_deltas() {
                *balances.entry(currency).or_insert(0) += delta_minor;
            }
        }

        Ok(balances)
    }

    /// Advisory live balances of a shift, recomputed on every read.
    ///
    /// Suitable for display while the shift is running; the authoritative
    /// expected amounts are the ones computed (by the same fold) at close
    /// time.
    pub async fn live_balances(&self, shift_id: Uuid) -> ResultLedger<HashMap<Currency, i64>> {
        with_tx!(self, |db_tx| {
            self.require_shift(&db_tx, shift_id).await?;
            self.balances_from_log(&db_tx, shift_id).await
        })
    }
}
