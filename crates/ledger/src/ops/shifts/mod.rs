use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{ResultLedger, Shift};

use super::{Ledger, with_tx};

mod approval;
mod close;
mod open;

impl Ledger {
    /// Look up a shift by id.
    pub async fn shift(&self, shift_id: Uuid) -> ResultLedger<Shift> {
        with_tx!(self, |db_tx| {
            let model = self.require_shift(&db_tx, shift_id).await?;
            Shift::try_from(model)
        })
    }
}
