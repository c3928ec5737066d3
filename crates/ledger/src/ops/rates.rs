use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Currency, ExchangeRate, LedgerError, ResultLedger, SetExchangeRateCmd, rates,
};

use super::{Ledger, with_tx};

/// The rate effective for `base -> quote` at instant `at`: the newest row
/// with `effective_from <= at` that has not expired.
pub(super) async fn find_effective_rate<C: ConnectionTrait>(
    db: &C,
    base: Currency,
    quote: Currency,
    at: DateTime<Utc>,
) -> ResultLedger<Option<ExchangeRate>> {
    let models: Vec<rates::Model> = rates::Entity::find()
        .filter(rates::Column::BaseCurrency.eq(base.code()))
        .filter(rates::Column::QuoteCurrency.eq(quote.code()))
        .filter(rates::Column::EffectiveFrom.lte(at))
        .order_by_desc(rates::Column::EffectiveFrom)
        .all(db)
        .await?;

    for model in models {
        let rate = ExchangeRate::try_from(model)?;
        if rate.is_effective_at(at) {
            return Ok(Some(rate));
        }
    }
    Ok(None)
}

impl Ledger {
    /// Records a new exchange-rate row.
    ///
    /// Rows are never updated; superseding a rate means inserting a newer
    /// `effective_from`. Reporting picks the newest effective row.
    pub async fn set_exchange_rate(&self, cmd: SetExchangeRateCmd) -> ResultLedger<Uuid> {
        if cmd.base_currency == cmd.quote_currency {
            return Err(LedgerError::CurrencyMismatch(
                "base and quote currency must differ".to_string(),
            ));
        }
        if cmd.rate_micros <= 0 {
            return Err(LedgerError::InvalidAmount(
                "rate_micros must be > 0".to_string(),
            ));
        }
        if let Some(expires_at) = cmd.expires_at
            && expires_at <= cmd.effective_from
        {
            return Err(LedgerError::InvalidAmount(
                "expires_at must be after effective_from".to_string(),
            ));
        }

        let rate = ExchangeRate {
            id: Uuid::new_v4(),
            base_currency: cmd.base_currency,
            quote_currency: cmd.quote_currency,
            rate_micros: cmd.rate_micros,
            effective_from: cmd.effective_from,
            expires_at: cmd.expires_at,
            created_at: cmd.created_at,
        };

        with_tx!(self, |db_tx| {
            rates::ActiveModel::from(&rate).insert(&db_tx).await?;
            Ok(rate.id)
        })
    }

    /// The currently effective rate for a currency pair, if any.
    pub async fn effective_rate(
        &self,
        base: Currency,
        quote: Currency,
        at: DateTime<Utc>,
    ) -> ResultLedger<Option<ExchangeRate>> {
        find_effective_rate(&self.database, base, quote, at).await
    }
}
