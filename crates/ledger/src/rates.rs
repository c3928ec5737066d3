//! Exchange-rate table.
//!
//! Rates are time-bounded and used only to express cross-currency totals in
//! reports. Ledger arithmetic never crosses currencies, and exchange
//! transactions are deliberately **not** validated against this table: rates
//! at the counter are entered manually by cashiers.
//!
//! The rate value is stored as an integer number of micro-units
//! (`quote-per-base` × 1_000_000) so storage stays float-free.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, LedgerError};
use crate::util::parse_uuid;

/// Scale factor for `rate_micros`.
pub const RATE_SCALE: i64 = 1_000_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub id: Uuid,
    pub base_currency: Currency,
    pub quote_currency: Currency,
    /// Quote minor units per base minor unit, times [`RATE_SCALE`].
    pub rate_micros: i64,
    pub effective_from: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ExchangeRate {
    /// Whether this row is effective at instant `at`.
    #[must_use]
    pub fn is_effective_at(&self, at: DateTime<Utc>) -> bool {
        self.effective_from <= at && self.expires_at.is_none_or(|exp| exp > at)
    }

    /// Converts an amount of base-currency minor units into quote-currency
    /// minor units, rounding toward zero. Reporting use only.
    #[must_use]
    pub fn convert_minor(&self, amount_minor: i64) -> i64 {
        amount_minor.saturating_mul(self.rate_micros) / RATE_SCALE
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exchange_rates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub base_currency: String,
    pub quote_currency: String,
    pub rate_micros: i64,
    pub effective_from: DateTimeUtc,
    pub expires_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ExchangeRate> for ActiveModel {
    fn from(rate: &ExchangeRate) -> Self {
        Self {
            id: ActiveValue::Set(rate.id.to_string()),
            base_currency: ActiveValue::Set(rate.base_currency.code().to_string()),
            quote_currency: ActiveValue::Set(rate.quote_currency.code().to_string()),
            rate_micros: ActiveValue::Set(rate.rate_micros),
            effective_from: ActiveValue::Set(rate.effective_from),
            expires_at: ActiveValue::Set(rate.expires_at),
            created_at: ActiveValue::Set(rate.created_at),
        }
    }
}

impl TryFrom<Model> for ExchangeRate {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "exchange_rate")?,
            base_currency: Currency::try_from(model.base_currency.as_str())?,
            quote_currency: Currency::try_from(model.quote_currency.as_str())?,
            rate_micros: model.rate_micros,
            effective_from: model.effective_from,
            expires_at: model.expires_at,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn rate(effective_from: i64, expires_at: Option<i64>) -> ExchangeRate {
        ExchangeRate {
            id: Uuid::new_v4(),
            base_currency: Currency::Usd,
            quote_currency: Currency::Uzs,
            rate_micros: 12_500 * RATE_SCALE,
            effective_from: Utc.timestamp_opt(effective_from, 0).unwrap(),
            expires_at: expires_at.map(|e| Utc.timestamp_opt(e, 0).unwrap()),
            created_at: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    #[test]
    fn effectiveness_window() {
        let at = Utc.timestamp_opt(100, 0).unwrap();
        assert!(rate(50, None).is_effective_at(at));
        assert!(rate(50, Some(200)).is_effective_at(at));
        assert!(!rate(150, None).is_effective_at(at));
        assert!(!rate(50, Some(100)).is_effective_at(at));
    }

    #[test]
    fn converts_minor_units() {
        // 1.00 USD at 12_500 UZS/USD -> 12_500.00 UZS.
        assert_eq!(rate(0, None).convert_minor(100), 1_250_000);
    }
}
