use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// ISO-like currency code used by drawers, shifts and money values.
///
/// The ledger is genuinely multi-currency: a single shift can hold cash in
/// several currencies at once, and every balance row is keyed by currency.
/// Amounts never cross a currency boundary inside the ledger; the exchange
/// rate table is consulted only when reports roll totals up into a single
/// reporting currency.
///
/// ## Minor units
///
/// Monetary values are stored as an `i64` number of **minor units** (see
/// `Money`). `minor_units()` returns how many decimal digits are used when
/// converting between:
/// - major units (human input/output, e.g. `1500.50 UZS`)
/// - minor units (stored integers, e.g. `150050`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Uzs,
    Usd,
    Eur,
    Rub,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Uzs => "UZS",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Rub => "RUB",
        }
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(self) -> u8 {
        match self {
            Currency::Uzs | Currency::Usd | Currency::Eur | Currency::Rub => 2,
        }
    }

    /// All supported currencies, in display order.
    #[must_use]
    pub const fn all() -> [Currency; 4] {
        [Currency::Uzs, Currency::Usd, Currency::Eur, Currency::Rub]
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "UZS" => Ok(Currency::Uzs),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "RUB" => Ok(Currency::Rub),
            other => Err(LedgerError::CurrencyMismatch(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}
