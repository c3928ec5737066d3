//! Command structs for ledger operations.
//!
//! These types group parameters for write operations (open/post/close),
//! keeping call sites readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{Currency, TransactionKind};

/// Open a shift on a drawer for a cashier.
#[derive(Clone, Debug)]
pub struct OpenShiftCmd {
    pub drawer_id: Uuid,
    pub cashier_id: String,
    pub opened_at: DateTime<Utc>,
    /// Explicit opening amounts per currency (minor units, non-negative).
    pub opening_balances: HashMap<Currency, i64>,
    /// When true, carry-forward templates flagged with a discrepancy are
    /// accepted for currencies not listed in `opening_balances`. When false
    /// (default) flagged templates are withheld and those currencies start
    /// without an opening row.
    pub accept_flagged_carry_forward: bool,
    pub notes: Option<String>,
}

impl OpenShiftCmd {
    #[must_use]
    pub fn new(drawer_id: Uuid, cashier_id: impl Into<String>, opened_at: DateTime<Utc>) -> Self {
        Self {
            drawer_id,
            cashier_id: cashier_id.into(),
            opened_at,
            opening_balances: HashMap::new(),
            accept_flagged_carry_forward: false,
            notes: None,
        }
    }

    #[must_use]
    pub fn opening_balance(mut self, currency: Currency, amount_minor: i64) -> Self {
        self.opening_balances.insert(currency, amount_minor);
        self
    }

    #[must_use]
    pub fn accept_flagged_carry_forward(mut self) -> Self {
        self.accept_flagged_carry_forward = true;
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Post a transaction to an open shift.
#[derive(Clone, Debug)]
pub struct PostTransactionCmd {
    pub shift_id: Uuid,
    pub kind: TransactionKind,
    pub currency: Currency,
    pub amount_minor: i64,
    /// Receiving leg of an exchange; required for `Exchange`, rejected
    /// otherwise.
    pub secondary: Option<(Currency, i64)>,
    pub category: Option<String>,
    pub reference: Option<String>,
    pub created_by: String,
    pub occurred_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
}

impl PostTransactionCmd {
    #[must_use]
    pub fn new(
        shift_id: Uuid,
        kind: TransactionKind,
        currency: Currency,
        amount_minor: i64,
        created_by: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            shift_id,
            kind,
            currency,
            amount_minor,
            secondary: None,
            category: None,
            reference: None,
            created_by: created_by.into(),
            occurred_at,
            idempotency_key: None,
        }
    }

    #[must_use]
    pub fn secondary(mut self, currency: Currency, amount_minor: i64) -> Self {
        self.secondary = Some((currency, amount_minor));
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Close an open shift with physically counted amounts.
#[derive(Clone, Debug)]
pub struct CloseShiftCmd {
    pub shift_id: Uuid,
    pub closed_by: String,
    pub closed_at: DateTime<Utc>,
    /// Counted cash per currency (minor units). Every currency with any
    /// activity in the shift must be present.
    pub counted_balances: HashMap<Currency, i64>,
    /// Optional free-text reason per currency, stored on the end balance row
    /// when that currency shows a discrepancy.
    pub reasons: HashMap<Currency, String>,
    pub notes: Option<String>,
}

impl CloseShiftCmd {
    #[must_use]
    pub fn new(shift_id: Uuid, closed_by: impl Into<String>, closed_at: DateTime<Utc>) -> Self {
        Self {
            shift_id,
            closed_by: closed_by.into(),
            closed_at,
            counted_balances: HashMap::new(),
            reasons: HashMap::new(),
            notes: None,
        }
    }

    #[must_use]
    pub fn counted(mut self, currency: Currency, amount_minor: i64) -> Self {
        self.counted_balances.insert(currency, amount_minor);
        self
    }

    #[must_use]
    pub fn reason(mut self, currency: Currency, reason: impl Into<String>) -> Self {
        self.reasons.insert(currency, reason.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Record a new exchange rate row.
#[derive(Clone, Debug)]
pub struct SetExchangeRateCmd {
    pub base_currency: Currency,
    pub quote_currency: Currency,
    /// Quote per base times `RATE_SCALE`.
    pub rate_micros: i64,
    pub effective_from: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SetExchangeRateCmd {
    #[must_use]
    pub fn new(
        base_currency: Currency,
        quote_currency: Currency,
        rate_micros: i64,
        effective_from: DateTime<Utc>,
    ) -> Self {
        Self {
            base_currency,
            quote_currency,
            rate_micros,
            effective_from,
            expires_at: None,
            created_at: effective_from,
        }
    }

    #[must_use]
    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    #[must_use]
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}
