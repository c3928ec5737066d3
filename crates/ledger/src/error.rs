//! The module contains the errors the ledger can return.
//!
//! Every expected, recoverable outcome of a ledger operation is a typed
//! variant so callers (admin UI actions, bot command handlers) can render an
//! actionable message instead of a generic failure. Storage failures pass
//! through transparently as [`Database`].
//!
//! [`Database`]: LedgerError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("a shift is already open for this drawer and cashier: {0}")]
    ShiftAlreadyOpen(String),
    #[error("shift is not open: {0}")]
    ShiftNotOpen(String),
    #[error("shift is not pending approval: {0}")]
    ShiftNotPendingApproval(String),
    #[error("drawer unavailable: {0}")]
    DrawerUnavailable(String),
    #[error("drawer has an open shift: {0}")]
    DrawerHasOpenShift(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("missing counted amount for currency: {0}")]
    MissingCurrencyCount(String),
    #[error("currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::ShiftAlreadyOpen(a), Self::ShiftAlreadyOpen(b)) => a == b,
            (Self::ShiftNotOpen(a), Self::ShiftNotOpen(b)) => a == b,
            (Self::ShiftNotPendingApproval(a), Self::ShiftNotPendingApproval(b)) => a == b,
            (Self::DrawerUnavailable(a), Self::DrawerUnavailable(b)) => a == b,
            (Self::DrawerHasOpenShift(a), Self::DrawerHasOpenShift(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::MissingCurrencyCount(a), Self::MissingCurrencyCount(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
