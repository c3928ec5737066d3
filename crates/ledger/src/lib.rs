//! Cash-drawer shift ledger.
//!
//! The crate tracks physical cash registers ("drawers"), the work sessions
//! ("shifts") cashiers open against them, the multi-currency transactions
//! posted during a shift and the end-of-shift reconciliation comparing
//! expected against physically counted cash.
//!
//! The public surface is the [`Ledger`] service: callers (admin UI actions,
//! bot command handlers) open a shift, post transactions, close the shift
//! with counted amounts, and a manager approves or rejects the result. The
//! reporting engine aggregates the same tables read-only.

pub use beginning_balances::{BalanceSource, BeginningBalance};
pub use commands::{CloseShiftCmd, OpenShiftCmd, PostTransactionCmd, SetExchangeRateCmd};
pub use currency::Currency;
pub use drawers::Drawer;
pub use end_balances::{EndBalance, EndBalanceLine, EndBalanceReport};
pub use error::LedgerError;
pub use money::Money;
pub use ops::{DEFAULT_DISCREPANCY_TOLERANCE_MINOR, Ledger, LedgerBuilder, TransactionListFilter};
pub use rates::{ExchangeRate, RATE_SCALE};
pub use reports::{
    CashierDiscrepancy, CurrencyTotals, DiscrepancyLine, DiscrepancyReport, ExchangePairTotals,
    ExchangeSummary, ExecutiveSummary, FinancialSummary, ReportFilter, ReportRange, quality_score,
};
pub use shifts::{ApprovalState, Shift, ShiftStatus};
pub use templates::ShiftTemplate;
pub use transactions::{Transaction, TransactionKind};
pub use users::{Role, User};

mod beginning_balances;
mod commands;
mod currency;
mod drawers;
mod end_balances;
mod error;
mod money;
mod ops;
mod rates;
mod reports;
mod shifts;
mod templates;
mod transactions;
mod users;
mod util;

type ResultLedger<T> = Result<T, LedgerError>;
