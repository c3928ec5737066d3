use sea_orm::DatabaseConnection;

use crate::ResultLedger;

mod access;
mod balances;
mod drawers;
mod rates;
mod reporting;
mod shifts;
mod transactions;
mod users;

pub use transactions::TransactionListFilter;

/// Default reconciliation tolerance in minor units: discrepancies up to one
/// minor unit (0.01 in major units) are treated as rounding noise, not a
/// flag.
pub const DEFAULT_DISCREPANCY_TOLERANCE_MINOR: i64 = 1;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The cash-drawer shift ledger service.
///
/// One instance wraps a database connection and exposes the full service
/// surface consumed by the admin UI and the bot command handlers: drawer
/// registry, shift lifecycle, transaction posting, balance reads and the
/// reporting engine. All writes are transactional; the struct itself holds
/// no mutable state, so it is freely shareable across request handlers.
#[derive(Debug)]
pub struct Ledger {
    database: DatabaseConnection,
    discrepancy_tolerance_minor: i64,
}

impl Ledger {
    /// Return a builder for `Ledger`. Help to build the struct.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    /// The configured reconciliation tolerance in minor units.
    #[must_use]
    pub fn discrepancy_tolerance_minor(&self) -> i64 {
        self.discrepancy_tolerance_minor
    }

    /// Whether a discrepancy of this size is flagged for review.
    pub(crate) fn is_flagged(&self, discrepancy_minor: i64) -> bool {
        discrepancy_minor.abs() > self.discrepancy_tolerance_minor
    }
}

/// The builder for `Ledger`
pub struct LedgerBuilder {
    database: DatabaseConnection,
    discrepancy_tolerance_minor: i64,
}

impl Default for LedgerBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            discrepancy_tolerance_minor: DEFAULT_DISCREPANCY_TOLERANCE_MINOR,
        }
    }
}

impl LedgerBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Override the reconciliation tolerance (minor units).
    pub fn discrepancy_tolerance_minor(mut self, tolerance_minor: i64) -> LedgerBuilder {
        self.discrepancy_tolerance_minor = tolerance_minor;
        self
    }

    /// Construct `Ledger`
    pub async fn build(self) -> ResultLedger<Ledger> {
        Ok(Ledger {
            database: self.database,
            discrepancy_tolerance_minor: self.discrepancy_tolerance_minor,
        })
    }
}
