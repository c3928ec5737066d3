//! Read-side report types.
//!
//! Everything here is computed on demand from the transaction and end-balance
//! tables; nothing is persisted. Cross-currency totals are expressed in the
//! filter's report currency via the exchange-rate table; amounts with no
//! effective rate stay in their own currency and are counted in
//! `unconverted_count`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, LedgerError, ResultLedger};

/// Half-open reporting window `[from, to)`, both in UTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ReportRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> ResultLedger<Self> {
        if from >= to {
            return Err(LedgerError::InvalidAmount(
                "invalid range: from must be < to".to_string(),
            ));
        }
        Ok(Self { from, to })
    }

    /// The immediately preceding window of equal length, used for
    /// period-over-period comparison.
    #[must_use]
    pub fn preceding(&self) -> ReportRange {
        let len = self.to - self.from;
        ReportRange {
            from: self.from - len,
            to: self.from,
        }
    }
}

/// Optional report filters.
#[derive(Clone, Debug, Default)]
pub struct ReportFilter {
    /// Restrict to drawers at this location.
    pub location: Option<String>,
    /// Restrict to a single transaction currency.
    pub currency: Option<Currency>,
    /// Currency used for cross-currency roll-ups (default UZS).
    pub report_currency: Option<Currency>,
}

impl ReportFilter {
    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    #[must_use]
    pub fn report_currency(mut self, currency: Currency) -> Self {
        self.report_currency = Some(currency);
        self
    }

    #[must_use]
    pub fn resolved_report_currency(&self) -> Currency {
        self.report_currency.unwrap_or_default()
    }
}

/// Revenue/expense/net for one currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyTotals {
    pub currency: Currency,
    pub revenue_minor: i64,
    pub expense_minor: i64,
    pub net_minor: i64,
    pub transaction_count: u64,
}

/// Per-period financial summary with the preceding period for comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub range: ReportRange,
    pub totals: Vec<CurrencyTotals>,
    pub preceding: Vec<CurrencyTotals>,
}

/// One closed-shift currency line with a discrepancy, ranked by magnitude.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyLine {
    pub shift_id: Uuid,
    pub drawer_name: String,
    pub cashier_id: String,
    pub currency: Currency,
    pub discrepancy_minor: i64,
    /// |discrepancy| expressed in the report currency; equals the raw
    /// magnitude when no rate is effective.
    pub magnitude_report_minor: i64,
    pub reason: Option<String>,
}

/// Per-cashier reconciliation accuracy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashierDiscrepancy {
    pub cashier_id: String,
    pub shifts_closed: u64,
    pub shifts_flagged: u64,
    pub total_abs_discrepancy_report_minor: i64,
}

impl CashierDiscrepancy {
    #[must_use]
    pub fn flagged_rate(&self) -> f64 {
        if self.shifts_closed == 0 {
            0.0
        } else {
            self.shifts_flagged as f64 / self.shifts_closed as f64
        }
    }
}

/// Discrepancy/variance report over shifts closed in the window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscrepancyReport {
    pub range: ReportRange,
    pub report_currency: Currency,
    pub shifts_closed: u64,
    pub shifts_flagged: u64,
    pub flagged_rate: f64,
    /// Worst offenders first.
    pub by_cashier: Vec<CashierDiscrepancy>,
    /// Flagged lines ranked by magnitude, largest first.
    pub worst_lines: Vec<DiscrepancyLine>,
    /// Lines whose currency had no effective rate into the report currency.
    pub unconverted_count: u64,
}

/// Executive rollup: financial + discrepancy views and a 0-100 quality score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub financial: FinancialSummary,
    pub discrepancy: DiscrepancyReport,
    pub quality_score: u8,
}

/// Exchange volume for one currency pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangePairTotals {
    pub sold_currency: Currency,
    pub bought_currency: Currency,
    pub exchange_count: u64,
    pub total_sold_minor: i64,
    pub total_bought_minor: i64,
}

/// Exchange activity report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeSummary {
    pub range: ReportRange,
    pub report_currency: Currency,
    pub pairs: Vec<ExchangePairTotals>,
    /// Total sold volume expressed in the report currency, where a rate was
    /// effective at the range end.
    pub total_sold_report_minor: i64,
    pub unconverted_count: u64,
}

/// Quality score used by the executive rollup.
///
/// Accuracy-weighted and discrepancy-penalized: a period where every shift
/// reconciles cleanly scores 100; the score drops with the rate of flagged
/// shifts and, further, with the discrepancy volume relative to counted cash.
#[must_use]
pub fn quality_score(
    shifts_closed: u64,
    shifts_flagged: u64,
    total_abs_discrepancy_minor: i64,
    total_counted_minor: i64,
) -> u8 {
    if shifts_closed == 0 {
        return 100;
    }
    let accuracy = 1.0 - shifts_flagged as f64 / shifts_closed as f64;
    let ratio = if total_counted_minor > 0 {
        total_abs_discrepancy_minor as f64 / total_counted_minor as f64
    } else if total_abs_discrepancy_minor > 0 {
        1.0
    } else {
        0.0
    };
    let penalty = (ratio * 500.0).min(25.0);
    (accuracy * 100.0 - penalty).clamp(0.0, 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn preceding_window_has_equal_length() {
        let range = ReportRange::new(
            Utc.timestamp_opt(1_000, 0).unwrap(),
            Utc.timestamp_opt(2_000, 0).unwrap(),
        )
        .unwrap();
        let prev = range.preceding();
        assert_eq!(prev.from, Utc.timestamp_opt(0, 0).unwrap());
        assert_eq!(prev.to, range.from);
    }

    #[test]
    fn clean_period_scores_100() {
        assert_eq!(quality_score(10, 0, 0, 1_000_000), 100);
        assert_eq!(quality_score(0, 0, 0, 0), 100);
    }

    #[test]
    fn flagged_shifts_lower_the_score() {
        let clean = quality_score(10, 0, 0, 1_000_000);
        let some = quality_score(10, 2, 500, 1_000_000);
        let many = quality_score(10, 5, 5_000, 1_000_000);
        assert!(some < clean);
        assert!(many < some);
    }

    #[test]
    fn score_is_bounded() {
        assert_eq!(quality_score(1, 1, i64::MAX, 1), 0);
    }
}
