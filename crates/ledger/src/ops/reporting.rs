//! Reconciliation & reporting engine.
//!
//! Pure read-side aggregation over the transaction and end-balance tables.
//! Every entry point takes the caller's identity and requires the manager
//! role; nothing here is persisted and nothing here mutates the ledger.

use std::collections::HashMap;

use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    CashierDiscrepancy, Currency, CurrencyTotals, DiscrepancyLine, DiscrepancyReport,
    ExchangePairTotals, ExchangeSummary, ExecutiveSummary, FinancialSummary, ReportFilter,
    ReportRange, ResultLedger, ShiftStatus, Transaction, TransactionKind, drawers, end_balances,
    quality_score, shifts, transactions,
};
use crate::util::{model_currency, parse_uuid};

use super::rates::find_effective_rate;
use super::{Ledger, with_tx};

/// Lazily-filled cache of effective rates into the report currency, so a
/// report does one rate lookup per distinct currency instead of one per row.
struct RateCache {
    report_currency: Currency,
    at: chrono::DateTime<chrono::Utc>,
    rates: HashMap<Currency, Option<crate::ExchangeRate>>,
}

impl RateCache {
    fn new(report_currency: Currency, at: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            report_currency,
            at,
            rates: HashMap::new(),
        }
    }

    /// Converts `amount_minor` into the report currency. Returns the raw
    /// amount and `false` when no rate is effective for the pair.
    async fn to_report_minor(
        &mut self,
        db_tx: &DatabaseTransaction,
        amount_minor: i64,
        from: Currency,
    ) -> ResultLedger<(i64, bool)> {
        if from == self.report_currency {
            return Ok((amount_minor, true));
        }
        if !self.rates.contains_key(&from) {
            let rate = find_effective_rate(db_tx, from, self.report_currency, self.at).await?;
            self.rates.insert(from, rate);
        }
        match self.rates.get(&from).cloned().flatten() {
            Some(rate) => Ok((rate.convert_minor(amount_minor), true)),
            None => Ok((amount_minor, false)),
        }
    }
}

/// Aggregates shared between the discrepancy report and the quality score.
struct DiscrepancyComputation {
    report: DiscrepancyReport,
    total_abs_discrepancy_report_minor: i64,
    total_counted_report_minor: i64,
}

impl Ledger {
    /// Financial summary over `[range.from, range.to)`: revenue, expense and
    /// net per currency, with the immediately preceding period of equal
    /// length for comparison.
    ///
    /// Exchange transactions move cash between currency buckets and are
    /// excluded from revenue/expense, the same way internal transfers stay
    /// out of income statistics.
    pub async fn financial_summary(
        &self,
        caller: &str,
        range: ReportRange,
        filter: &ReportFilter,
    ) -> ResultLedger<FinancialSummary> {
        with_tx!(self, |db_tx| {
            self.require_manager(&db_tx, caller).await?;
            let scope = self.scoped_drawers(&db_tx, filter).await?;
            self.financial_summary_in(&db_tx, range, filter, &scope)
                .await
        })
    }

    /// Discrepancy/variance report over shifts closed in the window: flag
    /// rate, per-cashier ranking and the worst lines by magnitude.
    pub async fn discrepancy_report(
        &self,
        caller: &str,
        range: ReportRange,
        filter: &ReportFilter,
    ) -> ResultLedger<DiscrepancyReport> {
        with_tx!(self, |db_tx| {
            self.require_manager(&db_tx, caller).await?;
            let scope = self.scoped_drawers(&db_tx, filter).await?;
            let computation = self
                .discrepancy_compute(&db_tx, range, filter, &scope)
                .await?;
            Ok(computation.report)
        })
    }

    /// Executive rollup: financial summary, discrepancy report and the 0-100
    /// quality score derived from both.
    pub async fn executive_summary(
        &self,
        caller: &str,
        range: ReportRange,
        filter: &ReportFilter,
    ) -> ResultLedger<ExecutiveSummary> {
        with_tx!(self, |db_tx| {
            self.require_manager(&db_tx, caller).await?;
            let scope = self.scoped_drawers(&db_tx, filter).await?;

            let financial = self
                .financial_summary_in(&db_tx, range, filter, &scope)
                .await?;
            let computation = self
                .discrepancy_compute(&db_tx, range, filter, &scope)
                .await?;

            let score = quality_score(
                computation.report.shifts_closed,
                computation.report.shifts_flagged,
                computation.total_abs_discrepancy_report_minor,
                computation.total_counted_report_minor,
            );

            Ok(ExecutiveSummary {
                financial,
                discrepancy: computation.report,
                quality_score: score,
            })
        })
    }

    /// Exchange activity grouped by currency pair, with sold volume rolled up
    /// into the report currency where a rate is effective.
    pub async fn exchange_summary(
        &self,
        caller: &str,
        range: ReportRange,
        filter: &ReportFilter,
    ) -> ResultLedger<ExchangeSummary> {
        with_tx!(self, |db_tx| {
            self.require_manager(&db_tx, caller).await?;
            let scope = self.scoped_drawers(&db_tx, filter).await?;
            let report_currency = filter.resolved_report_currency();
            let mut rate_cache = RateCache::new(report_currency, range.to);

            let txs = self
                .scoped_transactions(&db_tx, range, &scope)
                .await?
                .into_iter()
                .filter(|tx| tx.kind == TransactionKind::Exchange);

            let mut pairs: HashMap<(Currency, Currency), ExchangePairTotals> = HashMap::new();
            let mut total_sold_report_minor: i64 = 0;
            let mut unconverted_count: u64 = 0;

            for tx in txs {
                let (Some(bought_currency), Some(bought_minor)) =
                    (tx.secondary_currency, tx.secondary_amount_minor)
                else {
                    continue;
                };
                let entry = pairs
                    .entry((tx.currency, bought_currency))
                    .or_insert(ExchangePairTotals {
                        sold_currency: tx.currency,
                        bought_currency,
                        exchange_count: 0,
                        total_sold_minor: 0,
                        total_bought_minor: 0,
                    });
                entry.exchange_count += 1;
                entry.total_sold_minor += tx.amount_minor;
                entry.total_bought_minor += bought_minor;

                let (sold_report, converted) = rate_cache
                    .to_report_minor(&db_tx, tx.amount_minor, tx.currency)
                    .await?;
                if converted {
                    total_sold_report_minor += sold_report;
                } else {
                    unconverted_count += 1;
                }
            }

            let mut pairs: Vec<ExchangePairTotals> = pairs.into_values().collect();
            pairs.sort_by_key(|p| (p.sold_currency, p.bought_currency));

            Ok(ExchangeSummary {
                range,
                report_currency,
                pairs,
                total_sold_report_minor,
                unconverted_count,
            })
        })
    }

    /// Drawers in scope for a report: all of them, or those at the filter's
    /// location. Returns `drawer_id -> drawer name`.
    async fn scoped_drawers(
        &self,
        db_tx: &DatabaseTransaction,
        filter: &ReportFilter,
    ) -> ResultLedger<HashMap<String, String>> {
        let mut query = drawers::Entity::find();
        if let Some(location) = &filter.location {
            query = query.filter(drawers::Column::Location.eq(location.clone()));
        }
        let models: Vec<drawers::Model> = query.all(db_tx).await?;
        Ok(models.into_iter().map(|m| (m.id, m.name)).collect())
    }

    /// Non-voided transactions with business time in the window, restricted
    /// to shifts on the scoped drawers.
    async fn scoped_transactions(
        &self,
        db_tx: &DatabaseTransaction,
        range: ReportRange,
        scope: &HashMap<String, String>,
    ) -> ResultLedger<Vec<Transaction>> {
        let drawer_ids: Vec<String> = scope.keys().cloned().collect();
        let shift_models: Vec<shifts::Model> = shifts::Entity::find()
            .filter(shifts::Column::DrawerId.is_in(drawer_ids))
            .all(db_tx)
            .await?;
        let shift_ids: Vec<String> = shift_models.into_iter().map(|m| m.id).collect();

        let tx_models: Vec<transactions::Model> = transactions::Entity::find()
            .filter(transactions::Column::ShiftId.is_in(shift_ids))
            .filter(transactions::Column::OccurredAt.gte(range.from))
            .filter(transactions::Column::OccurredAt.lt(range.to))
            .filter(transactions::Column::VoidedAt.is_null())
            .all(db_tx)
            .await?;

        tx_models.into_iter().map(Transaction::try_from).collect()
    }

    async fn financial_summary_in(
        &self,
        db_tx: &DatabaseTransaction,
        range: ReportRange,
        filter: &ReportFilter,
        scope: &HashMap<String, String>,
    ) -> ResultLedger<FinancialSummary> {
        let totals = self
            .financial_totals(db_tx, range, filter, scope)
            .await?;
        let preceding = self
            .financial_totals(db_tx, range.preceding(), filter, scope)
            .await?;
        Ok(FinancialSummary {
            range,
            totals,
            preceding,
        })
    }

    async fn financial_totals(
        &self,
        db_tx: &DatabaseTransaction,
        range: ReportRange,
        filter: &ReportFilter,
        scope: &HashMap<String, String>,
    ) -> ResultLedger<Vec<CurrencyTotals>> {
        let txs = self.scoped_transactions(db_tx, range, scope).await?;

        let mut by_currency: HashMap<Currency, CurrencyTotals> = HashMap::new();
        for tx in txs {
            if tx.kind == TransactionKind::Exchange {
                continue;
            }
            if filter.currency.is_some_and(|c| c != tx.currency) {
                continue;
            }
            let entry = by_currency.entry(tx.currency).or_insert(CurrencyTotals {
                currency: tx.currency,
                revenue_minor: 0,
                expense_minor: 0,
                net_minor: 0,
                transaction_count: 0,
            });
            entry.transaction_count += 1;
            match tx.kind {
                TransactionKind::In => entry.revenue_minor += tx.amount_minor,
                TransactionKind::Out => entry.expense_minor += tx.amount_minor,
                TransactionKind::Exchange => {}
            }
            entry.net_minor = entry.revenue_minor - entry.expense_minor;
        }

        let mut totals: Vec<CurrencyTotals> = by_currency.into_values().collect();
        totals.sort_by_key(|t| t.currency);
        Ok(totals)
    }

    async fn discrepancy_compute(
        &self,
        db_tx: &DatabaseTransaction,
        range: ReportRange,
        filter: &ReportFilter,
        scope: &HashMap<String, String>,
    ) -> ResultLedger<DiscrepancyComputation> {
        let report_currency = filter.resolved_report_currency();
        let mut rate_cache = RateCache::new(report_currency, range.to);

        let drawer_ids: Vec<String> = scope.keys().cloned().collect();
        let shift_models: Vec<shifts::Model> = shifts::Entity::find()
            .filter(shifts::Column::DrawerId.is_in(drawer_ids))
            .filter(shifts::Column::Status.eq(ShiftStatus::Closed.as_str()))
            .filter(shifts::Column::ClosedAt.gte(range.from))
            .filter(shifts::Column::ClosedAt.lt(range.to))
            .all(db_tx)
            .await?;

        let shift_ids: Vec<String> = shift_models.iter().map(|m| m.id.clone()).collect();
        let balance_models: Vec<end_balances::Model> = end_balances::Entity::find()
            .filter(end_balances::Column::ShiftId.is_in(shift_ids))
            .all(db_tx)
            .await?;

        let mut lines_by_shift: HashMap<String, Vec<end_balances::Model>> = HashMap::new();
        for model in balance_models {
            lines_by_shift
                .entry(model.shift_id.clone())
                .or_default()
                .push(model);
        }

        let shifts_closed = shift_models.len() as u64;
        let mut shifts_flagged: u64 = 0;
        let mut by_cashier: HashMap<String, CashierDiscrepancy> = HashMap::new();
        let mut worst_lines: Vec<DiscrepancyLine> = Vec::new();
        let mut unconverted_count: u64 = 0;
        let mut total_abs_discrepancy_report_minor: i64 = 0;
        let mut total_counted_report_minor: i64 = 0;

        for shift_model in &shift_models {
            let cashier_entry = by_cashier
                .entry(shift_model.cashier_id.clone())
                .or_insert(CashierDiscrepancy {
                    cashier_id: shift_model.cashier_id.clone(),
                    shifts_closed: 0,
                    shifts_flagged: 0,
                    total_abs_discrepancy_report_minor: 0,
                });
            cashier_entry.shifts_closed += 1;

            let mut shift_flagged = false;
            let Some(lines) = lines_by_shift.get(&shift_model.id) else {
                continue;
            };
            for model in lines {
                let currency = model_currency(&model.currency)?;
                if filter.currency.is_some_and(|c| c != currency) {
                    continue;
                }

                let (counted_report, _) = rate_cache
                    .to_report_minor(db_tx, model.counted_minor, currency)
                    .await?;
                total_counted_report_minor += counted_report;

                let (magnitude_report, converted) = rate_cache
                    .to_report_minor(db_tx, model.discrepancy_minor.abs(), currency)
                    .await?;
                total_abs_discrepancy_report_minor += magnitude_report;
                if !converted {
                    unconverted_count += 1;
                }

                let flagged = self.is_flagged(model.discrepancy_minor);
                if !flagged {
                    continue;
                }
                shift_flagged = true;

                if let Some(entry) = by_cashier.get_mut(&shift_model.cashier_id) {
                    entry.total_abs_discrepancy_report_minor += magnitude_report;
                }

                worst_lines.push(DiscrepancyLine {
                    shift_id: parse_uuid(&shift_model.id, "shift")?,
                    drawer_name: scope
                        .get(&shift_model.drawer_id)
                        .cloned()
                        .unwrap_or_default(),
                    cashier_id: shift_model.cashier_id.clone(),
                    currency,
                    discrepancy_minor: model.discrepancy_minor,
                    magnitude_report_minor: magnitude_report,
                    reason: model.reason.clone(),
                });
            }

            if shift_flagged {
                shifts_flagged += 1;
                if let Some(entry) = by_cashier.get_mut(&shift_model.cashier_id) {
                    entry.shifts_flagged += 1;
                }
            }
        }

        worst_lines.sort_by(|a, b| b.magnitude_report_minor.cmp(&a.magnitude_report_minor));

        let mut by_cashier: Vec<CashierDiscrepancy> = by_cashier.into_values().collect();
        by_cashier.sort_by(|a, b| {
            b.flagged_rate()
                .partial_cmp(&a.flagged_rate())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.total_abs_discrepancy_report_minor
                        .cmp(&a.total_abs_discrepancy_report_minor)
                })
                .then_with(|| a.cashier_id.cmp(&b.cashier_id))
        });

        let flagged_rate = if shifts_closed == 0 {
            0.0
        } else {
            shifts_flagged as f64 / shifts_closed as f64
        };

        Ok(DiscrepancyComputation {
            report: DiscrepancyReport {
                range,
                report_currency,
                shifts_closed,
                shifts_flagged,
                flagged_rate,
                by_cashier,
                worst_lines,
                unconverted_count,
            },
            total_abs_discrepancy_report_minor,
            total_counted_report_minor,
        })
    }
}
