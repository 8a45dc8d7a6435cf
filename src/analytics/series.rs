//! Monthly revenue, expense and cashflow series.
//!
//! Every series is a fold over the transactions in the order given. A month gets a bucket the
//! first time a transaction from that month is seen, so pre-sorting the input by date ascending
//! yields chronological buckets. Only the trailing `window` buckets are returned.

use crate::analytics::period::{add, scale, to_f64, MonthKey};
use crate::analytics::Ratios;
use crate::model::{Transaction, TransactionType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

/// One month of income with its stretch target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenuePoint {
    pub month: String,
    pub year: i32,
    pub month_number: u32,
    pub revenue: f64,
    pub target: f64,
}

/// One month of spending against its budget figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpensePoint {
    pub month: String,
    pub year: i32,
    pub month_number: u32,
    pub expenses: f64,
    pub budget: f64,
}

/// One month of money in and out. Transfers count toward neither side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowPoint {
    pub month: String,
    pub year: i32,
    pub month_number: u32,
    pub inflow: f64,
    pub outflow: f64,
    pub net: f64,
}

/// Monthly income with `target = revenue * 1.1`.
pub fn revenue_series(transactions: &[Transaction], window: usize) -> Vec<RevenuePoint> {
    revenue_series_with(transactions, window, &Ratios::default())
}

/// Monthly income with `target = revenue * ratios.target_ratio`.
pub fn revenue_series_with(
    transactions: &[Transaction],
    window: usize,
    ratios: &Ratios,
) -> Vec<RevenuePoint> {
    let mut fold = MonthlyFold::<Decimal>::default();
    for txn in of_kind(transactions, TransactionType::Income) {
        if let Some(bucket) = fold.bucket_for(txn) {
            add(bucket, txn.amount.non_negative());
        }
    }
    fold.into_trailing(window)
        .into_iter()
        .map(|(key, month, revenue)| RevenuePoint {
            month,
            year: key.year,
            month_number: key.month,
            revenue: to_f64(revenue),
            target: to_f64(scale(revenue, ratios.target_ratio)),
        })
        .collect()
}

/// Monthly spending with `budget = expenses * 1.2`.
pub fn expense_series(transactions: &[Transaction], window: usize) -> Vec<ExpensePoint> {
    expense_series_with(transactions, window, &Ratios::default())
}

#[derive(Debug, Default, Clone, Copy)]
struct ExpenseTotals {
    expenses: Decimal,
    budget: Decimal,
}

/// Monthly spending with `budget = expenses * ratios.budget_ratio`.
pub fn expense_series_with(
    transactions: &[Transaction],
    window: usize,
    ratios: &Ratios,
) -> Vec<ExpensePoint> {
    let mut fold = MonthlyFold::<ExpenseTotals>::default();
    for txn in of_kind(transactions, TransactionType::Expense) {
        if let Some(bucket) = fold.bucket_for(txn) {
            add(&mut bucket.expenses, txn.amount.non_negative());
            // budget is derived from the running total, never accumulated
            bucket.budget = scale(bucket.expenses, ratios.budget_ratio);
        }
    }
    fold.into_trailing(window)
        .into_iter()
        .map(|(key, month, totals)| ExpensePoint {
            month,
            year: key.year,
            month_number: key.month,
            expenses: to_f64(totals.expenses),
            budget: to_f64(totals.budget),
        })
        .collect()
}

#[derive(Debug, Default, Clone, Copy)]
struct CashflowTotals {
    inflow: Decimal,
    outflow: Decimal,
}

/// Monthly inflow (income), outflow (expenses) and `net = inflow - outflow`.
pub fn cashflow_series(transactions: &[Transaction], window: usize) -> Vec<CashflowPoint> {
    let mut fold = MonthlyFold::<CashflowTotals>::default();
    for txn in transactions {
        let Some(bucket) = fold.bucket_for(txn) else {
            continue;
        };
        match txn.kind {
            TransactionType::Income => add(&mut bucket.inflow, txn.amount.non_negative()),
            TransactionType::Expense => add(&mut bucket.outflow, txn.amount.non_negative()),
            TransactionType::Transfer => {}
        }
    }
    fold.into_trailing(window)
        .into_iter()
        .map(|(key, month, totals)| {
            let inflow = to_f64(totals.inflow);
            let outflow = to_f64(totals.outflow);
            CashflowPoint {
                month,
                year: key.year,
                month_number: key.month,
                inflow,
                outflow,
                net: inflow - outflow,
            }
        })
        .collect()
}

fn of_kind(
    transactions: &[Transaction],
    kind: TransactionType,
) -> impl Iterator<Item = &Transaction> {
    transactions.iter().filter(move |txn| txn.kind == kind)
}

/// Month buckets in first-seen order.
struct MonthlyFold<T> {
    buckets: Vec<(MonthKey, T)>,
    index: HashMap<MonthKey, usize>,
}

impl<T> Default for MonthlyFold<T> {
    fn default() -> Self {
        Self {
            buckets: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Default> MonthlyFold<T> {
    /// Returns the bucket for the transaction's month, creating it if needed. Transactions without
    /// a parseable date have no bucket.
    fn bucket_for(&mut self, txn: &Transaction) -> Option<&mut T> {
        let Some(date) = txn.parsed_date() else {
            trace!(
                "Transaction '{}' has no parseable date ({:?}), leaving it out of the series",
                txn.id,
                txn.date
            );
            return None;
        };
        let key = MonthKey::of(&date);
        let ix = match self.index.get(&key) {
            Some(&ix) => ix,
            None => {
                self.buckets.push((key, T::default()));
                let ix = self.buckets.len() - 1;
                self.index.insert(key, ix);
                ix
            }
        };
        self.buckets.get_mut(ix).map(|(_, value)| value)
    }

    /// Keeps the last `window` buckets and labels them. Labels carry the year only when the kept
    /// buckets span more than one year.
    fn into_trailing(self, window: usize) -> Vec<(MonthKey, String, T)> {
        let skip = self.buckets.len().saturating_sub(window);
        let kept: Vec<(MonthKey, T)> = self.buckets.into_iter().skip(skip).collect();
        let with_year = kept
            .first()
            .map(|(first, _)| kept.iter().any(|(key, _)| key.year != first.year))
            .unwrap_or(false);
        kept.into_iter()
            .map(|(key, value)| (key, key.label(with_year), value))
            .collect()
    }
}
