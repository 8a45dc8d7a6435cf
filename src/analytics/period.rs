//! Calendar helpers shared by the aggregates: trailing-period bounds, month keys and the
//! zero-safe arithmetic used for percentages.

use crate::model::{Transaction, TransactionDate, TransactionType};
use chrono::{DateTime, Months, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::trace;

/// Returns `now` minus `months` calendar months. The day of month is clamped to the end of the
/// target month, so March 31 minus one month is the last day of February.
pub(crate) fn months_before(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Which trailing period an instant falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Period {
    Current,
    Previous,
}

/// Two back-to-back trailing periods ending at `now`:
/// - current: `[now - length, ..)`
/// - previous: `[now - 2 * length, now - length)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TrailingPeriods {
    current_start: DateTime<Utc>,
    previous_start: DateTime<Utc>,
}

impl TrailingPeriods {
    pub(crate) fn new(now: DateTime<Utc>, length_in_months: u32) -> Self {
        Self {
            current_start: months_before(now, length_in_months),
            previous_start: months_before(now, length_in_months.saturating_mul(2)),
        }
    }

    pub(crate) fn classify(&self, instant: DateTime<Utc>) -> Option<Period> {
        if instant >= self.current_start {
            Some(Period::Current)
        } else if instant >= self.previous_start {
            Some(Period::Previous)
        } else {
            None
        }
    }
}

/// Income and expense totals for a pair of trailing periods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PeriodTotals {
    pub(crate) current_revenue: Decimal,
    pub(crate) current_expenses: Decimal,
    pub(crate) previous_revenue: Decimal,
    pub(crate) previous_expenses: Decimal,
}

impl PeriodTotals {
    pub(crate) fn compute(
        transactions: &[Transaction],
        now: DateTime<Utc>,
        length_in_months: u32,
    ) -> Self {
        let periods = TrailingPeriods::new(now, length_in_months);
        let mut totals = PeriodTotals::default();
        for txn in transactions {
            let Some(date) = txn.parsed_date() else {
                trace!("Skipping undated transaction '{}' in period totals", txn.id);
                continue;
            };
            let Some(period) = periods.classify(date.instant()) else {
                continue;
            };
            let amount = txn.amount.non_negative();
            let slot = match (txn.kind, period) {
                (TransactionType::Income, Period::Current) => &mut totals.current_revenue,
                (TransactionType::Income, Period::Previous) => &mut totals.previous_revenue,
                (TransactionType::Expense, Period::Current) => &mut totals.current_expenses,
                (TransactionType::Expense, Period::Previous) => &mut totals.previous_expenses,
                (TransactionType::Transfer, _) => continue,
            };
            add(slot, amount);
        }
        totals
    }

    pub(crate) fn current_net(&self) -> Decimal {
        self.current_revenue - self.current_expenses
    }

    pub(crate) fn previous_net(&self) -> Decimal {
        self.previous_revenue - self.previous_expenses
    }
}

/// `(current - previous) / previous * 100`, or zero when `previous` is not positive.
pub(crate) fn percent_change(current: Decimal, previous: Decimal) -> Decimal {
    if previous <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (current - previous)
        .checked_div(previous)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// `part / whole * 100`, or zero when `whole` is zero.
pub(crate) fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// Adds `amount` to `total`, saturating instead of panicking on overflow.
pub(crate) fn add(total: &mut Decimal, amount: Decimal) {
    *total = total.checked_add(amount).unwrap_or(Decimal::MAX);
}

/// Multiplies, saturating on overflow.
pub(crate) fn scale(value: Decimal, ratio: Decimal) -> Decimal {
    value.checked_mul(ratio).unwrap_or(Decimal::MAX)
}

pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A calendar month, the grouping key for the monthly series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct MonthKey {
    pub(crate) year: i32,
    /// 1 through 12.
    pub(crate) month: u32,
}

impl MonthKey {
    pub(crate) fn of(date: &TransactionDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub(crate) fn label(&self, with_year: bool) -> String {
        let name = MONTH_ABBREVIATIONS
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("???");
        if with_year {
            format!("{name} {}", self.year)
        } else {
            name.to_string()
        }
    }
}
