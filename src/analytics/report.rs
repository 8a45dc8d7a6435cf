use crate::analytics::period::{percent_change, percent_of, to_f64, PeriodTotals};
use crate::model::Transaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const REPORT_PERIOD_MONTHS: u32 = 12;

/// A value with its change against the previous year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub value: f64,
    pub change: f64,
}

/// Trailing twelve months against the twelve months before.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub revenue: Change,
    pub expenses: Change,
    pub net_profit: Change,
    /// `net / revenue * 100`. Its change is the difference in percentage points.
    pub profit_margin: Change,
}

pub fn report_summary(transactions: &[Transaction], now: DateTime<Utc>) -> ReportSummary {
    let totals = PeriodTotals::compute(transactions, now, REPORT_PERIOD_MONTHS);
    let (current_net, previous_net) = (totals.current_net(), totals.previous_net());
    let current_margin = percent_of(current_net, totals.current_revenue);
    let previous_margin = percent_of(previous_net, totals.previous_revenue);

    ReportSummary {
        revenue: Change {
            value: to_f64(totals.current_revenue),
            change: to_f64(percent_change(
                totals.current_revenue,
                totals.previous_revenue,
            )),
        },
        expenses: Change {
            value: to_f64(totals.current_expenses),
            change: to_f64(percent_change(
                totals.current_expenses,
                totals.previous_expenses,
            )),
        },
        net_profit: Change {
            value: to_f64(current_net),
            change: to_f64(percent_change(current_net, previous_net)),
        },
        profit_margin: Change {
            value: to_f64(current_margin),
            change: to_f64(current_margin - previous_margin),
        },
    }
}
