use crate::analytics::period::{add, percent_change, to_f64, PeriodTotals};
use crate::model::{Account, Transaction};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a metric compared to the previous period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

serde_plain::derive_display_from_serialize!(Trend);

/// A headline metric: its current value and the percent change from the previous period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub value: f64,
    pub change: f64,
    pub trend: Trend,
}

/// The dashboard's headline metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub revenue: Kpi,
    pub expenses: Kpi,
    pub net_profit: Kpi,
    pub active_accounts: Kpi,
    /// Sum of every account balance, negative balances included.
    pub total_balance: f64,
}

/// Computes the headline metrics for the month ending at `now` against the month before it.
///
/// Transfers and transactions without a parseable date are ignored. Revenue and net profit trend
/// up when they did not shrink, expenses trend down when they did not grow.
pub fn kpi_summary(
    transactions: &[Transaction],
    accounts: &[Account],
    now: DateTime<Utc>,
) -> KpiSummary {
    let totals = PeriodTotals::compute(transactions, now, 1);

    let revenue = Kpi {
        value: to_f64(totals.current_revenue),
        change: to_f64(percent_change(totals.current_revenue, totals.previous_revenue)),
        trend: up_unless_lower(totals.current_revenue, totals.previous_revenue),
    };

    let expenses = Kpi {
        value: to_f64(totals.current_expenses),
        change: to_f64(percent_change(
            totals.current_expenses,
            totals.previous_expenses,
        )),
        trend: if totals.current_expenses <= totals.previous_expenses {
            Trend::Down
        } else {
            Trend::Up
        },
    };

    let (current_net, previous_net) = (totals.current_net(), totals.previous_net());
    let net_profit = Kpi {
        value: to_f64(current_net),
        change: to_f64(percent_change(current_net, previous_net)),
        trend: up_unless_lower(current_net, previous_net),
    };

    let active = accounts.iter().filter(|account| account.is_active).count();
    let active_accounts = Kpi {
        value: active as f64,
        change: 0.0,
        trend: Trend::Up,
    };

    let mut total_balance = Decimal::ZERO;
    for account in accounts {
        add(&mut total_balance, account.balance.value());
    }

    KpiSummary {
        revenue,
        expenses,
        net_profit,
        active_accounts,
        total_balance: to_f64(total_balance),
    }
}

fn up_unless_lower(current: Decimal, previous: Decimal) -> Trend {
    if current >= previous {
        Trend::Up
    } else {
        Trend::Down
    }
}
