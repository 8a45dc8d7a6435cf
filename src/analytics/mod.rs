//! Pure aggregation over fetched transactions and accounts: headline KPIs, monthly series,
//! category breakdowns and the filtered transaction list.
//!
//! Nothing in here performs I/O or fails. Malformed amounts count as zero, transactions without a
//! parseable date are left out of anything bucketed by time, and every division by zero yields 0.

mod category;
mod kpi;
mod memo;
mod period;
mod report;
mod series;
mod view;

pub use category::{category_breakdown, CategorySlice};
pub use kpi::{kpi_summary, Kpi, KpiSummary, Trend};
pub use memo::Memo;
pub use report::{report_summary, Change, ReportSummary};
pub use series::{
    cashflow_series, expense_series, expense_series_with, revenue_series, revenue_series_with,
    CashflowPoint, ExpensePoint, RevenuePoint,
};
pub use view::{
    filter_and_sort, transaction_rows, Direction, TransactionFilter, TransactionRow, TypeFilter,
};

use crate::model::{Snapshot, Transaction};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Multipliers for the chart reference lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratios {
    /// Revenue target as a multiple of actual revenue.
    pub target_ratio: Decimal,
    /// Expense budget as a multiple of actual expenses.
    pub budget_ratio: Decimal,
}

impl Default for Ratios {
    fn default() -> Self {
        Self {
            target_ratio: Decimal::new(11, 1),
            budget_ratio: Decimal::new(12, 1),
        }
    }
}

/// Window sizes and ratios used to build a dashboard or report. Stored under `dashboard` in
/// `config.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub revenue_window: usize,
    pub expense_window: usize,
    pub cashflow_window: usize,
    /// The window for all three series in a report.
    pub report_window: usize,
    pub top_categories: usize,
    pub recent_transactions: usize,
    pub target_ratio: Decimal,
    pub budget_ratio: Decimal,
}

impl Default for Settings {
    fn default() -> Self {
        let ratios = Ratios::default();
        Self {
            revenue_window: 6,
            expense_window: 6,
            cashflow_window: 12,
            report_window: 12,
            top_categories: 6,
            recent_transactions: 10,
            target_ratio: ratios.target_ratio,
            budget_ratio: ratios.budget_ratio,
        }
    }
}

impl Settings {
    pub fn ratios(&self) -> Ratios {
        Ratios {
            target_ratio: self.target_ratio,
            budget_ratio: self.budget_ratio,
        }
    }
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub kpis: KpiSummary,
    pub revenue: Vec<RevenuePoint>,
    pub expenses: Vec<ExpensePoint>,
    pub cashflow: Vec<CashflowPoint>,
    pub categories: Vec<CategorySlice>,
    pub recent: Vec<TransactionRow>,
}

/// Everything the report page shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub summary: ReportSummary,
    pub revenue: Vec<RevenuePoint>,
    pub expenses: Vec<ExpensePoint>,
    pub cashflow: Vec<CashflowPoint>,
    pub categories: Vec<CategorySlice>,
}

/// Builds complete dashboards and reports with a fixed set of `Settings`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Aggregator {
    settings: Settings,
}

impl Aggregator {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The series are fed in chronological order so that the trailing windows hold the most
    /// recent months, whatever order the backend returned.
    pub fn dashboard(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> Dashboard {
        let s = &self.settings;
        let ratios = s.ratios();
        let chronological = oldest_first(&snapshot.transactions);
        let newest = filter_and_sort(&snapshot.transactions, &TransactionFilter::default());
        debug!(
            "Building dashboard from {} transactions and {} accounts",
            snapshot.transactions.len(),
            snapshot.accounts.len()
        );
        Dashboard {
            kpis: kpi_summary(&snapshot.transactions, &snapshot.accounts, now),
            revenue: revenue_series_with(&chronological, s.revenue_window, &ratios),
            expenses: expense_series_with(&chronological, s.expense_window, &ratios),
            cashflow: cashflow_series(&chronological, s.cashflow_window),
            categories: category_breakdown(&snapshot.transactions, s.top_categories),
            recent: transaction_rows(&newest, s.recent_transactions),
        }
    }

    /// Only transactions that pass `filter` are seen. The summary compares the trailing year
    /// ending at `now` with the year before, within that selection.
    pub fn report(
        &self,
        transactions: &[Transaction],
        filter: &TransactionFilter,
        now: DateTime<Utc>,
    ) -> Report {
        let s = &self.settings;
        let ratios = s.ratios();
        let matching: Vec<Transaction> = transactions
            .iter()
            .filter(|txn| filter.matches(txn))
            .cloned()
            .collect();
        let selected = oldest_first(&matching);
        debug!(
            "Building report from {} of {} transactions",
            selected.len(),
            transactions.len()
        );
        Report {
            summary: report_summary(&matching, now),
            revenue: revenue_series_with(&selected, s.report_window, &ratios),
            expenses: expense_series_with(&selected, s.report_window, &ratios),
            cashflow: cashflow_series(&selected, s.report_window),
            categories: category_breakdown(&selected, s.top_categories),
        }
    }
}

/// Clones the transactions sorted by date ascending, stable, undated last.
fn oldest_first(transactions: &[Transaction]) -> Vec<Transaction> {
    let mut keyed: Vec<_> = transactions
        .iter()
        .map(|txn| (txn.parsed_date().map(|d| d.instant()), txn))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    keyed.into_iter().map(|(_, txn)| txn.clone()).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{Account, Amount, TransactionType};
    use chrono::TimeZone;

    /// A transaction with just the fields the aggregates look at.
    pub(crate) fn txn(
        kind: TransactionType,
        amount: &str,
        date: Option<&str>,
        category: Option<&str>,
    ) -> Transaction {
        Transaction {
            id: format!("{kind}-{amount}-{}", date.unwrap_or("undated")),
            kind,
            amount: Amount::lenient(amount),
            currency: "USD".to_string(),
            date: date.map(str::to_string),
            category: category.map(str::to_string),
            ..Default::default()
        }
    }

    fn snapshot() -> Snapshot {
        let transactions = vec![
            txn(TransactionType::Expense, "40", Some("2024-03-02"), Some("Rent")),
            txn(TransactionType::Income, "200", Some("2024-03-01"), Some("Sales")),
            txn(TransactionType::Income, "100", Some("2024-02-01"), Some("Sales")),
            txn(TransactionType::Expense, "100", Some("2024-01-10"), Some("Food")),
            txn(TransactionType::Income, "50", Some("2023-12-05"), None),
            txn(TransactionType::Expense, "5", None, Some("Misc")),
        ];
        let accounts = vec![Account {
            id: "a1".to_string(),
            is_active: true,
            balance: Amount::lenient("500"),
            ..Default::default()
        }];
        Snapshot::new(transactions, accounts)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_dashboard_series_are_chronological() {
        let dashboard = Aggregator::default().dashboard(&snapshot(), now());
        let months: Vec<&str> = dashboard.revenue.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["Dec 2023", "Feb 2024", "Mar 2024"]);
        assert_eq!(dashboard.revenue[2].target, 220.0);
        assert_eq!(dashboard.expenses[0].budget, 120.0);
        let cashflow: Vec<&str> = dashboard.cashflow.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(cashflow, vec!["Dec 2023", "Jan 2024", "Feb 2024", "Mar 2024"]);
    }

    #[test]
    fn test_dashboard_windows_keep_latest_months() {
        let settings = Settings {
            revenue_window: 1,
            cashflow_window: 2,
            ..Default::default()
        };
        let dashboard = Aggregator::new(settings).dashboard(&snapshot(), now());
        assert_eq!(dashboard.revenue.len(), 1);
        assert_eq!(dashboard.revenue[0].month, "Mar");
        let cashflow: Vec<&str> = dashboard.cashflow.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(cashflow, vec!["Feb", "Mar"]);
    }

    #[test]
    fn test_dashboard_kpis_categories_and_recent() {
        let dashboard = Aggregator::default().dashboard(&snapshot(), now());
        assert_eq!(dashboard.kpis.revenue.value, 200.0);
        assert_eq!(dashboard.kpis.revenue.change, 100.0);
        assert_eq!(dashboard.kpis.active_accounts.value, 1.0);
        assert_eq!(dashboard.categories[0].category, "Food");
        assert_eq!(dashboard.recent.len(), 6);
        assert_eq!(dashboard.recent[0].description, "EXPENSE Transaction");
        assert_eq!(dashboard.recent[0].date.as_deref(), Some("2024-03-02"));
        assert_eq!(dashboard.recent[5].date, None);
    }

    #[test]
    fn test_dashboard_is_idempotent() {
        let aggregator = Aggregator::default();
        let snapshot = snapshot();
        assert_eq!(
            aggregator.dashboard(&snapshot, now()),
            aggregator.dashboard(&snapshot, now())
        );
    }

    #[test]
    fn test_custom_ratios() {
        let settings = Settings {
            target_ratio: Decimal::new(15, 1),
            ..Default::default()
        };
        let dashboard = Aggregator::new(settings).dashboard(&snapshot(), now());
        assert_eq!(dashboard.revenue[2].target, 300.0);
    }

    #[test]
    fn test_report_respects_range() {
        let filter = TransactionFilter {
            since: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        let snapshot = snapshot();
        let report = Aggregator::default().report(&snapshot.transactions, &filter, now());
        let months: Vec<&str> = report.cashflow.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["Jan", "Feb", "Mar"]);
        let categories: Vec<&str> = report.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(categories, vec!["Food", "Rent"]);
        assert_eq!(report.summary.revenue.value, 300.0);
    }

    #[test]
    fn test_report_summary_excludes_out_of_range() {
        let transactions = vec![
            txn(TransactionType::Income, "1000", Some("2024-03-01"), None),
            txn(TransactionType::Income, "500", Some("2024-06-01"), None),
        ];
        let filter = TransactionFilter {
            since: chrono::NaiveDate::from_ymd_opt(2024, 5, 1),
            until: chrono::NaiveDate::from_ymd_opt(2024, 6, 30),
            ..Default::default()
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let report = Aggregator::default().report(&transactions, &filter, now);
        assert_eq!(report.revenue.len(), 1);
        assert_eq!(report.revenue[0].revenue, 500.0);
        assert_eq!(report.summary.revenue.value, 500.0);
        assert_eq!(report.summary.net_profit.value, 500.0);
    }

    #[test]
    fn test_settings_defaults_from_partial_json() {
        let settings: Settings = serde_json::from_str(r#"{"revenue_window": 3}"#).unwrap();
        assert_eq!(settings.revenue_window, 3);
        assert_eq!(settings.cashflow_window, 12);
        assert_eq!(settings.ratios(), Ratios::default());
    }
}
