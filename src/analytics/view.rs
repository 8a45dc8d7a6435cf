//! Filtering and ordering for the transaction list, plus the row shape used by tables.

use crate::model::{Transaction, TransactionType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Restricts the list to one transaction type, or lets everything through.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFilter {
    #[default]
    All,
    Only(TransactionType),
}

impl From<Option<TransactionType>> for TypeFilter {
    fn from(value: Option<TransactionType>) -> Self {
        value.map(TypeFilter::Only).unwrap_or_default()
    }
}

/// The list view's filter. Every dimension is optional and they are AND-ed together. Empty
/// strings are treated the same as `None`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct TransactionFilter {
    /// Matches when the account is on either side of the transaction.
    pub account_id: Option<String>,
    pub kind: TypeFilter,
    /// Case-insensitive substring of the description or the category.
    pub search: Option<String>,
    /// Inclusive, compared against the transaction's own calendar date.
    pub since: Option<NaiveDate>,
    /// Inclusive.
    pub until: Option<NaiveDate>,
}

impl TransactionFilter {
    pub fn matches(&self, txn: &Transaction) -> bool {
        if let Some(account_id) = non_empty(self.account_id.as_deref()) {
            if !txn.involves_account(account_id) {
                return false;
            }
        }
        if let TypeFilter::Only(kind) = self.kind {
            if txn.kind != kind {
                return false;
            }
        }
        if let Some(needle) = non_empty(self.search.as_deref()) {
            let needle = needle.to_lowercase();
            let hit = |field: Option<&str>| {
                field
                    .map(|value| value.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            };
            if !hit(txn.description.as_deref()) && !hit(txn.category.as_deref()) {
                return false;
            }
        }
        if self.since.is_some() || self.until.is_some() {
            let Some(date) = txn.parsed_date().map(|d| d.local_date()) else {
                return false;
            };
            if self.since.is_some_and(|since| date < since) {
                return false;
            }
            if self.until.is_some_and(|until| date > until) {
                return false;
            }
        }
        true
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Returns the matching transactions, newest first. The sort is stable and transactions without
/// a parseable date go last.
pub fn filter_and_sort(transactions: &[Transaction], filter: &TransactionFilter) -> Vec<Transaction> {
    let mut keyed: Vec<(Option<DateTime<Utc>>, &Transaction)> = transactions
        .iter()
        .filter(|txn| filter.matches(txn))
        .map(|txn| (txn.parsed_date().map(|d| d.instant()), txn))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| newest_first(a, b));
    keyed.into_iter().map(|(_, txn)| txn.clone()).collect()
}

fn newest_first(a: &Option<DateTime<Utc>>, b: &Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Whether money came in or went out. Transfers show as `expense`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(Direction);

impl From<TransactionType> for Direction {
    fn from(kind: TransactionType) -> Self {
        match kind {
            TransactionType::Income => Direction::Income,
            TransactionType::Expense | TransactionType::Transfer => Direction::Expense,
        }
    }
}

/// A display-ready transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: String,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub direction: Direction,
    pub date: Option<String>,
}

impl From<&Transaction> for TransactionRow {
    fn from(txn: &Transaction) -> Self {
        Self {
            id: txn.id.clone(),
            description: txn.description_or_default(),
            category: txn.category_or_default().to_string(),
            amount: txn.amount.to_f64(),
            direction: txn.kind.into(),
            date: txn.date.clone(),
        }
    }
}

/// Formats the first `limit` transactions, in the order given.
pub fn transaction_rows(transactions: &[Transaction], limit: usize) -> Vec<TransactionRow> {
    transactions
        .iter()
        .take(limit)
        .map(TransactionRow::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::tests::txn;

    fn ids(txns: &[Transaction]) -> Vec<&str> {
        txns.iter().map(|t| t.id.as_str()).collect()
    }

    fn sample() -> Vec<Transaction> {
        let mut a = txn(TransactionType::Income, "100", Some("2024-01-15"), Some("Sales"));
        a.id = "a".to_string();
        a.to_account_id = Some("acct-1".to_string());
        let mut b = txn(TransactionType::Expense, "40", Some("2024-03-01"), Some("Office"));
        b.id = "b".to_string();
        b.description = Some("Printer PAPER".to_string());
        b.from_account_id = Some("acct-1".to_string());
        let mut c = txn(TransactionType::Income, "10", None, None);
        c.id = "c".to_string();
        let mut d = txn(TransactionType::Income, "5", Some("2024-02-10T08:00:00Z"), None);
        d.id = "d".to_string();
        d.from_account_id = Some("acct-2".to_string());
        vec![a, b, c, d]
    }

    #[test]
    fn test_no_filter_sorts_newest_first_undated_last() {
        let out = filter_and_sort(&sample(), &TransactionFilter::default());
        assert_eq!(ids(&out), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_income_only() {
        let filter = TransactionFilter {
            kind: TypeFilter::Only(TransactionType::Income),
            ..Default::default()
        };
        let out = filter_and_sort(&sample(), &filter);
        assert!(out.iter().all(|t| t.kind == TransactionType::Income));
        assert_eq!(ids(&out), vec!["d", "a", "c"]);
    }

    #[test]
    fn test_account_matches_either_side() {
        let filter = TransactionFilter {
            account_id: Some("acct-1".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&sample(), &filter)), vec!["b", "a"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_description_and_category() {
        let filter = TransactionFilter {
            search: Some("paper".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&sample(), &filter)), vec!["b"]);

        let filter = TransactionFilter {
            search: Some("SAL".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&sample(), &filter)), vec!["a"]);
    }

    #[test]
    fn test_empty_strings_match_everything() {
        let filter = TransactionFilter {
            account_id: Some(String::new()),
            search: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(filter_and_sort(&sample(), &filter).len(), 4);
    }

    #[test]
    fn test_date_range_is_inclusive_and_drops_undated() {
        let filter = TransactionFilter {
            since: NaiveDate::from_ymd_opt(2024, 1, 15),
            until: NaiveDate::from_ymd_opt(2024, 2, 10),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&sample(), &filter)), vec!["d", "a"]);
    }

    #[test]
    fn test_filters_compose() {
        let filter = TransactionFilter {
            kind: TypeFilter::Only(TransactionType::Expense),
            account_id: Some("acct-2".to_string()),
            ..Default::default()
        };
        assert!(filter_and_sort(&sample(), &filter).is_empty());
    }

    #[test]
    fn test_stable_for_equal_dates() {
        let mut first = txn(TransactionType::Expense, "1", Some("2024-01-01"), None);
        first.id = "first".to_string();
        let mut second = txn(TransactionType::Expense, "2", Some("2024-01-01"), None);
        second.id = "second".to_string();
        let out = filter_and_sort(&[first, second], &TransactionFilter::default());
        assert_eq!(ids(&out), vec!["first", "second"]);
    }

    #[test]
    fn test_rows() {
        let rows = transaction_rows(&sample(), 3);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].direction, Direction::Income);
        assert_eq!(rows[1].description, "Printer PAPER");
        assert_eq!(rows[1].direction, Direction::Expense);
        assert_eq!(rows[2].description, "INCOME Transaction");
        assert_eq!(rows[2].category, "Uncategorized");
        assert_eq!(rows[2].date, None);
        assert_eq!(Direction::Income.to_string(), "income");
    }

    #[test]
    fn test_transfer_rows_show_as_expense() {
        let row = TransactionRow::from(&txn(TransactionType::Transfer, "7", None, None));
        assert_eq!(row.direction, Direction::Expense);
        assert_eq!(row.amount, 7.0);
    }
}
