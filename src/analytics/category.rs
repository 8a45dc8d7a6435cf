//! Expense-by-category breakdown.

use crate::analytics::period::{add, percent_of, to_f64};
use crate::model::{Transaction, TransactionType};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One category's share of total spending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySlice {
    pub category: String,
    pub amount: f64,
    /// Share of all expenses, not just of the returned slices, rounded down to two decimals.
    pub percentage: f64,
}

/// Groups expenses by category and returns the `top_k` largest, biggest first.
///
/// Missing or blank categories are grouped under `"Uncategorized"`. Dates are irrelevant here, so
/// undated expenses are included. Ties keep the order in which categories were first seen.
///
/// Percentages never add up to more than 100. When the returned slices cover all spending the last
/// one takes the rounding remainder so that they add up to exactly 100.
pub fn category_breakdown(transactions: &[Transaction], top_k: usize) -> Vec<CategorySlice> {
    let mut totals: Vec<(&str, Decimal)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut total = Decimal::ZERO;

    for txn in transactions
        .iter()
        .filter(|txn| txn.kind == TransactionType::Expense)
    {
        let category = txn.category_or_default();
        let amount = txn.amount.non_negative();
        let ix = *index.entry(category).or_insert_with(|| {
            totals.push((category, Decimal::ZERO));
            totals.len() - 1
        });
        if let Some((_, sum)) = totals.get_mut(ix) {
            add(sum, amount);
        }
        add(&mut total, amount);
    }

    totals.sort_by(|a, b| b.1.cmp(&a.1));
    totals.truncate(top_k);

    let mut covered = Decimal::ZERO;
    for (_, amount) in &totals {
        add(&mut covered, *amount);
    }
    let complete = total > Decimal::ZERO && covered == total;
    let last = totals.len().saturating_sub(1);

    let mut assigned = 0.0;
    totals
        .into_iter()
        .enumerate()
        .map(|(ix, (category, amount))| {
            let percentage = if complete && ix == last {
                100.0 - assigned
            } else {
                to_f64(
                    percent_of(amount, total).round_dp_with_strategy(2, RoundingStrategy::ToZero),
                )
            };
            assigned += percentage;
            CategorySlice {
                category: category.to_string(),
                amount: to_f64(amount),
                percentage,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::tests::txn;
    use crate::model::UNCATEGORIZED;

    #[test]
    fn test_breakdown_scenario() {
        let txns = vec![
            txn(TransactionType::Expense, "30", None, Some("Food")),
            txn(TransactionType::Expense, "10", None, None),
        ];
        let breakdown = category_breakdown(&txns, 6);
        assert_eq!(
            breakdown,
            vec![
                CategorySlice {
                    category: "Food".to_string(),
                    amount: 30.0,
                    percentage: 75.0,
                },
                CategorySlice {
                    category: UNCATEGORIZED.to_string(),
                    amount: 10.0,
                    percentage: 25.0,
                },
            ]
        );
    }

    #[test]
    fn test_only_expenses_count() {
        let txns = vec![
            txn(TransactionType::Expense, "50", Some("2024-01-01"), Some("Rent")),
            txn(TransactionType::Income, "500", Some("2024-01-01"), Some("Rent")),
            txn(TransactionType::Transfer, "70", Some("2024-01-01"), Some("Savings")),
        ];
        let breakdown = category_breakdown(&txns, 6);
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].amount, 50.0);
        assert_eq!(breakdown[0].percentage, 100.0);
    }

    #[test]
    fn test_top_k_truncates_and_percentages_stay_below_100() {
        let txns = vec![
            txn(TransactionType::Expense, "40", None, Some("A")),
            txn(TransactionType::Expense, "30", None, Some("B")),
            txn(TransactionType::Expense, "20", None, Some("C")),
            txn(TransactionType::Expense, "10", None, Some("D")),
        ];
        let top = category_breakdown(&txns, 2);
        let names: Vec<&str> = top.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        let sum: f64 = top.iter().map(|s| s.percentage).sum();
        assert_eq!(sum, 70.0);

        let all = category_breakdown(&txns, 10);
        let sum: f64 = all.iter().map(|s| s.percentage).sum();
        assert_eq!(sum, 100.0);
    }

    #[test]
    fn test_equal_shares_never_exceed_100() {
        for n in 1..=20 {
            let txns: Vec<Transaction> = (0..n)
                .map(|i| {
                    let category = format!("C{i}");
                    txn(TransactionType::Expense, "1", None, Some(category.as_str()))
                })
                .collect();

            let all = category_breakdown(&txns, 6.max(n));
            let sum: f64 = all.iter().map(|s| s.percentage).sum();
            assert_eq!(sum, 100.0, "{n} categories");

            for top_k in 1..n {
                let top = category_breakdown(&txns, top_k);
                let sum: f64 = top.iter().map(|s| s.percentage).sum();
                assert!(sum < 100.0, "{n} categories, top {top_k}: {sum}");
            }
        }
    }

    #[test]
    fn test_thirds_round_down_and_last_takes_remainder() {
        let txns = vec![
            txn(TransactionType::Expense, "1", None, Some("A")),
            txn(TransactionType::Expense, "1", None, Some("B")),
            txn(TransactionType::Expense, "1", None, Some("C")),
        ];
        let breakdown = category_breakdown(&txns, 6);
        assert_eq!(breakdown[0].percentage, 33.33);
        assert_eq!(breakdown[1].percentage, 33.33);
        assert_eq!(breakdown[2].percentage, 100.0 - (33.33 + 33.33));
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let txns = vec![
            txn(TransactionType::Expense, "5", None, Some("Small")),
            txn(TransactionType::Expense, "20", None, Some("Tie1")),
            txn(TransactionType::Expense, "20", None, Some("Tie2")),
            txn(TransactionType::Expense, "15", None, Some("Small")),
        ];
        let breakdown = category_breakdown(&txns, 6);
        let names: Vec<&str> = breakdown.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, vec!["Small", "Tie1", "Tie2"]);
    }

    #[test]
    fn test_zero_total_has_zero_percentages() {
        let txns = vec![
            txn(TransactionType::Expense, "0", None, Some("Food")),
            txn(TransactionType::Expense, "junk", None, Some("Fuel")),
        ];
        let breakdown = category_breakdown(&txns, 6);
        assert_eq!(breakdown.len(), 2);
        assert!(breakdown.iter().all(|s| s.percentage == 0.0));
    }

    #[test]
    fn test_empty() {
        assert!(category_breakdown(&[], 6).is_empty());
    }
}
