//! Expense breakdown by category.

use serde::Serialize;

use crate::transaction::TransactionRecord;

/// The total spent in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBucket {
    /// The category name, "Other" for uncategorised expenses.
    pub category: String,
    /// Sum of expense amounts in the category.
    pub total_amount: f64,
}

/// Sum expenses per category.
///
/// Income is not broken out. Buckets come out in the order their category is
/// first seen in `transactions`, use [sorted_by_amount] for display order.
pub fn build_category_breakdown(transactions: &[TransactionRecord]) -> Vec<CategoryBucket> {
    let mut buckets: Vec<CategoryBucket> = Vec::new();

    for transaction in transactions.iter().filter(|t| t.is_expense()) {
        let category = transaction.category_label();

        match buckets.iter_mut().find(|bucket| bucket.category == category) {
            Some(bucket) => bucket.total_amount += transaction.amount,
            None => buckets.push(CategoryBucket {
                category: category.to_owned(),
                total_amount: transaction.amount,
            }),
        }
    }

    buckets
}

/// Sort buckets by amount, largest first, and then by name.
pub fn sorted_by_amount(mut buckets: Vec<CategoryBucket>) -> Vec<CategoryBucket> {
    buckets.sort_by(|a, b| {
        b.total_amount
            .total_cmp(&a.total_amount)
            .then_with(|| a.category.cmp(&b.category))
    });

    buckets
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::{
        reporting::test_utils::{expense, income},
        transaction::TransactionRecord,
    };

    use super::{CategoryBucket, build_category_breakdown, sorted_by_amount};

    fn categorised(record: TransactionRecord, category: &str) -> TransactionRecord {
        TransactionRecord {
            category: Some(category.to_owned()),
            ..record
        }
    }

    #[test]
    fn uncategorised_expense_goes_to_other() {
        let transactions = [
            income(100.0, datetime!(2024-01-15 00:00)),
            expense(40.0, datetime!(2024-01-20 00:00)),
        ];

        let got = build_category_breakdown(&transactions);

        assert_eq!(
            got,
            [CategoryBucket {
                category: "Other".to_owned(),
                total_amount: 40.0,
            }]
        );
    }

    #[test]
    fn groups_expenses_and_skips_income() {
        let date = datetime!(2024-01-20 00:00);
        let transactions = [
            categorised(expense(10.0, date), "Fees"),
            categorised(income(500.0, date), "Ads"),
            categorised(expense(5.0, date), "Refunds"),
            categorised(expense(2.5, date), "Fees"),
            categorised(expense(1.0, date), ""),
        ];

        let got = build_category_breakdown(&transactions);

        assert_eq!(
            got,
            [
                CategoryBucket {
                    category: "Fees".to_owned(),
                    total_amount: 12.5,
                },
                CategoryBucket {
                    category: "Refunds".to_owned(),
                    total_amount: 5.0,
                },
                CategoryBucket {
                    category: "Other".to_owned(),
                    total_amount: 1.0,
                },
            ]
        );
    }

    #[test]
    fn empty_input_gives_no_buckets() {
        assert!(build_category_breakdown(&[]).is_empty());
    }

    #[test]
    fn sorts_largest_first_then_by_name() {
        let buckets = vec![
            CategoryBucket {
                category: "Merch".to_owned(),
                total_amount: 5.0,
            },
            CategoryBucket {
                category: "Fees".to_owned(),
                total_amount: 50.0,
            },
            CategoryBucket {
                category: "Ads".to_owned(),
                total_amount: 5.0,
            },
        ];

        let got: Vec<_> = sorted_by_amount(buckets)
            .into_iter()
            .map(|bucket| bucket.category)
            .collect();

        assert_eq!(got, ["Fees", "Ads", "Merch"]);
    }
}
