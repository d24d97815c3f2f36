//! Lifetime totals and profit margin.

use serde::Serialize;

use crate::{
    reporting::percentage_of,
    transaction::{TransactionRecord, TransactionType},
};

/// Income, expenses and profit over every transaction given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    /// Sum of all income amounts.
    pub total_income: f64,
    /// Sum of all expense amounts.
    pub total_expense: f64,
    /// Income minus expenses, may be negative.
    pub net_profit: f64,
    /// Net profit as a percentage of income, zero when there is no income.
    pub profit_margin_pct: f64,
}

/// Sum income and expenses and derive the profit margin.
///
/// An empty slice gives all zeros.
pub fn compute_totals(transactions: &[TransactionRecord]) -> Totals {
    let (total_income, total_expense) =
        transactions
            .iter()
            .fold((0.0, 0.0), |(income, expense), transaction| {
                match transaction.transaction_type {
                    TransactionType::Income => (income + transaction.amount, expense),
                    TransactionType::Expense => (income, expense + transaction.amount),
                }
            });

    let net_profit = total_income - total_expense;

    Totals {
        total_income,
        total_expense,
        net_profit,
        profit_margin_pct: percentage_of(net_profit, total_income),
    }
}

/// How healthy a profit margin is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginHealth {
    /// Below 20%.
    Low,
    /// From 20% up to 30%.
    Fair,
    /// 30% or more.
    Strong,
}

impl MarginHealth {
    /// Classify a profit margin given as a percentage.
    pub fn classify(profit_margin_pct: f64) -> Self {
        if profit_margin_pct < 20.0 {
            Self::Low
        } else if profit_margin_pct < 30.0 {
            Self::Fair
        } else {
            Self::Strong
        }
    }

    /// A one sentence comment on the margin for the user.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Low => "Your expenses are high. Try cutting your fixed costs.",
            Self::Fair => "Your margin is reasonable, but keep an eye on your expenses.",
            Self::Strong => "Excellent margin, keep optimising your revenue.",
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::{
        reporting::test_utils::{expense, income, record},
        transaction::TransactionType,
    };

    use super::{MarginHealth, Totals, compute_totals};

    #[test]
    fn empty_input_gives_zeros() {
        assert_eq!(compute_totals(&[]), Totals::default());
    }

    #[test]
    fn sums_income_and_expenses() {
        let transactions = [
            income(100.0, datetime!(2024-01-15 00:00)),
            expense(40.0, datetime!(2024-01-20 00:00)),
        ];

        let got = compute_totals(&transactions);

        assert_eq!(
            got,
            Totals {
                total_income: 100.0,
                total_expense: 40.0,
                net_profit: 60.0,
                profit_margin_pct: 60.0,
            }
        );
    }

    #[test]
    fn missing_type_counts_as_income() {
        let transactions = [record(
            25.0,
            TransactionType::parse_lenient(None),
            datetime!(2024-01-15 00:00),
        )];

        let got = compute_totals(&transactions);

        assert_eq!(got.total_income, 25.0);
        assert_eq!(got.total_expense, 0.0);
    }

    #[test]
    fn profit_can_be_negative() {
        let transactions = [
            income(50.0, datetime!(2024-01-15 00:00)),
            expense(80.0, datetime!(2024-01-20 00:00)),
        ];

        let got = compute_totals(&transactions);

        assert_eq!(got.net_profit, got.total_income - got.total_expense);
        assert_eq!(got.net_profit, -30.0);
        assert_eq!(got.profit_margin_pct, -60.0);
    }

    #[test]
    fn margin_is_zero_without_income() {
        let transactions = [expense(80.0, datetime!(2024-01-20 00:00))];

        let got = compute_totals(&transactions);

        assert_eq!(got.net_profit, -80.0);
        assert_eq!(got.profit_margin_pct, 0.0);
    }

    #[test]
    fn order_does_not_change_totals() {
        let mut transactions = vec![
            income(100.0, datetime!(2024-01-15 00:00)),
            expense(40.0, datetime!(2024-01-20 00:00)),
            income(12.5, datetime!(2023-06-01 00:00)),
        ];
        let want = compute_totals(&transactions);

        transactions.reverse();

        assert_eq!(compute_totals(&transactions), want);
        assert_eq!(compute_totals(&transactions), want);
    }

    #[test]
    fn classifies_margin() {
        assert_eq!(MarginHealth::classify(-5.0), MarginHealth::Low);
        assert_eq!(MarginHealth::classify(19.9), MarginHealth::Low);
        assert_eq!(MarginHealth::classify(20.0), MarginHealth::Fair);
        assert_eq!(MarginHealth::classify(29.9), MarginHealth::Fair);
        assert_eq!(MarginHealth::classify(30.0), MarginHealth::Strong);
    }
}
