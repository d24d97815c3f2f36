//! Calendar month arithmetic and the trailing monthly series.

use std::{collections::HashMap, fmt::Display};

use serde::{Serialize, Serializer};
use time::{Date, Month, PrimitiveDateTime};

use crate::transaction::{TransactionRecord, TransactionType};

/// The number of months in the analytics series.
pub const DEFAULT_WINDOW_MONTHS: usize = 12;

/// A calendar month, e.g. January 2024.
///
/// Ordered chronologically. Serializes as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    /// Zero-based, January is 0.
    month0: u8,
}

impl MonthKey {
    /// The month that `date` falls in.
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month0: u8::from(date.month()) - 1,
        }
    }

    /// The year of the month.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month of the year.
    pub fn month(&self) -> Month {
        Month::January.nth_next(self.month0)
    }

    /// The month `months` before this one.
    pub fn minus_months(&self, months: usize) -> Self {
        let index = self.index() - months as i64;

        Self {
            year: index.div_euclid(12) as i32,
            month0: index.rem_euclid(12) as u8,
        }
    }

    /// The month before this one.
    pub fn previous(&self) -> Self {
        self.minus_months(1)
    }

    fn index(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month0)
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month0 + 1)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Formats a month as a three-letter abbreviation, e.g. "Jan".
pub fn format_month_label(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

/// Income and expenses for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBucket {
    /// The month the bucket covers.
    pub month: MonthKey,
    /// Three-letter month name for chart axes.
    pub month_label: String,
    /// Sum of income amounts dated in the month.
    pub income: f64,
    /// Sum of expense amounts dated in the month.
    pub expense: f64,
    /// Income minus expenses.
    pub profit: f64,
}

impl MonthlyBucket {
    fn empty(month: MonthKey) -> Self {
        Self {
            month,
            month_label: format_month_label(month.month()).to_owned(),
            income: 0.0,
            expense: 0.0,
            profit: 0.0,
        }
    }
}

/// Aggregate transactions into one bucket per month for the `window_months`
/// months ending with the month of `reference_now`, oldest first.
///
/// Every month in the window gets a bucket even if it has no transactions.
/// Transactions dated outside the window are ignored.
pub fn build_monthly_series(
    transactions: &[TransactionRecord],
    reference_now: PrimitiveDateTime,
    window_months: usize,
) -> Vec<MonthlyBucket> {
    let current_month = MonthKey::of(reference_now.date());

    let mut buckets: Vec<MonthlyBucket> = (0..window_months)
        .rev()
        .map(|months_ago| MonthlyBucket::empty(current_month.minus_months(months_ago)))
        .collect();

    let positions: HashMap<MonthKey, usize> = buckets
        .iter()
        .enumerate()
        .map(|(position, bucket)| (bucket.month, position))
        .collect();

    for transaction in transactions {
        let Some(&position) = positions.get(&MonthKey::of(transaction.date.date())) else {
            continue;
        };

        let bucket = &mut buckets[position];
        match transaction.transaction_type {
            TransactionType::Income => bucket.income += transaction.amount,
            TransactionType::Expense => bucket.expense += transaction.amount,
        }
    }

    for bucket in &mut buckets {
        bucket.profit = bucket.income - bucket.expense;
    }

    buckets
}

#[cfg(test)]
mod tests {
    use time::{
        Month,
        macros::{date, datetime},
    };

    use crate::reporting::{
        compute_totals,
        test_utils::{expense, income},
    };

    use super::{DEFAULT_WINDOW_MONTHS, MonthKey, build_monthly_series};

    #[test]
    fn month_key_steps_back_across_years() {
        let january = MonthKey::of(date!(2024 - 01 - 31));

        let got = january.minus_months(13);

        assert_eq!(got.year(), 2022);
        assert_eq!(got.month(), Month::December);
        assert_eq!(january.previous().to_string(), "2023-12");
    }

    #[test]
    fn month_keys_order_chronologically() {
        assert!(MonthKey::of(date!(2023 - 12 - 31)) < MonthKey::of(date!(2024 - 01 - 01)));
        assert!(MonthKey::of(date!(2024 - 02 - 01)) > MonthKey::of(date!(2024 - 01 - 31)));
    }

    #[test]
    fn empty_input_gives_full_window_of_zeros() {
        let got = build_monthly_series(&[], datetime!(2024-01-31 00:00), DEFAULT_WINDOW_MONTHS);

        assert_eq!(got.len(), 12);
        assert!(
            got.iter()
                .all(|bucket| bucket.income == 0.0 && bucket.expense == 0.0 && bucket.profit == 0.0)
        );
    }

    #[test]
    fn buckets_are_chronological_and_end_at_current_month() {
        let got = build_monthly_series(&[], datetime!(2024-01-31 00:00), DEFAULT_WINDOW_MONTHS);

        let months: Vec<String> = got.iter().map(|bucket| bucket.month.to_string()).collect();
        assert_eq!(months.first().map(String::as_str), Some("2023-02"));
        assert_eq!(months.last().map(String::as_str), Some("2024-01"));
        assert!(got.windows(2).all(|pair| pair[0].month < pair[1].month));

        let labels: Vec<&str> = got.iter().map(|bucket| bucket.month_label.as_str()).collect();
        assert_eq!(
            labels,
            [
                "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec", "Jan"
            ]
        );
    }

    #[test]
    fn accumulates_by_month_and_type() {
        let transactions = [
            income(100.0, datetime!(2024-01-15 00:00)),
            expense(40.0, datetime!(2024-01-20 00:00)),
            income(30.0, datetime!(2023-12-01 00:00)),
            income(20.0, datetime!(2023-12-31 23:59)),
        ];

        let got = build_monthly_series(&transactions, datetime!(2024-01-31 00:00), 12);

        let january = &got[11];
        assert_eq!(january.income, 100.0);
        assert_eq!(january.expense, 40.0);
        assert_eq!(january.profit, 60.0);

        let december = &got[10];
        assert_eq!(december.income, 50.0);
        assert_eq!(december.expense, 0.0);
        assert_eq!(december.profit, 50.0);
    }

    #[test]
    fn ignores_transactions_outside_window() {
        let transactions = [
            income(100.0, datetime!(2024-01-15 00:00)),
            income(999.0, datetime!(2023-01-31 00:00)),
            income(555.0, datetime!(2024-02-01 00:00)),
        ];

        let got = build_monthly_series(&transactions, datetime!(2024-01-31 00:00), 12);

        let windowed_income: f64 = got.iter().map(|bucket| bucket.income).sum();
        assert_eq!(windowed_income, 100.0);
        // Lifetime totals still see everything.
        assert_eq!(compute_totals(&transactions).total_income, 1654.0);
    }

    #[test]
    fn windowed_income_matches_totals_of_transactions_in_window() {
        let transactions: Vec<_> = (0..24)
            .map(|months_ago| {
                let month = MonthKey::of(date!(2024 - 06 - 01)).minus_months(months_ago);
                let date = time::Date::from_calendar_date(month.year(), month.month(), 10)
                    .unwrap()
                    .midnight();
                income(10.0 + months_ago as f64, date)
            })
            .collect();
        let now = datetime!(2024-06-15 00:00);

        let got = build_monthly_series(&transactions, now, 12);

        let in_window: Vec<_> = transactions
            .iter()
            .filter(|transaction| {
                MonthKey::of(transaction.date.date()) > MonthKey::of(now.date()).minus_months(12)
            })
            .cloned()
            .collect();
        let series_income: f64 = got.iter().map(|bucket| bucket.income).sum();
        assert_eq!(series_income, compute_totals(&in_window).total_income);
    }

    #[test]
    fn respects_custom_window_length() {
        assert_eq!(build_monthly_series(&[], datetime!(2024-01-31 00:00), 3).len(), 3);
        assert!(build_monthly_series(&[], datetime!(2024-01-31 00:00), 0).is_empty());
    }

    #[test]
    fn same_input_gives_same_output() {
        let transactions = [income(100.0, datetime!(2024-01-15 00:00))];
        let now = datetime!(2024-01-31 00:00);

        assert_eq!(
            build_monthly_series(&transactions, now, 12),
            build_monthly_series(&transactions, now, 12)
        );
    }
}
