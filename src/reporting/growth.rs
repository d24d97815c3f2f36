//! Month-over-month revenue growth and trailing averages.

use serde::Serialize;
use time::PrimitiveDateTime;

use crate::{
    reporting::{monthly::MonthKey, percentage_of},
    transaction::TransactionRecord,
};

/// The number of months averaged on the dashboard.
pub const DEFAULT_TRAILING_MONTHS: usize = 3;

/// Revenue this month compared to last month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Growth {
    /// Income dated in the month of the reference time.
    pub current_month_revenue: f64,
    /// Income dated in the month before.
    pub last_month_revenue: f64,
    /// Percentage change from last month, zero when last month had no revenue.
    pub growth_pct: f64,
}

/// Compare income in the month of `reference_now` with the month before it.
///
/// The current month runs from the 1st to the end of the month, so income
/// dated later in the month than `reference_now` still counts.
pub fn compute_growth(
    transactions: &[TransactionRecord],
    reference_now: PrimitiveDateTime,
) -> Growth {
    let current_month = MonthKey::of(reference_now.date());
    let last_month = current_month.previous();

    let income_in = |month: MonthKey| -> f64 {
        transactions
            .iter()
            .filter(|t| t.is_income() && MonthKey::of(t.date.date()) == month)
            .map(|t| t.amount)
            .sum()
    };

    let current_month_revenue = income_in(current_month);
    let last_month_revenue = income_in(last_month);

    Growth {
        current_month_revenue,
        last_month_revenue,
        growth_pct: percentage_of(
            current_month_revenue - last_month_revenue,
            last_month_revenue,
        ),
    }
}

/// Average monthly income over the current month and the `months - 1`
/// months before it, up to and including `reference_now`.
///
/// The sum is always divided by `months`, months without income count as
/// zero. A window of zero months averages to zero.
pub fn compute_trailing_average(
    transactions: &[TransactionRecord],
    reference_now: PrimitiveDateTime,
    months: usize,
) -> f64 {
    if months == 0 {
        return 0.0;
    }

    let first_month = MonthKey::of(reference_now.date()).minus_months(months - 1);

    let total: f64 = transactions
        .iter()
        .filter(|t| {
            t.is_income() && MonthKey::of(t.date.date()) >= first_month && t.date <= reference_now
        })
        .map(|t| t.amount)
        .sum();

    total / months as f64
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::reporting::test_utils::{expense, income};

    use super::{DEFAULT_TRAILING_MONTHS, Growth, compute_growth, compute_trailing_average};

    #[test]
    fn growth_compares_calendar_months() {
        let transactions = [
            income(150.0, datetime!(2024-03-02 00:00)),
            income(100.0, datetime!(2024-02-29 23:59)),
            income(999.0, datetime!(2024-01-31 00:00)),
            expense(70.0, datetime!(2024-03-03 00:00)),
        ];

        let got = compute_growth(&transactions, datetime!(2024-03-10 12:00));

        assert_eq!(
            got,
            Growth {
                current_month_revenue: 150.0,
                last_month_revenue: 100.0,
                growth_pct: 50.0,
            }
        );
    }

    #[test]
    fn growth_is_zero_without_last_month_revenue() {
        let transactions = [income(500.0, datetime!(2024-03-02 00:00))];

        let got = compute_growth(&transactions, datetime!(2024-03-10 00:00));

        assert_eq!(got.current_month_revenue, 500.0);
        assert_eq!(got.last_month_revenue, 0.0);
        assert_eq!(got.growth_pct, 0.0);
    }

    #[test]
    fn growth_counts_whole_current_month() {
        let transactions = [income(80.0, datetime!(2024-03-28 00:00))];

        let got = compute_growth(&transactions, datetime!(2024-03-10 00:00));

        assert_eq!(got.current_month_revenue, 80.0);
    }

    #[test]
    fn growth_wraps_year_boundary() {
        let transactions = [
            income(50.0, datetime!(2024-01-05 00:00)),
            income(100.0, datetime!(2023-12-20 00:00)),
        ];

        let got = compute_growth(&transactions, datetime!(2024-01-10 00:00));

        assert_eq!(got.growth_pct, -50.0);
    }

    #[test]
    fn growth_of_empty_input_is_zero() {
        assert_eq!(
            compute_growth(&[], datetime!(2024-01-10 00:00)),
            Growth::default()
        );
    }

    #[test]
    fn trailing_average_divides_by_window_length() {
        let transactions = [
            income(300.0, datetime!(2024-03-01 00:00)),
            income(900.0, datetime!(2024-01-15 00:00)),
            income(5000.0, datetime!(2023-12-31 00:00)),
            expense(1000.0, datetime!(2024-02-01 00:00)),
        ];

        let got = compute_trailing_average(
            &transactions,
            datetime!(2024-03-10 00:00),
            DEFAULT_TRAILING_MONTHS,
        );

        assert_eq!(got, 400.0);
    }

    #[test]
    fn trailing_average_excludes_income_after_now() {
        let transactions = [
            income(300.0, datetime!(2024-03-01 00:00)),
            income(600.0, datetime!(2024-03-20 00:00)),
        ];

        let got = compute_trailing_average(&transactions, datetime!(2024-03-10 00:00), 3);

        assert_eq!(got, 100.0);
    }

    #[test]
    fn trailing_average_of_empty_window_is_zero() {
        let transactions = [income(300.0, datetime!(2024-03-01 00:00))];

        assert_eq!(compute_trailing_average(&[], datetime!(2024-03-10 00:00), 3), 0.0);
        assert_eq!(
            compute_trailing_average(&transactions, datetime!(2024-03-10 00:00), 0),
            0.0
        );
    }
}
