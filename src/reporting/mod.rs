//! The reporting engine.
//!
//! Pure functions that turn a user's transactions into the figures shown on
//! the dashboard and analytics pages: lifetime totals, a trailing monthly
//! series, an expense breakdown by category, month-over-month growth, the top
//! source and a trailing monthly average.
//!
//! Nothing in here reads a clock, touches the database or formats currency.
//! Callers pass in the reference "now" and render the results themselves, so
//! every function gives the same output for the same input.

mod category;
mod growth;
mod monthly;
mod sources;
mod totals;

pub use category::{CategoryBucket, build_category_breakdown, sorted_by_amount};
pub use growth::{DEFAULT_TRAILING_MONTHS, Growth, compute_growth, compute_trailing_average};
pub use monthly::{
    DEFAULT_WINDOW_MONTHS, MonthKey, MonthlyBucket, build_monthly_series, format_month_label,
};
pub use sources::{TopSource, compute_top_source};
pub use totals::{MarginHealth, Totals, compute_totals};

/// `numerator` as a percentage of `denominator`, or zero when the denominator
/// is not positive.
fn percentage_of(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use time::PrimitiveDateTime;

    use crate::transaction::{TransactionRecord, TransactionType};

    pub fn record(
        amount: f64,
        transaction_type: TransactionType,
        date: PrimitiveDateTime,
    ) -> TransactionRecord {
        TransactionRecord {
            id: 0,
            amount,
            transaction_type,
            category: None,
            date,
            status: "COMPLETED".to_owned(),
            source_provider: None,
            description: String::new(),
            note: String::new(),
        }
    }

    pub fn income(amount: f64, date: PrimitiveDateTime) -> TransactionRecord {
        record(amount, TransactionType::Income, date)
    }

    pub fn expense(amount: f64, date: PrimitiveDateTime) -> TransactionRecord {
        record(amount, TransactionType::Expense, date)
    }
}
