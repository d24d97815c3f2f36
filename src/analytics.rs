//! The analytics page: a year of monthly figures, where the money goes and how
//! healthy the margin is.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::Serialize;
use time::PrimitiveDateTime;

use crate::{
    AppState, Error,
    clock::Clock,
    currency::format_currency,
    database_id::DatabaseId,
    reporting::{
        CategoryBucket, DEFAULT_WINDOW_MONTHS, MarginHealth, MonthlyBucket, Totals,
        build_category_breakdown, build_monthly_series, compute_totals, sorted_by_amount,
    },
    transaction::{TransactionRecord, get_user_transactions},
    user::{User, UserID, get_user_by_id},
};

/// Everything shown on the analytics page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    /// The ISO 4217 code amounts are formatted in.
    pub currency: String,
    /// Whether there is anything to analyse.
    pub has_transactions: bool,
    /// Income, expenses, net profit and profit margin over all transactions.
    pub totals: Totals,
    /// Income, expenses and profit for each of the last 12 months, oldest first.
    pub monthly_series: Vec<MonthlyBucket>,
    /// Expenses per category, largest first.
    pub categories: Vec<CategoryBucket>,
    /// How healthy the profit margin is.
    pub margin_health: MarginHealth,
    /// A sentence of advice for the margin health.
    pub margin_advice: String,
    /// Total income in the user's currency.
    pub formatted_income: String,
    /// Total expenses in the user's currency.
    pub formatted_expense: String,
    /// Net profit in the user's currency.
    pub formatted_net_profit: String,
}

/// Build the analytics report for `user` as of `now`.
pub fn build_analytics_report(
    user: &User,
    transactions: &[TransactionRecord],
    now: PrimitiveDateTime,
) -> AnalyticsReport {
    let totals = compute_totals(transactions);
    let margin_health = MarginHealth::classify(totals.profit_margin_pct);
    let currency = user.currency.as_str();

    AnalyticsReport {
        currency: user.currency.clone(),
        has_transactions: !transactions.is_empty(),
        totals,
        monthly_series: build_monthly_series(transactions, now, DEFAULT_WINDOW_MONTHS),
        categories: sorted_by_amount(build_category_breakdown(transactions)),
        margin_health,
        margin_advice: margin_health.advice().to_owned(),
        formatted_income: format_currency(totals.total_income, currency),
        formatted_expense: format_currency(totals.total_expense, currency),
        formatted_net_profit: format_currency(totals.net_profit, currency),
    }
}

/// The state needed for the analytics page.
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    /// The database connection for reading users and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Supplies the month the series ends with.
    pub clock: Clock,
}

impl FromRef<AppState> for AnalyticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            clock: state.clock.clone(),
        }
    }
}

/// A route handler for a user's analytics report.
pub async fn get_analytics(
    State(state): State<AnalyticsState>,
    Path(user_id): Path<DatabaseId>,
) -> Result<Json<AnalyticsReport>, Error> {
    let user_id = UserID::new(user_id);
    let now = state.clock.now()?;

    let (user, transactions) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        (
            get_user_by_id(user_id, &connection)?,
            get_user_transactions(user_id, &connection)?,
        )
    };

    Ok(Json(build_analytics_report(&user, &transactions, now)))
}
