//! The dashboard overview: headline figures, growth, the top source, recent
//! transactions and a few generated insights.

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
    currency::{format_currency, format_currency_rounded},
    database_id::DatabaseId,
    reporting::{
        DEFAULT_TRAILING_MONTHS, Growth, MarginHealth, TopSource, Totals, compute_growth,
        compute_top_source, compute_totals, compute_trailing_average,
    },
    source::{ACTIVE_STATUS, Source, get_sources},
    transaction::{TransactionRecord, get_user_transactions},
    user::{User, UserID, get_user_by_id},
};

/// How many of the latest transactions the dashboard lists.
pub const RECENT_TRANSACTION_COUNT: usize = 5;

/// The money figures of the dashboard, formatted in the user's currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedFigures {
    /// All income, e.g. "€1,234.50".
    pub total_income: String,
    /// All expenses.
    pub total_expense: String,
    /// Income minus expenses, negative when the user made a loss.
    pub net_profit: String,
    /// Income in the calendar month of "now".
    pub current_month_revenue: String,
    /// The trailing monthly average, rounded to whole units.
    pub trailing_average: String,
}

/// Everything shown on the dashboard overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    /// The ISO 4217 code amounts are formatted in.
    pub currency: String,
    /// Whether the user has connected any source yet.
    pub has_sources: bool,
    /// The number of sources with an active connection.
    pub active_sources: usize,
    /// Income, expenses and net profit over all transactions.
    pub totals: Totals,
    /// This month's income compared to last month's.
    pub growth: Growth,
    /// The source with the most transactions, if any.
    pub top_source: TopSource,
    /// Average monthly income over the last [DEFAULT_TRAILING_MONTHS] months.
    pub trailing_average: f64,
    /// The money figures above as display strings.
    pub formatted: FormattedFigures,
    /// The latest transactions, most recent first.
    pub recent_transactions: Vec<TransactionRecord>,
    /// Short sentences summarising the figures.
    pub insights: Vec<String>,
}

/// Build the dashboard for `user` as of `now`.
///
/// A user without sources gets a report of zeros, even if they have added
/// transactions by hand.
pub fn build_dashboard_report(
    user: &User,
    sources: &[Source],
    transactions: &[TransactionRecord],
    now: PrimitiveDateTime,
) -> DashboardReport {
    let has_sources = !sources.is_empty();
    let transactions: &[TransactionRecord] = if has_sources { transactions } else { &[] };

    let totals = compute_totals(transactions);
    let growth = compute_growth(transactions, now);
    let top_source = compute_top_source(transactions);
    let trailing_average = compute_trailing_average(transactions, now, DEFAULT_TRAILING_MONTHS);

    let currency = user.currency.as_str();
    let formatted = FormattedFigures {
        total_income: format_currency(totals.total_income, currency),
        total_expense: format_currency(totals.total_expense, currency),
        net_profit: format_currency(totals.net_profit, currency),
        current_month_revenue: format_currency(growth.current_month_revenue, currency),
        trailing_average: format_currency_rounded(trailing_average, currency),
    };

    let mut recent_transactions = transactions.to_vec();
    recent_transactions.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    recent_transactions.truncate(RECENT_TRANSACTION_COUNT);

    let insights = if has_sources {
        write_insights(&totals, &growth, &top_source)
    } else {
        vec!["Connect a source to see your statistics.".to_owned()]
    };

    DashboardReport {
        currency: user.currency.clone(),
        has_sources,
        active_sources: sources
            .iter()
            .filter(|source| source.status == ACTIVE_STATUS)
            .count(),
        totals,
        growth,
        top_source,
        trailing_average,
        formatted,
        recent_transactions,
        insights,
    }
}

fn write_insights(totals: &Totals, growth: &Growth, top_source: &TopSource) -> Vec<String> {
    let mut insights = Vec::with_capacity(3);

    if growth.growth_pct >= 0.0 {
        insights.push(format!(
            "Your revenue grew {:.0}% compared to last month.",
            growth.growth_pct
        ));
    } else {
        insights.push(format!(
            "Your revenue fell {:.0}% compared to last month.",
            growth.growth_pct.abs()
        ));
    }

    if let Some(name) = &top_source.source_name {
        insights.push(format!(
            "{} accounts for {}% of your transactions.",
            capitalize(name),
            top_source.percentage_of_all
        ));
    }

    let margin = MarginHealth::classify(totals.profit_margin_pct);
    insights.push(format!(
        "Profit margin of {:.0}%. {}",
        totals.profit_margin_pct,
        margin.advice()
    ));

    insights
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The state needed for the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading users, sources and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Supplies the date the report is computed for.
    pub clock: Clock,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            clock: state.clock.clone(),
        }
    }
}

/// A route handler for a user's dashboard report.
pub async fn get_dashboard(
    State(state): State<DashboardState>,
    Path(user_id): Path<DatabaseId>,
) -> Result<Json<DashboardReport>, Error> {
    let user_id = UserID::new(user_id);
    let now = state.clock.now()?;

    let (user, sources, transactions) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        (
            get_user_by_id(user_id, &connection)?,
            get_sources(user_id, &connection)?,
            get_user_transactions(user_id, &connection)?,
        )
    };

    Ok(Json(build_dashboard_report(
        &user,
        &sources,
        &transactions,
        now,
    )))
}
