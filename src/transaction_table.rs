//! The transaction table: searching, filtering, paging and exporting a user's
//! transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{PrimitiveDateTime, macros::format_description};

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    pagination::{PageInfo, PaginationConfig, PaginationIndicator, create_pagination_indicators},
    transaction::{TransactionRecord, get_user_transactions},
    user::{UserID, get_user_by_id},
};

/// The column headers of an exported CSV file.
pub const CSV_HEADER: [&str; 7] = [
    "Description",
    "Date",
    "Type",
    "Category",
    "Note",
    "Amount",
    "Source",
];

const MISSING_SOURCE: &str = "N/A";

/// The filters applied to the transaction table.
///
/// Blank values and "ALL" mean no filter.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TableQuery {
    /// Only show transactions whose description or note contains this text,
    /// ignoring case.
    pub search: Option<String>,
    /// Only show "INCOME" or "EXPENSE" transactions, ignoring case. Any other
    /// type matches nothing.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// Only show transactions imported from this provider, ignoring case.
    pub source: Option<String>,
    /// The 1-based page to show.
    pub page: Option<u64>,
}

fn active_filter(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("ALL"))
}

impl TableQuery {
    /// Whether `transaction` passes every filter.
    pub fn matches(&self, transaction: &TransactionRecord) -> bool {
        if let Some(search) = active_filter(&self.search) {
            let search = search.to_lowercase();
            if !transaction.description.to_lowercase().contains(&search)
                && !transaction.note.to_lowercase().contains(&search)
            {
                return false;
            }
        }

        if let Some(transaction_type) = active_filter(&self.transaction_type) {
            if !transaction
                .transaction_type
                .as_str()
                .eq_ignore_ascii_case(transaction_type)
            {
                return false;
            }
        }

        if let Some(source) = active_filter(&self.source) {
            if transaction.provider_key().as_deref() != Some(source.to_lowercase().as_str()) {
                return false;
            }
        }

        true
    }

    /// The transactions that pass every filter, in their original order.
    pub fn filter<'a>(&self, transactions: &'a [TransactionRecord]) -> Vec<&'a TransactionRecord> {
        transactions.iter().filter(|t| self.matches(t)).collect()
    }
}

/// One page of the filtered transaction table.
#[derive(Debug, Serialize)]
pub struct TransactionPage<'a> {
    /// The transactions on this page.
    pub transactions: Vec<&'a TransactionRecord>,
    /// The current page, after clamping.
    pub page: u64,
    /// The number of pages.
    pub total_pages: u64,
    /// The number of transactions matching the filters.
    pub total_matches: u64,
    /// The page links to show around the current page.
    pub indicators: Vec<PaginationIndicator>,
}

/// Filter `transactions` with `query` and cut out the requested page.
pub fn build_transaction_page<'a>(
    transactions: &'a [TransactionRecord],
    query: &TableQuery,
    config: &PaginationConfig,
) -> TransactionPage<'a> {
    let matches = query.filter(transactions);
    let page_info = PageInfo::new(
        query.page.unwrap_or(config.default_page),
        config.page_size,
        matches.len() as u64,
    );

    TransactionPage {
        transactions: page_info.slice(&matches).to_vec(),
        page: page_info.page,
        total_pages: page_info.page_count,
        total_matches: page_info.total_rows,
        indicators: create_pagination_indicators(
            page_info.page,
            page_info.page_count,
            config.max_pages,
        ),
    }
}

/// Write `transactions` as CSV with every cell quoted.
///
/// # Errors
/// Returns [Error::CsvExportError] if a row could not be written.
pub fn export_csv<'a>(
    transactions: impl IntoIterator<Item = &'a TransactionRecord>,
) -> Result<String, Error> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|error| Error::CsvExportError(error.to_string()))?;

    for transaction in transactions {
        let date = format_export_date(transaction.date)?;
        let amount = format!("{:.2}", transaction.amount);

        writer
            .write_record([
                transaction.description.as_str(),
                date.as_str(),
                transaction.transaction_type.as_str(),
                transaction.category_label(),
                transaction.note.as_str(),
                amount.as_str(),
                transaction.source_provider.as_deref().unwrap_or(MISSING_SOURCE),
            ])
            .map_err(|error| Error::CsvExportError(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::CsvExportError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::CsvExportError(error.to_string()))
}

fn format_export_date(date: PrimitiveDateTime) -> Result<String, Error> {
    date.format(format_description!("[day] [month repr:short] [year]"))
        .map_err(|error| Error::CsvExportError(error.to_string()))
}

// ============================================================================
// ENDPOINTS
// ============================================================================

/// The state needed for the transaction table.
#[derive(Debug, Clone)]
pub struct TransactionTableState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Controls the page size of the table.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionTableState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

fn load_transactions(
    db_connection: &Mutex<Connection>,
    user_id: UserID,
) -> Result<Vec<TransactionRecord>, Error> {
    let connection = db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_user_by_id(user_id, &connection)?;

    get_user_transactions(user_id, &connection)
}

/// A route handler for one page of a user's filtered transactions.
pub async fn get_transactions_page(
    State(state): State<TransactionTableState>,
    Path(user_id): Path<DatabaseId>,
    Query(query): Query<TableQuery>,
) -> Result<Response, Error> {
    let transactions = load_transactions(&state.db_connection, UserID::new(user_id))?;
    let page = build_transaction_page(&transactions, &query, &state.pagination_config);

    Ok(Json(page).into_response())
}

/// A route handler for downloading a user's filtered transactions as CSV.
pub async fn export_transactions_csv(
    State(state): State<TransactionTableState>,
    Path(user_id): Path<DatabaseId>,
    Query(query): Query<TableQuery>,
) -> Result<Response, Error> {
    let transactions = load_transactions(&state.db_connection, UserID::new(user_id))?;
    let body = export_csv(query.filter(&transactions))?;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"transactions.csv\""),
        ],
        body,
    )
        .into_response())
}
