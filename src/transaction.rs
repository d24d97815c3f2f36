//! Transaction records for the reporting dashboard.
//!
//! This module contains everything related to transactions:
//! - The [TransactionRecord] read model consumed by the reporting engine
//! - The [NewTransaction] builder used by sources and the API to create transactions
//! - Database functions for storing and querying transactions
//! - The endpoint for adding a transaction by hand

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::{
    AppState, Error,
    clock::datetime_format,
    database_id::DatabaseId,
    user::{UserID, get_user_by_id},
};

/// The category reported for transactions without one.
pub const UNCATEGORIZED_LABEL: &str = "Other";

/// The status given to transactions when none is specified.
pub const DEFAULT_STATUS: &str = "COMPLETED";

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
///
/// Amounts are always non-negative, the direction of the money is carried by
/// this type instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "Option<String>")]
pub enum TransactionType {
    /// Money earned, e.g. ad revenue or a sale.
    #[default]
    Income,
    /// Money spent, e.g. platform fees.
    Expense,
}

impl TransactionType {
    /// Parse a stored or submitted type.
    ///
    /// Only `EXPENSE` (in any case) is an expense. Missing, blank and legacy
    /// values are treated as income.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw {
            Some(raw) if raw.trim().eq_ignore_ascii_case("EXPENSE") => Self::Expense,
            _ => Self::Income,
        }
    }

    /// The name of the type as stored in the database and shown in exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }
}

impl From<Option<String>> for TransactionType {
    fn from(raw: Option<String>) -> Self {
        Self::parse_lenient(raw.as_deref())
    }
}

/// Returns `category` or [UNCATEGORIZED_LABEL] if it is missing or blank.
pub fn normalize_category(category: Option<&str>) -> &str {
    match category {
        Some(category) if !category.trim().is_empty() => category,
        _ => UNCATEGORIZED_LABEL,
    }
}

/// A transaction as read back from the database for one user.
///
/// Records are immutable snapshots: the reporting engine and the transaction
/// table only ever borrow them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The size of the transaction, never negative.
    pub amount: f64,
    /// Whether the amount was earned or spent.
    #[serde(rename = "type", default)]
    pub transaction_type: TransactionType,
    /// A free-text label such as "Ads" or "Fees".
    pub category: Option<String>,
    /// When the transaction happened, in local time.
    #[serde(with = "datetime_format")]
    pub date: PrimitiveDateTime,
    /// The lifecycle label, e.g. "COMPLETED" or "PENDING". Display only.
    pub status: String,
    /// The provider of the source that imported the transaction, e.g. "stripe".
    pub source_provider: Option<String>,
    /// A text description of what the transaction was for.
    #[serde(default)]
    pub description: String,
    /// A free-text note attached by the source.
    #[serde(default)]
    pub note: String,
}

impl TransactionRecord {
    /// The category to group this transaction under.
    pub fn category_label(&self) -> &str {
        normalize_category(self.category.as_deref())
    }

    /// The lowercased source provider, or `None` if the transaction was not
    /// imported from a source.
    pub fn provider_key(&self) -> Option<String> {
        self.source_provider
            .as_deref()
            .map(str::trim)
            .filter(|provider| !provider.is_empty())
            .map(str::to_lowercase)
    }

    /// Whether the transaction counts as income.
    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }

    /// Whether the transaction counts as an expense.
    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }
}

/// A transaction that has not been saved yet.
///
/// To create a new `NewTransaction`, use [NewTransaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// The size of the transaction, must not be negative.
    pub amount: f64,
    /// Whether the amount was earned or spent.
    #[serde(rename = "type", default)]
    pub transaction_type: TransactionType,
    /// A free-text label such as "Ads" or "Fees".
    #[serde(default)]
    pub category: Option<String>,
    /// When the transaction happened, in local time.
    #[serde(with = "datetime_format")]
    pub date: PrimitiveDateTime,
    /// The lifecycle label. Defaults to [DEFAULT_STATUS].
    #[serde(default = "default_status")]
    pub status: String,
    /// A text description of what the transaction was for.
    #[serde(default)]
    pub description: String,
    /// A free-text note.
    #[serde(default)]
    pub note: String,
}

fn default_status() -> String {
    DEFAULT_STATUS.to_owned()
}

impl NewTransaction {
    /// Start building an income transaction of `amount` on `date`.
    ///
    /// The remaining fields default to no category, [DEFAULT_STATUS] and an
    /// empty description and note.
    pub fn build(amount: f64, date: PrimitiveDateTime) -> Self {
        Self {
            amount,
            transaction_type: TransactionType::Income,
            category: None,
            date,
            status: default_status(),
            description: String::new(),
            note: String::new(),
        }
    }

    /// Set whether the transaction is income or an expense.
    pub fn transaction_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = transaction_type;
        self
    }

    /// Set the category.
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_owned());
        self
    }

    /// Set the lifecycle status.
    pub fn status(mut self, status: &str) -> Self {
        self.status = status.to_owned();
        self
    }

    /// Set the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set the note.
    pub fn note(mut self, note: &str) -> Self {
        self.note = note.to_owned();
        self
    }
}

// ============================================================================
// DATABASE
// ============================================================================

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            source_id INTEGER,
            amount REAL NOT NULL,
            type TEXT,
            category TEXT,
            date TEXT NOT NULL,
            status TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            note TEXT NOT NULL DEFAULT '',
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(source_id) REFERENCES source(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
    )?;

    Ok(())
}

/// Create a transaction for `user_id`, optionally imported from `source_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeAmount] if the amount is negative, infinite or NaN,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    transaction: &NewTransaction,
    user_id: UserID,
    source_id: Option<DatabaseId>,
    connection: &Connection,
) -> Result<DatabaseId, Error> {
    if !transaction.amount.is_finite() || transaction.amount < 0.0 {
        return Err(Error::NegativeAmount(transaction.amount));
    }

    connection.execute(
        "INSERT INTO \"transaction\"
            (user_id, source_id, amount, type, category, date, status, description, note)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        (
            user_id.as_i64(),
            source_id,
            transaction.amount,
            transaction.transaction_type.as_str(),
            &transaction.category,
            transaction.date,
            &transaction.status,
            &transaction.description,
            &transaction.note,
        ),
    )?;

    Ok(connection.last_insert_rowid())
}

const SELECT_RECORD: &str = "SELECT
        t.id, t.amount, t.type, t.category, t.date, t.status,
        s.provider, t.description, t.note
    FROM \"transaction\" t
    LEFT JOIN source s ON s.id = t.source_id";

/// Retrieve a single transaction by its ID.
///
/// # Errors
/// Returns [Error::NotFound] if there is no transaction with `id`.
pub fn get_transaction(id: DatabaseId, connection: &Connection) -> Result<TransactionRecord, Error> {
    connection
        .prepare(&format!("{SELECT_RECORD} WHERE t.id = :id"))?
        .query_row(&[(":id", &id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all of a user's transactions, most recent first.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_user_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<TransactionRecord>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_RECORD} WHERE t.user_id = :user_id ORDER BY t.date DESC, t.id DESC"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_record| maybe_record.map_err(|error| error.into()))
        .collect()
}

fn map_row(row: &Row) -> Result<TransactionRecord, rusqlite::Error> {
    let raw_type: Option<String> = row.get(2)?;

    Ok(TransactionRecord {
        id: row.get(0)?,
        amount: row.get(1)?,
        transaction_type: TransactionType::parse_lenient(raw_type.as_deref()),
        category: row.get(3)?,
        date: row.get(4)?,
        status: row.get(5)?,
        source_provider: row.get(6)?,
        description: row.get(7)?,
        note: row.get(8)?,
    })
}

// ============================================================================
// ENDPOINTS
// ============================================================================

/// The state needed for adding a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for adding a transaction that did not come from a source.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Path(user_id): Path<DatabaseId>,
    Json(new_transaction): Json<NewTransaction>,
) -> Result<Response, Error> {
    let user_id = UserID::new(user_id);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_user_by_id(user_id, &connection)?;

    let id = create_transaction(&new_transaction, user_id, None, &connection)?;
    let record = get_transaction(id, &connection)?;

    tracing::info!("Created transaction {id} for user {user_id}");

    Ok((StatusCode::CREATED, Json(record)).into_response())
}
