//! Connected revenue sources.
//!
//! A source links a user to a provider such as Stripe or YouTube. Connecting a
//! source imports transactions from the provider, deleting it removes them.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::PrimitiveDateTime;

use crate::{
    AppState, Error,
    clock::{Clock, datetime_format},
    database_id::DatabaseId,
    mock_provider::TransactionGenerator,
    transaction::create_transaction,
    user::{UserID, get_user_by_id},
};

/// The provider connected when a request does not name one.
pub const DEFAULT_PROVIDER: &str = "stripe";

/// The status of a source that is importing transactions.
pub const ACTIVE_STATUS: &str = "ACTIVE";

/// A provider connected to a user's account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// The ID of the source.
    pub id: DatabaseId,
    /// The user the source belongs to.
    pub user_id: UserID,
    /// The lowercased provider name, unique per user.
    pub provider: String,
    /// The connection status, e.g. "ACTIVE".
    pub status: String,
    /// When the source was first connected.
    #[serde(with = "datetime_format")]
    pub created_at: PrimitiveDateTime,
    /// When the source was last connected.
    #[serde(with = "datetime_format")]
    pub updated_at: PrimitiveDateTime,
}

/// Lowercase and trim a provider name, falling back to [DEFAULT_PROVIDER].
pub fn normalize_provider(provider: Option<&str>) -> String {
    match provider.map(str::trim) {
        Some(provider) if !provider.is_empty() => provider.to_lowercase(),
        _ => DEFAULT_PROVIDER.to_owned(),
    }
}

pub fn create_source_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS source (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            provider TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, provider),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )?;

    Ok(())
}

/// Insert a source, or mark an existing one for the same user and provider as
/// active again.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn upsert_source(
    user_id: UserID,
    provider: &str,
    now: PrimitiveDateTime,
    connection: &Connection,
) -> Result<Source, Error> {
    connection
        .prepare(
            "INSERT INTO source (user_id, provider, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(user_id, provider) DO UPDATE SET
                status = excluded.status,
                updated_at = excluded.updated_at
            RETURNING id, user_id, provider, status, created_at, updated_at",
        )?
        .query_row((user_id.as_i64(), provider, ACTIVE_STATUS, now), map_row)
        .map_err(|error| error.into())
}

/// Retrieve a user's sources, most recently connected first.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_sources(user_id: UserID, connection: &Connection) -> Result<Vec<Source>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, provider, status, created_at, updated_at
            FROM source WHERE user_id = :user_id
            ORDER BY updated_at DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_source| maybe_source.map_err(|error| error.into()))
        .collect()
}

/// Delete a source and every transaction imported from it.
///
/// # Errors
/// This function will return an error if there is an SQL error or if the source doesn't exist.
pub fn delete_source(source_id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM source WHERE id = ?1", [source_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingSource);
    }

    Ok(())
}

/// Connect `provider` for a user and import the transactions `generator`
/// produces for it.
///
/// The source and its transactions are saved together or not at all.
/// Returns the source and the number of transactions imported.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the user does not exist,
/// - [Error::NegativeAmount] if the generator produced an invalid amount,
/// - [Error::SqlError] if there is some other SQL error.
pub fn connect_source(
    user_id: UserID,
    provider: Option<&str>,
    now: PrimitiveDateTime,
    generator: &dyn TransactionGenerator,
    connection: &Connection,
) -> Result<(Source, usize), Error> {
    get_user_by_id(user_id, connection)?;

    let provider = normalize_provider(provider);
    let transaction = connection.unchecked_transaction()?;

    let source = upsert_source(user_id, &provider, now, &transaction)?;

    let new_transactions = generator.generate(&provider, now);
    for new_transaction in &new_transactions {
        create_transaction(new_transaction, user_id, Some(source.id), &transaction)?;
    }

    transaction.commit()?;

    tracing::info!(
        "Connected {provider} for user {user_id}, imported {} transactions",
        new_transactions.len()
    );

    Ok((source, new_transactions.len()))
}

fn map_row(row: &Row) -> Result<Source, rusqlite::Error> {
    Ok(Source {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        provider: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

// ============================================================================
// ENDPOINTS
// ============================================================================

/// The state needed for connecting, listing and deleting sources.
#[derive(Debug, Clone)]
pub struct SourceState {
    /// The database connection for managing sources.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Timestamps new and reconnected sources.
    pub clock: Clock,
    /// Produces the transactions imported on connect.
    pub transaction_generator: Arc<dyn TransactionGenerator>,
}

impl FromRef<AppState> for SourceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            clock: state.clock.clone(),
            transaction_generator: state.transaction_generator.clone(),
        }
    }
}

/// The query string of a connect request.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// The provider to connect, defaults to [DEFAULT_PROVIDER].
    pub provider: Option<String>,
}

/// The response to a connect request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectResponse {
    /// The connected source.
    pub source: Source,
    /// How many transactions were imported.
    pub imported: usize,
}

/// A route handler for connecting a source and importing its transactions.
pub async fn connect_source_endpoint(
    State(state): State<SourceState>,
    Path(user_id): Path<DatabaseId>,
    Query(query): Query<ConnectQuery>,
) -> Result<Response, Error> {
    let now = state.clock.now()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let (source, imported) = connect_source(
        UserID::new(user_id),
        query.provider.as_deref(),
        now,
        state.transaction_generator.as_ref(),
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(ConnectResponse { source, imported })).into_response())
}

/// A route handler for listing a user's sources.
pub async fn get_sources_endpoint(
    State(state): State<SourceState>,
    Path(user_id): Path<DatabaseId>,
) -> Result<Json<Vec<Source>>, Error> {
    let user_id = UserID::new(user_id);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_user_by_id(user_id, &connection)?;

    get_sources(user_id, &connection).map(Json)
}

/// A route handler for deleting a source and its transactions.
pub async fn delete_source_endpoint(
    State(state): State<SourceState>,
    Path(source_id): Path<DatabaseId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_source(source_id, &connection)
        .inspect_err(|error| tracing::warn!("could not delete source {source_id}: {error}"))?;

    tracing::info!("Deleted source {source_id}");

    Ok(Json(json!({ "success": true })).into_response())
}
