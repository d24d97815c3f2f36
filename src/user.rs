//! Code for creating the user table, fetching users from the database and the
//! user endpoints.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, database_id::DatabaseId};

/// The display currency given to users who do not pick one.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email address, unique across users.
    pub email: String,
    /// The ISO 4217 code of the currency amounts are displayed in, e.g. "EUR".
    pub currency: String,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                currency TEXT NOT NULL DEFAULT 'EUR'
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// `email` is trimmed and lowercased so the same inbox cannot register twice.
/// `currency` is uppercased, a blank currency falls back to [DEFAULT_CURRENCY].
///
/// # Errors
///
/// This function will return a:
/// - [Error::InvalidEmail] if `email` is not of the form `name@domain`,
/// - [Error::DuplicateEmail] if `email` belongs to another user,
/// - [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(email: &str, currency: &str, connection: &Connection) -> Result<User, Error> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(Error::InvalidEmail(email));
    }

    let currency = match currency.trim() {
        "" => DEFAULT_CURRENCY.to_owned(),
        currency => currency.to_uppercase(),
    };

    connection
        .execute(
            "INSERT INTO user (email, currency) VALUES (?1, ?2)",
            (&email, &currency),
        )
        .map_err(Error::from)
        .inspect_err(|error| {
            if *error == Error::DuplicateEmail {
                tracing::debug!("could not register \"{email}\": {error}");
            }
        })?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email,
        currency,
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((name, domain)) => !name.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, currency FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`, ignoring case.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has the email address.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, currency FROM user WHERE email = :email")?
        .query_row(&[(":email", &normalize_email(email))], map_row)
        .map_err(|error| error.into())
}

/// Delete the user registered with `email`, along with their sources and
/// transactions.
///
/// Returns whether a user was deleted.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn delete_user_by_email(email: &str, connection: &Connection) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM user WHERE email = ?1",
        [normalize_email(email)],
    )?;

    Ok(rows_affected > 0)
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: UserID::new(row.get(0)?),
        email: row.get(1)?,
        currency: row.get(2)?,
    })
}

/// The state needed for the user endpoints.
#[derive(Debug, Clone)]
pub struct UserState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a request to register a user.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterForm {
    /// The new user's email address.
    pub email: String,
    /// The display currency, defaults to [DEFAULT_CURRENCY].
    #[serde(default)]
    pub currency: String,
}

/// A route handler for registering a new user.
pub async fn register_user(
    State(state): State<UserState>,
    Json(form): Json<RegisterForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = create_user(&form.email, &form.currency, &connection)?;
    tracing::info!("Registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// A route handler for getting a user by their ID.
pub async fn get_user(
    State(state): State<UserState>,
    Path(user_id): Path<DatabaseId>,
) -> Result<Json<User>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_user_by_id(UserID::new(user_id), &connection).map(Json)
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{
        DEFAULT_CURRENCY, UserID, create_user, delete_user_by_email, get_user_by_email,
        get_user_by_id,
    };

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize(&conn).expect("Could not create tables");

        conn
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();

        let inserted_user = create_user("demo@creatorcfo.com", "usd", &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, "demo@creatorcfo.com");
        assert_eq!(inserted_user.currency, "USD");
    }

    #[test]
    fn blank_currency_uses_default() {
        let db_connection = get_db_connection();

        let inserted_user = create_user("demo@creatorcfo.com", " ", &db_connection).unwrap();

        assert_eq!(inserted_user.currency, DEFAULT_CURRENCY);
    }

    #[test]
    fn insert_user_fails_on_invalid_email() {
        let db_connection = get_db_connection();

        for email in ["", "no-at-sign", "@example.com", "name@", "a@b@c"] {
            let got = create_user(email, "EUR", &db_connection);

            assert_eq!(got, Err(Error::InvalidEmail(email.to_owned())));
        }
    }

    #[test]
    fn insert_user_fails_on_duplicate_email() {
        let db_connection = get_db_connection();
        create_user("demo@creatorcfo.com", "EUR", &db_connection).unwrap();

        let got = create_user("demo@creatorcfo.com", "USD", &db_connection);

        assert_eq!(got, Err(Error::DuplicateEmail));
    }

    #[test]
    fn insert_user_fails_on_duplicate_email_in_different_case() {
        let db_connection = get_db_connection();
        let first = create_user(" Demo@CreatorCFO.com ", "EUR", &db_connection).unwrap();

        let got = create_user("demo@creatorcfo.com", "EUR", &db_connection);

        assert_eq!(first.email, "demo@creatorcfo.com");
        assert_eq!(got, Err(Error::DuplicateEmail));
    }

    #[test]
    fn email_lookups_ignore_case() {
        let db_connection = get_db_connection();
        let test_user = create_user("demo@creatorcfo.com", "EUR", &db_connection).unwrap();

        assert_eq!(
            get_user_by_email("DEMO@creatorcfo.com", &db_connection),
            Ok(test_user)
        );
        assert_eq!(
            delete_user_by_email("Demo@CreatorCFO.com", &db_connection),
            Ok(true)
        );
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        let id = UserID::new(42);

        assert_eq!(get_user_by_id(id, &db_connection), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id_and_email() {
        let db_connection = get_db_connection();
        let test_user = create_user("demo@creatorcfo.com", "EUR", &db_connection).unwrap();

        assert_eq!(get_user_by_id(test_user.id, &db_connection), Ok(test_user.clone()));
        assert_eq!(
            get_user_by_email("demo@creatorcfo.com", &db_connection),
            Ok(test_user)
        );
    }

    #[test]
    fn delete_user_reports_whether_user_existed() {
        let db_connection = get_db_connection();
        create_user("demo@creatorcfo.com", "EUR", &db_connection).unwrap();

        assert_eq!(delete_user_by_email("demo@creatorcfo.com", &db_connection), Ok(true));
        assert_eq!(delete_user_by_email("demo@creatorcfo.com", &db_connection), Ok(false));
        assert_eq!(
            get_user_by_email("demo@creatorcfo.com", &db_connection),
            Err(Error::NotFound)
        );
    }
}
