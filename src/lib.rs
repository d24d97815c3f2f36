//! Creator CFO is a financial dashboard for creators.
//!
//! Users connect revenue sources (mocked integrations), which import
//! transactions. The [reporting] engine turns those transactions into the
//! totals, monthly trends and category breakdowns served by the JSON API.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod analytics;
mod app_state;
mod clock;
mod currency;
mod dashboard;
mod database_id;
mod db;
pub mod endpoints;
mod logging;
pub mod mock_provider;
mod pagination;
pub mod reporting;
mod routing;
mod source;
mod transaction;
mod transaction_table;
mod user;

pub use app_state::AppState;
pub use clock::Clock;
pub use currency::{format_currency, format_currency_rounded};
pub use database_id::DatabaseId;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use source::{Source, connect_source, get_sources};
pub use transaction::{NewTransaction, TransactionRecord, TransactionType, UNCATEGORIZED_LABEL};
pub use user::{
    DEFAULT_CURRENCY, User, UserID, create_user, delete_user_by_email, get_user_by_email,
    get_user_by_id,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
///
/// The reporting engine never fails, so every variant here comes from the
/// collaborators around it: the database, the clock and request validation.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The email address is already registered to another user.
    ///
    /// The address is left out, callers that know it should log it.
    #[error("the email is already in use")]
    DuplicateEmail,

    /// The email address is not of the form `name@domain`.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// Transaction amounts are magnitudes, the sign is carried by the type.
    #[error("{0} is not a valid amount, amounts must be finite and not negative")]
    NegativeAmount(f64),

    /// The transactions could not be written as CSV.
    #[error("could not export transactions as CSV: {0}")]
    CsvExportError(String),

    /// Tried to delete a source that does not exist
    #[error("tried to delete a source that is not in the database")]
    DeleteMissingSource,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound | Error::DeleteMissingSource => StatusCode::NOT_FOUND,
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::InvalidEmail(_) | Error::NegativeAmount(_) => StatusCode::BAD_REQUEST,
            Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_)
            | Error::CsvExportError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            Error::InvalidTimezoneError(timezone) => format!(
                "Could not get local timezone \"{timezone}\". Check your server settings and \
                ensure the timezone has been set to valid, canonical timezone string"
            ),
            // Any other server errors are not intended to be shown to the client.
            error if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("An unexpected error occurred: {}", error);
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            error => error.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use crate::Error;

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn unique_email_violation_maps_to_duplicate_email() {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute("CREATE TABLE user (email TEXT NOT NULL UNIQUE)", ())
            .unwrap();
        connection
            .execute("INSERT INTO user (email) VALUES ('a@b.c')", ())
            .unwrap();

        let error: Error = connection
            .execute("INSERT INTO user (email) VALUES ('a@b.c')", ())
            .unwrap_err()
            .into();

        assert_eq!(error, Error::DuplicateEmail);
        assert_eq!(error.to_string(), "the email is already in use");
    }

    #[test]
    fn client_errors_keep_their_status() {
        let cases = [
            (Error::NotFound, StatusCode::NOT_FOUND),
            (Error::DeleteMissingSource, StatusCode::NOT_FOUND),
            (Error::DuplicateEmail, StatusCode::CONFLICT),
            (Error::InvalidEmail("nope".to_owned()), StatusCode::BAD_REQUEST),
            (Error::NegativeAmount(-1.0), StatusCode::BAD_REQUEST),
            (Error::DatabaseLockError, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, want) in cases {
            let got = error.into_response().status();
            assert_eq!(got, want);
        }
    }
}
