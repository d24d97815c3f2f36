//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error, clock::Clock, db::initialize, mock_provider::TransactionGenerator,
    pagination::PaginationConfig,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// Where reports get the current date and time from.
    pub clock: Clock,

    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,

    /// Produces the transactions imported when a source is connected.
    pub transaction_generator: Arc<dyn TransactionGenerator>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        clock: Clock,
        pagination_config: PaginationConfig,
        transaction_generator: Arc<dyn TransactionGenerator>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            clock,
            pagination_config,
            transaction_generator,
        })
    }
}
