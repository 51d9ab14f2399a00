//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::{Error, db::initialize};

/// The state of the REST server.
///
/// The database connection is the only shared resource. It is created by the
/// caller, handed to the server here, and closed when the last clone of the
/// state is dropped.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Lock the database connection for the duration of a request.
    ///
    /// # Errors
    /// Returns [Error::DatabaseLockError] if the mutex was poisoned by a panicking request.
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.db_connection.lock().map_err(|error| {
            tracing::error!("Could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
    }
}
