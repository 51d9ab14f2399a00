//! Opens database connections and creates the application's tables.

use std::{path::Path, time::Duration};

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, account::create_account_table, consent::create_consent_table,
    customer::create_customer_table, id_sequence::create_id_sequence_table,
    transaction::create_transaction_table,
};

/// How long a writer waits for another connection's write lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a connection to the SQLite database at `path` and configure it for the app.
///
/// Foreign keys are enforced and writers wait up to [BUSY_TIMEOUT] for the
/// database write lock instead of failing straight away.
///
/// # Errors
/// Returns an error if the database cannot be opened or configured.
pub fn open_connection(path: impl AsRef<Path>) -> Result<Connection, Error> {
    let connection = Connection::open(path)?;
    configure(&connection)?;

    Ok(connection)
}

fn configure(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;
    connection.busy_timeout(BUSY_TIMEOUT)?;

    Ok(())
}

/// Create all of the database tables for the application.
///
/// Tables that already exist are left untouched, so this is safe to call on
/// every start-up.
///
/// # Errors
/// Returns an error if a table cannot be created or there is some other SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    configure(connection)?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_id_sequence_table(&transaction)?;
    create_customer_table(&transaction)?;
    create_account_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_consent_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn creates_all_tables() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("could not initialize database");

        let mut tables: Vec<String> = connection
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|name| name.unwrap())
            .collect();
        tables.sort();

        assert_eq!(
            tables,
            vec!["account", "consent", "customer", "id_sequence", "transaction"]
        );
    }

    #[test]
    fn can_initialize_twice() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        assert_eq!(Ok(()), initialize(&connection));
    }

    #[test]
    fn enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let enabled: bool = connection
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();

        assert!(enabled);
    }
}
