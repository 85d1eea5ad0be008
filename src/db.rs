//! Database initialization and shared connection handling.

use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error,
    ledger::{
        create_budget_table, create_expense_table, create_savings_goal_table,
        create_subscription_table, create_wallet_table,
    },
    notification::create_notification_table,
    user::create_user_table,
};

/// Create all of the application tables.
///
/// The tables are created inside a single exclusive transaction, so a
/// partially initialized database is never left behind.
///
/// # Errors
///
/// Returns an error if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_expense_table(&transaction)?;
    create_subscription_table(&transaction)?;
    create_wallet_table(&transaction)?;
    create_savings_goal_table(&transaction)?;
    create_notification_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Acquire the lock on a shared database connection.
///
/// # Errors
///
/// Returns [Error::DatabaseLockError] if the mutex was poisoned.
pub fn lock_connection(connection: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, Error> {
    connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}
