//! The user's spending wallet.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::DatabaseID, user::UserID};

/// The money a user has available to spend. A user has at most one wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub id: DatabaseID,
    pub user_id: UserID,
    pub balance: f64,
    /// How much the user plans to spend from the wallet each month, if set.
    pub monthly_budget: Option<f64>,
}

/// Create the user's wallet, or update its balance and monthly budget if it already exists.
pub fn upsert_wallet(
    user_id: UserID,
    balance: f64,
    monthly_budget: Option<f64>,
    connection: &Connection,
) -> Result<WalletSnapshot, Error> {
    connection.execute(
        "INSERT INTO wallet (user_id, balance, monthly_budget)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                balance=excluded.balance,
                monthly_budget=excluded.monthly_budget",
        (user_id.as_i64(), balance, monthly_budget),
    )?;

    get_wallet(user_id, connection)?.ok_or(Error::NotFound)
}

/// Get the user's wallet, `None` if they have not set one up.
pub fn get_wallet(user_id: UserID, connection: &Connection) -> Result<Option<WalletSnapshot>, Error> {
    connection
        .prepare("SELECT id, user_id, balance, monthly_budget FROM wallet WHERE user_id = :user_id")?
        .query_row(&[(":user_id", &user_id.as_i64())], map_row)
        .optional()
        .map_err(|error| error.into())
}

/// Initialize the wallet table.
pub fn create_wallet_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS wallet (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL UNIQUE REFERENCES user(id) ON DELETE CASCADE,
            balance REAL NOT NULL,
            monthly_budget REAL
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<WalletSnapshot, rusqlite::Error> {
    Ok(WalletSnapshot {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        balance: row.get(2)?,
        monthly_budget: row.get(3)?,
    })
}

#[cfg(test)]
mod wallet_tests {
    use rusqlite::Connection;

    use crate::{db::initialize, user::create_user};

    use super::{get_wallet, upsert_wallet};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[test]
    fn get_wallet_returns_none_without_wallet() {
        let connection = get_test_connection();
        let user_id = create_user("test", &connection).unwrap();

        assert_eq!(get_wallet(user_id, &connection), Ok(None));
    }

    #[test]
    fn upsert_wallet_keeps_one_wallet_per_user() {
        let connection = get_test_connection();
        let user_id = create_user("test", &connection).unwrap();

        let first = upsert_wallet(user_id, 100.0, Some(1000.0), &connection).unwrap();
        let second = upsert_wallet(user_id, 5.0, None, &connection).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.balance, 5.0);
        assert_eq!(second.monthly_budget, None);
        assert_eq!(get_wallet(user_id, &connection), Ok(Some(second)));
    }
}
