//! Code for creating the user table and listing the users whose records are swept for alerts.

use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::Error;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from the IDs of budgets, goals and the
/// like, which all share the same integer representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash, PartialOrd, Ord)]
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

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Create a user and return their generated ID.
pub fn create_user(name: &str, connection: &Connection) -> Result<UserID, Error> {
    connection.execute("INSERT INTO user (name) VALUES (?1)", (name,))?;

    Ok(UserID::new(connection.last_insert_rowid()))
}

/// Get the IDs of every user, in ascending order.
pub fn get_all_user_ids(connection: &Connection) -> Result<Vec<UserID>, Error> {
    connection
        .prepare("SELECT id FROM user ORDER BY id ASC")?
        .query_map([], |row| row.get(0).map(UserID::new))?
        .map(|maybe_id| maybe_id.map_err(|error| error.into()))
        .collect()
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use super::{UserID, create_user, create_user_table, get_all_user_ids};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_user_table(&connection).unwrap();
        connection
    }

    #[test]
    fn get_all_user_ids_returns_ids_in_order() {
        let connection = get_test_connection();
        let first = create_user("Alice", &connection).unwrap();
        let second = create_user("Bob", &connection).unwrap();

        let ids = get_all_user_ids(&connection).unwrap();

        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn get_all_user_ids_returns_empty_for_no_users() {
        let connection = get_test_connection();

        assert_eq!(get_all_user_ids(&connection), Ok(Vec::<UserID>::new()));
    }
}
