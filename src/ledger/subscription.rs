//! Recurring payments such as streaming services or gym memberships.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, database_id::DatabaseID, user::UserID};

/// A recurring payment and the date it is next charged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: DatabaseID,
    pub user_id: UserID,
    pub name: String,
    pub price: f64,
    pub next_billing_date: Date,
}

/// Create a subscription and return it with its generated ID.
pub fn create_subscription(
    user_id: UserID,
    name: &str,
    price: f64,
    next_billing_date: Date,
    connection: &Connection,
) -> Result<Subscription, Error> {
    connection.execute(
        "INSERT INTO subscription (user_id, name, price, next_billing_date) VALUES (?1, ?2, ?3, ?4)",
        (user_id.as_i64(), name, price, next_billing_date),
    )?;

    Ok(Subscription {
        id: connection.last_insert_rowid(),
        user_id,
        name: name.to_owned(),
        price,
        next_billing_date,
    })
}

/// Get all of the user's subscriptions ordered by their next billing date.
pub fn get_subscriptions(user_id: UserID, connection: &Connection) -> Result<Vec<Subscription>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, price, next_billing_date
            FROM subscription
            WHERE user_id = :user_id
            ORDER BY next_billing_date ASC, id ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_subscription| maybe_subscription.map_err(|error| error.into()))
        .collect()
}

/// Initialize the subscription table.
pub fn create_subscription_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS subscription (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            price REAL NOT NULL,
            next_billing_date TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Subscription, rusqlite::Error> {
    Ok(Subscription {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        price: row.get(3)?,
        next_billing_date: row.get(4)?,
    })
}

#[cfg(test)]
mod subscription_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{db::initialize, user::create_user};

    use super::{create_subscription, get_subscriptions};

    #[test]
    fn get_subscriptions_orders_by_next_billing_date() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user_id = create_user("test", &connection).unwrap();
        let gym = create_subscription(user_id, "Gym", 30.0, date!(2026 - 11 - 02), &connection)
            .unwrap();
        let streaming =
            create_subscription(user_id, "Streaming", 15.99, date!(2026 - 10 - 18), &connection)
                .unwrap();

        let got = get_subscriptions(user_id, &connection);

        assert_eq!(got, Ok(vec![streaming, gym]));
    }
}
