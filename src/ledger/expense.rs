//! Categorised spending records.

use std::ops::RangeInclusive;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, database_id::DatabaseID, user::UserID};

/// The category that expenses without one are grouped under.
pub const UNCATEGORIZED_LABEL: &str = "Other";

/// Money the user spent on a particular day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: DatabaseID,
    pub user_id: UserID,
    /// The spending category, if the user chose one.
    pub category: Option<String>,
    /// How much was spent. Always positive.
    pub amount: f64,
    pub date: Date,
}

impl ExpenseRecord {
    /// The category this expense counts towards, [UNCATEGORIZED_LABEL] if it has none.
    pub fn category_or_default(&self) -> &str {
        match self.category.as_deref().map(str::trim) {
            Some(category) if !category.is_empty() => category,
            _ => UNCATEGORIZED_LABEL,
        }
    }
}

/// The data needed to create an [ExpenseRecord].
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub user_id: UserID,
    pub category: Option<String>,
    pub amount: f64,
    pub date: Date,
}

/// Create an expense and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::InvalidExpenseAmount] if the amount is not greater than zero,
/// or an SQL error if the insert failed.
pub fn create_expense(expense: NewExpense, connection: &Connection) -> Result<ExpenseRecord, Error> {
    if !(expense.amount.is_finite() && expense.amount > 0.0) {
        return Err(Error::InvalidExpenseAmount(expense.amount));
    }

    connection.execute(
        "INSERT INTO expense (user_id, category, amount, date) VALUES (?1, ?2, ?3, ?4)",
        (
            expense.user_id.as_i64(),
            &expense.category,
            expense.amount,
            expense.date,
        ),
    )?;

    Ok(ExpenseRecord {
        id: connection.last_insert_rowid(),
        user_id: expense.user_id,
        category: expense.category,
        amount: expense.amount,
        date: expense.date,
    })
}

/// Get the user's expenses dated within `date_range` (inclusive), oldest first.
pub fn get_expenses(
    user_id: UserID,
    date_range: RangeInclusive<Date>,
    connection: &Connection,
) -> Result<Vec<ExpenseRecord>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, category, amount, date
            FROM expense
            WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
            ORDER BY date ASC, id ASC",
        )?
        .query_map(
            (user_id.as_i64(), date_range.start(), date_range.end()),
            map_row,
        )?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Initialize the expense table and indexes.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category TEXT,
            amount REAL NOT NULL CHECK (amount > 0),
            date TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<ExpenseRecord, rusqlite::Error> {
    Ok(ExpenseRecord {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
    })
}

#[cfg(test)]
mod expense_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        user::{UserID, create_user},
    };

    use super::{ExpenseRecord, NewExpense, create_expense, get_expenses};

    fn get_test_connection() -> (Connection, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user_id = create_user("test", &connection).unwrap();
        (connection, user_id)
    }

    fn new_expense(user_id: UserID, category: Option<&str>, amount: f64) -> NewExpense {
        NewExpense {
            user_id,
            category: category.map(str::to_owned),
            amount,
            date: date!(2026 - 10 - 10),
        }
    }

    #[test]
    fn create_expense_rejects_non_positive_amount() {
        let (connection, user_id) = get_test_connection();

        assert_eq!(
            create_expense(new_expense(user_id, Some("Food"), 0.0), &connection),
            Err(Error::InvalidExpenseAmount(0.0))
        );
        assert_eq!(
            create_expense(new_expense(user_id, Some("Food"), -3.0), &connection),
            Err(Error::InvalidExpenseAmount(-3.0))
        );
    }

    #[test]
    fn missing_category_defaults_to_other() {
        let (connection, user_id) = get_test_connection();

        let expense = create_expense(new_expense(user_id, None, 12.0), &connection).unwrap();
        let blank = create_expense(new_expense(user_id, Some("  "), 12.0), &connection).unwrap();

        assert_eq!(expense.category, None);
        assert_eq!(expense.category_or_default(), "Other");
        assert_eq!(blank.category_or_default(), "Other");
    }

    #[test]
    fn get_expenses_filters_by_date_range_inclusive() {
        let (connection, user_id) = get_test_connection();
        let mut want: Vec<ExpenseRecord> = Vec::new();
        for date in [
            date!(2026 - 09 - 30),
            date!(2026 - 10 - 01),
            date!(2026 - 10 - 31),
            date!(2026 - 11 - 01),
        ] {
            let expense = create_expense(
                NewExpense {
                    user_id,
                    category: Some("Food".to_owned()),
                    amount: 10.0,
                    date,
                },
                &connection,
            )
            .unwrap();

            if date.month() == time::Month::October {
                want.push(expense);
            }
        }

        let got = get_expenses(
            user_id,
            date!(2026 - 10 - 01)..=date!(2026 - 10 - 31),
            &connection,
        );

        assert_eq!(got, Ok(want));
    }

    #[test]
    fn get_expenses_excludes_other_users() {
        let (connection, user_id) = get_test_connection();
        let other_user = create_user("other", &connection).unwrap();
        create_expense(new_expense(other_user, Some("Food"), 10.0), &connection).unwrap();

        let got = get_expenses(
            user_id,
            date!(2026 - 10 - 01)..=date!(2026 - 10 - 31),
            &connection,
        );

        assert_eq!(got, Ok(vec![]));
    }
}
