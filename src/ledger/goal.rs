//! Savings goals and their one-way completion flag.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::DatabaseID, user::UserID};

/// An amount of money the user is saving towards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: DatabaseID,
    pub user_id: UserID,
    pub name: String,
    pub current_amount: f64,
    /// The amount to reach. Open-ended goals have no target and never complete.
    pub target_amount: Option<f64>,
    /// Set once when the target is first reached, never unset.
    pub is_completed: bool,
    /// Archived goals are kept for history but no longer tracked.
    pub is_active: bool,
}

impl SavingsGoal {
    /// Whether the goal has reached its target but has not been marked as completed yet.
    pub fn is_newly_achieved(&self) -> bool {
        match self.target_amount {
            Some(target_amount) => {
                self.is_active && !self.is_completed && self.current_amount >= target_amount
            }
            None => false,
        }
    }
}

/// Create an active, incomplete savings goal and return it with its generated ID.
pub fn create_savings_goal(
    user_id: UserID,
    name: &str,
    current_amount: f64,
    target_amount: Option<f64>,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    connection.execute(
        "INSERT INTO savings_goal (user_id, name, current_amount, target_amount)
            VALUES (?1, ?2, ?3, ?4)",
        (user_id.as_i64(), name, current_amount, target_amount),
    )?;

    Ok(SavingsGoal {
        id: connection.last_insert_rowid(),
        user_id,
        name: name.to_owned(),
        current_amount,
        target_amount,
        is_completed: false,
        is_active: true,
    })
}

/// Get all of the user's savings goals, including completed and archived ones.
pub fn get_savings_goals(user_id: UserID, connection: &Connection) -> Result<Vec<SavingsGoal>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, current_amount, target_amount, is_completed, is_active
            FROM savings_goal
            WHERE user_id = :user_id
            ORDER BY id ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_goal| maybe_goal.map_err(|error| error.into()))
        .collect()
}

/// Set how much has been saved towards a goal.
///
/// The completion flag is left untouched, a completed goal stays completed
/// even if money is withdrawn from it.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no goal with `goal_id`.
pub fn update_goal_progress(
    goal_id: DatabaseID,
    current_amount: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE savings_goal SET current_amount = ?1 WHERE id = ?2",
        (current_amount, goal_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Stop tracking a goal without deleting it.
pub fn archive_savings_goal(goal_id: DatabaseID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE savings_goal SET is_active = 0 WHERE id = ?1",
        (goal_id,),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Mark a goal as completed if it is not already.
///
/// Returns `true` only for the call that changed the flag from false to true.
/// Concurrent callers racing on the same goal therefore see exactly one `true`.
pub fn mark_goal_completed(goal_id: DatabaseID, connection: &Connection) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "UPDATE savings_goal SET is_completed = 1 WHERE id = ?1 AND is_completed = 0",
        (goal_id,),
    )?;

    Ok(rows_affected == 1)
}

/// Initialize the savings goal table.
pub fn create_savings_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_goal (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            current_amount REAL NOT NULL DEFAULT 0,
            target_amount REAL,
            is_completed INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<SavingsGoal, rusqlite::Error> {
    Ok(SavingsGoal {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        current_amount: row.get(3)?,
        target_amount: row.get(4)?,
        is_completed: row.get(5)?,
        is_active: row.get(6)?,
    })
}
