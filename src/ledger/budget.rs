//! Monthly spending limits per expense category.

use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};
use time::Month;

use crate::{Error, database_id::DatabaseID, ledger::BudgetPeriod, user::UserID};

/// The percentage of a budget that must be used before a warning is sent,
/// unless the user chooses otherwise.
pub const DEFAULT_ALERT_THRESHOLD: f64 = 80.0;

/// A spending limit for one category in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: DatabaseID,
    pub user_id: UserID,
    /// The expense category the limit applies to.
    pub category: String,
    /// The most the user intends to spend in the category this month.
    ///
    /// Always greater than zero for budgets read from the database.
    pub monthly_limit: f64,
    /// The percentage of `monthly_limit` at which a warning is sent.
    pub alert_threshold: f64,
    /// Whether warnings and overspending alerts should be sent at all.
    pub enable_alerts: bool,
    pub period: BudgetPeriod,
}

/// The data needed to create a [Budget].
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    user_id: UserID,
    category: String,
    monthly_limit: f64,
    alert_threshold: f64,
    enable_alerts: bool,
    period: BudgetPeriod,
}

impl NewBudget {
    /// A budget with the default alert threshold and alerts enabled.
    pub fn new(user_id: UserID, category: &str, monthly_limit: f64, period: BudgetPeriod) -> Self {
        Self {
            user_id,
            category: category.trim().to_owned(),
            monthly_limit,
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            enable_alerts: true,
            period,
        }
    }

    pub fn alert_threshold(mut self, alert_threshold: f64) -> Self {
        self.alert_threshold = alert_threshold;
        self
    }

    pub fn enable_alerts(mut self, enable_alerts: bool) -> Self {
        self.enable_alerts = enable_alerts;
        self
    }
}

/// Create a budget and return it with its generated ID.
///
/// # Errors
///
/// Returns an error if:
/// - the monthly limit is not greater than zero ([Error::InvalidBudgetLimit]),
/// - the alert threshold is not in (0, 100] ([Error::InvalidAlertThreshold]),
/// - the user already has a budget for the category in that month ([Error::DuplicateBudget]),
/// - there was some other SQL error.
pub fn create_budget(budget: NewBudget, connection: &Connection) -> Result<Budget, Error> {
    if !(budget.monthly_limit.is_finite() && budget.monthly_limit > 0.0) {
        return Err(Error::InvalidBudgetLimit(budget.monthly_limit));
    }

    if !(budget.alert_threshold > 0.0 && budget.alert_threshold <= 100.0) {
        return Err(Error::InvalidAlertThreshold(budget.alert_threshold));
    }

    connection
        .execute(
            "INSERT INTO budget (user_id, category, monthly_limit, alert_threshold, enable_alerts, month, year)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                budget.user_id.as_i64(),
                &budget.category,
                budget.monthly_limit,
                budget.alert_threshold,
                budget.enable_alerts,
                u8::from(budget.period.month),
                budget.period.year,
            ),
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, _) if sql_error.extended_code == 2067 => {
                Error::DuplicateBudget(budget.category.clone())
            }
            error => error.into(),
        })?;

    Ok(Budget {
        id: connection.last_insert_rowid(),
        user_id: budget.user_id,
        category: budget.category,
        monthly_limit: budget.monthly_limit,
        alert_threshold: budget.alert_threshold,
        enable_alerts: budget.enable_alerts,
        period: budget.period,
    })
}

/// Get the user's budgets for `period`, ordered by category.
pub fn get_budgets(
    user_id: UserID,
    period: BudgetPeriod,
    connection: &Connection,
) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, category, monthly_limit, alert_threshold, enable_alerts, month, year
            FROM budget
            WHERE user_id = ?1 AND month = ?2 AND year = ?3
            ORDER BY category ASC",
        )?
        .query_map(
            (user_id.as_i64(), u8::from(period.month), period.year),
            map_row,
        )?
        .map(|maybe_budget| maybe_budget.map_err(|error| error.into()))
        .collect()
}

/// Initialize the budget table.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category TEXT NOT NULL,
            monthly_limit REAL NOT NULL CHECK (monthly_limit > 0),
            alert_threshold REAL NOT NULL DEFAULT 80,
            enable_alerts INTEGER NOT NULL DEFAULT 1,
            month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
            year INTEGER NOT NULL,
            UNIQUE (user_id, category, month, year)
        );

        CREATE INDEX IF NOT EXISTS idx_budget_period ON budget(user_id, year, month);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    let raw_month: u8 = row.get(6)?;
    let month = Month::try_from(raw_month)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(6, Type::Integer, Box::new(error)))?;

    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category: row.get(2)?,
        monthly_limit: row.get(3)?,
        alert_threshold: row.get(4)?,
        enable_alerts: row.get(5)?,
        period: BudgetPeriod::new(month, row.get(7)?),
    })
}
