//! Defines the crate level error type.

/// The errors that may occur while reading the ledger, evaluating alerts and
/// persisting notifications.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The ledger could not supply a snapshot of the user's records.
    ///
    /// The whole evaluation cycle is abandoned when this happens. Nothing is
    /// emitted and the next trigger retries from scratch.
    #[error("ledger data unavailable: {0}")]
    DataUnavailable(String),

    /// A single condition evaluator failed.
    ///
    /// Only the candidates of the failing evaluator are skipped.
    #[error("evaluator \"{evaluator}\" failed: {reason}")]
    EvaluatorFailure {
        /// The name of the evaluator that failed.
        evaluator: &'static str,
        /// The error message of the underlying failure.
        reason: String,
    },

    /// The notification history could not be queried.
    ///
    /// The deduplication gate fails closed on this error and suppresses the
    /// candidate.
    #[error("could not query notification history: {0}")]
    DedupQueryFailure(String),

    /// An approved alert could not be written to the notification store.
    #[error("could not persist notification: {0}")]
    PersistenceFailure(String),

    /// A notification with the same type and subject already exists in the
    /// dedup window.
    ///
    /// Returned by the store when a racing insert loses to another one.
    #[error("a notification for this alert already exists in its window")]
    DuplicateNotification,

    /// A budget was given a limit that is zero or negative.
    #[error("{0} is not a valid budget limit, the limit must be greater than zero")]
    InvalidBudgetLimit(f64),

    /// A budget was given an alert threshold outside of (0, 100].
    #[error("{0} is not a valid alert threshold, it must be between 0 and 100")]
    InvalidAlertThreshold(f64),

    /// An expense was given an amount that is zero or negative.
    #[error("{0} is not a valid expense amount, the amount must be greater than zero")]
    InvalidExpenseAmount(f64),

    /// The month and year do not describe a representable calendar month.
    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    /// A budget for the category already exists in the same month.
    #[error("a budget for \"{0}\" already exists for this month")]
    DuplicateBudget(String),

    /// The alert type string read from the database is not recognised.
    #[error("unknown alert type \"{0}\"")]
    InvalidAlertType(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to mark a notification as read that does not exist.
    #[error("tried to update a notification that is not in the database")]
    UpdateMissingNotification,

    /// An error occurred while serializing or deserializing JSON.
    #[error("could not (de)serialize JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("notification.") =>
            {
                Error::DuplicateNotification
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONSerializationError(value.to_string())
    }
}
