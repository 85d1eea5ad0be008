//! Database operations for notifications.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, Row, types::Type};
use time::OffsetDateTime;

use crate::{
    Error,
    alert::{AlertPayload, AlertType},
    database_id::DatabaseID,
    db::lock_connection,
    ledger::mark_goal_completed,
    notification::{NewNotification, NotificationRecord, NotificationStore},
    user::UserID,
};

const SELECT_COLUMNS: &str = "SELECT id, user_id, type, subject_key, window_bucket, title, message, payload, created_at, is_read
    FROM notification";

/// Save a notification and return it with its generated ID.
///
/// If the notification has a dedup window, the existence check and the insert
/// happen in a single statement, and the unique index on
/// (type, subject_key, window_bucket) rejects a second notification for the
/// same calendar window. Either way a losing insert fails with
/// [Error::DuplicateNotification] instead of silently creating a duplicate.
pub fn create_notification(
    notification: NewNotification,
    connection: &Connection,
) -> Result<NotificationRecord, Error> {
    let alert_type = notification.alert_type();
    let payload = serde_json::to_string(&notification.payload)?;
    let created_at = notification.created_at.unix_timestamp();
    let window_bucket = notification
        .window
        .as_ref()
        .and_then(|window| window.bucket.clone());

    let rows_affected = match &notification.window {
        Some(window) => connection.execute(
            "INSERT INTO notification (user_id, type, subject_key, window_bucket, title, message, payload, created_at)
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
            WHERE NOT EXISTS (
                SELECT 1 FROM notification
                WHERE type = ?2 AND subject_key = ?3 AND created_at >= ?9
            )",
            (
                notification.user_id.as_i64(),
                alert_type.as_str(),
                notification.subject_key,
                &window_bucket,
                &notification.title,
                &notification.message,
                &payload,
                created_at,
                window.since.unix_timestamp(),
            ),
        )?,
        None => connection.execute(
            "INSERT INTO notification (user_id, type, subject_key, window_bucket, title, message, payload, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            (
                notification.user_id.as_i64(),
                alert_type.as_str(),
                notification.subject_key,
                &window_bucket,
                &notification.title,
                &notification.message,
                &payload,
                created_at,
            ),
        )?,
    };

    if rows_affected == 0 {
        return Err(Error::DuplicateNotification);
    }

    Ok(NotificationRecord {
        id: connection.last_insert_rowid(),
        user_id: notification.user_id,
        alert_type,
        subject_key: notification.subject_key,
        window_bucket,
        title: notification.title,
        message: notification.message,
        payload: notification.payload,
        created_at: timestamp_to_datetime(created_at)?,
        is_read: false,
    })
}

/// Get the notifications of `alert_type` about `subject_key` created at or after `since`, oldest first.
pub fn query_notifications(
    alert_type: AlertType,
    subject_key: DatabaseID,
    since: OffsetDateTime,
    connection: &Connection,
) -> Result<Vec<NotificationRecord>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_COLUMNS}
            WHERE type = ?1 AND subject_key = ?2 AND created_at >= ?3
            ORDER BY created_at ASC, id ASC"
        ))?
        .query_map(
            (alert_type.as_str(), subject_key, since.unix_timestamp()),
            map_row,
        )?
        .map(|maybe_notification| maybe_notification.map_err(|error| error.into()))
        .collect()
}

/// Get up to `limit` of the user's most recent notifications, newest first.
pub fn get_notifications(
    user_id: UserID,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<NotificationRecord>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_COLUMNS}
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2"
        ))?
        .query_map((user_id.as_i64(), limit), map_row)?
        .map(|maybe_notification| maybe_notification.map_err(|error| error.into()))
        .collect()
}

/// Count the user's unread notifications.
pub fn count_unread(user_id: UserID, connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row(
            "SELECT COUNT(*) FROM notification WHERE user_id = ?1 AND is_read = 0",
            (user_id.as_i64(),),
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count as u64)
        .map_err(|error| error.into())
}

/// Mark a single notification as read.
///
/// # Errors
///
/// Returns [Error::UpdateMissingNotification] if there is no notification with `id`.
pub fn mark_notification_read(id: DatabaseID, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("UPDATE notification SET is_read = 1 WHERE id = ?1", (id,))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingNotification);
    }

    Ok(())
}

/// Mark all of the user's notifications as read, returning how many were unread.
pub fn mark_all_notifications_read(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE notification SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
            (user_id.as_i64(),),
        )
        .map_err(|error| error.into())
}

/// Initialize the notification table and indexes.
pub fn create_notification_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS notification (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            type TEXT NOT NULL,
            subject_key INTEGER NOT NULL,
            window_bucket TEXT,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            payload TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            is_read INTEGER NOT NULL DEFAULT 0
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_notification_window
            ON notification(type, subject_key, window_bucket);
        CREATE INDEX IF NOT EXISTS idx_notification_subject
            ON notification(type, subject_key, created_at);
        CREATE INDEX IF NOT EXISTS idx_notification_unread
            ON notification(user_id, is_read);",
    )?;

    Ok(())
}

fn timestamp_to_datetime(timestamp: i64) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|error| Error::InvalidPeriod(format!("timestamp {timestamp}: {error}")))
}

fn map_row(row: &Row) -> Result<NotificationRecord, rusqlite::Error> {
    let raw_type: String = row.get(2)?;
    let alert_type = AlertType::from_str(&raw_type)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error)))?;

    let raw_payload: String = row.get(7)?;
    let payload: AlertPayload = serde_json::from_str(&raw_payload)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(error)))?;

    let raw_created_at: i64 = row.get(8)?;
    let created_at = OffsetDateTime::from_unix_timestamp(raw_created_at).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(8, Type::Integer, Box::new(error))
    })?;

    Ok(NotificationRecord {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        alert_type,
        subject_key: row.get(3)?,
        window_bucket: row.get(4)?,
        title: row.get(5)?,
        message: row.get(6)?,
        payload,
        created_at,
        is_read: row.get(9)?,
    })
}

/// A [NotificationStore] backed by the application's SQLite database.
///
/// Goal completion flags live in the same database, so the store also
/// performs the compare-and-set on them.
#[derive(Debug, Clone)]
pub struct SQLiteNotificationStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteNotificationStore {
    /// Create a new store from the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl NotificationStore for SQLiteNotificationStore {
    fn query_notifications(
        &self,
        alert_type: AlertType,
        subject_key: DatabaseID,
        since: OffsetDateTime,
    ) -> Result<Vec<NotificationRecord>, Error> {
        let connection = lock_connection(&self.connection)?;
        query_notifications(alert_type, subject_key, since, &connection)
    }

    fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<NotificationRecord, Error> {
        let connection = lock_connection(&self.connection)?;
        create_notification(notification, &connection)
    }

    fn mark_goal_completed(&self, goal_id: DatabaseID) -> Result<bool, Error> {
        let connection = lock_connection(&self.connection)?;
        mark_goal_completed(goal_id, &connection)
    }

    fn count_unread(&self, user_id: UserID) -> Result<u64, Error> {
        let connection = lock_connection(&self.connection)?;
        count_unread(user_id, &connection)
    }

    fn enforces_window_uniqueness(&self) -> bool {
        true
    }
}
