//! Persisted notifications and the store interface used by the alert pipeline.

mod db;

pub use db::{
    SQLiteNotificationStore, count_unread, create_notification, create_notification_table,
    get_notifications, mark_all_notifications_read, mark_notification_read,
    query_notifications,
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    alert::{AlertPayload, AlertType, DedupWindow},
    database_id::DatabaseID,
    user::UserID,
};

/// An alert that has been sent to a user.
///
/// Records are never deleted or edited apart from the read flag, so they also
/// serve as the history that repeat alerts are checked against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: DatabaseID,
    pub user_id: UserID,
    pub alert_type: AlertType,
    pub subject_key: DatabaseID,
    /// The calendar window the alert was sent in, if its type uses one.
    pub window_bucket: Option<String>,
    pub title: String,
    pub message: String,
    pub payload: AlertPayload,
    /// When the notification was created, truncated to whole seconds.
    pub created_at: OffsetDateTime,
    pub is_read: bool,
}

/// The data needed to create a [NotificationRecord].
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: UserID,
    pub subject_key: DatabaseID,
    /// The dedup window the alert was approved in.
    ///
    /// When set, the store refuses to insert the notification if one with the
    /// same type and subject was created inside the window in the meantime.
    pub window: Option<DedupWindow>,
    pub title: String,
    pub message: String,
    pub payload: AlertPayload,
    pub created_at: OffsetDateTime,
}

impl NewNotification {
    pub fn alert_type(&self) -> AlertType {
        self.payload.alert_type()
    }
}

/// Reads and writes the notification history.
///
/// Stores are shared with the threads that run evaluators.
pub trait NotificationStore: Send + Sync {
    /// Get the notifications of `alert_type` about `subject_key` created at or after `since`.
    fn query_notifications(
        &self,
        alert_type: AlertType,
        subject_key: DatabaseID,
        since: OffsetDateTime,
    ) -> Result<Vec<NotificationRecord>, Error>;

    /// Save a notification.
    ///
    /// # Errors
    ///
    /// Implementations that enforce window uniqueness return
    /// [Error::DuplicateNotification] if a notification of the same type and
    /// subject already exists within `notification.window`.
    fn create_notification(&self, notification: NewNotification)
    -> Result<NotificationRecord, Error>;

    /// Mark a savings goal as completed.
    ///
    /// Returns `true` only if this call changed the flag from false to true.
    fn mark_goal_completed(&self, goal_id: DatabaseID) -> Result<bool, Error>;

    /// The number of unread notifications the user has.
    fn count_unread(&self, user_id: UserID) -> Result<u64, Error>;

    /// Whether [NotificationStore::create_notification] atomically rejects
    /// duplicates within a window.
    ///
    /// Stores that return `false` may record the same alert twice when two
    /// cycles for the same user overlap.
    fn enforces_window_uniqueness(&self) -> bool {
        false
    }
}
