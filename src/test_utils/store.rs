use std::{collections::HashSet, sync::Mutex};

use time::OffsetDateTime;

use crate::{
    Error,
    alert::AlertType,
    database_id::DatabaseID,
    notification::{NewNotification, NotificationRecord, NotificationStore},
    user::UserID,
};

/// An in-memory [NotificationStore] that records everything it is asked to save.
///
/// Unlike the SQLite store it does not reject duplicates on insert, so tests
/// can observe exactly what the gate let through.
#[derive(Debug, Default)]
pub(crate) struct FakeNotificationStore {
    notifications: Mutex<Vec<NotificationRecord>>,
    completed_goals: Mutex<HashSet<DatabaseID>>,
    fail_queries: bool,
    fail_creates: bool,
    fail_goal_updates: bool,
}

impl FakeNotificationStore {
    /// Make every history query return an error.
    pub(crate) fn fail_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    /// Make every insert return an error.
    pub(crate) fn fail_creates(mut self) -> Self {
        self.fail_creates = true;
        self
    }

    /// Make every goal completion update return an error.
    pub(crate) fn fail_goal_updates(mut self) -> Self {
        self.fail_goal_updates = true;
        self
    }

    /// Every notification saved so far, oldest first.
    pub(crate) fn notifications(&self) -> Vec<NotificationRecord> {
        self.notifications.lock().unwrap().clone()
    }

    /// The notifications of one type saved so far, oldest first.
    pub(crate) fn notifications_of_type(&self, alert_type: AlertType) -> Vec<NotificationRecord> {
        self.notifications()
            .into_iter()
            .filter(|notification| notification.alert_type == alert_type)
            .collect()
    }
}

impl NotificationStore for FakeNotificationStore {
    fn query_notifications(
        &self,
        alert_type: AlertType,
        subject_key: DatabaseID,
        since: OffsetDateTime,
    ) -> Result<Vec<NotificationRecord>, Error> {
        if self.fail_queries {
            return Err(Error::DatabaseLockError);
        }

        Ok(self
            .notifications()
            .into_iter()
            .filter(|notification| {
                notification.alert_type == alert_type
                    && notification.subject_key == subject_key
                    && notification.created_at >= since
            })
            .collect())
    }

    fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<NotificationRecord, Error> {
        if self.fail_creates {
            return Err(Error::DatabaseLockError);
        }

        let mut notifications = self.notifications.lock().unwrap();
        let record = NotificationRecord {
            id: notifications.len() as DatabaseID + 1,
            user_id: notification.user_id,
            alert_type: notification.alert_type(),
            subject_key: notification.subject_key,
            window_bucket: notification.window.and_then(|window| window.bucket),
            title: notification.title,
            message: notification.message,
            payload: notification.payload,
            created_at: notification.created_at,
            is_read: false,
        };
        notifications.push(record.clone());

        Ok(record)
    }

    fn mark_goal_completed(&self, goal_id: DatabaseID) -> Result<bool, Error> {
        if self.fail_goal_updates {
            return Err(Error::DatabaseLockError);
        }

        Ok(self.completed_goals.lock().unwrap().insert(goal_id))
    }

    fn count_unread(&self, user_id: UserID) -> Result<u64, Error> {
        Ok(self
            .notifications()
            .iter()
            .filter(|notification| notification.user_id == user_id && !notification.is_read)
            .count() as u64)
    }
}
