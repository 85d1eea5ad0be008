//! Turns approved candidates into persisted notifications.

use time::OffsetDateTime;

use crate::{
    Error,
    alert::{CandidateAlert, DedupWindow},
    notification::{NewNotification, NotificationRecord, NotificationStore},
    user::UserID,
};

/// Render and persist an approved `candidate` for `user_id`.
///
/// The notification is stamped with `now` and carries the `window` the
/// candidate was approved in.
///
/// # Errors
///
/// Returns [Error::DuplicateNotification] if the store rejected the insert
/// because another cycle recorded the same alert first. Any other failure is
/// returned as [Error::PersistenceFailure].
pub fn emit_notification(
    user_id: UserID,
    candidate: CandidateAlert,
    window: Option<DedupWindow>,
    now: OffsetDateTime,
    store: &dyn NotificationStore,
) -> Result<NotificationRecord, Error> {
    let notification = NewNotification {
        user_id,
        subject_key: candidate.subject_key,
        window,
        title: candidate.payload.title(),
        message: candidate.payload.message(),
        payload: candidate.payload,
        created_at: now,
    };

    match store.create_notification(notification) {
        Ok(record) => {
            tracing::info!(
                "sent {} notification {} to user {user_id}: {}",
                record.alert_type,
                record.id,
                record.title
            );
            Ok(record)
        }
        Err(Error::DuplicateNotification) => Err(Error::DuplicateNotification),
        Err(error) => Err(Error::PersistenceFailure(error.to_string())),
    }
}
