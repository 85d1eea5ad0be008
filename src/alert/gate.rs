//! Decides whether a candidate alert may be sent or repeats a recent one.

use time::OffsetDateTime;
use time_tz::Tz;

use crate::{
    alert::{CandidateAlert, DedupPolicy, DedupWindow},
    notification::NotificationStore,
};

/// The outcome of checking a candidate against the notification history.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// The candidate may be emitted. Carries the window it was approved in so
    /// the store can reject an insert that loses a race within that window.
    Approve(Option<DedupWindow>),
    /// The candidate must not be emitted.
    Suppress(SuppressReason),
}

/// Why a candidate was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// A notification of the same type and subject exists in the window.
    AlreadyNotified,
    /// The history could not be checked. Suppressing is preferred over risking
    /// a duplicate.
    QueryFailed,
}

/// Check `candidate` against the notifications sent within its dedup window.
///
/// Calendar windows are measured in `tz`.
///
/// Candidates under [DedupPolicy::CompletionFlag] are always approved, their
/// evaluator has already claimed the subject.
pub fn check_candidate(
    candidate: &CandidateAlert,
    policy: DedupPolicy,
    now: OffsetDateTime,
    tz: &Tz,
    store: &dyn NotificationStore,
) -> GateDecision {
    let alert_type = candidate.alert_type();

    let window = match policy.window(now, tz) {
        Ok(Some(window)) => window,
        Ok(None) => return GateDecision::Approve(None),
        Err(error) => {
            tracing::error!(
                "could not compute the dedup window for {alert_type} on subject {}: {error}",
                candidate.subject_key
            );
            return GateDecision::Suppress(SuppressReason::QueryFailed);
        }
    };

    match store.query_notifications(alert_type, candidate.subject_key, window.since) {
        Ok(existing) if existing.is_empty() => GateDecision::Approve(Some(window)),
        Ok(existing) => {
            tracing::debug!(
                "suppressing {alert_type} for subject {}, {} notification(s) since {}",
                candidate.subject_key,
                existing.len(),
                window.since
            );
            GateDecision::Suppress(SuppressReason::AlreadyNotified)
        }
        Err(error) => {
            tracing::error!(
                "could not query notification history for {alert_type} on subject {}: {error}",
                candidate.subject_key
            );
            GateDecision::Suppress(SuppressReason::QueryFailed)
        }
    }
}
