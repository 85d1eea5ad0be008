//! Pushes unread notification counts to connected clients.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::user::UserID;

/// The number of events a slow subscriber may fall behind before it starts
/// missing them.
const CHANNEL_CAPACITY: usize = 64;

/// Sent whenever new notifications change a user's unread count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnreadCountChanged {
    pub user_id: UserID,
    pub unread_count: u64,
}

/// Broadcasts [UnreadCountChanged] events to any number of subscribers.
///
/// Publishing never blocks and never fails the caller, events sent while
/// nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct UnreadCountNotifier {
    sender: broadcast::Sender<UnreadCountChanged>,
}

impl Default for UnreadCountNotifier {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl UnreadCountNotifier {
    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<UnreadCountChanged> {
        self.sender.subscribe()
    }

    /// Send `event` to the current subscribers.
    pub fn publish(&self, event: UnreadCountChanged) {
        match self.sender.send(event) {
            Ok(receivers) => tracing::debug!(
                "published unread count {} for user {} to {receivers} subscriber(s)",
                event.unread_count,
                event.user_id
            ),
            Err(_) => tracing::debug!(
                "no subscribers for the unread count of user {}",
                event.user_id
            ),
        }
    }
}
