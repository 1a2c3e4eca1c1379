//! Per-device queues of cloud-to-device messages

use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Identifies the connection holding a lock
pub type SessionId = u64;

/// A message handed to a device and not yet completed
struct Locked {
    device_id: String,
    session: SessionId,
    /// Delivery order, used to requeue in the original order
    order: u64,
    payload: Bytes,
}

#[derive(Default)]
struct MailboxState {
    queues: HashMap<String, VecDeque<Bytes>>,
    /// lock token -> delivered message
    locked: HashMap<String, Locked>,
    next_lock: u64,
}

/// Shared store of device-bound messages
///
/// `lock_next` hands out the oldest message under a fresh lock token owned by
/// the calling session. `complete` removes it for good; `abandon_session`
/// puts every message that session still holds back at the front of its
/// device's queue.
#[derive(Clone, Default)]
pub struct Mailbox {
    state: Arc<Mutex<MailboxState>>,
    next_session: Arc<AtomicU64>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for a new connection
    pub fn register_session(&self) -> SessionId {
        self.next_session.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Queue a message for a device, returning the queue depth
    pub async fn enqueue(&self, device_id: &str, payload: Bytes) -> usize {
        let mut state = self.state.lock().await;
        let queue = state.queues.entry(device_id.to_string()).or_default();
        queue.push_back(payload);
        queue.len()
    }

    /// Lock the oldest queued message for `session`, returning its token and body
    pub async fn lock_next(&self, device_id: &str, session: SessionId) -> Option<(String, Bytes)> {
        let mut state = self.state.lock().await;
        let payload = state.queues.get_mut(device_id)?.pop_front()?;

        state.next_lock += 1;
        let order = state.next_lock;
        let token = format!("lock-{}", order);
        state.locked.insert(
            token.clone(),
            Locked {
                device_id: device_id.to_string(),
                session,
                order,
                payload: payload.clone(),
            },
        );

        Some((token, payload))
    }

    /// Remove a locked message; false if the token is unknown for this device
    pub async fn complete(&self, device_id: &str, token: &str) -> bool {
        let mut state = self.state.lock().await;
        let owned = state
            .locked
            .get(token)
            .is_some_and(|locked| locked.device_id == device_id);
        if owned {
            state.locked.remove(token);
        }
        owned
    }

    /// Requeue every message `session` still holds, returning how many
    pub async fn abandon_session(&self, session: SessionId) -> usize {
        let mut state = self.state.lock().await;

        let tokens: Vec<String> = state
            .locked
            .iter()
            .filter(|(_, locked)| locked.session == session)
            .map(|(token, _)| token.clone())
            .collect();

        let mut abandoned: Vec<Locked> = tokens
            .iter()
            .filter_map(|token| state.locked.remove(token))
            .collect();
        abandoned.sort_by_key(|locked| locked.order);

        let count = abandoned.len();
        for locked in abandoned.into_iter().rev() {
            state
                .queues
                .entry(locked.device_id)
                .or_default()
                .push_front(locked.payload);
        }
        count
    }

    /// Messages waiting (not locked) for a device
    pub async fn pending(&self, device_id: &str) -> usize {
        let state = self.state.lock().await;
        state.queues.get(device_id).map_or(0, VecDeque::len)
    }
}
