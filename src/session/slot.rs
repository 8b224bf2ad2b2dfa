use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{AvatarError, Result};

/// The current session identifier, shared between the send path and the stream.
///
/// An empty string means no session is active. The slot can only be filled by
/// [`SessionSlot::open`], which hands out the single [`SessionLease`] for that
/// session; only the lease holder can clear it again.
#[derive(Debug, Clone)]
pub struct SessionSlot {
    current: Arc<watch::Sender<String>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        let (current, _) = watch::channel(String::new());
        Self {
            current: Arc::new(current),
        }
    }

    /// Current session id (empty when idle)
    pub fn current(&self) -> String {
        self.current.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        !self.current.borrow().is_empty()
    }

    /// Watch the session id change
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.current.subscribe()
    }

    /// Claim the slot for a new session
    pub fn open(&self, session_id: &str) -> Result<SessionLease> {
        if session_id.is_empty() {
            return Err(AvatarError::ProtocolViolation(
                "Cannot open a session with an empty id".to_string(),
            ));
        }

        let mut busy_with = None;
        self.current.send_if_modified(|current| {
            if current.is_empty() {
                *current = session_id.to_string();
                true
            } else {
                busy_with = Some(current.clone());
                false
            }
        });

        if let Some(active) = busy_with {
            return Err(AvatarError::SessionBusy(active));
        }

        info!("Session opened: {}", session_id);

        Ok(SessionLease {
            slot: self.clone(),
            session_id: session_id.to_string(),
        })
    }

    fn clear(&self, session_id: &str) -> bool {
        let cleared = self.current.send_if_modified(|current| {
            if current == session_id {
                current.clear();
                true
            } else {
                false
            }
        });

        if cleared {
            info!("Session closed: {}", session_id);
        } else {
            debug!("Session {} was not the active session", session_id);
        }

        cleared
    }
}

impl Default for SessionSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of ownership of the active session.
///
/// Dropping a lease without releasing it leaves the slot untouched; a torn-down
/// view abandons its session rather than closing it.
#[derive(Debug)]
pub struct SessionLease {
    slot: SessionSlot,
    session_id: String,
}

impl SessionLease {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Clear the slot; called on stream exhaustion or an unrecoverable error
    pub(crate) fn release(&self) -> bool {
        self.slot.clear(&self.session_id)
    }
}
