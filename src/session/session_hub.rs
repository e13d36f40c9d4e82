use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use crate::session::{AuthEvent, Session, SessionId};
use crate::types::UserId;

const CHANNEL_CAPACITY: usize = 64;

/// Issues sessions for users the external identity provider has already
/// authenticated, and announces every sign-in and sign-out to subscribers.
pub struct SessionHub {
    sender: broadcast::Sender<AuthEvent>,
    next_session_id: AtomicU64,
    active: DashMap<SessionId, UserId>
}

impl SessionHub {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    /// `capacity` bounds how far a slow subscriber may fall behind before it
    /// starts missing events.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);

        Self {
            sender,
            next_session_id: AtomicU64::new(1),
            active: DashMap::new()
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    pub fn sign_in(&self, user_id: &str) -> Session {
        self.sign_in_at(user_id, Utc::now())
    }

    pub fn sign_in_at(&self, user_id: &str, signed_in_at: DateTime<Utc>) -> Session {
        let session_id = self.next_session_id.fetch_add(1, Ordering::SeqCst);
        self.active.insert(session_id, user_id.to_string());

        self.publish(AuthEvent::SignedIn { session_id, user_id: user_id.to_string() });

        Session {
            session_id,
            user_id: user_id.to_string(),
            signed_in_at
        }
    }

    /// Ends the session. Returns `false` if it had already been ended.
    pub fn sign_out(&self, session: Session) -> bool {
        if self.active.remove(&session.session_id).is_none() {
            return false;
        }

        self.publish(AuthEvent::SignedOut { session_id: session.session_id, user_id: session.user_id });

        true
    }

    pub fn is_active(&self, session: &Session) -> bool {
        self.active.contains_key(&session.session_id)
    }

    pub fn active_sessions(&self) -> usize {
        self.active.len()
    }

    fn publish(&self, event: AuthEvent) {
        if self.sender.send(event).is_err() {
            debug!("No subscribers for auth events");
        }
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}
