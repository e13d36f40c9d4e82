mod session_hub;

use chrono::{DateTime, Utc};

use crate::types::UserId;

pub use session_hub::SessionHub;

pub type SessionId = u64;

/// Proof that a user is signed in, handed explicitly to every operation that
/// acts on that user's behalf. Only a [`SessionHub`] can create one.
#[derive(Debug, PartialEq, Eq)]
pub struct Session {
    session_id: SessionId,
    user_id: UserId,
    signed_in_at: DateTime<Utc>
}

impl Session {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn signed_in_at(&self) -> DateTime<Utc> {
        self.signed_in_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn {
        session_id: SessionId,
        user_id: UserId
    },
    SignedOut {
        session_id: SessionId,
        user_id: UserId
    }
}
