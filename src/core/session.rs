//! Authenticated session and its holder
//!
//! A `Session` is produced by the external auth service (login or code
//! verification) and consumed read-only by every gated component. The
//! `SessionContext` is the single owner of the live session; nothing else
//! reads ambient storage.

use serde::{Deserialize, Serialize};

/// An authenticated identity plus its backend credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Backend subject/account identifier
    pub subject_id: String,
    /// Display name for greeting output
    pub display_name: String,
    /// Account email
    pub email: String,
    /// Bearer credential attached to every gateway call
    pub credential: String,
}

impl Session {
    pub fn new(
        subject_id: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            display_name: display_name.into(),
            email: email.into(),
            credential: credential.into(),
        }
    }
}

/// Holder of the current session, passed by reference into components.
///
/// Lifecycle (set on login/verify, clear on logout) is driven by the CLI auth
/// commands; the workflow and quota monitor only ever borrow.
#[derive(Debug, Default)]
pub struct SessionContext {
    session: Option<Session>,
}

impl SessionContext {
    pub fn new(session: Option<Session>) -> Self {
        Self { session }
    }

    /// Borrow the current session, if any.
    pub fn get(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Replace the current session.
    pub fn set(&mut self, session: Session) {
        self.session = Some(session);
    }

    /// Drop the current session (logout).
    pub fn clear(&mut self) {
        self.session = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Session {
        Session::new("696fbb2f", "Acme Corp", "ops@acme.test", "jwt-token")
    }

    #[test]
    fn test_context_lifecycle() {
        let mut ctx = SessionContext::default();
        assert!(!ctx.is_authenticated());
        assert!(ctx.get().is_none());

        ctx.set(sample());
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.get().unwrap().subject_id, "696fbb2f");

        ctx.clear();
        assert!(ctx.get().is_none());
    }

    #[test]
    fn test_session_roundtrip_json() {
        let session = sample();
        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
