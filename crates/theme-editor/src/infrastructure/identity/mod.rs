//! Local identity backends.
//!
//! - [`LocalSessions`]: an in-process session holder.  The CLI signs in as the
//!   identity given with `--as`; tests drive sign-in and sign-out directly.
//! - [`ProfileTable`]: identity → role string, read from `[profiles]` in the
//!   app config.
//!
//! Hosted deployments would put their auth service and profile database
//! behind the same two traits.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::info;

use crate::application::access_gate::{
    IdentityError, IdentityId, IdentityProvider, RoleLookup, Session, SessionEvent,
};

/// Capacity of the session event channel.  Slow subscribers that fall further
/// behind re-read the current session.
const SESSION_EVENT_CAPACITY: usize = 32;

// ── LocalSessions ─────────────────────────────────────────────────────────────

/// Holds at most one session and broadcasts every change.
pub struct LocalSessions {
    current: Mutex<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl LocalSessions {
    /// Starts signed out.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            current: Mutex::new(None),
            events,
        }
    }

    /// Starts signed in as `identity`.
    pub fn signed_in(identity: IdentityId) -> Self {
        let sessions = Self::new();
        *sessions.lock_current() = Some(Session::new(identity));
        sessions
    }

    /// Replaces the session with a fresh one for `identity`.
    pub fn sign_in(&self, identity: IdentityId) -> Session {
        let session = Session::new(identity);
        info!("signed in as {}", session.identity);
        *self.lock_current() = Some(session.clone());
        let _ = self.events.send(SessionEvent::SignedIn(session.clone()));
        session
    }

    pub fn sign_out(&self) {
        if self.lock_current().take().is_some() {
            info!("signed out");
            let _ = self.events.send(SessionEvent::SignedOut);
        }
    }

    /// Reissues the token for the current identity.  `None` when signed out.
    pub fn refresh(&self) -> Option<Session> {
        let mut current = self.lock_current();
        let identity = current.as_ref()?.identity.clone();
        let session = Session::new(identity);
        *current = Some(session.clone());
        drop(current);
        let _ = self.events.send(SessionEvent::TokenRefreshed(session.clone()));
        Some(session)
    }

    pub fn current(&self) -> Option<Session> {
        self.lock_current().clone()
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<Session>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LocalSessions {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for LocalSessions {
    async fn current_session(&self) -> Result<Option<Session>, IdentityError> {
        Ok(self.current())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

// ── ProfileTable ──────────────────────────────────────────────────────────────

/// A fixed identity → role map.
#[derive(Debug, Clone, Default)]
pub struct ProfileTable {
    roles: HashMap<IdentityId, String>,
}

impl ProfileTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            roles: entries
                .into_iter()
                .map(|(id, role)| (IdentityId::new(id), role.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

#[async_trait]
impl RoleLookup for ProfileTable {
    async fn role_for(&self, identity: &IdentityId) -> Result<Option<String>, IdentityError> {
        Ok(self.roles.get(identity).cloned())
    }
}
