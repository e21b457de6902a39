//! AccessGate: decides whether the current session may edit the site.
//!
//! The gate observes the identity provider's session stream and, for every
//! identity it sees, asks the profile backend for that identity's role.  The
//! answer is published as a [`Privilege`] on a watch channel:
//!
//! ```text
//!  session event ──► identity changed? ──► publish Unknown
//!                                          spawn role lookup (generation n)
//!  lookup result ──► generation still n? ──► publish Granted / Denied
//!                                     no ──► drop it
//! ```
//!
//! # Fail-closed rules (for beginners)
//!
//! - No session: `Denied`, without a lookup.
//! - No profile record for the identity: `Denied`.
//! - Profile lookup error: `Denied`, logged at `warn`.
//! - Still resolving: `Unknown`, which every consumer treats as `Denied`.
//!
//! The gate subscribes to session events *before* it queries the current
//! session, so a change landing between the two is never missed.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use theme_core::{Privilege, RolePolicy};
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ── Identity types ────────────────────────────────────────────────────────────

/// Stable identifier of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique per sign-in; changes when the token is reissued.
    pub id: Uuid,
    pub identity: IdentityId,
}

impl Session {
    /// Creates a session with a fresh random id.
    pub fn new(identity: IdentityId) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
        }
    }
}

/// Session change notifications emitted by an [`IdentityProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
    /// Same identity, new token.
    TokenRefreshed(Session),
}

impl SessionEvent {
    fn identity(&self) -> Option<&IdentityId> {
        match self {
            SessionEvent::SignedIn(s) | SessionEvent::TokenRefreshed(s) => Some(&s.identity),
            SessionEvent::SignedOut => None,
        }
    }
}

/// Error type for identity and profile lookups.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The identity service could not be reached.
    #[error("identity service unavailable: {0}")]
    Unavailable(String),

    /// The profile store returned an error for this identity.
    #[error("profile lookup failed for {identity}: {reason}")]
    Lookup { identity: IdentityId, reason: String },
}

/// The authentication backend.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The session as of now, `None` when signed out.
    async fn current_session(&self) -> Result<Option<Session>, IdentityError>;

    /// Subscribes to future session changes.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// The profile backend: maps an identity to its free-form role string.
#[async_trait]
pub trait RoleLookup: Send + Sync {
    /// Returns `Ok(None)` when the identity has no profile record.
    async fn role_for(&self, identity: &IdentityId) -> Result<Option<String>, IdentityError>;
}

/// Resolves the privilege of one (possibly absent) identity.
pub async fn resolve_privilege(
    identity: Option<&IdentityId>,
    roles: &dyn RoleLookup,
    policy: &RolePolicy,
) -> Privilege {
    let Some(identity) = identity else {
        return Privilege::Denied;
    };
    match roles.role_for(identity).await {
        Ok(role) => {
            let classified = policy.classify(role.as_deref());
            debug!("identity {identity}: role {role:?} classified as {classified}");
            Privilege::from(classified)
        }
        Err(e) => {
            warn!("identity {identity}: {e}; denying edit access");
            Privilege::Denied
        }
    }
}

// ── AccessGate ────────────────────────────────────────────────────────────────

/// Publication side shared between the gate handle and its worker.
struct Publisher {
    tx: watch::Sender<Privilege>,
    active: AtomicBool,
}

impl Publisher {
    /// Publishes `privilege` unless the gate was deactivated.
    ///
    /// The active check runs under the channel's write lock, so nothing can
    /// land after the `Denied` written by [`AccessGate::deactivate`].
    fn publish(&self, privilege: Privilege) {
        self.tx.send_if_modified(|current| {
            if !self.active.load(Ordering::Acquire) || *current == privilege {
                return false;
            }
            *current = privilege;
            true
        });
    }
}

/// Live privilege of the current session.
///
/// Dropping the gate stops the background observer.
pub struct AccessGate {
    publisher: Arc<Publisher>,
    worker: JoinHandle<()>,
}

impl AccessGate {
    /// Starts observing `identity`.  Must be called inside a tokio runtime.
    pub fn activate(
        identity: Arc<dyn IdentityProvider>,
        roles: Arc<dyn RoleLookup>,
        policy: RolePolicy,
    ) -> Self {
        let (tx, _rx) = watch::channel(Privilege::Unknown);
        let publisher = Arc::new(Publisher {
            tx,
            active: AtomicBool::new(true),
        });

        let events = identity.subscribe();
        let worker = GateWorker::new(Arc::clone(&publisher), roles, policy);
        let handle = tokio::spawn(worker.run(identity, events));

        Self {
            publisher,
            worker: handle,
        }
    }

    /// The current privilege.  `Unknown` until the first resolution.
    pub fn privilege(&self) -> Privilege {
        *self.publisher.tx.borrow()
    }

    /// A receiver notified on every privilege change.
    pub fn subscribe(&self) -> watch::Receiver<Privilege> {
        self.publisher.tx.subscribe()
    }

    /// Waits until the privilege is resolved and returns it.
    pub async fn resolved(&self) -> Privilege {
        let mut rx = self.subscribe();
        let resolved = rx.wait_for(|p| p.is_resolved()).await.map(|p| *p);
        resolved.unwrap_or(Privilege::Denied)
    }

    /// Stops observing and publishes `Denied`.
    pub fn deactivate(&self) {
        self.publisher.active.store(false, Ordering::Release);
        self.publisher.tx.send_replace(Privilege::Denied);
        self.worker.abort();
        debug!("access gate deactivated");
    }

    pub fn is_active(&self) -> bool {
        self.publisher.active.load(Ordering::Acquire)
    }
}

impl Drop for AccessGate {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

struct GateWorker {
    publisher: Arc<Publisher>,
    roles: Arc<dyn RoleLookup>,
    policy: Arc<RolePolicy>,
    /// `None` until the first identity has been observed.
    observed: Option<Option<IdentityId>>,
    generation: u64,
    results_tx: mpsc::UnboundedSender<(u64, Privilege)>,
    results_rx: mpsc::UnboundedReceiver<(u64, Privilege)>,
    inflight: Option<JoinHandle<()>>,
}

impl GateWorker {
    fn new(publisher: Arc<Publisher>, roles: Arc<dyn RoleLookup>, policy: RolePolicy) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            publisher,
            roles,
            policy: Arc::new(policy),
            observed: None,
            generation: 0,
            results_tx,
            results_rx,
            inflight: None,
        }
    }

    async fn run(
        mut self,
        identity: Arc<dyn IdentityProvider>,
        mut events: broadcast::Receiver<SessionEvent>,
    ) {
        self.query_current(identity.as_ref()).await;

        let mut events_open = true;
        loop {
            tokio::select! {
                event = events.recv(), if events_open => match event {
                    Ok(event) => {
                        debug!("session event: {event:?}");
                        self.observe(event.identity().cloned());
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("missed {skipped} session events; re-reading current session");
                        self.query_current(identity.as_ref()).await;
                    }
                    Err(RecvError::Closed) => {
                        debug!("session event stream closed");
                        events_open = false;
                    }
                },
                Some((generation, privilege)) = self.results_rx.recv() => {
                    if generation == self.generation {
                        self.inflight = None;
                        info!("edit privilege resolved: {privilege:?}");
                        self.publisher.publish(privilege);
                    } else {
                        debug!("dropping stale privilege result (generation {generation})");
                    }
                }
            }

            if !events_open && self.inflight.is_none() {
                break;
            }
        }
    }

    async fn query_current(&mut self, identity: &dyn IdentityProvider) {
        let session = match identity.current_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("could not read current session: {e}; treating as signed out");
                None
            }
        };
        self.observe(session.map(|s| s.identity));
    }

    /// Reacts to the latest known identity.
    ///
    /// A different identity resets the privilege to `Unknown` and starts a new
    /// lookup.  The same identity re-runs the lookup in the background while
    /// the published privilege stays as it is.
    fn observe(&mut self, identity: Option<IdentityId>) {
        let changed = self.observed.as_ref() != Some(&identity);
        self.observed = Some(identity.clone());

        self.generation += 1;
        if let Some(previous) = self.inflight.take() {
            previous.abort();
        }

        let Some(identity) = identity else {
            info!("no session; edit privilege denied");
            self.publisher.publish(Privilege::Denied);
            return;
        };

        if changed {
            info!("resolving edit privilege for {identity}");
            self.publisher.publish(Privilege::Unknown);
        }

        let generation = self.generation;
        let roles = Arc::clone(&self.roles);
        let policy = Arc::clone(&self.policy);
        let results = self.results_tx.clone();
        self.inflight = Some(tokio::spawn(async move {
            let privilege = resolve_privilege(Some(&identity), roles.as_ref(), &policy).await;
            let _ = results.send((generation, privilege));
        }));
    }
}

impl Drop for GateWorker {
    fn drop(&mut self) {
        if let Some(inflight) = self.inflight.take() {
            inflight.abort();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
