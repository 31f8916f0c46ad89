//! Port for the persisted session plus change notifications.
//!
//! The store is synchronous: reads and writes are small and happen between
//! awaits, never while a request is in flight. Every mutation is broadcast so
//! the gateway, the stores and the CLI observe logins, refreshes and expiry
//! without polling each other.

use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::domain::{ClearReason, Session, SessionChange, User};

use super::define_port_error;

/// Buffered notifications per subscriber before old ones are dropped.
pub const SESSION_CHANNEL_CAPACITY: usize = 16;

/// Broadcast `change` to every subscriber. Nobody listening is not an error.
pub(crate) fn publish_change(changes: &broadcast::Sender<SessionChange>, change: SessionChange) {
    match changes.send(change) {
        Ok(receivers) => trace!(receivers, "session change published"),
        Err(_) => trace!("session change had no subscribers"),
    }
}

define_port_error! {
    /// Errors raised by session store adapters.
    pub enum SessionStoreError {
        /// The backing storage could not be written.
        Io { message: String } => "session storage failed: {message}",
        /// The session could not be encoded.
        Encode { message: String } => "session could not be encoded: {message}",
    }
}

/// Persisted session with change notifications. Last write wins.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    /// Current session, if any. Unreadable storage reads as signed out.
    fn load(&self) -> Option<Session>;

    /// Persist `session` and broadcast [`SessionChange::Updated`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError`] when the session cannot be stored.
    fn save(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Remove the session and broadcast [`SessionChange::Cleared`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError`] when the storage cannot be cleared.
    fn clear(&self, reason: ClearReason) -> Result<(), SessionStoreError>;

    /// Receiver for subsequent changes.
    fn subscribe(&self) -> broadcast::Receiver<SessionChange>;

    /// Store a fresh token pair for `user`.
    ///
    /// # Errors
    ///
    /// See [`SessionStore::save`].
    fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
        user: &User,
    ) -> Result<(), SessionStoreError> {
        self.save(&Session::new(access_token, refresh_token, user.clone()))
    }
}

/// Run `callback` for every session change until the store goes away.
///
/// Changes made by this process and changes detected in other processes
/// both arrive here. Must be called from within a Tokio runtime.
pub fn initialize_session_sync<F>(store: &dyn SessionStore, mut callback: F) -> JoinHandle<()>
where
    F: FnMut(SessionChange) + Send + 'static,
{
    let mut changes = store.subscribe();
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => callback(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "session subscriber lagged; treating as external change");
                    callback(SessionChange::External);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("session store dropped; stopping sync");
                    break;
                }
            }
        }
    })
}

/// Process-local session store for tests and ephemeral runs.
pub struct InMemorySessionStore {
    session: Mutex<Option<Session>>,
    changes: broadcast::Sender<SessionChange>,
}

impl InMemorySessionStore {
    /// Empty store.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(SESSION_CHANNEL_CAPACITY);
        Self {
            session: Mutex::new(None),
            changes,
        }
    }

    /// Store pre-populated with `session`.
    pub fn with_session(session: Session) -> Self {
        let store = Self::new();
        *store.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session);
        store
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        publish_change(&self.changes, SessionChange::Updated(session.clone()));
        Ok(())
    }

    fn clear(&self, reason: ClearReason) -> Result<(), SessionStoreError> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        publish_change(&self.changes, SessionChange::Cleared(reason));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }
}
