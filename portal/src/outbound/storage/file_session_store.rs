//! File-backed [`SessionStore`] with cross-process change detection.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::state_dir::{StateDir, fingerprint};
use crate::domain::ports::{
    SESSION_CHANNEL_CAPACITY, SessionStore, SessionStoreError, publish_change,
};
use crate::domain::{ClearReason, Session, SessionChange};

const SESSION_FILE: &str = "session.json";

/// Session persisted as `session.json` in the state directory.
///
/// Another process sharing the directory shows up as
/// [`SessionChange::External`] once [`FileSessionStore::spawn_watcher`] is
/// running.
pub struct FileSessionStore {
    dir: StateDir,
    changes: broadcast::Sender<SessionChange>,
    /// Fingerprint of the file as this process last wrote or saw it.
    seen: Mutex<Option<String>>,
}

impl FileSessionStore {
    /// Open the store rooted at `state_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::Io`] when the directory cannot be opened.
    pub fn open(state_dir: &Utf8Path) -> Result<Self, SessionStoreError> {
        let dir =
            StateDir::open(state_dir).map_err(|err| SessionStoreError::io(err.to_string()))?;
        let seen = dir.fingerprint(SESSION_FILE);
        let (changes, _) = broadcast::channel(SESSION_CHANNEL_CAPACITY);
        Ok(Self {
            dir,
            changes,
            seen: Mutex::new(seen),
        })
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> Utf8PathBuf {
        self.dir.path_of(SESSION_FILE)
    }

    fn remember(&self, fingerprint: Option<String>) {
        *self.seen.lock().unwrap_or_else(PoisonError::into_inner) = fingerprint;
    }

    /// Compare the file against what this process last saw and broadcast
    /// [`SessionChange::External`] when it differs.
    pub fn detect_external_change(&self) -> bool {
        let current = self.dir.fingerprint(SESSION_FILE);
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        if *seen == current {
            return false;
        }
        *seen = current;
        drop(seen);
        debug!(path = %self.path(), "session changed by another process");
        publish_change(&self.changes, SessionChange::External);
        true
    }

    /// Poll for external changes every `poll` until the store is dropped.
    pub fn spawn_watcher(self: &Arc<Self>, poll: Duration) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                store.detect_external_change();
            }
        })
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<Session> {
        let bytes = match self.dir.read(SESSION_FILE) {
            Ok(bytes) => bytes?,
            Err(err) => {
                warn!(path = %self.path(), error = %err, "session file unreadable");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(
                    path = %self.path(),
                    error = %err,
                    "session file corrupt; treating as signed out"
                );
                None
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        let bytes = serde_json::to_vec_pretty(session)
            .map_err(|err| SessionStoreError::encode(err.to_string()))?;
        self.dir
            .write_atomically(SESSION_FILE, &bytes)
            .map_err(|err| SessionStoreError::io(err.to_string()))?;
        self.remember(Some(fingerprint(&bytes)));
        publish_change(&self.changes, SessionChange::Updated(session.clone()));
        Ok(())
    }

    fn clear(&self, reason: ClearReason) -> Result<(), SessionStoreError> {
        self.dir
            .remove(SESSION_FILE)
            .map_err(|err| SessionStoreError::io(err.to_string()))?;
        self.remember(None);
        debug!(?reason, "session cleared");
        publish_change(&self.changes, SessionChange::Cleared(reason));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }
}
