//! Port for local wizard draft snapshots.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::domain::{ApplicationType, DraftSnapshot};

use super::define_port_error;

define_port_error! {
    /// Errors raised by draft store adapters.
    pub enum DraftStoreError {
        /// The backing storage could not be read or written.
        Io { message: String } => "draft storage failed: {message}",
        /// A stored snapshot could not be decoded.
        Corrupt { message: String } => "stored draft is unreadable: {message}",
    }
}

/// One snapshot slot per product. Saving replaces the previous snapshot.
#[cfg_attr(test, mockall::automock)]
pub trait DraftStore: Send + Sync {
    /// Snapshot for `kind`, if one was saved.
    ///
    /// # Errors
    ///
    /// Returns [`DraftStoreError`] when storage fails or the snapshot is
    /// unreadable.
    fn load(&self, kind: ApplicationType) -> Result<Option<DraftSnapshot>, DraftStoreError>;

    /// Replace the snapshot for the snapshot's product.
    ///
    /// # Errors
    ///
    /// Returns [`DraftStoreError`] when storage fails.
    fn save(&self, snapshot: &DraftSnapshot) -> Result<(), DraftStoreError>;

    /// Drop the snapshot for `kind`. Clearing an empty slot succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`DraftStoreError`] when storage fails.
    fn clear(&self, kind: ApplicationType) -> Result<(), DraftStoreError>;
}

/// Process-local draft store.
#[derive(Default)]
pub struct InMemoryDraftStore {
    slots: Mutex<HashMap<ApplicationType, DraftSnapshot>>,
}

impl InMemoryDraftStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for InMemoryDraftStore {
    fn load(&self, kind: ApplicationType) -> Result<Option<DraftSnapshot>, DraftStoreError> {
        Ok(self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned())
    }

    fn save(&self, snapshot: &DraftSnapshot) -> Result<(), DraftStoreError> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(snapshot.application_type(), snapshot.clone());
        Ok(())
    }

    fn clear(&self, kind: ApplicationType) -> Result<(), DraftStoreError> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&kind);
        Ok(())
    }
}
