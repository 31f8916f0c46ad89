//! File-backed [`DraftStore`]: one JSON snapshot per product.

use camino::Utf8Path;
use tracing::debug;

use super::state_dir::StateDir;
use crate::domain::ports::{DraftStore, DraftStoreError};
use crate::domain::{ApplicationType, DraftSnapshot};

fn file_name(kind: ApplicationType) -> &'static str {
    match kind {
        ApplicationType::Sme => "draft-sme.json",
        ApplicationType::Payroll => "draft-payroll.json",
    }
}

/// Draft snapshots under the state directory.
pub struct FileDraftStore {
    dir: StateDir,
}

impl FileDraftStore {
    /// Open the store rooted at `state_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`DraftStoreError::Io`] when the directory cannot be opened.
    pub fn open(state_dir: &Utf8Path) -> Result<Self, DraftStoreError> {
        let dir = StateDir::open(state_dir).map_err(|err| DraftStoreError::io(err.to_string()))?;
        Ok(Self { dir })
    }
}

impl DraftStore for FileDraftStore {
    fn load(&self, kind: ApplicationType) -> Result<Option<DraftSnapshot>, DraftStoreError> {
        let name = file_name(kind);
        let Some(bytes) = self
            .dir
            .read(name)
            .map_err(|err| DraftStoreError::io(err.to_string()))?
        else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|err| DraftStoreError::corrupt(format!("{}: {err}", self.dir.path_of(name))))
    }

    fn save(&self, snapshot: &DraftSnapshot) -> Result<(), DraftStoreError> {
        let kind = snapshot.application_type();
        let bytes = serde_json::to_vec_pretty(snapshot)
            .map_err(|err| DraftStoreError::io(format!("encoding draft: {err}")))?;
        self.dir
            .write_atomically(file_name(kind), &bytes)
            .map_err(|err| DraftStoreError::io(err.to_string()))?;
        debug!(%kind, step = snapshot.step_index, "draft saved");
        Ok(())
    }

    fn clear(&self, kind: ApplicationType) -> Result<(), DraftStoreError> {
        self.dir
            .remove(file_name(kind))
            .map_err(|err| DraftStoreError::io(err.to_string()))
    }
}
