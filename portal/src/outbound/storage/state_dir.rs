//! Capability-scoped state directory with atomic replacement.

use std::io::{self, Write};
#[cfg(unix)]
use cap_std::fs::OpenOptionsExt;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Permission bits for every file written here.
#[cfg(unix)]
const PRIVATE_FILE_MODE: u32 = 0o600;

/// Directory holding the portal's persisted client state.
///
/// Files are replaced by writing a sibling temp file and renaming it over
/// the target, so readers never observe a partial write.
pub struct StateDir {
    dir: Dir,
    root: Utf8PathBuf,
}

impl StateDir {
    /// Open `root`, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the directory cannot be created or opened.
    pub fn open(root: &Utf8Path) -> io::Result<Self> {
        Dir::create_ambient_dir_all(root, ambient_authority())?;
        let dir = Dir::open_ambient_dir(root, ambient_authority())?;
        Ok(Self {
            dir,
            root: root.to_path_buf(),
        })
    }

    /// Directory the state lives in.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Full path of `name` for diagnostics.
    pub fn path_of(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    /// Contents of `name`, or `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns any I/O error other than not-found.
    pub fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        match self.dir.read(name) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Replace `name` with `bytes`.
    ///
    /// The file is created readable by the owner only, since it may hold
    /// credentials or personal data.
    ///
    /// # Errors
    ///
    /// Returns the I/O error of the write or the rename; the temp file is
    /// removed on failure.
    pub fn write_atomically(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let staged = format!(".{name}.{}.tmp", Uuid::new_v4().simple());
        let result = self
            .write_staged(&staged, bytes)
            .and_then(|()| self.dir.rename(&staged, &self.dir, name));
        if result.is_err() {
            drop(self.dir.remove_file(&staged));
        }
        result
    }

    fn write_staged(&self, staged: &str, bytes: &[u8]) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(PRIVATE_FILE_MODE);
        let mut file = self.dir.open_with(staged, &options)?;
        file.write_all(bytes)?;
        file.sync_all()
    }

    /// Remove `name`. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns any I/O error other than not-found.
    pub fn remove(&self, name: &str) -> io::Result<()> {
        match self.dir.remove_file(name) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error),
        }
    }

    /// SHA-256 of the current contents of `name`, hex encoded. `None` when
    /// the file is missing or unreadable.
    pub fn fingerprint(&self, name: &str) -> Option<String> {
        self.read(name).ok().flatten().map(|bytes| fingerprint(&bytes))
    }
}

pub(super) fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
