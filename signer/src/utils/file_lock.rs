use anyhow::Error;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Advisory lock held on a sidecar lock file until dropped.
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Blocks until the exclusive lock on `path` is acquired, creating the lock
    /// file if needed.
    pub fn new_exclusive(path: &Path) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open lock file {}: {e}", path.display()))?;
        file.lock_exclusive()
            .map_err(|e| anyhow::anyhow!("Failed to lock {}: {e}", path.display()))?;
        tracing::trace!("Acquired lock {}", path.display());
        Ok(FileLock {
            file,
            path: path.to_path_buf(),
        })
    }

    #[cfg(test)]
    pub(crate) fn try_exclusive(path: &Path) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open lock file {}: {e}", path.display()))?;
        file.try_lock_exclusive()
            .map_err(|e| anyhow::anyhow!("Lock {} is held: {e}", path.display()))?;
        Ok(FileLock {
            file,
            path: path.to_path_buf(),
        })
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        tracing::trace!("Released lock {}", self.path.display());
    }
}
