use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::SignerError;
use crate::utils::file_lock::FileLock;
use crate::utils::file_operations::{read_trimmed, write_atomically, PRIVATE_FILE_MODE};

pub const PRIOR_BLOCK_HASH_FILENAME: &str = "prior-block-hash";
const PRIOR_BLOCK_HASH_LOCK_FILENAME: &str = "prior-block-hash.lock";

/// Proof hash of the last independent block this signer published.
pub struct ChainState {
    path: PathBuf,
    lock_path: PathBuf,
}

impl ChainState {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(PRIOR_BLOCK_HASH_FILENAME),
            lock_path: data_dir.join(PRIOR_BLOCK_HASH_LOCK_FILENAME),
        }
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Locks the chain state and reads the prior hash, empty on first run.
    /// The lock is held by the returned guard until it is saved or dropped.
    pub fn load_prior_hash(&self) -> Result<PriorHashGuard, SignerError> {
        debug!("Loading prior block hash");
        let lock = FileLock::new_exclusive(&self.lock_path)
            .map_err(|e| SignerError::io("Failed to lock prior block hash", e))?;

        let hash = read_trimmed(&self.path)
            .map_err(|e| SignerError::io(&format!("Failed to read {}", self.path.display()), e))?
            .unwrap_or_default();
        if hash.is_empty() {
            info!("No prior block hash, starting a new chain");
        } else {
            debug!("Prior block hash: {}", hash);
        }

        Ok(PriorHashGuard {
            hash,
            path: self.path.clone(),
            _lock: lock,
        })
    }
}

/// Prior hash read under the chain state lock. Saving consumes the guard;
/// dropping it leaves the state file as it was.
pub struct PriorHashGuard {
    hash: String,
    path: PathBuf,
    _lock: FileLock,
}

impl PriorHashGuard {
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn save(self, hash: &str) -> Result<(), SignerError> {
        write_atomically(&self.path, hash.as_bytes(), PRIVATE_FILE_MODE).map_err(|e| {
            SignerError::io(&format!("Failed to write {}", self.path.display()), e)
        })?;
        info!("Prior block hash saved: {}", hash);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HASH: &str = "df9063763cc29f0c4c2858a7c073243174de7b748057040db85b03e3539b0fcc";

    #[test]
    fn test_first_run_has_empty_prior_hash() {
        let dir = tempfile::tempdir().unwrap();
        let state = ChainState::new(dir.path());

        let guard = state.load_prior_hash().unwrap();
        assert_eq!(guard.hash(), "");
        drop(guard);
        assert!(!state.path().exists());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let state = ChainState::new(dir.path());

        state.load_prior_hash().unwrap().save(HASH).unwrap();
        assert_eq!(fs::read_to_string(state.path()).unwrap(), HASH);
        assert_eq!(state.load_prior_hash().unwrap().hash(), HASH);
    }

    #[test]
    fn test_dropped_guard_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let state = ChainState::new(dir.path());
        fs::write(state.path(), format!("{HASH}\n")).unwrap();

        let guard = state.load_prior_hash().unwrap();
        assert_eq!(guard.hash(), HASH);
        drop(guard);

        assert_eq!(fs::read_to_string(state.path()).unwrap(), format!("{HASH}\n"));
    }

    #[test]
    fn test_guard_holds_the_lock() {
        let dir = tempfile::tempdir().unwrap();
        let state = ChainState::new(dir.path());
        let lock_path = dir.path().join(PRIOR_BLOCK_HASH_LOCK_FILENAME);

        let guard = state.load_prior_hash().unwrap();
        assert!(FileLock::try_exclusive(&lock_path).is_err());
        guard.save(HASH).unwrap();
        assert!(FileLock::try_exclusive(&lock_path).is_ok());
    }

    #[test]
    fn test_unreadable_state_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = ChainState::new(dir.path());
        fs::create_dir(state.path()).unwrap();

        assert!(matches!(state.load_prior_hash(), Err(SignerError::Io(_))));
    }
}
