//! File-backed key-value store.
//!
//! Every key lives in `<dir>/<key>.json`. Writes go to a temporary sibling
//! first and are renamed into place, so a crash never leaves a half-written
//! document behind. Batches stage every temp before the first rename, which
//! makes them best-effort atomic: a rename failing part way leaves earlier
//! keys committed.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{KeyValueStore, StoreError, validate_key};

/// A [`KeyValueStore`] persisting each key as a JSON file in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        debug!(dir = %dir.display(), "Opened file store");
        Ok(Self { dir })
    }

    /// Directory holding the store's files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn temp_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{key}.json.tmp"))
    }

    fn stage(&self, key: &str, value: &str) -> Result<PathBuf, StoreError> {
        let temp = self.temp_path_for(key);
        fs::write(&temp, value).map_err(|source| io_error(key, source))?;
        Ok(temp)
    }

    fn commit(&self, key: &str, temp: &Path) -> Result<(), StoreError> {
        fs::rename(temp, self.path_for(key)).map_err(|source| io_error(key, source))
    }
}

fn io_error(key: &str, source: std::io::Error) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(io_error(key, source)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let temp = self.stage(key, value)?;
        self.commit(key, &temp)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(io_error(key, source)),
        }
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        for (key, _) in entries {
            validate_key(key)?;
        }

        // Stage everything before touching live files; on failure drop the temps.
        let mut staged = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match self.stage(key, value) {
                Ok(temp) => staged.push((*key, temp)),
                Err(e) => {
                    for (_, temp) in &staged {
                        let _ = fs::remove_file(temp);
                    }
                    return Err(e);
                }
            }
        }

        // Renames are atomic per key only. If one fails, keys already renamed
        // stay visible and the remaining temps are discarded.
        for (index, (key, temp)) in staged.iter().enumerate() {
            if let Err(e) = self.commit(key, temp) {
                let pending = staged.iter().skip(index).map(|(_, temp)| temp);
                for temp in pending {
                    match fs::remove_file(temp) {
                        Ok(()) => {}
                        Err(cleanup) if cleanup.kind() == ErrorKind::NotFound => {}
                        Err(cleanup) => {
                            warn!(path = %temp.display(), error = %cleanup, "Failed to remove staged file");
                        }
                    }
                }
                warn!(key = %key, committed = index, error = %e, "Batch write stopped part way");
                return Err(e);
            }
        }
        Ok(())
    }
}
