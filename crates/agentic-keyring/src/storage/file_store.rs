//! Filesystem-backed [`KeyValueStore`].
//!
//! Each entry is a file named `{hex(key)}.rec` inside the base directory.
//! Writes go to a sibling temp file first and are renamed into place, so a
//! reader never sees a half-written record. Durable writes additionally
//! fsync the file and the directory.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{KeyringError, Result};
use crate::storage::KeyValueStore;

const RECORD_EXT: &str = "rec";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One-file-per-key store.
///
/// Safe for use from several threads of one process; concurrent writers in
/// different processes are not coordinated.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `base_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `KeyringError::Io` if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn record_path(&self, key: &[u8]) -> PathBuf {
        self.base_dir.join(format!("{}.{RECORD_EXT}", hex::encode(key)))
    }

    fn write(&self, key: &[u8], value: &[u8], durable: bool) -> Result<()> {
        let path = self.record_path(key);
        // unique per writer so concurrent writes never share a temp file
        let tmp_path = self.base_dir.join(format!(
            "{}.{}-{}.tmp",
            hex::encode(key),
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let placed = write_temp(&tmp_path, value, durable)
            .and_then(|()| fs::rename(&tmp_path, &path));
        if let Err(e) = placed {
            let _ = fs::remove_file(&tmp_path);
            return Err(KeyringError::Io(e));
        }
        if durable {
            sync_dir(&self.base_dir)?;
        }
        Ok(())
    }

    fn remove(&self, key: &[u8], durable: bool) -> Result<()> {
        match fs::remove_file(self.record_path(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(KeyringError::Io(e)),
        }
        if durable {
            sync_dir(&self.base_dir)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match fs::read(self.record_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(KeyringError::Io(e)),
        }
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write(key, value, false)
    }

    fn set_durable(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write(key, value, true)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.remove(key, false)
    }

    fn delete_durable(&self, key: &[u8]) -> Result<()> {
        self.remove(key, true)
    }

    fn iterate(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();

            // Skips temp files and anything foreign.
            let Some(stem) = file_name.strip_suffix(&format!(".{RECORD_EXT}")) else {
                continue;
            };
            let Ok(key) = hex::decode(stem) else {
                log::warn!("ignoring unrecognized file {file_name} in keyring directory");
                continue;
            };

            match fs::read(entry.path()) {
                Ok(value) => entries.push((key, value)),
                // deleted between read_dir and read
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(KeyringError::Io(e)),
            }
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

fn write_temp(tmp_path: &Path, value: &[u8], durable: bool) -> std::io::Result<()> {
    let mut file = File::create(tmp_path)?;
    file.write_all(value)?;
    if durable {
        file.sync_all()?;
    }
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
