//! Annotation file access: advisory lock, load and atomic save
//!
//! A `StoreFile` owns an exclusive lock on `<file>.lock` for as long as it
//! lives, so only one process works on a given annotation file at a time.
//! Saving writes a temporary file next to the target, copies the previous
//! contents to `<file>.bak` and then renames the temporary over the target.
//! The target is never missing: a failed save leaves the old file in place.

use crate::codec;
use crate::store::Store;
use crate::types::{AnnotateError, Result};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Locked handle on an annotation file
#[derive(Debug)]
pub struct StoreFile {
    path: PathBuf,
    lock: File,
}

impl StoreFile {
    /// Lock the annotation file and load its store
    ///
    /// A missing file yields an empty store (the file is created on the
    /// first save).
    ///
    /// # Errors
    /// * `ConcurrentAccess` if another process holds the lock
    /// * `IoError` / parse errors if the file cannot be read or decoded
    pub fn open(path: impl AsRef<Path>) -> Result<(StoreFile, Store)> {
        let path = path.as_ref().to_path_buf();
        let lock_path = with_suffix(&path, ".lock");

        let lock = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        FileExt::try_lock_exclusive(&lock).map_err(|err| {
            if err.kind() == fs2::lock_contended_error().kind() {
                AnnotateError::ConcurrentAccess(path.clone())
            } else {
                AnnotateError::IoError(err)
            }
        })?;

        let file = StoreFile { path, lock };
        let store = if file.path.exists() {
            let bytes = fs::read(&file.path)?;
            let store = codec::load(&bytes)?;
            log::info!(
                "Loaded {} ({} events, {} bookmarks)",
                file.path.display(),
                store.num_events(),
                store.bookmarks.len()
            );
            store
        } else {
            log::info!("{} does not exist yet, starting empty", file.path.display());
            Store::new()
        };

        Ok((file, store))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the previous contents are kept on save
    pub fn backup_path(&self) -> PathBuf {
        with_suffix(&self.path, ".bak")
    }

    /// Write the store atomically, keeping the previous file as backup
    pub fn save(&self, store: &Store) -> Result<()> {
        let bytes = codec::save(store)?;
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temporary = NamedTempFile::new_in(directory)?;
        temporary.write_all(&bytes)?;
        temporary.as_file().sync_all()?;

        if self.path.exists() {
            fs::copy(&self.path, self.backup_path())?;
        }
        temporary
            .persist(&self.path)
            .map_err(|err| AnnotateError::IoError(err.error))?;

        log::info!("Saved {} ({} bytes)", self.path.display(), bytes.len());
        Ok(())
    }
}

impl Drop for StoreFile {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.lock) {
            log::warn!("Could not release lock on {}: {}", self.path.display(), err);
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
