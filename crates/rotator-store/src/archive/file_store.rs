//! Filesystem archive store

#![allow(clippy::result_large_err)]

use crate::archive::atomic::atomic_write;
use crate::errors::{corrupt_archive, io_error, serialization_error, Result};
use rotator_core::{CollectionId, PostRecord};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Archives live in one directory, one file per collection
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    directory: PathBuf,
}

impl ArchiveStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// `<directory>/Collection-<id>.json`
    pub fn default_path(&self, collection: CollectionId) -> PathBuf {
        self.directory.join(format!("Collection-{}.json", collection))
    }

    /// Read the archive at `path`.
    ///
    /// A missing file is an empty archive. A file that exists but does not
    /// decode is an error, so it is never silently overwritten.
    pub fn load(&self, path: &Path) -> Result<Vec<PostRecord>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No existing archive");
                return Ok(Vec::new());
            }
            Err(e) => return Err(io_error("archive_read", e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| corrupt_archive(path, e))
    }

    /// Replace the archive at `path` with `records`
    pub fn save(&self, path: &Path, records: &[PostRecord]) -> Result<()> {
        let content =
            serde_json::to_vec_pretty(records).map_err(|e| serialization_error("archive_encode", e))?;
        atomic_write(path, &content)?;

        tracing::debug!(
            path = %path.display(),
            entry_count = records.len(),
            "Archive written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotator_core::PostId;
    use tempfile::TempDir;

    #[test]
    fn test_default_path() {
        let store = ArchiveStore::new("data/archives");
        assert_eq!(
            store.default_path(CollectionId(77)),
            PathBuf::from("data/archives/Collection-77.json")
        );
    }

    #[test]
    fn test_load_missing_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArchiveStore::new(temp_dir.path());

        let records = store.load(&store.default_path(CollectionId(1))).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArchiveStore::new(temp_dir.path());
        let path = store.default_path(CollectionId(1));
        let records = vec![
            PostRecord::new(PostId(1)).with_retweeted(true),
            PostRecord::new(PostId(2)).with_field("text", serde_json::json!("hi")),
        ];

        store.save(&path, &records).unwrap();

        assert_eq!(store.load(&path).unwrap(), records);
    }

    #[test]
    fn test_load_corrupt_archive_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArchiveStore::new(temp_dir.path());
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, b"{ not an array").unwrap();

        let err = store.load(&path).unwrap_err();
        assert_eq!(err.code(), "ERR_PERSISTENCE");
    }
}
