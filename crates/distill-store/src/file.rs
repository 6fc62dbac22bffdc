//! JSON file store
//!
//! Each key maps to one file under the root directory (`quota/state` →
//! `<root>/quota/state.json`). Each write goes to its own uniquely named
//! temporary sibling that is then renamed over the target, so readers never
//! observe a torn value and concurrent writers to one key never share a
//! temp path.

use async_trait::async_trait;
use distill_core::error::{AppError, Result};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::ports::{validate_key, KeyValueStore};

const EXTENSION: &str = "json";

/// File-backed implementation of KeyValueStore
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(key.split('/'));
        path.set_extension(EXTENSION);
        path
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?.with_extension("");
        let segments: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
        segments.map(|s| s.join("/"))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.path_for(key);
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
        tokio::fs::create_dir_all(&parent).await?;

        let target = path.clone();
        let value = value.to_string();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            // Dropped on any error, which removes the temp file
            let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
            tmp.write_all(value.as_bytes())?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::unknown(format!("store write aborted: {}", e)))??;

        tracing::trace!(key, path = %path.display(), "Wrote store entry");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if path.extension().and_then(|e| e.to_str()) == Some(EXTENSION) {
                    if let Some(key) = self.key_for(&path) {
                        if key.starts_with(prefix) && validate_key(&key).is_ok() {
                            keys.push(key);
                        }
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}
