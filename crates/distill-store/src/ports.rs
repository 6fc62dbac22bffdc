use async_trait::async_trait;
use distill_core::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Port for opaque key-value persistence
///
/// Keys are `/`-separated paths of lowercase ASCII segments
/// (e.g. `quota/state`). Values are opaque strings.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// List keys starting with `prefix`, sorted
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Read and deserialize a JSON value
pub async fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize and write a JSON value
pub async fn put_json<T: Serialize + Sync>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| AppError::unknown(format!("Failed to serialize {}: {}", key, e)))?;
    store.put(key, &raw).await
}

/// Reject keys that cannot be mapped safely onto every backend
pub(crate) fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.split('/').all(|segment| {
            !segment.is_empty()
                && segment.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        });

    if valid {
        Ok(())
    } else {
        Err(AppError::invalid_input(format!("Invalid store key: {:?}", key)))
    }
}
