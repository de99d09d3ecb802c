//! Whole-document JSON persistence shared by the key and entry stores.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::error::{StoreError, StoreResult};

/// Read `path`, first writing `init` to it when the file does not exist.
pub fn load_or_init<T>(path: &Path, init: &T) -> StoreResult<T>
where
    T: Serialize + DeserializeOwned,
{
    if !path.exists() {
        tracing::info!(path = %path.display(), "creating missing document");
        write_pretty(path, init)?;
    }
    read(path)
}

pub fn read<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let text = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| StoreError::json(path, e))
}

/// Overwrite `path` with pretty-printed JSON. No locking: last writer wins.
pub fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
    }
    let text = serde_json::to_string_pretty(value).map_err(|e| StoreError::json(path, e))?;
    std::fs::write(path, text).map_err(|e| StoreError::io(path, e))
}
