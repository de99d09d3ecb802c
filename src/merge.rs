//! Combining exported entry files.

use std::path::Path;

use crate::document;
use crate::entries::{dedupe, Entry};
use crate::error::{StoreError, StoreResult};

/// Concatenate in argument order, keeping the first entry per identity.
pub fn merge_entries<I>(lists: I) -> Vec<Entry>
where
    I: IntoIterator<Item = Vec<Entry>>,
{
    let mut merged: Vec<Entry> = lists.into_iter().flatten().collect();
    let dropped = dedupe(&mut merged);
    tracing::debug!(dropped, kept = merged.len(), "merged entry lists");
    merged
}

/// Load and merge exported files. Unlike the workspace document, a named
/// file that does not exist is an error.
pub fn merge_files<P: AsRef<Path>>(paths: &[P]) -> StoreResult<Vec<Entry>> {
    let mut lists = Vec::with_capacity(paths.len());
    for p in paths {
        let p = p.as_ref();
        if !p.is_file() {
            return Err(StoreError::not_found(format!(
                "entry file not found: {}",
                p.display()
            )));
        }
        lists.push(document::read::<Vec<Entry>>(p)?);
    }
    Ok(merge_entries(lists))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, value: serde_json::Value) -> std::path::PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, value.to_string()).unwrap();
        p
    }

    #[test]
    fn merged_size_is_distinct_identity_count() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(
            dir.path(),
            "a.json",
            json!([
                {"name": "Ali", "phone": "1", "answers": "ab", "score": 3},
                {"name": "Sara", "phone": "2", "answers": "cd", "score": 4}
            ]),
        );
        let b = write(
            dir.path(),
            "b.json",
            json!([
                {"name": "Ali", "phone": "1", "answers": "ab", "score": 100},
                {"name": "Ali", "phone": "1", "answers": "aa", "score": 1}
            ]),
        );
        let merged = merge_files(&[a, b]).unwrap();
        assert_eq!(merged.len(), 3);
        // first file wins for the shared tuple
        assert_eq!(merged[0].score, 3);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = merge_files(&[dir.path().join("nope.json")]).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
