use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};

pub const KEYS_FILE: &str = "keys.json";
pub const ENTRIES_FILE: &str = "entries.json";
pub const CLASSES_DB_FILE: &str = "classes.sqlite3";
pub const CONFIG_FILE: &str = "psychod.json";

/// Workspace opened at startup when set.
pub const WORKSPACE_ENV: &str = "PSYCHOD_WORKSPACE";

/// Per-workspace options read from `psychod.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceConfig {
    /// Freeze the current key into each new entry.
    pub snapshots: bool,
    /// Require exactly one a-d letter per question on submit.
    pub strict_answers: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        WorkspaceConfig {
            snapshots: true,
            strict_answers: false,
        }
    }
}

impl WorkspaceConfig {
    /// Missing file means defaults. A malformed one is rejected so a typo
    /// does not silently turn snapshots off.
    pub fn load(workspace: &Path) -> StoreResult<Self> {
        let path = workspace.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(WorkspaceConfig::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        serde_json::from_str(&text).map_err(|e| {
            StoreError::validation(format!("{} is invalid: {}", path.display(), e))
        })
    }
}

pub fn workspace_from_env() -> Option<PathBuf> {
    std::env::var_os(WORKSPACE_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            WorkspaceConfig::load(dir.path()).unwrap(),
            WorkspaceConfig::default()
        );
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{"strictAnswers": true}"#).unwrap();
        let cfg = WorkspaceConfig::load(dir.path()).unwrap();
        assert!(cfg.strict_answers);
        assert!(cfg.snapshots);
    }

    #[test]
    fn malformed_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{snapshots: nope").unwrap();
        assert!(WorkspaceConfig::load(dir.path()).is_err());
    }
}
