use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::document;
use crate::entries::Entry;
use crate::error::{StoreError, StoreResult};
use crate::scoring::{compute_score, DescriptionTable, KeyTable};

/// The answer key: point and description tables, one pair per question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyDocument {
    #[serde(default)]
    pub keys: Vec<KeyTable>,
    #[serde(default)]
    pub descriptions: Vec<DescriptionTable>,
}

impl KeyDocument {
    pub fn question_count(&self) -> usize {
        self.keys.len()
    }

    /// Point and description tables must line up question by question.
    pub fn validate(&self) -> StoreResult<()> {
        if self.keys.len() != self.descriptions.len() {
            return Err(StoreError::validation(format!(
                "key has {} score tables but {} description tables",
                self.keys.len(),
                self.descriptions.len()
            )));
        }
        Ok(())
    }
}

/// Parse key-editor text. Malformed JSON is a validation error.
pub fn parse_document(text: &str) -> StoreResult<KeyDocument> {
    let doc: KeyDocument = serde_json::from_str(text)
        .map_err(|e| StoreError::validation(format!("invalid key JSON: {}", e)))?;
    doc.validate()?;
    Ok(doc)
}

/// Recompute every entry's score: from its own snapshot when it has one,
/// otherwise from `keys`. Returns how many scores changed.
pub fn recalculate(entries: &mut [Entry], keys: &[KeyTable]) -> usize {
    let mut changed = 0;
    for e in entries.iter_mut() {
        // An empty snapshot (taken while the key was empty) scores like none.
        let table = match e.keys_snapshot.as_deref() {
            Some(snap) if !snap.is_empty() => snap,
            _ => keys,
        };
        let score = compute_score(table, &e.answers);
        if score != e.score {
            e.score = score;
            changed += 1;
        }
    }
    changed
}

#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        KeyStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> StoreResult<KeyDocument> {
        document::load_or_init(&self.path, &KeyDocument::default())
    }

    pub fn save(&self, doc: &KeyDocument) -> StoreResult<()> {
        doc.validate()?;
        document::write_pretty(&self.path, doc)?;
        tracing::info!(questions = doc.question_count(), "answer key saved");
        Ok(())
    }
}
