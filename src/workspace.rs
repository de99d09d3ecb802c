//! The explicit store object the request handlers work against.
//!
//! A workspace is one directory holding the key document, the entry
//! document and the class database. Nothing is cached: every operation
//! reloads what it needs from disk.

use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::{WorkspaceConfig, ENTRIES_FILE, KEYS_FILE};
use crate::db;
use crate::entries::{Entry, EntryStore, Identity};
use crate::error::{StoreError, StoreResult};
use crate::keys::{recalculate, KeyDocument, KeyStore};
use crate::merge::{merge_entries, merge_files};
use crate::roster::{self, ImportSummary};
use crate::scoring::{feedback, render_feedback, validate_answers, QuestionFeedback};

pub struct Workspace {
    root: PathBuf,
    pub config: WorkspaceConfig,
    pub keys: KeyStore,
    pub entries: EntryStore,
    pub db: Connection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDetails {
    pub entry: Entry,
    pub feedback: Vec<QuestionFeedback>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub added: usize,
    pub total: usize,
}

impl Workspace {
    pub fn open(root: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(root).map_err(|e| StoreError::io(root, e))?;
        let config = WorkspaceConfig::load(root)?;
        let db = db::open_db(root)?;
        tracing::info!(
            workspace = %root.display(),
            snapshots = config.snapshots,
            strict = config.strict_answers,
            "workspace opened"
        );
        Ok(Workspace {
            root: root.to_path_buf(),
            config,
            keys: KeyStore::new(root.join(KEYS_FILE)),
            entries: EntryStore::new(root.join(ENTRIES_FILE)),
            db,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate, score against the current key and store a new entry.
    pub fn submit(&self, name: &str, phone: &str, answers: &str) -> StoreResult<Entry> {
        let entry = self.build_entry(name, phone, answers)?;
        self.entries.add(entry.clone())?;
        Ok(entry)
    }

    /// Rescore the replacement against the current key and put it in place
    /// of the entry identified by `id`. `None` when nothing matched.
    pub fn edit(
        &self,
        id: &Identity,
        name: &str,
        phone: &str,
        answers: &str,
    ) -> StoreResult<Option<Entry>> {
        let entry = self.build_entry(name, phone, answers)?;
        let replaced = self.entries.edit(id, entry.clone())?;
        Ok(replaced.then_some(entry))
    }

    fn build_entry(&self, name: &str, phone: &str, answers: &str) -> StoreResult<Entry> {
        let key = self.keys.load()?;
        let entry = Entry::scored(name, phone, answers, &key.keys, self.config.snapshots);
        if entry.name.is_empty() {
            return Err(StoreError::validation("name is required"));
        }
        validate_answers(&entry.answers, key.question_count(), self.config.strict_answers)
            .map_err(StoreError::Validation)?;
        Ok(entry)
    }

    /// Save a new key and rescore every entry. Entries with a snapshot keep
    /// the score their snapshot gives.
    pub fn update_keys(&self, doc: &KeyDocument) -> StoreResult<usize> {
        self.keys.save(doc)?;
        let mut entries = self.entries.load()?;
        let changed = recalculate(&mut entries, &doc.keys);
        self.entries.save(&entries)?;
        tracing::info!(changed, total = entries.len(), "scores recalculated");
        Ok(changed)
    }

    pub fn migrate_snapshots(&self) -> StoreResult<usize> {
        let key = self.keys.load()?;
        self.entries.migrate_snapshots(&key.keys)
    }

    /// Per-question feedback for the first entry matching `id`.
    pub fn details(&self, id: &Identity) -> StoreResult<EntryDetails> {
        let entry = self
            .entries
            .load()?
            .into_iter()
            .find(|e| e.matches(id))
            .ok_or_else(|| StoreError::not_found(format!("entry not found: {}", id.name)))?;
        self.describe(entry)
    }

    /// Points come from the entry's snapshot when it has one; descriptions
    /// are not snapshotted and always come from the current key.
    pub fn describe(&self, entry: Entry) -> StoreResult<EntryDetails> {
        let key = self.keys.load()?;
        let tables = match entry.keys_snapshot.as_deref() {
            Some(snap) if !snap.is_empty() => snap,
            _ => key.keys.as_slice(),
        };
        let items = feedback(tables, &key.descriptions, &entry.answers);
        let text = render_feedback(&items);
        Ok(EntryDetails {
            feedback: items,
            text,
            entry,
        })
    }

    /// Merge exported entry files into this workspace's entries. `added`
    /// counts incoming identities the workspace did not already hold.
    pub fn import_entries<P: AsRef<Path>>(&self, paths: &[P]) -> StoreResult<MergeSummary> {
        let current = self.entries.load()?;
        let incoming = merge_files(paths)?;
        let known: HashSet<Identity> = current.iter().map(Entry::identity).collect();
        let added = incoming
            .iter()
            .filter(|e| !known.contains(&e.identity()))
            .count();
        let merged = merge_entries([current, incoming]);
        self.entries.save(&merged)?;
        Ok(MergeSummary {
            added,
            total: merged.len(),
        })
    }

    /// Enroll the entries matching `ids` in `class`.
    pub fn enroll(&self, class: &str, ids: &[Identity]) -> StoreResult<ImportSummary> {
        let selected: Vec<Entry> = self
            .entries
            .load()?
            .into_iter()
            .filter(|e| ids.iter().any(|id| e.matches(id)))
            .collect();
        roster::import_students(&self.db, class, &selected)
    }
}
