use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::document;
use crate::error::{StoreError, StoreResult};
use crate::scoring::{compute_score, KeyTable};

/// One respondent's submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub answers: String,
    #[serde(default)]
    pub score: i64,
    /// Key in effect when the entry was submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys_snapshot: Option<Vec<KeyTable>>,
}

impl Entry {
    /// Build a scored entry. With `snapshot` set, `keys` is frozen into it.
    pub fn scored(name: &str, phone: &str, answers: &str, keys: &[KeyTable], snapshot: bool) -> Self {
        let answers = normalize_answers(answers);
        Entry {
            name: name.trim().to_string(),
            phone: phone.trim().to_string(),
            score: compute_score(keys, &answers),
            answers,
            keys_snapshot: snapshot.then(|| keys.to_vec()),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            name: self.name.clone(),
            phone: self.phone.clone(),
            answers: self.answers.clone(),
        }
    }

    pub fn matches(&self, id: &Identity) -> bool {
        self.name == id.name && self.phone == id.phone && self.answers == id.answers
    }
}

pub fn normalize_answers(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// (name, phone, answers): the only way entries are located for edit and
/// delete. Two identical submissions are indistinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Identity {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub answers: String,
}

pub fn validate_entry(entry: &Entry) -> StoreResult<()> {
    if entry.name.trim().is_empty() {
        return Err(StoreError::validation("name is required"));
    }
    Ok(())
}

/// Replace the first entry matching `id`. Returns false when nothing matched.
pub fn replace_first(entries: &mut [Entry], id: &Identity, replacement: Entry) -> bool {
    match entries.iter_mut().find(|e| e.matches(id)) {
        Some(slot) => {
            *slot = replacement;
            true
        }
        None => false,
    }
}

/// Remove every entry matching `id`. Returns how many were removed.
pub fn remove_all(entries: &mut Vec<Entry>, id: &Identity) -> usize {
    let before = entries.len();
    entries.retain(|e| !e.matches(id));
    before - entries.len()
}

/// Keep the first entry per identity tuple, in encounter order.
pub fn dedupe(entries: &mut Vec<Entry>) -> usize {
    let before = entries.len();
    let mut seen: HashSet<Identity> = HashSet::new();
    entries.retain(|e| seen.insert(e.identity()));
    before - entries.len()
}

/// Freeze `keys` into every entry without a snapshot and rescore it.
pub fn attach_snapshots(entries: &mut [Entry], keys: &[KeyTable]) -> usize {
    let mut touched = 0;
    for e in entries.iter_mut().filter(|e| e.keys_snapshot.is_none()) {
        e.keys_snapshot = Some(keys.to_vec());
        e.score = compute_score(keys, &e.answers);
        touched += 1;
    }
    touched
}

/// Entries whose name contains `query` (ignoring case) or whose phone
/// contains it. An empty query matches everything.
pub fn search<'a>(entries: &'a [Entry], query: &str) -> Vec<&'a Entry> {
    let q = query.trim();
    let q_lower = q.to_lowercase();
    entries
        .iter()
        .filter(|e| q.is_empty() || e.name.to_lowercase().contains(&q_lower) || e.phone.contains(q))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Name,
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Stable sort, so ties keep their stored order.
pub fn sort(entries: &mut [Entry], field: SortField, order: SortOrder) {
    entries.sort_by(|a, b| {
        let ord = match field {
            SortField::Name => a.name.cmp(&b.name),
            SortField::Score => a.score.cmp(&b.score),
        };
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

#[derive(Debug, Clone)]
pub struct EntryStore {
    path: PathBuf,
}

impl EntryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EntryStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> StoreResult<Vec<Entry>> {
        document::load_or_init(&self.path, &Vec::<Entry>::new())
    }

    pub fn save(&self, entries: &[Entry]) -> StoreResult<()> {
        document::write_pretty(&self.path, entries)
    }

    pub fn add(&self, entry: Entry) -> StoreResult<()> {
        validate_entry(&entry)?;
        let mut entries = self.load()?;
        tracing::info!(name = %entry.name, score = entry.score, "entry added");
        entries.push(entry);
        self.save(&entries)
    }

    /// Replace the entry identified by `id`. A miss is not an error; the
    /// caller gets `false` and the document is left untouched.
    pub fn edit(&self, id: &Identity, entry: Entry) -> StoreResult<bool> {
        validate_entry(&entry)?;
        let mut entries = self.load()?;
        if !replace_first(&mut entries, id, entry) {
            tracing::warn!(name = %id.name, "edit target not found; dropped");
            return Ok(false);
        }
        self.save(&entries)?;
        Ok(true)
    }

    pub fn delete(&self, id: &Identity) -> StoreResult<usize> {
        let mut entries = self.load()?;
        let removed = remove_all(&mut entries, id);
        if removed > 0 {
            self.save(&entries)?;
        }
        tracing::info!(name = %id.name, removed, "entries deleted");
        Ok(removed)
    }

    pub fn deduplicate(&self) -> StoreResult<usize> {
        let mut entries = self.load()?;
        let removed = dedupe(&mut entries);
        if removed > 0 {
            self.save(&entries)?;
        }
        tracing::info!(removed, remaining = entries.len(), "entries deduplicated");
        Ok(removed)
    }

    pub fn migrate_snapshots(&self, keys: &[KeyTable]) -> StoreResult<usize> {
        let mut entries = self.load()?;
        let touched = attach_snapshots(&mut entries, keys);
        if touched > 0 {
            self.save(&entries)?;
            tracing::info!(touched, "attached key snapshots");
        }
        Ok(touched)
    }

    pub fn sorted(&self, field: SortField, order: SortOrder) -> StoreResult<Vec<Entry>> {
        let mut entries = self.load()?;
        sort(&mut entries, field, order);
        Ok(entries)
    }
}
