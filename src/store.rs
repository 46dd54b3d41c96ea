//! Per-document annotation store.
//!
//! Holds the passages, passage notes, page note, and page metadata for the
//! document currently in view, scoped to one project. Navigating to
//! another document discards the store wholesale and reloads it from the
//! backend; there is no cross-document merging. Saves are likewise a full
//! overwrite of the stored blob, so [`AnnotationStore::snapshot`] always
//! returns the complete current state.
//!
//! The store also tracks a transient [`SaveStatus`] for the UI. `Saved`
//! and `Error` revert to `Idle` a few seconds after they were entered;
//! callers poll [`AnnotationStore::settle_status`] with the current time.
//! A failed save keeps the in-memory state so the user can retry.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::{AnnotationBlob, PageMetadata, Passage};

/// Default linger time of `Saved`/`Error` indicators before reverting to
/// `Idle`; see [`AnnotationStore::set_revert_secs`].
pub const STATUS_REVERT_SECS: i64 = 3;

/// Outcome indicator for the most recent bulk save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved { at: DateTime<Utc> },
    Error { at: DateTime<Utc> },
}

/// Annotations for the currently loaded document within one project.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    blob: AnnotationBlob,
    metadata: PageMetadata,
    status: SaveStatus,
    revert_secs: i64,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self {
            blob: AnnotationBlob::default(),
            metadata: PageMetadata::default(),
            status: SaveStatus::Idle,
            revert_secs: STATUS_REVERT_SECS,
        }
    }
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override how long `Saved`/`Error` linger before [`settle_status`]
    /// reverts them. Survives [`load`] across document changes.
    ///
    /// [`settle_status`]: AnnotationStore::settle_status
    /// [`load`]: AnnotationStore::load
    pub fn set_revert_secs(&mut self, secs: i64) {
        self.revert_secs = secs;
    }

    /// Replace the entire store with a freshly fetched blob and metadata.
    /// Called on every document change; resets the save status.
    pub fn load(&mut self, blob: AnnotationBlob, metadata: PageMetadata) {
        self.blob = blob;
        self.metadata = metadata;
        self.status = SaveStatus::Idle;
    }

    pub fn passages(&self) -> &[Passage] {
        &self.blob.passages
    }

    pub fn passage(&self, id: &str) -> Option<&Passage> {
        self.blob.passages.iter().find(|p| p.id == id)
    }

    /// Append a passage. A passage with empty or whitespace-only text is
    /// rejected as a no-op.
    pub fn add_passage(&mut self, passage: Passage) -> bool {
        if passage.text.trim().is_empty() {
            return false;
        }
        self.blob.passages.push(passage);
        true
    }

    /// Remove a passage and its note. Unknown ids are a no-op.
    pub fn delete_passage(&mut self, id: &str) {
        self.blob.passages.retain(|p| p.id != id);
        self.blob.passage_notes.remove(id);
    }

    /// Attach or replace the free-text note for an existing passage.
    /// Ignored when no passage with `id` is loaded.
    pub fn set_passage_note(&mut self, id: &str, note: impl Into<String>) {
        if self.passage(id).is_some() {
            self.blob.passage_notes.insert(id.to_string(), note.into());
        }
    }

    pub fn passage_note(&self, id: &str) -> Option<&str> {
        self.blob.passage_notes.get(id).map(String::as_str)
    }

    pub fn page_notes(&self) -> &str {
        &self.blob.page_notes
    }

    pub fn set_page_notes(&mut self, notes: impl Into<String>) {
        self.blob.page_notes = notes.into();
    }

    pub fn metadata(&self) -> &PageMetadata {
        &self.metadata
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.metadata.date = date;
    }

    /// Add a topic tag, ignoring duplicates and blank entries.
    pub fn add_topic(&mut self, topic: impl Into<String>) {
        let topic = topic.into();
        let trimmed = topic.trim();
        if trimmed.is_empty() {
            return;
        }
        if !self.metadata.topics.iter().any(|t| t == trimmed) {
            self.metadata.topics.push(trimmed.to_string());
        }
    }

    pub fn remove_topic(&mut self, topic: &str) {
        self.metadata.topics.retain(|t| t != topic);
    }

    /// The complete current annotation state, for a full-overwrite save.
    pub fn snapshot(&self) -> AnnotationBlob {
        self.blob.clone()
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn begin_save(&mut self) {
        self.status = SaveStatus::Saving;
    }

    pub fn save_succeeded(&mut self, now: DateTime<Utc>) {
        self.status = SaveStatus::Saved { at: now };
    }

    pub fn save_failed(&mut self, now: DateTime<Utc>) {
        self.status = SaveStatus::Error { at: now };
    }

    /// Revert a lingering `Saved`/`Error` indicator to `Idle` once it has
    /// been visible for the configured revert delay (default
    /// [`STATUS_REVERT_SECS`]). Returns the status after settling.
    pub fn settle_status(&mut self, now: DateTime<Utc>) -> SaveStatus {
        let entered_at = match self.status {
            SaveStatus::Saved { at } | SaveStatus::Error { at } => at,
            SaveStatus::Idle | SaveStatus::Saving => return self.status,
        };
        if now - entered_at >= Duration::seconds(self.revert_secs) {
            self.status = SaveStatus::Idle;
        }
        self.status
    }
}
