//! In-memory [`Backend`] implementation for tests.
//!
//! Documents, annotation blobs, and cross-project passages live in
//! `HashMap`s behind `std::sync::RwLock`. Physical volume order is the
//! insertion order of documents. Failure injection toggles let tests
//! exercise the fetch-failure and save-failure paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::models::{
    AnnotationBlob, Direction, Document, PageMetadata, SearchQuery, SharedPassage,
};

use super::Backend;

/// In-memory backend for tests and examples.
pub struct MemoryBackend {
    docs: RwLock<HashMap<String, Document>>,
    volume_order: RwLock<Vec<String>>,
    blobs: RwLock<HashMap<(String, String), AnnotationBlob>>,
    shared: RwLock<HashMap<String, Vec<SharedPassage>>>,
    fail_saves: AtomicBool,
    fail_fetches: AtomicBool,
    fail_annotation_fetches: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            volume_order: RwLock::new(Vec::new()),
            blobs: RwLock::new(HashMap::new()),
            shared: RwLock::new(HashMap::new()),
            fail_saves: AtomicBool::new(false),
            fail_fetches: AtomicBool::new(false),
            fail_annotation_fetches: AtomicBool::new(false),
        }
    }

    /// Add a document. Insertion order defines physical volume order.
    pub fn insert_document(&self, doc: Document) {
        let mut order = self.volume_order.write().unwrap();
        let mut docs = self.docs.write().unwrap();
        if !docs.contains_key(&doc.id) {
            order.push(doc.id.clone());
        }
        docs.insert(doc.id.clone(), doc);
    }

    /// Seed another project's passage on a document.
    pub fn insert_shared_passage(&self, document_id: &str, shared: SharedPassage) {
        self.shared
            .write()
            .unwrap()
            .entry(document_id.to_string())
            .or_default()
            .push(shared);
    }

    /// Make every subsequent `save_annotations` call fail.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent fetch call fail.
    pub fn set_fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Make only `fetch_annotations` fail, leaving document fetches up.
    pub fn set_fail_annotation_fetches(&self, fail: bool) {
        self.fail_annotation_fetches.store(fail, Ordering::SeqCst);
    }

    /// The stored blob for `(project_id, document_id)`, for assertions.
    pub fn stored_blob(&self, project_id: &str, document_id: &str) -> Option<AnnotationBlob> {
        self.blobs
            .read()
            .unwrap()
            .get(&(project_id.to_string(), document_id.to_string()))
            .cloned()
    }

    fn check_fetches(&self) -> Result<()> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            bail!("backend unavailable");
        }
        Ok(())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_query(doc: &Document, query: &SearchQuery) -> bool {
    let text_lower = doc.text.to_lowercase();
    for keyword in &query.keywords {
        let keyword = keyword.trim();
        if !keyword.is_empty() && !text_lower.contains(&keyword.to_lowercase()) {
            return false;
        }
    }
    if let Some(year) = query.year.as_deref().map(str::trim).filter(|y| !y.is_empty()) {
        match doc.date {
            Some(date) => {
                if date.format("%Y").to_string() != year {
                    return false;
                }
            }
            None => return false,
        }
    }
    if !query.volumes.is_empty() && !query.volumes.iter().any(|v| *v == doc.volume_set) {
        return false;
    }
    if !query.page_numbers.is_empty() && !query.page_numbers.iter().any(|p| *p == doc.page_number)
    {
        return false;
    }
    if !query.topics.is_empty() && !query.topics.iter().any(|t| doc.topics.contains(t)) {
        return false;
    }
    true
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn fetch_document(&self, id: &str) -> Result<Option<Document>> {
        self.check_fetches()?;
        Ok(self.docs.read().unwrap().get(id).cloned())
    }

    async fn fetch_annotations(
        &self,
        project_id: &str,
        document_id: &str,
    ) -> Result<Option<AnnotationBlob>> {
        self.check_fetches()?;
        if self.fail_annotation_fetches.load(Ordering::SeqCst) {
            bail!("annotation backend unavailable");
        }
        Ok(self
            .blobs
            .read()
            .unwrap()
            .get(&(project_id.to_string(), document_id.to_string()))
            .cloned())
    }

    async fn save_annotations(
        &self,
        project_id: &str,
        document_id: &str,
        blob: &AnnotationBlob,
    ) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            bail!("backend rejected save");
        }
        self.blobs.write().unwrap().insert(
            (project_id.to_string(), document_id.to_string()),
            blob.clone(),
        );
        Ok(())
    }

    async fn update_page_metadata(
        &self,
        document_id: &str,
        metadata: &PageMetadata,
    ) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            bail!("backend rejected save");
        }
        let mut docs = self.docs.write().unwrap();
        if let Some(doc) = docs.get_mut(document_id) {
            doc.date = metadata.date;
            doc.topics = metadata.topics.clone();
        }
        Ok(())
    }

    async fn adjacent_document(
        &self,
        document_id: &str,
        direction: Direction,
    ) -> Result<Option<Document>> {
        self.check_fetches()?;
        let order = self.volume_order.read().unwrap();
        let position = match order.iter().position(|id| id == document_id) {
            Some(position) => position,
            None => return Ok(None),
        };
        let neighbour = match direction {
            Direction::Previous => position.checked_sub(1).map(|i| &order[i]),
            Direction::Next => order.get(position + 1),
        };
        Ok(neighbour.and_then(|id| self.docs.read().unwrap().get(id).cloned()))
    }

    async fn shared_passages(
        &self,
        document_id: &str,
        current_project_id: &str,
    ) -> Result<Vec<SharedPassage>> {
        self.check_fetches()?;
        Ok(self
            .shared
            .read()
            .unwrap()
            .get(document_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|s| s.project_id != current_project_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<String>> {
        self.check_fetches()?;
        let order = self.volume_order.read().unwrap();
        let docs = self.docs.read().unwrap();
        Ok(order
            .iter()
            .filter(|id| docs.get(*id).map(|doc| matches_query(doc, query)).unwrap_or(false))
            .cloned()
            .collect())
    }
}
