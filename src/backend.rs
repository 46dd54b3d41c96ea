//! Backend abstraction for document, annotation, and search traffic.
//!
//! The [`Backend`] trait is the engine's only view of the outside world:
//! everything a document session needs (page fetches, annotation blobs,
//! adjacent-page lookup, result-set search) goes through it, so transport
//! and persistence stay pluggable. [`MemoryBackend`] is the in-process
//! implementation used by tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{AnnotationBlob, Direction, Document, PageMetadata, SearchQuery, SharedPassage};

/// Abstract backend collaborator.
///
/// All operations are async (via `async-trait`); in-memory implementations
/// return immediately-ready futures.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`fetch_document`](Backend::fetch_document) | Retrieve one page by id |
/// | [`fetch_annotations`](Backend::fetch_annotations) | Load a project's saved blob for a page |
/// | [`save_annotations`](Backend::save_annotations) | Overwrite a project's blob for a page |
/// | [`update_page_metadata`](Backend::update_page_metadata) | Overwrite a page's shared date/topics |
/// | [`adjacent_document`](Backend::adjacent_document) | Neighbouring page in physical volume order |
/// | [`shared_passages`](Backend::shared_passages) | Other projects' passages on a page |
/// | [`search`](Backend::search) | Result-set query, returning ordered page ids |
#[async_trait]
pub trait Backend: Send + Sync {
    /// Retrieve a single document by id. `None` when the id is unknown.
    async fn fetch_document(&self, id: &str) -> Result<Option<Document>>;

    /// Load the saved annotation blob for `(project_id, document_id)`.
    /// `None` when nothing has been saved yet.
    async fn fetch_annotations(
        &self,
        project_id: &str,
        document_id: &str,
    ) -> Result<Option<AnnotationBlob>>;

    /// Overwrite the stored annotation blob for `(project_id,
    /// document_id)`. There is no partial-update contract.
    async fn save_annotations(
        &self,
        project_id: &str,
        document_id: &str,
        blob: &AnnotationBlob,
    ) -> Result<()>;

    /// Overwrite the document-level date and topic tags shared across
    /// projects.
    async fn update_page_metadata(
        &self,
        document_id: &str,
        metadata: &PageMetadata,
    ) -> Result<()>;

    /// The physically adjacent document in underlying volume order. `None`
    /// at either end of the corpus or for an unknown id.
    async fn adjacent_document(
        &self,
        document_id: &str,
        direction: Direction,
    ) -> Result<Option<Document>>;

    /// Other projects' saved passages on the same document, excluding
    /// `current_project_id`'s own.
    async fn shared_passages(
        &self,
        document_id: &str,
        current_project_id: &str,
    ) -> Result<Vec<SharedPassage>>;

    /// Run a result-set query, returning matching document ids in corpus
    /// order.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<String>>;
}
