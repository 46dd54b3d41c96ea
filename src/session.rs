//! Document view session: the stateful coordinator over one open page.
//!
//! A [`DocumentSession`] owns the annotation store, the navigation cursor,
//! and the highlight cache for whichever document is in view, and talks to
//! the [`Backend`] for fetches and saves. All asynchronous failures are
//! converted to view state ([`ViewStatus`], [`SaveStatus`]) rather than
//! propagated; the worst case is a page failing to load or a save needing
//! a retry.
//!
//! # Staleness
//!
//! Every open and every search is issued under a ticket carrying a
//! generation number. Applying a result whose ticket generation no longer
//! matches the session's is a no-op, so a fetch for document A that
//! resolves after the user has navigated to document B is discarded rather
//! than applied. Cancelling a search bumps the generation the same way,
//! which is the whole cancellation mechanism: the in-flight future may
//! still complete, but its result can never land.
//!
//! The split into `begin_* / fetch / apply_*` keeps the suspension point
//! outside the session's mutable state; the `open_document` and
//! `run_search` conveniences drive all three steps for callers that do not
//! interleave.

use anyhow::Result;
use chrono::Utc;

use crate::backend::Backend;
use crate::config::{HighlightConfig, SelectionConfig};
use crate::cursor::NavigationCursor;
use crate::highlight::{self, HighlightCache};
use crate::models::{
    AnnotationBlob, Direction, Document, HighlightRequest, PageMetadata, SearchQuery, Segment,
    SharedPassage,
};
use crate::store::{AnnotationStore, SaveStatus};

/// Load state of the document view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    Idle,
    Loading,
    Ready,
    /// The document fetch failed; the message is for an inline indicator.
    Error(String),
}

/// Ticket for an in-flight document open. Results applied under a stale
/// ticket are discarded.
#[derive(Debug, Clone)]
pub struct OpenTicket {
    generation: u64,
    document_id: String,
}

/// Ticket for an in-flight result-set search.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    generation: u64,
}

/// Everything fetched when opening a document.
///
/// The annotation and shared-passage fetches are non-fatal; their failures
/// degrade to empty defaults while the page still renders.
/// `annotations_degraded` records that the empty blob came from a failed
/// fetch rather than from nothing being saved yet, so the view can warn
/// before a full-overwrite save discards server state.
#[derive(Debug, Clone)]
pub struct OpenPayload {
    pub document: Document,
    pub blob: AnnotationBlob,
    pub shared: Vec<SharedPassage>,
    pub annotations_degraded: bool,
}

/// Host-persisted snapshot of the in-progress search, replacing ambient
/// global storage. The host decides where it lives; the session only
/// defines the load/save boundary.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SessionState {
    pub query: SearchQuery,
    pub result_ids: Vec<String>,
    pub current_index: usize,
}

/// The active document view for one project.
pub struct DocumentSession<B: Backend> {
    backend: B,
    project_id: String,
    document: Option<Document>,
    store: AnnotationStore,
    cursor: NavigationCursor,
    cache: HighlightCache,
    status: ViewStatus,
    highlight: HighlightConfig,
    query: SearchQuery,
    shared: Vec<SharedPassage>,
    show_shared: bool,
    find_query: Option<String>,
    annotations_degraded: bool,
    open_generation: u64,
    search_generation: u64,
    search_loading: bool,
}

impl<B: Backend> DocumentSession<B> {
    pub fn new(backend: B, project_id: impl Into<String>) -> Self {
        Self {
            backend,
            project_id: project_id.into(),
            document: None,
            store: AnnotationStore::new(),
            cursor: NavigationCursor::default(),
            cache: HighlightCache::new(),
            status: ViewStatus::Idle,
            highlight: HighlightConfig::default(),
            query: SearchQuery::default(),
            shared: Vec::new(),
            show_shared: false,
            find_query: None,
            annotations_degraded: false,
            open_generation: 0,
            search_generation: 0,
            search_loading: false,
        }
    }

    /// Apply configured highlight styling and locator probe length.
    pub fn with_highlight_config(mut self, highlight: HighlightConfig) -> Self {
        self.highlight = highlight;
        self
    }

    /// Apply configured selection timings; the status revert delay is
    /// threaded into the annotation store.
    pub fn with_selection_config(mut self, selection: SelectionConfig) -> Self {
        self.store.set_revert_secs(selection.status_revert_secs as i64);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AnnotationStore {
        &mut self.store
    }

    pub fn cursor(&self) -> &NavigationCursor {
        &self.cursor
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn search_loading(&self) -> bool {
        self.search_loading
    }

    pub fn shared_passages(&self) -> &[SharedPassage] {
        &self.shared
    }

    /// True when the current view's empty annotation state is the result
    /// of a failed blob fetch rather than nothing being saved yet. A
    /// [`save`] while this is set overwrites whatever the backend holds,
    /// so hosts should warn (or re-open) first.
    ///
    /// [`save`]: DocumentSession::save
    pub fn annotations_degraded(&self) -> bool {
        self.annotations_degraded
    }

    pub fn set_show_shared(&mut self, show: bool) {
        self.show_shared = show;
    }

    /// Set or clear the find-in-page term.
    pub fn set_find_query(&mut self, term: Option<String>) {
        self.find_query = term.filter(|t| !t.trim().is_empty());
    }

    // ---- document open ----

    /// Start opening `document_id`. Invalidates every earlier open ticket.
    pub fn begin_open(&mut self, document_id: &str) -> OpenTicket {
        self.open_generation += 1;
        self.status = ViewStatus::Loading;
        OpenTicket {
            generation: self.open_generation,
            document_id: document_id.to_string(),
        }
    }

    /// Fetch the document, its annotation blob, and cross-project passages
    /// for an open ticket. A missing document or failed document fetch is
    /// an error; annotation and shared-passage failures degrade to empty
    /// defaults.
    pub async fn fetch(&self, ticket: &OpenTicket) -> Result<OpenPayload> {
        let document = self
            .backend
            .fetch_document(&ticket.document_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("unknown document {}", ticket.document_id))?;
        let (blob, annotations_degraded) = match self
            .backend
            .fetch_annotations(&self.project_id, &ticket.document_id)
            .await
        {
            Ok(saved) => (saved.unwrap_or_default(), false),
            Err(_) => (AnnotationBlob::default(), true),
        };
        let shared = self
            .backend
            .shared_passages(&ticket.document_id, &self.project_id)
            .await
            .unwrap_or_default();
        Ok(OpenPayload {
            document,
            blob,
            shared,
            annotations_degraded,
        })
    }

    /// Apply a completed fetch. Stale tickets are discarded; a fetch error
    /// under the current ticket puts the view in [`ViewStatus::Error`]
    /// with empty annotation state.
    pub fn apply_open(&mut self, ticket: OpenTicket, payload: Result<OpenPayload>) {
        if ticket.generation != self.open_generation {
            return;
        }
        match payload {
            Ok(payload) => {
                let metadata = PageMetadata {
                    date: payload.document.date,
                    topics: payload.document.topics.clone(),
                };
                self.store.load(payload.blob, metadata);
                self.shared = payload.shared;
                self.document = Some(payload.document);
                self.find_query = None;
                self.annotations_degraded = payload.annotations_degraded;
                self.status = ViewStatus::Ready;
            }
            Err(err) => {
                self.document = None;
                self.shared = Vec::new();
                self.store.load(AnnotationBlob::default(), PageMetadata::default());
                self.annotations_degraded = false;
                self.status = ViewStatus::Error(err.to_string());
            }
        }
    }

    /// Open a document end to end, positioning the cursor on it when it is
    /// part of the current result set.
    pub async fn open_document(&mut self, document_id: &str) {
        self.cursor.jump_to(document_id);
        let ticket = self.begin_open(document_id);
        let payload = self.fetch(&ticket).await;
        self.apply_open(ticket, payload);
    }

    /// Move through the search-result order and open the page now under
    /// the cursor. A boundary no-op leaves the current document in place.
    pub async fn navigate_result(&mut self, direction: Direction) {
        let before = self.cursor.current_id().map(str::to_string);
        let after = self.cursor.advance(direction).map(str::to_string);
        if let Some(id) = after {
            if before.as_deref() != Some(id.as_str()) {
                self.open_document(&id).await;
            }
        }
    }

    /// Open the physically adjacent page in volume order, independent of
    /// the search-result order. No-op at the corpus edge or on failure.
    pub async fn open_adjacent(&mut self, direction: Direction) {
        let current = match &self.document {
            Some(doc) => doc.id.clone(),
            None => return,
        };
        match self.backend.adjacent_document(&current, direction).await {
            Ok(Some(neighbour)) => self.open_document(&neighbour.id).await,
            Ok(None) | Err(_) => {}
        }
    }

    // ---- search ----

    /// Start a result-set search. Invalidates any earlier search ticket.
    pub fn begin_search(&mut self, query: SearchQuery) -> SearchTicket {
        self.search_generation += 1;
        self.query = query;
        self.search_loading = true;
        SearchTicket {
            generation: self.search_generation,
        }
    }

    /// Abort the in-flight search and clear the loading state. The
    /// superseded ticket's result can no longer be applied.
    pub fn cancel_search(&mut self) {
        self.search_generation += 1;
        self.search_loading = false;
    }

    /// Apply a completed search under `ticket`. Stale or cancelled tickets
    /// are discarded. On success the cursor is reconciled by id against
    /// the new result order; on failure the previous results are kept.
    pub fn apply_search(&mut self, ticket: SearchTicket, result: Result<Vec<String>>) {
        if ticket.generation != self.search_generation {
            return;
        }
        self.search_loading = false;
        if let Ok(ids) = result {
            self.cursor.reconcile(ids);
        }
    }

    /// Run a search end to end.
    pub async fn run_search(&mut self, query: SearchQuery) {
        let ticket = self.begin_search(query.clone());
        let result = self.backend.search(&query).await;
        self.apply_search(ticket, result);
    }

    // ---- save ----

    /// Push the full annotation snapshot and page metadata to the backend.
    /// Failures become [`SaveStatus::Error`] with the in-memory state
    /// retained for retry.
    pub async fn save(&mut self) -> SaveStatus {
        let document_id = match &self.document {
            Some(doc) => doc.id.clone(),
            None => return self.store.status(),
        };
        self.store.begin_save();
        let blob = self.store.snapshot();
        let metadata = self.store.metadata().clone();

        let saved = self
            .backend
            .save_annotations(&self.project_id, &document_id, &blob)
            .await;
        let saved = match saved {
            Ok(()) => {
                self.backend
                    .update_page_metadata(&document_id, &metadata)
                    .await
            }
            Err(err) => Err(err),
        };

        match saved {
            Ok(()) => self.store.save_succeeded(Utc::now()),
            Err(_) => self.store.save_failed(Utc::now()),
        }
        self.store.status()
    }

    // ---- rendering ----

    /// Composite the current passages, keywords, shared overlay, and
    /// find-in-page matches over the document text and render the segment
    /// sequence. With no document loaded this is empty.
    pub fn render(&mut self) -> Vec<Segment> {
        let document = match &self.document {
            Some(doc) => doc,
            None => return Vec::new(),
        };
        let mut requests: Vec<HighlightRequest> = Vec::new();

        for passage in self.store.passages() {
            requests.push(HighlightRequest::passage(
                passage,
                Some(self.highlight.passage_color.clone()),
            ));
        }
        if self.show_shared {
            for shared in &self.shared {
                requests.push(HighlightRequest::passage(
                    &shared.passage,
                    Some(format!("project:{}", shared.project_id)),
                ));
            }
        }
        for keyword in &self.query.keywords {
            requests.push(HighlightRequest::keyword(
                keyword,
                Some(self.highlight.keyword_color.clone()),
            ));
        }
        if let Some(term) = &self.find_query {
            for (start, end) in highlight::keyword_spans(&document.text, term) {
                requests.push(HighlightRequest::search(
                    start,
                    end,
                    Some(self.highlight.search_color.clone()),
                ));
            }
        }

        let intervals = self
            .cache
            .composite(&document.text, &requests, self.highlight.probe_len);
        highlight::render(&document.text, &intervals)
    }

    // ---- host persistence boundary ----

    /// Snapshot the in-progress search for host persistence.
    pub fn suspend(&self) -> SessionState {
        SessionState {
            query: self.query.clone(),
            result_ids: self.cursor.ordered_ids().to_vec(),
            current_index: self.cursor.current_index().unwrap_or(0),
        }
    }

    /// Restore a previously suspended search state.
    pub fn resume(&mut self, state: SessionState) {
        self.query = state.query;
        self.cursor = NavigationCursor::new(state.result_ids, state.current_index);
    }
}
