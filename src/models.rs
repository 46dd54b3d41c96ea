//! Core data models used throughout the annotation engine.
//!
//! These types represent the documents, passages, and highlight data that
//! flow between the backend collaborator, the annotation store, and the
//! highlight compositor.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One transcribed archival page as returned by the backend.
///
/// Immutable for the duration of a view session; navigating to another
/// page replaces it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    /// Full plain-text transcription of the page.
    pub text: String,
    pub image_url: String,
    pub volume_title: String,
    pub page_number: String,
    pub volume_set: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// A user-marked excerpt of a document's text.
///
/// `text` is captured verbatim at creation time and is never empty.
/// `start`/`end` are best-effort byte offsets into the document text at
/// capture time and may be stale after upstream text cleanup; the span
/// locator re-derives them for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub project_id: String,
}

/// The origin of a highlight request, in ascending merge priority.
///
/// The derived ordering is the overlap tie-break rule: a passage highlight
/// outranks a keyword highlight, which outranks a live-search highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HighlightKind {
    Search,
    Keyword,
    Passage,
}

impl HighlightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightKind::Search => "search",
            HighlightKind::Keyword => "keyword",
            HighlightKind::Passage => "passage",
        }
    }
}

/// A request to highlight occurrences of some source text.
///
/// Rebuilt from scratch on every render: passages and keywords carry only
/// their source text and are resolved by the compositor, while live-search
/// requests arrive with a pre-resolved byte span (the search feature
/// computed its matches against the same text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightRequest {
    pub source_text: String,
    pub kind: HighlightKind,
    pub owner_id: Option<String>,
    pub color: Option<String>,
    /// Pre-resolved `[start, end)` byte span; only meaningful for
    /// [`HighlightKind::Search`] requests.
    pub span: Option<(usize, usize)>,
}

impl HighlightRequest {
    pub fn passage(passage: &Passage, color: Option<String>) -> Self {
        Self {
            source_text: passage.text.clone(),
            kind: HighlightKind::Passage,
            owner_id: Some(passage.id.clone()),
            color,
            span: None,
        }
    }

    pub fn keyword(keyword: &str, color: Option<String>) -> Self {
        Self {
            source_text: keyword.to_string(),
            kind: HighlightKind::Keyword,
            owner_id: None,
            color,
            span: None,
        }
    }

    pub fn search(start: usize, end: usize, color: Option<String>) -> Self {
        Self {
            source_text: String::new(),
            kind: HighlightKind::Search,
            owner_id: None,
            color,
            span: Some((start, end)),
        }
    }
}

/// A resolved, styled character range over a document's text.
///
/// Half-open `[start, end)` in bytes. Within one compositor run the output
/// intervals are pairwise non-overlapping, sorted ascending by `start`, and
/// `content` equals `text[start..end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightInterval {
    pub start: usize,
    pub end: usize,
    pub content: String,
    pub kind: HighlightKind,
    pub owner_id: Option<String>,
    pub color: Option<String>,
}

/// One piece of the rendered text sequence.
///
/// Concatenating every segment's content reconstructs the document text
/// exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Plain(String),
    Highlighted(HighlightInterval),
}

impl Segment {
    pub fn content(&self) -> &str {
        match self {
            Segment::Plain(text) => text,
            Segment::Highlighted(interval) => &interval.content,
        }
    }
}

/// The full per-document annotation payload for one project.
///
/// Saved as a single overwrite of the stored blob; there is no partial
/// update. Passage notes live in a separate map keyed by passage id, as the
/// backend stores them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationBlob {
    #[serde(default)]
    pub passages: Vec<Passage>,
    #[serde(default)]
    pub page_notes: String,
    #[serde(default)]
    pub passage_notes: HashMap<String, String>,
}

/// Document-level metadata shared across projects (date and topic tags).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Another project's saved passage on the same document, for optional
/// overlay highlighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedPassage {
    pub project_id: String,
    pub project_title: String,
    pub passage: Passage,
}

/// Search parameters for a result-set query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub volumes: Vec<String>,
    #[serde(default)]
    pub page_numbers: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Direction of movement through an ordered sequence of documents, used by
/// both the navigation cursor (result order) and adjacent-page lookup
/// (physical volume order).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}
