//! # Proximus Annotate
//!
//! The in-document annotation and highlight-overlay engine behind the
//! Proximus archival research tool's page-verification view.
//!
//! Given one page of transcribed archival text, the engine locates saved
//! passages inside possibly-drifted live text, composites passage, keyword,
//! and live-search highlights into a non-overlapping segment sequence,
//! captures text selections into durable passages, and keeps a
//! per-document annotation set synchronized with a pluggable backend.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌────────────┐
//! │ Selection  │──▶│ Annotation  │──▶│  Backend   │
//! │  Capture   │   │   Store     │   │  (trait)   │
//! └────────────┘   └──────┬──────┘   └────────────┘
//!                         │
//!                         ▼
//!      ┌─────────┐   ┌───────────┐   ┌───────────┐
//!      │ Locator │──▶│Compositor │──▶│ Segments  │
//!      └─────────┘   └───────────┘   └───────────┘
//! ```
//!
//! The [`session::DocumentSession`] coordinates all of the above for the
//! page currently in view, including stale-fetch discard and search
//! cancellation.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`locate`] | Whitespace-tolerant span location |
//! | [`highlight`] | Highlight compositing and rendering |
//! | [`selection`] | Selection-to-passage capture state machine |
//! | [`store`] | Per-document annotation store and save status |
//! | [`cursor`] | Navigation over an ordered result set |
//! | [`backend`] | Backend abstraction and in-memory implementation |
//! | [`session`] | Document view session coordination |

pub mod backend;
pub mod config;
pub mod cursor;
pub mod highlight;
pub mod locate;
pub mod models;
pub mod selection;
pub mod session;
pub mod store;
