//! Storage abstraction for redirect documents.
//!
//! The [`RedirectStore`] trait is the whole contract between Redirect Desk
//! and the document store: fetch everything, look up by source, and write
//! single documents. Implementations must be `Send + Sync` so one handle can
//! be shared by the CLI, the table controller, and the HTTP server.
//!
//! A store handle is constructed once per configuration and passed
//! explicitly to every routine that needs it.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ContentDocument, Redirect, RedirectDraft};

/// Abstract document store for redirects and the content they point at.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`fetch_all`](RedirectStore::fetch_all) | All redirects, joined with destination snapshots, ordered by source |
/// | [`get`](RedirectStore::get) | One redirect by id |
/// | [`find_by_source`](RedirectStore::find_by_source) | Duplicate lookup for validation |
/// | [`create`](RedirectStore::create) | Insert a redirect, assigning id and timestamps |
/// | [`update`](RedirectStore::update) | Overwrite all writable fields |
/// | [`set_active`](RedirectStore::set_active) | Toggle the active flag only |
/// | [`delete`](RedirectStore::delete) | Remove a redirect |
/// | [`get_content`](RedirectStore::get_content) | One content document by id |
///
/// Writes against an unknown id fail with
/// [`RedirectError::NotFound`](crate::error::RedirectError::NotFound).
#[async_trait]
pub trait RedirectStore: Send + Sync {
    /// Every redirect with its destination snapshot, ordered by source ascending.
    async fn fetch_all(&self) -> Result<Vec<Redirect>>;

    async fn get(&self, id: &str) -> Result<Option<Redirect>>;

    /// A redirect with exactly this source, ignoring `exclude_id`.
    async fn find_by_source(&self, source: &str, exclude_id: Option<&str>)
        -> Result<Option<Redirect>>;

    async fn create(&self, draft: &RedirectDraft) -> Result<Redirect>;

    /// Overwrite the writable fields. The destination field not selected by
    /// `destination_type` is cleared.
    async fn update(&self, id: &str, draft: &RedirectDraft) -> Result<()>;

    async fn set_active(&self, id: &str, active: bool) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Insert or replace a content document.
    async fn put_content(&self, doc: &ContentDocument) -> Result<()>;

    /// Returns `false` if no such document existed.
    async fn remove_content(&self, id: &str) -> Result<bool>;

    async fn get_content(&self, id: &str) -> Result<Option<ContentDocument>>;

    async fn list_content(&self) -> Result<Vec<ContentDocument>>;
}
