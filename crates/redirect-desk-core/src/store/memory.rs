//! In-memory [`RedirectStore`] implementation for tests and embedding.
//!
//! Uses `HashMap`s behind `std::sync::RwLock`. Redirects keep only the id of
//! their internal destination; the snapshot is joined on every read, so
//! removing a content document leaves dangling (broken) references exactly
//! as a real store would.
//!
//! Write failures can be simulated with [`InMemoryStore::set_fail_writes`],
//! and [`InMemoryStore::fetch_count`] reports how many full fetches ran.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::error::RedirectError;
use crate::models::{ContentDocument, Redirect, RedirectDraft};

use super::RedirectStore;

/// In-memory store for tests.
pub struct InMemoryStore {
    redirects: RwLock<HashMap<String, Redirect>>,
    content: RwLock<HashMap<String, ContentDocument>>,
    fail_writes: AtomicBool,
    fetches: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            redirects: RwLock::new(HashMap::new()),
            content: RwLock::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent redirect write fail as if the store were unreachable.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of completed [`RedirectStore::fetch_all`] calls.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RedirectError::Remote("store unavailable".to_string()).into());
        }
        Ok(())
    }

    fn joined(&self, redirect: &Redirect) -> Redirect {
        let content = self.content.read().unwrap();
        let mut out = redirect.clone();
        out.internal_destination = redirect
            .internal_ref
            .as_ref()
            .and_then(|id| content.get(id))
            .map(ContentDocument::snapshot);
        out
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RedirectStore for InMemoryStore {
    async fn fetch_all(&self) -> Result<Vec<Redirect>> {
        let mut all: Vec<Redirect> = {
            let redirects = self.redirects.read().unwrap();
            redirects.values().map(|r| self.joined(r)).collect()
        };
        all.sort_by(|a, b| a.source.cmp(&b.source));
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(all)
    }

    async fn get(&self, id: &str) -> Result<Option<Redirect>> {
        let redirects = self.redirects.read().unwrap();
        Ok(redirects.get(id).map(|r| self.joined(r)))
    }

    async fn find_by_source(
        &self,
        source: &str,
        exclude_id: Option<&str>,
    ) -> Result<Option<Redirect>> {
        let redirects = self.redirects.read().unwrap();
        Ok(redirects
            .values()
            .find(|r| r.source == source && Some(r.id.as_str()) != exclude_id)
            .map(|r| self.joined(r)))
    }

    async fn create(&self, draft: &RedirectDraft) -> Result<Redirect> {
        self.check_writable()?;
        let draft = draft.clone().cleared();
        let now = Utc::now();
        let redirect = Redirect {
            id: uuid::Uuid::new_v4().to_string(),
            source: draft.source,
            destination_type: draft.destination_type,
            internal_ref: draft.internal_ref,
            internal_destination: None,
            external_destination: draft.external_destination,
            redirect_type: draft.redirect_type,
            is_active: draft.is_active,
            language: draft.language,
            preserve_query_string: draft.preserve_query_string,
            notes: draft.notes,
            last_tested_at: None,
            created_at: now,
            updated_at: now,
        };
        self.redirects
            .write()
            .unwrap()
            .insert(redirect.id.clone(), redirect.clone());
        Ok(self.joined(&redirect))
    }

    async fn update(&self, id: &str, draft: &RedirectDraft) -> Result<()> {
        self.check_writable()?;
        let draft = draft.clone().cleared();
        let mut redirects = self.redirects.write().unwrap();
        let existing = match redirects.get_mut(id) {
            Some(r) => r,
            None => bail!(RedirectError::NotFound(id.to_string())),
        };
        existing.source = draft.source;
        existing.destination_type = draft.destination_type;
        existing.internal_ref = draft.internal_ref;
        existing.external_destination = draft.external_destination;
        existing.redirect_type = draft.redirect_type;
        existing.is_active = draft.is_active;
        existing.language = draft.language;
        existing.preserve_query_string = draft.preserve_query_string;
        existing.notes = draft.notes;
        existing.updated_at = Utc::now();
        Ok(())
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<()> {
        self.check_writable()?;
        let mut redirects = self.redirects.write().unwrap();
        match redirects.get_mut(id) {
            Some(r) => {
                r.is_active = active;
                r.updated_at = Utc::now();
                Ok(())
            }
            None => bail!(RedirectError::NotFound(id.to_string())),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.check_writable()?;
        match self.redirects.write().unwrap().remove(id) {
            Some(_) => Ok(()),
            None => bail!(RedirectError::NotFound(id.to_string())),
        }
    }

    async fn put_content(&self, doc: &ContentDocument) -> Result<()> {
        self.content
            .write()
            .unwrap()
            .insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn remove_content(&self, id: &str) -> Result<bool> {
        Ok(self.content.write().unwrap().remove(id).is_some())
    }

    async fn get_content(&self, id: &str) -> Result<Option<ContentDocument>> {
        Ok(self.content.read().unwrap().get(id).cloned())
    }

    async fn list_content(&self) -> Result<Vec<ContentDocument>> {
        let mut docs: Vec<ContentDocument> =
            self.content.read().unwrap().values().cloned().collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }
}
