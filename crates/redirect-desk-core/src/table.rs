//! Table controller: filtered/sorted views over the analyzed redirect set
//! and optimistic mutations reconciled against the store.
//!
//! Filtering and sorting are pure projections over the rows held in memory;
//! they never reorder or change the rows themselves.
//!
//! # Mutations
//!
//! Each mutation moves through `Pending → Committed | RolledBack` exactly
//! once:
//!
//! | Mutation | Local effect on begin | On remote failure |
//! |----------|-----------------------|-------------------|
//! | status   | flip `is_active`      | restore previous value |
//! | delete   | remove the row        | full re-fetch |
//! | update   | none                  | none (error is surfaced) |
//!
//! A successful update triggers a re-fetch so the displayed row matches the
//! store. The two-phase API ([`RedirectTable::begin_status_change`] and
//! friends, then [`RedirectTable::settle`]) lets a caller keep interacting
//! while the remote call is in flight.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::actions::{RedirectActions, RemoteOutcome};
use crate::analyze::{analyze, summarize, AnalysisSummary, AnalyzedRedirect};
use crate::error::RedirectError;
use crate::models::{Redirect, RedirectDraft};
use crate::resolve::Resolver;
use crate::store::RedirectStore;

// ═══════════════════════════════════════════════════════════════════════
// View query
// ═══════════════════════════════════════════════════════════════════════

/// Status filter. `Issues` keeps rows with a chain or a broken destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
    Issues,
}

impl FromStr for StatusFilter {
    type Err = RedirectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "inactive" => Ok(StatusFilter::Inactive),
            "issues" => Ok(StatusFilter::Issues),
            other => Err(RedirectError::InvalidValue {
                field: "filter",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Created,
    Source,
    Destination,
    Type,
    Language,
}

impl FromStr for SortField {
    type Err = RedirectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" | "created_at" | "createdAt" => Ok(SortField::Created),
            "source" => Ok(SortField::Source),
            "destination" => Ok(SortField::Destination),
            "type" => Ok(SortField::Type),
            "language" | "lang" => Ok(SortField::Language),
            other => Err(RedirectError::InvalidValue {
                field: "sort",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = RedirectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(RedirectError::InvalidValue {
                field: "direction",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

/// Single-key sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Header-click behaviour: the same field ascending flips to descending,
    /// anything else starts ascending.
    pub fn toggle(&mut self, field: SortField) {
        self.direction = if self.field == field && self.direction == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        self.field = field;
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::new(SortField::Created, SortDirection::Desc)
    }
}

/// Filters (AND-composed) plus sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub status: StatusFilter,
    /// `None` means every content type.
    pub content_type: Option<String>,
    pub search: String,
    pub sort: Sort,
}

/// Locale-aware string ordering: case-insensitive first, lowercase before
/// uppercase on ties.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let primary = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    primary.then_with(|| b.cmp(a))
}

enum SortKey<'a> {
    Time(i64),
    Text(&'a str),
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn sort_key(row: &AnalyzedRedirect, field: SortField) -> Option<SortKey<'_>> {
    let r = &row.redirect;
    match field {
        SortField::Created => Some(SortKey::Time(r.created_at.timestamp_millis())),
        SortField::Source => non_empty(&r.source).map(SortKey::Text),
        SortField::Destination => row.target.as_deref().and_then(non_empty).map(SortKey::Text),
        SortField::Type => Some(SortKey::Text(r.redirect_type.as_str())),
        SortField::Language => non_empty(&r.language).map(SortKey::Text),
    }
}

/// Compare two rows under `sort`. Missing keys sort last in either direction.
pub fn compare_rows(a: &AnalyzedRedirect, b: &AnalyzedRedirect, sort: Sort) -> Ordering {
    match (sort_key(a, sort.field), sort_key(b, sort.field)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(ka), Some(kb)) => {
            let ord = match (ka, kb) {
                (SortKey::Time(x), SortKey::Time(y)) => x.cmp(&y),
                (SortKey::Text(x), SortKey::Text(y)) => locale_compare(x, y),
                _ => Ordering::Equal,
            };
            match sort.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

fn matches(row: &AnalyzedRedirect, query: &ViewQuery, needle: &str) -> bool {
    let status_ok = match query.status {
        StatusFilter::All => true,
        StatusFilter::Active => row.redirect.is_active,
        StatusFilter::Inactive => !row.redirect.is_active,
        StatusFilter::Issues => row.has_issues(),
    };
    if !status_ok {
        return false;
    }

    if let Some(ct) = &query.content_type {
        if row.redirect.content_type() != Some(ct.as_str()) {
            return false;
        }
    }

    if needle.is_empty() {
        return true;
    }
    row.redirect.source.to_lowercase().contains(needle)
        || row.resolved_destination.to_lowercase().contains(needle)
}

/// Filter and sort `rows` without touching them.
pub fn project<'a>(rows: &'a [AnalyzedRedirect], query: &ViewQuery) -> Vec<&'a AnalyzedRedirect> {
    let needle = query.search.to_lowercase();
    let mut out: Vec<&AnalyzedRedirect> =
        rows.iter().filter(|r| matches(r, query, &needle)).collect();
    out.sort_by(|a, b| compare_rows(a, b, query.sort));
    out
}

/// `"all"` followed by each distinct internal content type, first-seen order.
pub fn content_types(rows: &[AnalyzedRedirect]) -> Vec<String> {
    let mut types = vec!["all".to_string()];
    for row in rows {
        if let Some(t) = row.redirect.content_type() {
            if !types.iter().any(|x| x == t) {
                types.push(t.to_string());
            }
        }
    }
    types
}

// ═══════════════════════════════════════════════════════════════════════
// Mutations
// ═══════════════════════════════════════════════════════════════════════

/// Settled records kept in the journal; older ones are dropped first.
pub const JOURNAL_LIMIT: usize = 64;

/// Handle for one in-flight mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationState {
    Pending,
    Committed,
    RolledBack,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    Status { previous: bool, next: bool },
    Delete,
    Update,
}

#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub ticket: MutationTicket,
    pub redirect_id: String,
    pub kind: MutationKind,
    pub state: MutationState,
    pub error: Option<String>,
}

/// What settling a mutation requires of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub state: MutationState,
    pub needs_refetch: bool,
}

/// In-memory redirect table with view state and a mutation journal.
pub struct RedirectTable {
    resolver: Resolver,
    rows: Vec<AnalyzedRedirect>,
    query: ViewQuery,
    journal: Vec<MutationRecord>,
    next_ticket: u64,
}

impl RedirectTable {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            rows: Vec::new(),
            query: ViewQuery::default(),
            journal: Vec::new(),
            next_ticket: 0,
        }
    }

    /// Replace the rows with a fresh analysis of `redirects`.
    pub fn load(&mut self, redirects: Vec<Redirect>) {
        self.rows = analyze(redirects, &self.resolver);
    }

    /// Fetch everything from the store and re-analyze.
    pub async fn refresh<S>(&mut self, store: &S) -> Result<()>
    where
        S: RedirectStore + ?Sized,
    {
        let redirects = store.fetch_all().await?;
        tracing::debug!(count = redirects.len(), "redirects fetched");
        self.load(redirects);
        Ok(())
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn rows(&self) -> &[AnalyzedRedirect] {
        &self.rows
    }

    pub fn get(&self, id: &str) -> Option<&AnalyzedRedirect> {
        self.rows.iter().find(|r| r.id() == id)
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.query.status = status;
    }

    /// `"all"` clears the content-type filter.
    pub fn set_content_type(&mut self, content_type: &str) {
        self.query.content_type = match content_type {
            "" | "all" => None,
            t => Some(t.to_string()),
        };
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
    }

    pub fn set_sort(&mut self, sort: Sort) {
        self.query.sort = sort;
    }

    pub fn toggle_sort(&mut self, field: SortField) {
        self.query.sort.toggle(field);
    }

    /// The current filtered, sorted view.
    pub fn view(&self) -> Vec<&AnalyzedRedirect> {
        project(&self.rows, &self.query)
    }

    pub fn content_types(&self) -> Vec<String> {
        content_types(&self.rows)
    }

    pub fn summary(&self) -> AnalysisSummary {
        summarize(&self.rows)
    }

    pub fn journal(&self) -> &[MutationRecord] {
        &self.journal
    }

    /// Ids of redirects with a mutation still in flight.
    pub fn pending(&self) -> Vec<&str> {
        self.journal
            .iter()
            .filter(|m| m.state == MutationState::Pending)
            .map(|m| m.redirect_id.as_str())
            .collect()
    }

    fn record(&mut self, redirect_id: &str, kind: MutationKind) -> MutationTicket {
        let ticket = MutationTicket(self.next_ticket);
        self.next_ticket += 1;
        self.journal.push(MutationRecord {
            ticket,
            redirect_id: redirect_id.to_string(),
            kind,
            state: MutationState::Pending,
            error: None,
        });
        ticket
    }

    fn row_mut(&mut self, id: &str) -> Option<&mut AnalyzedRedirect> {
        self.rows.iter_mut().find(|r| r.redirect.id == id)
    }

    /// Optimistically set `is_active` and open a status mutation.
    pub fn begin_status_change(
        &mut self,
        id: &str,
        active: bool,
    ) -> Result<MutationTicket, RedirectError> {
        let row = self
            .row_mut(id)
            .ok_or_else(|| RedirectError::NotFound(id.to_string()))?;
        let previous = row.redirect.is_active;
        row.redirect.is_active = active;
        Ok(self.record(
            id,
            MutationKind::Status {
                previous,
                next: active,
            },
        ))
    }

    /// Optimistically remove the row and open a delete mutation.
    pub fn begin_delete(&mut self, id: &str) -> Result<MutationTicket, RedirectError> {
        let idx = self
            .rows
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| RedirectError::NotFound(id.to_string()))?;
        self.rows.remove(idx);
        Ok(self.record(id, MutationKind::Delete))
    }

    /// Open an update mutation. Nothing changes locally until a re-fetch.
    pub fn begin_update(&mut self, id: &str) -> Result<MutationTicket, RedirectError> {
        if self.get(id).is_none() {
            return Err(RedirectError::NotFound(id.to_string()));
        }
        Ok(self.record(id, MutationKind::Update))
    }

    /// Apply the remote outcome of a pending mutation.
    ///
    /// Returns `None` for an unknown or already-settled ticket, so a
    /// rollback can never run twice.
    pub fn settle(&mut self, ticket: MutationTicket, outcome: &RemoteOutcome) -> Option<Settlement> {
        let idx = self
            .journal
            .iter()
            .position(|m| m.ticket == ticket && m.state == MutationState::Pending)?;
        let (redirect_id, kind) = {
            let m = &self.journal[idx];
            (m.redirect_id.clone(), m.kind.clone())
        };

        let settlement = if outcome.success {
            Settlement {
                state: MutationState::Committed,
                needs_refetch: kind == MutationKind::Update,
            }
        } else {
            match kind {
                MutationKind::Status { previous, .. } => {
                    // A later change on the same row owns the visible value;
                    // hand it our baseline instead of overwriting it.
                    let later = self.journal[idx + 1..].iter_mut().find(|m| {
                        m.redirect_id == redirect_id
                            && m.state != MutationState::RolledBack
                            && matches!(m.kind, MutationKind::Status { .. })
                    });
                    let restore = match later {
                        Some(MutationRecord {
                            state: MutationState::Pending,
                            kind: MutationKind::Status { previous: p, .. },
                            ..
                        }) => {
                            *p = previous;
                            false
                        }
                        Some(_) => false,
                        None => true,
                    };
                    if restore {
                        if let Some(row) = self.row_mut(&redirect_id) {
                            row.redirect.is_active = previous;
                        }
                    }
                    tracing::warn!(redirect_id = %redirect_id, "status change rolled back");
                    Settlement {
                        state: MutationState::RolledBack,
                        needs_refetch: false,
                    }
                }
                MutationKind::Delete => {
                    tracing::warn!(redirect_id = %redirect_id, "delete failed; re-fetching");
                    Settlement {
                        state: MutationState::RolledBack,
                        needs_refetch: true,
                    }
                }
                MutationKind::Update => Settlement {
                    state: MutationState::RolledBack,
                    needs_refetch: false,
                },
            }
        };

        let record = &mut self.journal[idx];
        record.state = settlement.state;
        record.error = outcome.error.clone();
        self.prune();
        Some(settlement)
    }

    fn prune(&mut self) {
        let settled = self
            .journal
            .iter()
            .filter(|m| m.state != MutationState::Pending)
            .count();
        let mut excess = settled.saturating_sub(JOURNAL_LIMIT);
        if excess == 0 {
            return;
        }
        self.journal.retain(|m| {
            if excess > 0 && m.state != MutationState::Pending {
                excess -= 1;
                false
            } else {
                true
            }
        });
    }

    async fn finish<S>(&mut self, store: &S, ticket: MutationTicket, outcome: &RemoteOutcome)
    where
        S: RedirectStore + ?Sized,
    {
        if let Some(settlement) = self.settle(ticket, outcome) {
            if settlement.needs_refetch {
                if let Err(e) = self.refresh(store).await {
                    tracing::warn!(error = %e, "re-fetch after mutation failed");
                }
            }
        }
    }

    /// Optimistic status change against the store.
    pub async fn set_status<S>(
        &mut self,
        actions: &RedirectActions<S>,
        id: &str,
        active: bool,
    ) -> Result<RemoteOutcome, RedirectError>
    where
        S: RedirectStore + ?Sized,
    {
        let ticket = self.begin_status_change(id, active)?;
        let outcome = actions.update_redirect_status(id, active).await;
        self.finish(actions.store(), ticket, &outcome).await;
        Ok(outcome)
    }

    /// Optimistic delete against the store.
    pub async fn delete<S>(
        &mut self,
        actions: &RedirectActions<S>,
        id: &str,
    ) -> Result<RemoteOutcome, RedirectError>
    where
        S: RedirectStore + ?Sized,
    {
        let ticket = self.begin_delete(id)?;
        let outcome = actions.delete_redirect(id).await;
        self.finish(actions.store(), ticket, &outcome).await;
        Ok(outcome)
    }

    /// Full update against the store; re-fetches on success.
    ///
    /// Validation is the caller's job (see
    /// [`validate_draft`](crate::validate::validate_draft)).
    pub async fn update<S>(
        &mut self,
        actions: &RedirectActions<S>,
        id: &str,
        draft: &RedirectDraft,
    ) -> Result<RemoteOutcome, RedirectError>
    where
        S: RedirectStore + ?Sized,
    {
        let ticket = self.begin_update(id)?;
        let outcome = actions.update_redirect(id, draft).await;
        self.finish(actions.store(), ticket, &outcome).await;
        Ok(outcome)
    }

    /// Create a redirect and re-fetch on success.
    pub async fn create<S>(&mut self, actions: &RedirectActions<S>, draft: &RedirectDraft) -> RemoteOutcome
    where
        S: RedirectStore + ?Sized,
    {
        let outcome = actions.create_redirect(draft).await;
        if outcome.success {
            if let Err(e) = self.refresh(actions.store()).await {
                tracing::warn!(error = %e, "re-fetch after create failed");
            }
        }
        outcome
    }
}
