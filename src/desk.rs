//! Validated redirect writes over a table controller.
//!
//! [`Desk`] is what both surfaces (CLI and HTTP) drive. It owns the
//! [`RedirectTable`] and the [`RedirectActions`] for one store handle, runs
//! validation before every create or update, and turns failed remote
//! outcomes into errors.
//!
//! Each surface builds a fresh `Desk` per command or request: fetch,
//! analyze, mutate.

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use serde::Serialize;

use redirect_desk_core::actions::RemoteOutcome;
use redirect_desk_core::models::DestinationType;
use redirect_desk_core::validate::{validate_draft, validate_source};
use redirect_desk_core::{
    Locales, Redirect, RedirectActions, RedirectDraft, RedirectError, RedirectStore, RedirectTable, Resolver,
    ValidationResult,
};

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// Result of a successful create or update.
#[derive(Debug, Clone, Serialize)]
pub struct WriteReport {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

pub struct Desk<S: RedirectStore + ?Sized> {
    actions: RedirectActions<S>,
    table: RedirectTable,
}

impl<S: RedirectStore + ?Sized> Desk<S> {
    /// Fetch and analyze the full redirect set.
    pub async fn load(store: Arc<S>, resolver: Resolver) -> Result<Self> {
        let actions = RedirectActions::new(store);
        let mut table = RedirectTable::new(resolver);
        table.refresh(actions.store()).await?;
        Ok(Self { actions, table })
    }

    pub fn table(&self) -> &RedirectTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut RedirectTable {
        &mut self.table
    }

    pub fn store(&self) -> &S {
        self.actions.store()
    }

    fn locales(&self) -> &Locales {
        self.table.resolver().locales()
    }

    pub async fn validate_source(
        &self,
        source: &str,
        current_id: Option<&str>,
    ) -> Result<ValidationResult> {
        validate_source(self.store(), source, current_id).await
    }

    /// Validate `draft`; fails with [`RedirectError::Validation`] when it has
    /// errors and [`RedirectError::ContentNotFound`] when it points at a new
    /// internal reference that does not exist. Keeping an existing reference
    /// is allowed even if the content has since been removed.
    async fn check(
        &self,
        draft: &RedirectDraft,
        current: Option<&Redirect>,
    ) -> Result<ValidationResult> {
        let current_id = current.map(|r| r.id.as_str());
        let result = validate_draft(self.store(), draft, current_id, self.locales()).await?;
        if !result.is_valid {
            bail!(RedirectError::Validation(result));
        }

        if draft.destination_type == DestinationType::Internal {
            if let Some(content_id) = draft.internal_ref.as_deref() {
                let unchanged =
                    current.map_or(false, |r| r.internal_ref.as_deref() == Some(content_id));
                if !unchanged && self.store().get_content(content_id).await?.is_none() {
                    bail!(RedirectError::ContentNotFound(content_id.to_string()));
                }
            }
        }

        Ok(result)
    }

    pub async fn create(&mut self, draft: &RedirectDraft) -> Result<WriteReport> {
        let checked = self.check(draft, None).await?;
        let outcome = into_result(self.table.create(&self.actions, draft).await)?;
        let id = outcome
            .id
            .ok_or_else(|| anyhow!("store did not return an id for the new redirect"))?;
        tracing::info!(id = %id, source = %draft.source, "redirect created");
        Ok(WriteReport {
            id,
            warnings: checked.warnings,
        })
    }

    pub async fn update(&mut self, id: &str, draft: &RedirectDraft) -> Result<WriteReport> {
        let current = match self.table.get(id) {
            Some(row) => row.redirect.clone(),
            None => bail!(RedirectError::NotFound(id.to_string())),
        };
        let checked = self.check(draft, Some(&current)).await?;
        into_result(self.table.update(&self.actions, id, draft).await?)?;
        tracing::info!(id = %id, "redirect updated");
        Ok(WriteReport {
            id: id.to_string(),
            warnings: checked.warnings,
        })
    }

    pub async fn set_status(&mut self, id: &str, active: bool) -> Result<()> {
        into_result(self.table.set_status(&self.actions, id, active).await?)?;
        tracing::info!(id = %id, active, "redirect status changed");
        Ok(())
    }

    pub async fn delete(&mut self, id: &str) -> Result<()> {
        into_result(self.table.delete(&self.actions, id).await?)?;
        tracing::info!(id = %id, "redirect deleted");
        Ok(())
    }
}

/// Open the configured SQLite store and load a desk over it.
pub async fn open(config: &Config) -> Result<Desk<SqliteStore>> {
    let store = Arc::new(SqliteStore::open(config).await?);
    Desk::load(store, config.resolver()).await
}

fn into_result(outcome: RemoteOutcome) -> Result<RemoteOutcome> {
    if outcome.success {
        Ok(outcome)
    } else {
        let message = outcome
            .error
            .unwrap_or_else(|| "remote operation failed".to_string());
        Err(anyhow!(message))
    }
}
