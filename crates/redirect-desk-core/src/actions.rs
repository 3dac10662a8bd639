//! Remote mutation actions with a uniform outcome.
//!
//! [`RedirectActions`] wraps a store handle and turns every write into a
//! [`RemoteOutcome`]. Store errors are logged and reported in the outcome;
//! they never propagate as `Err` past this boundary.

use std::sync::Arc;

use serde::Serialize;

use crate::models::RedirectDraft;
use crate::store::RedirectStore;

/// Result of a remote write: `{ success, error? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Id of the document a create produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl RemoteOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            id: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            id: None,
        }
    }

    fn from_result(op: &str, result: anyhow::Result<()>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => {
                tracing::error!(operation = op, error = %e, "redirect write failed");
                Self::failed(e.to_string())
            }
        }
    }
}

/// Write operations bound to one store handle.
pub struct RedirectActions<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for RedirectActions<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RedirectStore + ?Sized> RedirectActions<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn delete_redirect(&self, id: &str) -> RemoteOutcome {
        RemoteOutcome::from_result("delete", self.store.delete(id).await)
    }

    pub async fn update_redirect_status(&self, id: &str, is_active: bool) -> RemoteOutcome {
        RemoteOutcome::from_result("set_active", self.store.set_active(id, is_active).await)
    }

    /// Writes every field of `draft`, clearing the unused destination.
    pub async fn update_redirect(&self, id: &str, draft: &RedirectDraft) -> RemoteOutcome {
        let draft = draft.clone().cleared();
        RemoteOutcome::from_result("update", self.store.update(id, &draft).await)
    }

    pub async fn create_redirect(&self, draft: &RedirectDraft) -> RemoteOutcome {
        let draft = draft.clone().cleared();
        match self.store.create(&draft).await {
            Ok(created) => {
                tracing::debug!(id = %created.id, source = %created.source, "redirect created");
                RemoteOutcome {
                    id: Some(created.id),
                    ..RemoteOutcome::ok()
                }
            }
            Err(e) => {
                tracing::error!(operation = "create", error = %e, "redirect write failed");
                RemoteOutcome::failed(e.to_string())
            }
        }
    }
}
