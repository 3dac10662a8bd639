//! Core data models for Redirect Desk.
//!
//! [`Redirect`] is the read model returned by a store: it carries a
//! denormalized [`DestinationSnapshot`] of the referenced content document,
//! taken at fetch time. [`RedirectDraft`] is the write model used for create
//! and full update.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RedirectError;

/// Language scope value meaning "applies to every locale".
pub const LANGUAGE_ALL: &str = "all";

/// Whether a redirect points at a content document or an absolute URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationType {
    Internal,
    External,
}

impl DestinationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationType::Internal => "internal",
            DestinationType::External => "external",
        }
    }
}

impl fmt::Display for DestinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DestinationType {
    type Err = RedirectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal" => Ok(DestinationType::Internal),
            "external" => Ok(DestinationType::External),
            other => Err(RedirectError::InvalidValue {
                field: "destination_type",
                value: other.to_string(),
            }),
        }
    }
}

/// HTTP semantics of a redirect when served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectType {
    Permanent,
    Temporary,
}

impl RedirectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectType::Permanent => "permanent",
            RedirectType::Temporary => "temporary",
        }
    }

    /// The HTTP status code a redirect server should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            RedirectType::Permanent => 301,
            RedirectType::Temporary => 302,
        }
    }
}

impl fmt::Display for RedirectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RedirectType {
    type Err = RedirectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "permanent" | "301" => Ok(RedirectType::Permanent),
            "temporary" | "302" => Ok(RedirectType::Temporary),
            other => Err(RedirectError::InvalidValue {
                field: "type",
                value: other.to_string(),
            }),
        }
    }
}

/// Snapshot of a referenced content document, taken when redirects are
/// fetched. Never synced incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationSnapshot {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub id: String,
    pub slug: Option<String>,
    pub language: Option<String>,
}

/// A redirect as read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redirect {
    pub id: String,
    pub source: String,
    pub destination_type: DestinationType,
    /// Id of the referenced content document, even when it no longer exists.
    pub internal_ref: Option<String>,
    /// `None` when the referenced document could not be joined.
    pub internal_destination: Option<DestinationSnapshot>,
    pub external_destination: Option<String>,
    #[serde(rename = "type")]
    pub redirect_type: RedirectType,
    pub is_active: bool,
    pub language: String,
    pub preserve_query_string: bool,
    pub notes: Option<String>,
    pub last_tested_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Redirect {
    /// Internal redirect whose referenced document is gone.
    pub fn is_broken(&self) -> bool {
        self.destination_type == DestinationType::Internal && self.internal_destination.is_none()
    }

    /// Content type of the internal destination, if resolvable.
    pub fn content_type(&self) -> Option<&str> {
        self.internal_destination
            .as_ref()
            .map(|d| d.doc_type.as_str())
    }
}

/// Fields written on create or full update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectDraft {
    pub source: String,
    pub destination_type: DestinationType,
    #[serde(default, alias = "internal_destination")]
    pub internal_ref: Option<String>,
    #[serde(default)]
    pub external_destination: Option<String>,
    #[serde(rename = "type", default = "default_redirect_type")]
    pub redirect_type: RedirectType,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub preserve_query_string: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_redirect_type() -> RedirectType {
    RedirectType::Permanent
}
fn default_true() -> bool {
    true
}
fn default_language() -> String {
    LANGUAGE_ALL.to_string()
}

impl RedirectDraft {
    /// An active, permanent external redirect for every language.
    pub fn external(source: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination_type: DestinationType::External,
            internal_ref: None,
            external_destination: Some(url.into()),
            redirect_type: RedirectType::Permanent,
            is_active: true,
            language: default_language(),
            preserve_query_string: false,
            notes: None,
        }
    }

    /// An active, permanent internal redirect for every language.
    pub fn internal(source: impl Into<String>, content_id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination_type: DestinationType::Internal,
            internal_ref: Some(content_id.into()),
            external_destination: None,
            redirect_type: RedirectType::Permanent,
            is_active: true,
            language: default_language(),
            preserve_query_string: false,
            notes: None,
        }
    }

    /// Rebuild the writable fields of an existing redirect.
    pub fn from_redirect(redirect: &Redirect) -> Self {
        Self {
            source: redirect.source.clone(),
            destination_type: redirect.destination_type,
            internal_ref: redirect.internal_ref.clone(),
            external_destination: redirect.external_destination.clone(),
            redirect_type: redirect.redirect_type,
            is_active: redirect.is_active,
            language: redirect.language.clone(),
            preserve_query_string: redirect.preserve_query_string,
            notes: redirect.notes.clone(),
        }
    }

    /// Clear the destination field the destination type does not use.
    pub fn cleared(mut self) -> Self {
        match self.destination_type {
            DestinationType::Internal => self.external_destination = None,
            DestinationType::External => self.internal_ref = None,
        }
        self
    }
}

/// A content document that internal redirects can point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub slug: Option<String>,
    pub language: Option<String>,
}

impl ContentDocument {
    pub fn snapshot(&self) -> DestinationSnapshot {
        DestinationSnapshot {
            doc_type: self.doc_type.clone(),
            id: self.id.clone(),
            slug: self.slug.clone(),
            language: self.language.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleared_drops_unused_destination() {
        let mut draft = RedirectDraft::external("/old", "https://example.com");
        draft.internal_ref = Some("doc-1".to_string());
        let cleared = draft.clone().cleared();
        assert_eq!(cleared.internal_ref, None);
        assert_eq!(cleared.external_destination.as_deref(), Some("https://example.com"));

        draft.destination_type = DestinationType::Internal;
        let cleared = draft.cleared();
        assert_eq!(cleared.external_destination, None);
        assert_eq!(cleared.internal_ref.as_deref(), Some("doc-1"));
    }

    #[test]
    fn test_redirect_type_parsing() {
        assert_eq!("permanent".parse::<RedirectType>().unwrap(), RedirectType::Permanent);
        assert_eq!("302".parse::<RedirectType>().unwrap(), RedirectType::Temporary);
        assert!("moved".parse::<RedirectType>().is_err());
        assert_eq!(RedirectType::Permanent.status_code(), 301);
    }

    #[test]
    fn test_draft_deserialize_defaults() {
        let draft: RedirectDraft = serde_json::from_str(
            r#"{"source": "/a", "destination_type": "external", "external_destination": "https://x.io"}"#,
        )
        .unwrap();
        assert!(draft.is_active);
        assert_eq!(draft.language, "all");
        assert_eq!(draft.redirect_type, RedirectType::Permanent);
        assert!(!draft.preserve_query_string);
    }
}
