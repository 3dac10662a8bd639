//! Redirect validation.
//!
//! Source rules are evaluated in order and the first failing rule
//! short-circuits with an error-only result:
//!
//! 1. empty source
//! 2. another redirect already uses the exact same source
//! 3. source does not start with `/`
//! 4. source contains an invalid character
//! 5. otherwise valid, with a warning when the path is not normalized
//!
//! Errors block a write; warnings never do.

use anyhow::Result;
use serde::Serialize;
use url::Url;

use crate::models::{DestinationType, Redirect, RedirectDraft};
use crate::normalize::{is_valid_path, normalize_path};
use crate::resolve::Locales;
use crate::store::RedirectStore;

pub const SOURCE_REQUIRED: &str = "Source URL is required";
pub const SOURCE_DUPLICATE: &str = "A redirect with this source path already exists";
pub const SOURCE_LEADING_SLASH: &str = "Path must start with /";
pub const SOURCE_INVALID_CHARS: &str = "Path contains invalid characters";
pub const URL_REQUIRED: &str = "External URL is required";
pub const URL_INVALID: &str = "Invalid URL format";
pub const URL_SCHEME: &str = "URL must use http or https protocol";
pub const URL_NO_DOMAIN: &str = "URL should include a valid domain";
pub const INTERNAL_REQUIRED: &str = "Internal destination is required";

/// Outcome of validating one or more fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Suggested canonical form when the source is not normalized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_path: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            normalized_path: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            errors: vec![error.into()],
            warnings: Vec::new(),
            normalized_path: None,
        }
    }

    /// Fold another field's result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        if self.normalized_path.is_none() {
            self.normalized_path = other.normalized_path;
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}

/// Rules 3-5: shape of a source that is known to be non-empty and unique.
fn check_source_shape(source: &str) -> ValidationResult {
    if !source.starts_with('/') {
        return ValidationResult::invalid(SOURCE_LEADING_SLASH);
    }

    if !is_valid_path(source) {
        return ValidationResult::invalid(SOURCE_INVALID_CHARS);
    }

    let normalized = normalize_path(source);
    if normalized != source {
        let mut result = ValidationResult::valid();
        result
            .warnings
            .push(format!("Path should be normalized to: {}", normalized));
        result.normalized_path = Some(normalized);
        return result;
    }

    ValidationResult::valid()
}

/// Validate a source against an already-fetched redirect set.
///
/// `current_id` is the redirect being edited; its own source never counts as
/// a duplicate.
pub fn validate_source_against(
    source: &str,
    current_id: Option<&str>,
    known: &[Redirect],
) -> ValidationResult {
    if source.is_empty() {
        return ValidationResult::invalid(SOURCE_REQUIRED);
    }

    let duplicate = known
        .iter()
        .any(|r| r.source == source && Some(r.id.as_str()) != current_id);
    if duplicate {
        return ValidationResult::invalid(SOURCE_DUPLICATE);
    }

    check_source_shape(source)
}

/// Validate a source, querying the store for a duplicate.
///
/// The duplicate lookup is the only I/O performed by validation.
pub async fn validate_source<S>(
    store: &S,
    source: &str,
    current_id: Option<&str>,
) -> Result<ValidationResult>
where
    S: RedirectStore + ?Sized,
{
    if source.is_empty() {
        return Ok(ValidationResult::invalid(SOURCE_REQUIRED));
    }

    if store.find_by_source(source, current_id).await?.is_some() {
        return Ok(ValidationResult::invalid(SOURCE_DUPLICATE));
    }

    Ok(check_source_shape(source))
}

/// Validate an external destination URL.
pub fn validate_external_url(url: &str) -> ValidationResult {
    if url.is_empty() {
        return ValidationResult::invalid(URL_REQUIRED);
    }

    let mut result = ValidationResult::valid();
    match Url::parse(url) {
        Ok(parsed) => {
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                result.errors.push(URL_SCHEME.to_string());
            }
            let has_domain = parsed.host_str().map_or(false, |h| h.contains('.'));
            if !has_domain {
                result.warnings.push(URL_NO_DOMAIN.to_string());
            }
        }
        Err(_) => result.errors.push(URL_INVALID.to_string()),
    }
    result.is_valid = result.errors.is_empty();
    result
}

/// Validate every field of a write: source, destination, language.
///
/// Errors aggregate across fields so the caller can report them together.
pub async fn validate_draft<S>(
    store: &S,
    draft: &RedirectDraft,
    current_id: Option<&str>,
    locales: &Locales,
) -> Result<ValidationResult>
where
    S: RedirectStore + ?Sized,
{
    let mut result = validate_source(store, &draft.source, current_id).await?;

    match draft.destination_type {
        DestinationType::External => {
            let url = draft.external_destination.as_deref().unwrap_or("");
            result.merge(validate_external_url(url));
        }
        DestinationType::Internal => {
            let missing = draft
                .internal_ref
                .as_deref()
                .map_or(true, |id| id.trim().is_empty());
            if missing {
                result.merge(ValidationResult::invalid(INTERNAL_REQUIRED));
            }
        }
    }

    if !locales.is_valid_scope(&draft.language) {
        result.merge(ValidationResult::invalid(format!(
            "Unsupported language: {}",
            draft.language
        )));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RedirectType;
    use crate::store::memory::InMemoryStore;
    use chrono::Utc;

    fn redirect(id: &str, source: &str) -> Redirect {
        let now = Utc::now();
        Redirect {
            id: id.to_string(),
            source: source.to_string(),
            destination_type: DestinationType::External,
            internal_ref: None,
            internal_destination: None,
            external_destination: Some("https://example.com".to_string()),
            redirect_type: RedirectType::Permanent,
            is_active: true,
            language: "all".to_string(),
            preserve_query_string: false,
            notes: None,
            last_tested_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_empty_source_required() {
        let r = validate_source_against("", None, &[]);
        assert!(!r.is_valid);
        assert_eq!(r.errors, vec![SOURCE_REQUIRED]);
    }

    #[test]
    fn test_duplicate_source_rejected_unless_self() {
        let known = vec![redirect("r1", "/old"), redirect("r2", "/other")];

        let r = validate_source_against("/old", None, &known);
        assert_eq!(r.errors, vec![SOURCE_DUPLICATE]);

        let r = validate_source_against("/old", Some("r2"), &known);
        assert_eq!(r.errors, vec![SOURCE_DUPLICATE]);

        let r = validate_source_against("/old", Some("r1"), &known);
        assert!(r.is_valid);
    }

    #[test]
    fn test_duplicate_is_exact_match() {
        let known = vec![redirect("r1", "/old/")];
        let r = validate_source_against("/old", None, &known);
        assert!(r.is_valid);
    }

    #[test]
    fn test_rules_short_circuit_in_order() {
        // Duplicate wins over the missing leading slash.
        let known = vec![redirect("r1", "old page")];
        let r = validate_source_against("old page", None, &known);
        assert_eq!(r.errors, vec![SOURCE_DUPLICATE]);

        // Leading slash wins over invalid characters.
        let r = validate_source_against("old page", None, &[]);
        assert_eq!(r.errors, vec![SOURCE_LEADING_SLASH]);

        let r = validate_source_against("/old page", None, &[]);
        assert_eq!(r.errors, vec![SOURCE_INVALID_CHARS]);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn test_unnormalized_source_warns_but_passes() {
        let r = validate_source_against("/blog//post/", None, &[]);
        assert!(r.is_valid);
        assert!(r.errors.is_empty());
        assert_eq!(r.warnings, vec!["Path should be normalized to: /blog/post"]);
        assert_eq!(r.normalized_path.as_deref(), Some("/blog/post"));
    }

    #[test]
    fn test_external_url_rules() {
        let r = validate_external_url("ftp://example.com");
        assert!(!r.is_valid);
        assert_eq!(r.errors, vec![URL_SCHEME]);

        let r = validate_external_url("not a url");
        assert!(!r.is_valid);
        assert_eq!(r.errors, vec![URL_INVALID]);

        let r = validate_external_url("https://example.com/path");
        assert!(r.is_valid);
        assert!(r.warnings.is_empty());

        let r = validate_external_url("");
        assert_eq!(r.errors, vec![URL_REQUIRED]);
    }

    #[test]
    fn test_external_url_without_domain_warns() {
        let r = validate_external_url("http://localhost:8080/x");
        assert!(r.is_valid);
        assert_eq!(r.warnings, vec![URL_NO_DOMAIN]);
    }

    #[tokio::test]
    async fn test_validate_source_queries_store() {
        let store = InMemoryStore::new();
        let created = store
            .create(&RedirectDraft::external("/taken", "https://example.com"))
            .await
            .unwrap();

        let r = validate_source(&store, "/taken", None).await.unwrap();
        assert_eq!(r.errors, vec![SOURCE_DUPLICATE]);

        let r = validate_source(&store, "/taken", Some(&created.id))
            .await
            .unwrap();
        assert!(r.is_valid);

        let r = validate_source(&store, "/free", None).await.unwrap();
        assert!(r.is_valid);
    }

    #[tokio::test]
    async fn test_validate_draft_aggregates_fields() {
        let store = InMemoryStore::new();
        let mut draft = RedirectDraft::external("/ok", "ftp://files.example.com");
        draft.language = "de".to_string();

        let r = validate_draft(&store, &draft, None, &Locales::default())
            .await
            .unwrap();
        assert!(!r.is_valid);
        assert_eq!(
            r.errors,
            vec![URL_SCHEME.to_string(), "Unsupported language: de".to_string()]
        );

        let draft = RedirectDraft {
            internal_ref: None,
            ..RedirectDraft::internal("/ok", "x")
        };
        let r = validate_draft(&store, &draft, None, &Locales::default())
            .await
            .unwrap();
        assert_eq!(r.errors, vec![INTERNAL_REQUIRED]);
    }
}
