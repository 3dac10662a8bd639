//! Redirect writes from the CLI: `add`, `edit`, `enable`/`disable`,
//! `delete`, and `validate`.

use anyhow::{bail, Result};

use redirect_desk_core::models::{DestinationType, RedirectType};
use redirect_desk_core::{RedirectDraft, RedirectError};

use crate::config::Config;
use crate::desk::{self, WriteReport};

/// Field changes collected from CLI flags. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct DraftChanges {
    pub source: Option<String>,
    pub url: Option<String>,
    pub content: Option<String>,
    pub redirect_type: Option<RedirectType>,
    pub language: Option<String>,
    pub active: Option<bool>,
    pub preserve_query_string: Option<bool>,
    pub notes: Option<String>,
}

impl DraftChanges {
    /// Build a draft for a new redirect. Needs a source and exactly one
    /// destination.
    pub fn into_new_draft(self) -> Result<RedirectDraft> {
        let source = match &self.source {
            Some(s) => s.clone(),
            None => bail!("a source path is required"),
        };
        let base = match (&self.url, &self.content) {
            (Some(url), None) => RedirectDraft::external(source, url.clone()),
            (None, Some(id)) => RedirectDraft::internal(source, id.clone()),
            (None, None) => bail!("one of --url or --content is required"),
            (Some(_), Some(_)) => bail!("--url and --content cannot be combined"),
        };
        self.apply(base)
    }

    /// Apply the changes on top of an existing draft.
    pub fn apply(self, mut draft: RedirectDraft) -> Result<RedirectDraft> {
        if self.url.is_some() && self.content.is_some() {
            bail!("--url and --content cannot be combined");
        }
        if let Some(source) = self.source {
            draft.source = source;
        }
        if let Some(url) = self.url {
            draft.destination_type = DestinationType::External;
            draft.external_destination = Some(url);
        }
        if let Some(id) = self.content {
            draft.destination_type = DestinationType::Internal;
            draft.internal_ref = Some(id);
        }
        if let Some(t) = self.redirect_type {
            draft.redirect_type = t;
        }
        if let Some(language) = self.language {
            draft.language = language;
        }
        if let Some(active) = self.active {
            draft.is_active = active;
        }
        if let Some(pqs) = self.preserve_query_string {
            draft.preserve_query_string = pqs;
        }
        if let Some(notes) = self.notes {
            draft.notes = if notes.is_empty() { None } else { Some(notes) };
        }
        Ok(draft.cleared())
    }
}

fn print_report(verb: &str, report: &WriteReport) {
    println!("{} {}", verb, report.id);
    for w in &report.warnings {
        println!("warning: {}", w);
    }
}

pub async fn run_add(config: &Config, changes: DraftChanges) -> Result<()> {
    let draft = changes.into_new_draft()?;
    let mut desk = desk::open(config).await?;
    let report = desk.create(&draft).await?;
    print_report("created", &report);
    Ok(())
}

pub async fn run_edit(config: &Config, id: &str, changes: DraftChanges) -> Result<()> {
    let mut desk = desk::open(config).await?;
    let existing = match desk.table().get(id) {
        Some(row) => RedirectDraft::from_redirect(&row.redirect),
        None => bail!(RedirectError::NotFound(id.to_string())),
    };
    let draft = changes.apply(existing)?;
    let report = desk.update(id, &draft).await?;
    print_report("updated", &report);
    Ok(())
}

pub async fn run_set_status(config: &Config, id: &str, active: bool) -> Result<()> {
    let mut desk = desk::open(config).await?;
    desk.set_status(id, active).await?;
    println!("{} {}", if active { "enabled" } else { "disabled" }, id);
    Ok(())
}

pub async fn run_delete(config: &Config, id: &str) -> Result<()> {
    let mut desk = desk::open(config).await?;
    desk.delete(id).await?;
    println!("deleted {}", id);
    Ok(())
}

/// Print the validation result for a source. Exits with status 1 when the
/// source has errors.
pub async fn run_validate(config: &Config, source: &str, current_id: Option<&str>) -> Result<()> {
    let desk = desk::open(config).await?;
    let result = desk.validate_source(source, current_id).await?;

    println!("{}", if result.is_valid { "valid" } else { "invalid" });
    for e in &result.errors {
        println!("error: {}", e);
    }
    for w in &result.warnings {
        println!("warning: {}", w);
    }

    if !result.is_valid {
        std::process::exit(1);
    }
    Ok(())
}
