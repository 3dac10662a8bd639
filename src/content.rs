//! `rdx content`: manage the documents internal redirects point at.
//!
//! Removing a document does not touch redirects that reference it; they
//! show up as broken destinations on the next fetch.

use anyhow::Result;

use redirect_desk_core::{ContentDocument, RedirectStore};

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

pub async fn run_content_add(config: &Config, doc: ContentDocument) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    store.put_content(&doc).await?;
    store.close().await;
    println!("saved {} ({})", doc.id, doc.doc_type);
    Ok(())
}

pub async fn run_content_list(config: &Config, json: bool) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let docs = store.list_content().await?;
    let resolver = config.resolver();
    store.close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&docs)?);
        return Ok(());
    }

    if docs.is_empty() {
        println!("No content documents.");
        return Ok(());
    }

    for doc in &docs {
        println!(
            "{:<24}  {:<10}  {:<4}  {}",
            doc.id,
            doc.doc_type,
            doc.language.as_deref().unwrap_or("-"),
            resolver.resolve(&doc.snapshot())
        );
    }
    Ok(())
}

pub async fn run_content_remove(config: &Config, id: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let removed = store.remove_content(id).await?;
    store.close().await;
    if removed {
        println!("removed {}", id);
    } else {
        println!("no content document {}", id);
    }
    Ok(())
}
