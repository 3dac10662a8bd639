//! SQLite-backed [`RedirectStore`] implementation.
//!
//! Redirects keep only the id of their internal destination. Every read joins
//! the `content` table, so a deleted content document surfaces as a redirect
//! with `internal_destination = None` (a broken destination).
//!
//! Timestamps are stored as Unix milliseconds.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use redirect_desk_core::error::RedirectError;
use redirect_desk_core::models::{
    ContentDocument, DestinationSnapshot, Redirect, RedirectDraft,
};
use redirect_desk_core::store::RedirectStore;

use crate::config::Config;
use crate::db;

const SELECT_REDIRECTS: &str = r#"
    SELECT r.id, r.source, r.destination_type, r.internal_ref, r.external_destination,
           r.redirect_type, r.is_active, r.language, r.preserve_query_string, r.notes,
           r.last_tested_at, r.created_at, r.updated_at,
           c.id AS content_id, c.doc_type AS content_type,
           c.slug AS content_slug, c.language AS content_language
    FROM redirects r
    LEFT JOIN content c ON c.id = r.internal_ref
"#;

/// SQLite implementation of [`RedirectStore`].
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect using `[db]` from `config`. The schema must already exist
    /// (`rdx init`).
    pub async fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| anyhow!("timestamp out of range: {}", ms))
}

fn row_to_redirect(row: &SqliteRow) -> Result<Redirect> {
    let destination_type: String = row.try_get("destination_type")?;
    let redirect_type: String = row.try_get("redirect_type")?;
    let last_tested_at: Option<i64> = row.try_get("last_tested_at")?;

    let content_id: Option<String> = row.try_get("content_id")?;
    let internal_destination = match content_id {
        Some(id) => Some(DestinationSnapshot {
            doc_type: row.try_get("content_type")?,
            id,
            slug: row.try_get("content_slug")?,
            language: row.try_get("content_language")?,
        }),
        None => None,
    };

    Ok(Redirect {
        id: row.try_get("id")?,
        source: row.try_get("source")?,
        destination_type: destination_type.parse()?,
        internal_ref: row.try_get("internal_ref")?,
        internal_destination,
        external_destination: row.try_get("external_destination")?,
        redirect_type: redirect_type.parse()?,
        is_active: row.try_get("is_active")?,
        language: row.try_get("language")?,
        preserve_query_string: row.try_get("preserve_query_string")?,
        notes: row.try_get("notes")?,
        last_tested_at: last_tested_at.map(from_millis).transpose()?,
        created_at: from_millis(row.try_get("created_at")?)?,
        updated_at: from_millis(row.try_get("updated_at")?)?,
    })
}

fn row_to_content(row: &SqliteRow) -> Result<ContentDocument> {
    Ok(ContentDocument {
        id: row.try_get("id")?,
        doc_type: row.try_get("doc_type")?,
        slug: row.try_get("slug")?,
        language: row.try_get("language")?,
    })
}

#[async_trait]
impl RedirectStore for SqliteStore {
    async fn fetch_all(&self) -> Result<Vec<Redirect>> {
        let rows = sqlx::query(&format!("{} ORDER BY r.source ASC, r.id ASC", SELECT_REDIRECTS))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_redirect).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Redirect>> {
        let row = sqlx::query(&format!("{} WHERE r.id = ?", SELECT_REDIRECTS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_redirect).transpose()
    }

    async fn find_by_source(
        &self,
        source: &str,
        exclude_id: Option<&str>,
    ) -> Result<Option<Redirect>> {
        let row = sqlx::query(&format!(
            "{} WHERE r.source = ? AND (? IS NULL OR r.id <> ?) LIMIT 1",
            SELECT_REDIRECTS
        ))
        .bind(source)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_redirect).transpose()
    }

    async fn create(&self, draft: &RedirectDraft) -> Result<Redirect> {
        let draft = draft.clone().cleared();
        let id = uuid::Uuid::new_v4().to_string();
        let now = to_millis(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO redirects (id, source, destination_type, internal_ref,
                                   external_destination, redirect_type, is_active,
                                   language, preserve_query_string, notes,
                                   created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&draft.source)
        .bind(draft.destination_type.as_str())
        .bind(&draft.internal_ref)
        .bind(&draft.external_destination)
        .bind(draft.redirect_type.as_str())
        .bind(draft.is_active)
        .bind(&draft.language)
        .bind(draft.preserve_query_string)
        .bind(&draft.notes)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        match self.get(&id).await? {
            Some(r) => Ok(r),
            None => bail!(RedirectError::NotFound(id)),
        }
    }

    async fn update(&self, id: &str, draft: &RedirectDraft) -> Result<()> {
        let draft = draft.clone().cleared();
        let result = sqlx::query(
            r#"
            UPDATE redirects SET
                source = ?,
                destination_type = ?,
                internal_ref = ?,
                external_destination = ?,
                redirect_type = ?,
                is_active = ?,
                language = ?,
                preserve_query_string = ?,
                notes = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&draft.source)
        .bind(draft.destination_type.as_str())
        .bind(&draft.internal_ref)
        .bind(&draft.external_destination)
        .bind(draft.redirect_type.as_str())
        .bind(draft.is_active)
        .bind(&draft.language)
        .bind(draft.preserve_query_string)
        .bind(&draft.notes)
        .bind(to_millis(Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!(RedirectError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<()> {
        let result = sqlx::query("UPDATE redirects SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active)
            .bind(to_millis(Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            bail!(RedirectError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM redirects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            bail!(RedirectError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn put_content(&self, doc: &ContentDocument) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO content (id, doc_type, slug, language)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                doc_type = excluded.doc_type,
                slug = excluded.slug,
                language = excluded.language
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.doc_type)
        .bind(&doc.slug)
        .bind(&doc.language)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_content(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM content WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_content(&self, id: &str) -> Result<Option<ContentDocument>> {
        let row = sqlx::query("SELECT id, doc_type, slug, language FROM content WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| row_to_content(&row)).transpose()
    }

    async fn list_content(&self) -> Result<Vec<ContentDocument>> {
        let rows = sqlx::query("SELECT id, doc_type, slug, language FROM content ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_content).collect()
    }
}
