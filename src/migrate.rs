use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create the schema. Safe to run any number of times.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Apply the schema to an open pool.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // Source uniqueness is checked by validation, not by the table.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS redirects (
            id TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            destination_type TEXT NOT NULL,
            internal_ref TEXT,
            external_destination TEXT,
            redirect_type TEXT NOT NULL DEFAULT 'permanent',
            is_active INTEGER NOT NULL DEFAULT 1,
            language TEXT NOT NULL DEFAULT 'all',
            preserve_query_string INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            last_tested_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS content (
            id TEXT PRIMARY KEY,
            doc_type TEXT NOT NULL,
            slug TEXT,
            language TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_redirects_source ON redirects(source)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_redirects_created_at ON redirects(created_at DESC)",
    )
    .execute(pool)
    .await?;

    tracing::debug!("schema applied");
    Ok(())
}
