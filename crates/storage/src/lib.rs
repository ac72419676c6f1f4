use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// SQLite-backed document store: named collections of JSON documents
/// addressed by a string key, one row per document.
#[derive(Clone)]
pub struct DocumentStore {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub key: String,
    pub body: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;

        let store = Self { pool };
        store.ensure_documents_table().await?;
        Ok(store)
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_documents_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                doc_key    TEXT NOT NULL,
                body       TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (collection, doc_key)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure documents table exists")?;
        Ok(())
    }

    pub async fn list_documents(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query(
            "SELECT doc_key, body, created_at, updated_at
             FROM documents
             WHERE collection = ?
             ORDER BY doc_key ASC",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to list documents in collection '{collection}'"))?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let key = row.get::<String, _>(0);
            let body = parse_body(collection, &key, &row.get::<String, _>(1))?;
            documents.push(StoredDocument {
                key,
                body,
                created_at: row.get::<DateTime<Utc>, _>(2),
                updated_at: row.get::<DateTime<Utc>, _>(3),
            });
        }
        Ok(documents)
    }

    pub async fn read_document(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND doc_key = ?")
            .bind(collection)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read document '{collection}/{key}'"))?;

        row.map(|r| parse_body(collection, key, &r.get::<String, _>(0)))
            .transpose()
    }

    /// Writes the whole document, creating it or replacing an existing body.
    pub async fn create_document(&self, collection: &str, key: &str, body: &Value) -> Result<()> {
        let body_text = serde_json::to_string(body)
            .with_context(|| format!("failed to encode document '{collection}/{key}'"))?;
        sqlx::query(
            "INSERT INTO documents (collection, doc_key, body)
             VALUES (?, ?, ?)
             ON CONFLICT(collection, doc_key) DO UPDATE SET body = excluded.body, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(collection)
        .bind(key)
        .bind(body_text)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write document '{collection}/{key}'"))?;
        Ok(())
    }

    /// Merges the given top-level fields into an existing document. Fields
    /// not named are left untouched; the document must already exist.
    pub async fn update_document(
        &self,
        collection: &str,
        key: &str,
        fields: Map<String, Value>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND doc_key = ?")
            .bind(collection)
            .bind(key)
            .fetch_optional(&mut *tx)
            .await
            .with_context(|| format!("failed to read document '{collection}/{key}' for update"))?;

        let Some(row) = row else {
            bail!("document '{collection}/{key}' does not exist");
        };

        let mut body = parse_body(collection, key, &row.get::<String, _>(0))?;
        let Some(target) = body.as_object_mut() else {
            bail!("document '{collection}/{key}' is not a JSON object");
        };
        for (name, value) in fields {
            target.insert(name, value);
        }

        let body_text = serde_json::to_string(&body)
            .with_context(|| format!("failed to encode document '{collection}/{key}'"))?;
        sqlx::query(
            "UPDATE documents SET body = ?, updated_at = CURRENT_TIMESTAMP
             WHERE collection = ? AND doc_key = ?",
        )
        .bind(body_text)
        .bind(collection)
        .bind(key)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to update document '{collection}/{key}'"))?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_document(&self, collection: &str, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND doc_key = ?")
            .bind(collection)
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete document '{collection}/{key}'"))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let rows =
            sqlx::query("SELECT DISTINCT collection FROM documents ORDER BY collection ASC")
                .fetch_all(&self.pool)
                .await
                .context("failed to list collections")?;
        Ok(rows
            .into_iter()
            .map(|r| r.get::<String, _>(0))
            .collect())
    }
}

fn parse_body(collection: &str, key: &str, body_text: &str) -> Result<Value> {
    serde_json::from_str(body_text)
        .with_context(|| format!("document '{collection}/{key}' holds invalid JSON"))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
