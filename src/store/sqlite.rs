//! SQLite-backed extension store.
//!
//! One row per extension identifier. Identifier uniqueness is enforced by the
//! schema and every write is an upsert on that key, so two tasks racing to
//! create the same row resolve as last-write-wins.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};

use super::errors::{StoreError, StoreResult};
use super::record::{ExtensionFields, ExtensionRecord, StoreStats, UpsertOutcome};
use super::ExtensionStore;

/// SQL schema for the extension store
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS extensions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    identifier TEXT NOT NULL UNIQUE,
    name TEXT,
    description TEXT,
    version TEXT,
    author TEXT,
    url TEXT,
    repository TEXT,
    downloads INTEGER CHECK (downloads IS NULL OR downloads >= 0),
    installs INTEGER CHECK (installs IS NULL OR installs >= 0),
    review_count INTEGER CHECK (review_count IS NULL OR review_count >= 0),
    rating REAL,
    categories TEXT,
    tags TEXT,
    last_updated TEXT,
    local_path TEXT,
    is_created INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Rescrape pass scans for rows that still need a local snapshot
CREATE INDEX IF NOT EXISTS idx_extensions_is_created ON extensions(is_created);
"#;

const SELECT_COLUMNS: &str = "identifier, name, description, version, author, url, repository, \
     downloads, installs, review_count, rating, categories, tags, last_updated, \
     local_path, is_created";

/// SQLite has a limit of ~999 bound variables per statement
const EXISTENCE_CHUNK: usize = 500;

/// Extension store over a SQLite connection pool
#[derive(Clone)]
pub struct SqliteExtensionStore {
    pool: SqlitePool,
}

impl SqliteExtensionStore {
    /// Open an existing database file or create a new one.
    ///
    /// Missing parent directories are created.
    pub async fn open(db_path: &Path, max_connections: u32) -> StoreResult<Self> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Connection(format!("{}: {e}", parent.display())))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Private in-memory database, mostly for tests.
    ///
    /// Pinned to a single connection that is never recycled, since every
    /// in-memory connection is its own database.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> StoreResult<Self> {
        // Idempotent - CREATE IF NOT EXISTS
        sqlx::query(SCHEMA_SQL).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ExtensionStore for SqliteExtensionStore {
    async fn find(&self, identifier: &str) -> StoreResult<Option<ExtensionRecord>> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM extensions WHERE identifier = ?");
        let row = sqlx::query(&query)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn existing_identifiers(&self, identifiers: &[String]) -> StoreResult<HashSet<String>> {
        let mut existing = HashSet::new();

        for chunk in identifiers.chunks(EXISTENCE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let query_str =
                format!("SELECT identifier FROM extensions WHERE identifier IN ({placeholders})");

            let mut query = sqlx::query(&query_str);
            for identifier in chunk {
                query = query.bind(identifier);
            }

            for row in query.fetch_all(&self.pool).await? {
                existing.insert(row.try_get::<String, _>("identifier")?);
            }
        }

        Ok(existing)
    }

    async fn upsert(
        &self,
        identifier: &str,
        fields: &ExtensionFields,
    ) -> StoreResult<UpsertOutcome> {
        let downloads = to_sql_int("downloads", fields.downloads)?;
        let installs = to_sql_int("installs", fields.installs)?;
        let review_count = to_sql_int("review_count", fields.review_count)?;
        let categories = encode_list(fields.categories.as_deref())?;
        let tags = encode_list(fields.tags.as_deref())?;
        let rating = fields.rating.filter(|r| r.is_finite());
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let existed = sqlx::query("SELECT 1 FROM extensions WHERE identifier = ?")
            .bind(identifier)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();

        sqlx::query(
            r#"
            INSERT INTO extensions (
                identifier, name, description, version, author, url, repository,
                downloads, installs, review_count, rating, categories, tags, last_updated,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(identifier) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                version = excluded.version,
                author = excluded.author,
                url = excluded.url,
                repository = excluded.repository,
                downloads = excluded.downloads,
                installs = excluded.installs,
                review_count = excluded.review_count,
                rating = excluded.rating,
                categories = excluded.categories,
                tags = excluded.tags,
                last_updated = excluded.last_updated,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(identifier)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.version)
        .bind(&fields.author)
        .bind(&fields.url)
        .bind(&fields.repository)
        .bind(downloads)
        .bind(installs)
        .bind(review_count)
        .bind(rating)
        .bind(categories)
        .bind(tags)
        .bind(fields.last_updated)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        })
    }

    async fn mark_materialized(&self, identifier: &str, local_path: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE extensions SET local_path = ?, is_created = 1 WHERE identifier = ?",
        )
        .bind(local_path)
        .bind(identifier)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn incomplete(&self) -> StoreResult<Vec<ExtensionRecord>> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM extensions WHERE is_created = 0 \
             ORDER BY downloads IS NULL, downloads DESC, identifier"
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(record_from_row).collect()
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        let (total, materialized): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(is_created), 0) FROM extensions",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreStats {
            total,
            materialized,
        })
    }
}

fn to_sql_int(column: &str, value: Option<u64>) -> StoreResult<Option<i64>> {
    value
        .map(|v| {
            i64::try_from(v)
                .map_err(|_| StoreError::Malformed(format!("{column} out of range: {v}")))
        })
        .transpose()
}

fn from_sql_int(column: &str, value: Option<i64>) -> StoreResult<Option<u64>> {
    value
        .map(|v| {
            u64::try_from(v).map_err(|_| StoreError::Malformed(format!("{column} is negative: {v}")))
        })
        .transpose()
}

/// Empty lists are stored as NULL, never as `[]`
fn encode_list(list: Option<&[String]>) -> StoreResult<Option<String>> {
    match list {
        Some(items) if !items.is_empty() => serde_json::to_string(items)
            .map(Some)
            .map_err(|e| StoreError::Malformed(e.to_string())),
        _ => Ok(None),
    }
}

fn decode_list(column: &str, raw: Option<String>) -> StoreResult<Option<Vec<String>>> {
    raw.map(|text| {
        serde_json::from_str::<Vec<String>>(&text)
            .map_err(|e| StoreError::Malformed(format!("{column}: {e}")))
    })
    .transpose()
}

fn record_from_row(row: &SqliteRow) -> StoreResult<ExtensionRecord> {
    let fields = ExtensionFields {
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        version: row.try_get("version")?,
        author: row.try_get("author")?,
        url: row.try_get("url")?,
        repository: row.try_get("repository")?,
        downloads: from_sql_int("downloads", row.try_get("downloads")?)?,
        installs: from_sql_int("installs", row.try_get("installs")?)?,
        review_count: from_sql_int("review_count", row.try_get("review_count")?)?,
        rating: row.try_get("rating")?,
        categories: decode_list("categories", row.try_get("categories")?)?,
        tags: decode_list("tags", row.try_get("tags")?)?,
        last_updated: row.try_get::<Option<DateTime<Utc>>, _>("last_updated")?,
    };

    Ok(ExtensionRecord {
        identifier: row.try_get("identifier")?,
        fields,
        local_path: row.try_get("local_path")?,
        is_created: row.try_get("is_created")?,
    })
}
