//! SQLite access for the three source relations.
//!
//! The store is only touched on the recompute branch of the split cache;
//! a reload run never opens a connection. All queries are read-only, but
//! the schema statements are applied on open so fixture databases can be
//! built in memory for tests.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::dataset::{LabeledMatchRow, QuotationFeatureRow, VersionRow};
use crate::{ApbError, Result};

/// Schema statements for the source relations. Applied in order by
/// [`migrate`]; every statement is idempotent.
const APB_MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS apb_labeled (
        doc_id TEXT NOT NULL,
        verse_id TEXT NOT NULL,
        "match" INTEGER NOT NULL,
        PRIMARY KEY (doc_id, verse_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS apb_potential_quotations (
        doc_id TEXT NOT NULL,
        verse_id TEXT NOT NULL,
        token_count INTEGER NOT NULL,
        tfidf REAL NOT NULL,
        proportion REAL NOT NULL,
        runs_pval REAL,
        PRIMARY KEY (doc_id, verse_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS scriptures (
        verse_id TEXT PRIMARY KEY,
        version TEXT NOT NULL,
        reference TEXT,
        text TEXT
    )
    "#,
];

/// Open a connection pool for the given database URL.
///
/// In-memory URLs are pinned to a single connection: each SQLite
/// `:memory:` connection is its own database, so a larger pool would
/// scatter the schema across invisible siblings.
pub async fn open_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| ApbError::Storage(format!("invalid database url: {e}")))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(|e| ApbError::Storage(format!("failed to connect: {e}")))?;

    migrate(&pool).await?;
    Ok(pool)
}

/// Apply the schema statements.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    for statement in APB_MIGRATIONS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| ApbError::Storage(format!("migration failed: {e}")))?;
    }
    Ok(())
}

/// Fetch every labeled match outcome.
pub async fn fetch_labeled_matches(pool: &SqlitePool) -> Result<Vec<LabeledMatchRow>> {
    // "match" is a SQLite keyword, hence the quoting.
    let rows = sqlx::query(r#"SELECT doc_id, verse_id, "match" AS is_match FROM apb_labeled"#)
        .fetch_all(pool)
        .await
        .map_err(|e| ApbError::Storage(format!("apb_labeled query failed: {e}")))?;

    debug!(count = rows.len(), "fetched labeled matches");
    rows.iter()
        .map(|row| {
            Ok(LabeledMatchRow {
                doc_id: row
                    .try_get("doc_id")
                    .map_err(|e| ApbError::Storage(e.to_string()))?,
                verse_id: row
                    .try_get("verse_id")
                    .map_err(|e| ApbError::Storage(e.to_string()))?,
                is_match: row
                    .try_get("is_match")
                    .map_err(|e| ApbError::Storage(e.to_string()))?,
            })
        })
        .collect()
}

/// Fetch the feature measurements for every potential quotation.
pub async fn fetch_quotation_features(pool: &SqlitePool) -> Result<Vec<QuotationFeatureRow>> {
    let rows = sqlx::query(
        "SELECT doc_id, verse_id, token_count, tfidf, proportion, runs_pval
         FROM apb_potential_quotations",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| ApbError::Storage(format!("apb_potential_quotations query failed: {e}")))?;

    debug!(count = rows.len(), "fetched quotation features");
    rows.iter()
        .map(|row| {
            Ok(QuotationFeatureRow {
                doc_id: row
                    .try_get("doc_id")
                    .map_err(|e| ApbError::Storage(e.to_string()))?,
                verse_id: row
                    .try_get("verse_id")
                    .map_err(|e| ApbError::Storage(e.to_string()))?,
                token_count: row
                    .try_get::<i64, _>("token_count")
                    .map_err(|e| ApbError::Storage(e.to_string()))? as u32,
                tfidf: row
                    .try_get("tfidf")
                    .map_err(|e| ApbError::Storage(e.to_string()))?,
                proportion: row
                    .try_get("proportion")
                    .map_err(|e| ApbError::Storage(e.to_string()))?,
                runs_pval: row
                    .try_get("runs_pval")
                    .map_err(|e| ApbError::Storage(e.to_string()))?,
            })
        })
        .collect()
}

/// Fetch the verse-to-version mapping, narrowed to the two columns the
/// dataset join needs.
pub async fn fetch_verse_versions(pool: &SqlitePool) -> Result<Vec<VersionRow>> {
    let rows = sqlx::query("SELECT verse_id, version FROM scriptures")
        .fetch_all(pool)
        .await
        .map_err(|e| ApbError::Storage(format!("scriptures query failed: {e}")))?;

    debug!(count = rows.len(), "fetched verse versions");
    rows.iter()
        .map(|row| {
            Ok(VersionRow {
                verse_id: row
                    .try_get("verse_id")
                    .map_err(|e| ApbError::Storage(e.to_string()))?,
                version: row
                    .try_get("version")
                    .map_err(|e| ApbError::Storage(e.to_string()))?,
            })
        })
        .collect()
}
