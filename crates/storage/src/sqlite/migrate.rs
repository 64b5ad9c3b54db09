use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates the full schema: books, chapter metadata, the unified reading
/// event log, the verse text cache, and indexes.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS books (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    book_order INTEGER NOT NULL CHECK (book_order >= 1),
                    chapter_count INTEGER NOT NULL CHECK (chapter_count >= 1)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS chapters (
                    id INTEGER PRIMARY KEY,
                    book_id INTEGER NOT NULL,
                    chapter_number INTEGER NOT NULL CHECK (chapter_number >= 1),
                    verse_count INTEGER NOT NULL CHECK (verse_count >= 1),
                    UNIQUE (book_id, chapter_number),
                    FOREIGN KEY (book_id) REFERENCES books(id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // One append-only log; the position pointer is a read view over it
        // (max recorded_at, id as tiebreak), the audit trail is another.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS reading_events (
                    id INTEGER PRIMARY KEY,
                    book_id INTEGER NOT NULL,
                    chapter_number INTEGER NOT NULL,
                    verse_number INTEGER NOT NULL,
                    recorded_at TEXT NOT NULL,
                    FOREIGN KEY (book_id) REFERENCES books(id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS verses (
                    id INTEGER PRIMARY KEY,
                    book_id INTEGER NOT NULL,
                    chapter_number INTEGER NOT NULL,
                    verse_number INTEGER NOT NULL,
                    verse_text TEXT NOT NULL,
                    UNIQUE (book_id, chapter_number, verse_number),
                    FOREIGN KEY (book_id) REFERENCES books(id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_reading_events_recorded_at
                    ON reading_events (recorded_at, id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_reading_events_book_chapter
                    ON reading_events (book_id, chapter_number);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        log::info!("applied schema migration v1");
    }

    Ok(())
}
