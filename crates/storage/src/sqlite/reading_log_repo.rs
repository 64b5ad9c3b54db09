use chrono::NaiveDate;
use lectio_core::model::{BookId, ReadingEvent};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{book_id_to_i64, map_event_row, parse_day, ser, u32_to_i64};
use crate::repository::{ReadingLogRepository, StorageError};

#[async_trait::async_trait]
impl ReadingLogRepository for SqliteRepository {
    async fn append_events(&self, events: &[ReadingEvent]) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for event in events {
            sqlx::query(
                r"
                INSERT INTO reading_events (book_id, chapter_number, verse_number, recorded_at)
                VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(book_id_to_i64(event.book_id)?)
            .bind(u32_to_i64(event.chapter))
            .bind(u32_to_i64(event.verse))
            .bind(event.recorded_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    async fn latest_event(&self) -> Result<Option<ReadingEvent>, StorageError> {
        // id breaks recorded_at ties so a same-instant rollover row wins.
        let row = sqlx::query(
            r"
            SELECT book_id, chapter_number, verse_number, recorded_at
            FROM reading_events
            ORDER BY recorded_at DESC, id DESC
            LIMIT 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_event_row).transpose()
    }

    async fn all_events(&self) -> Result<Vec<ReadingEvent>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT book_id, chapter_number, verse_number, recorded_at
            FROM reading_events
            ORDER BY recorded_at ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_event_row).collect()
    }

    async fn recent_events(&self, limit: u32) -> Result<Vec<ReadingEvent>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT book_id, chapter_number, verse_number, recorded_at
            FROM reading_events
            ORDER BY recorded_at DESC, id DESC
            LIMIT ?1
            ",
        )
        .bind(u32_to_i64(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_event_row).collect()
    }

    async fn events_for_book(&self, book_id: BookId) -> Result<Vec<ReadingEvent>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT book_id, chapter_number, verse_number, recorded_at
            FROM reading_events
            WHERE book_id = ?1
            ORDER BY recorded_at ASC, id ASC
            ",
        )
        .bind(book_id_to_i64(book_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_event_row).collect()
    }

    async fn count_events(&self) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM reading_events")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let n: i64 = row.try_get("n").map_err(ser)?;
        u64::try_from(n).map_err(|_| StorageError::Serialization(format!("invalid count: {n}")))
    }

    async fn distinct_days(&self, limit: u32) -> Result<Vec<NaiveDate>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT DISTINCT substr(recorded_at, 1, 10) AS day
            FROM reading_events
            ORDER BY day DESC
            LIMIT ?1
            ",
        )
        .bind(u32_to_i64(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let day: String = row.try_get("day").map_err(ser)?;
                parse_day(&day)
            })
            .collect()
    }

    async fn day_counts(&self) -> Result<Vec<(NaiveDate, u64)>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT substr(recorded_at, 1, 10) AS day, COUNT(*) AS n
            FROM reading_events
            GROUP BY day
            ORDER BY day ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let day: String = row.try_get("day").map_err(ser)?;
                let n: i64 = row.try_get("n").map_err(ser)?;
                Ok((
                    parse_day(&day)?,
                    u64::try_from(n).map_err(|_| {
                        StorageError::Serialization(format!("invalid count: {n}"))
                    })?,
                ))
            })
            .collect()
    }

    async fn reset(&self, initial: ReadingEvent) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM reading_events")
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO reading_events (book_id, chapter_number, verse_number, recorded_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(book_id_to_i64(initial.book_id)?)
        .bind(u32_to_i64(initial.chapter))
        .bind(u32_to_i64(initial.verse))
        .bind(initial.recorded_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}
