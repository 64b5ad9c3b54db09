use lectio_core::model::BookId;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{book_id_to_i64, ser, u32_to_i64};
use crate::repository::{ChapterMetaRepository, StorageError};

#[async_trait::async_trait]
impl ChapterMetaRepository for SqliteRepository {
    async fn verse_count(&self, book_id: BookId, chapter: u32) -> Result<Option<u32>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT verse_count FROM chapters
            WHERE book_id = ?1 AND chapter_number = ?2
            ",
        )
        .bind(book_id_to_i64(book_id)?)
        .bind(u32_to_i64(chapter))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.map(|r| {
            let count: i64 = r.try_get("verse_count").map_err(ser)?;
            u32::try_from(count)
                .map_err(|_| StorageError::Serialization(format!("invalid verse_count: {count}")))
        })
        .transpose()
    }

    async fn put_verse_count(
        &self,
        book_id: BookId,
        chapter: u32,
        count: u32,
    ) -> Result<(), StorageError> {
        // First write wins: a cached count is permanent truth for its chapter.
        sqlx::query(
            r"
            INSERT INTO chapters (book_id, chapter_number, verse_count)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(book_id, chapter_number) DO NOTHING
            ",
        )
        .bind(book_id_to_i64(book_id)?)
        .bind(u32_to_i64(chapter))
        .bind(u32_to_i64(count))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn counts_for_book(&self, book_id: BookId) -> Result<Vec<(u32, u32)>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT chapter_number, verse_count FROM chapters
            WHERE book_id = ?1
            ORDER BY chapter_number ASC
            ",
        )
        .bind(book_id_to_i64(book_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let chapter: i64 = row.try_get("chapter_number").map_err(ser)?;
                let count: i64 = row.try_get("verse_count").map_err(ser)?;
                Ok((
                    u32::try_from(chapter).map_err(|_| {
                        StorageError::Serialization(format!("invalid chapter_number: {chapter}"))
                    })?,
                    u32::try_from(count).map_err(|_| {
                        StorageError::Serialization(format!("invalid verse_count: {count}"))
                    })?,
                ))
            })
            .collect()
    }
}
