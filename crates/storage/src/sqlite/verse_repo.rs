use lectio_core::model::BookId;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{book_id_to_i64, ser, u32_to_i64};
use crate::repository::{StorageError, VerseTextRepository};

#[async_trait::async_trait]
impl VerseTextRepository for SqliteRepository {
    async fn verse_text(
        &self,
        book_id: BookId,
        chapter: u32,
        verse: u32,
    ) -> Result<Option<String>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT verse_text FROM verses
            WHERE book_id = ?1 AND chapter_number = ?2 AND verse_number = ?3
            ",
        )
        .bind(book_id_to_i64(book_id)?)
        .bind(u32_to_i64(chapter))
        .bind(u32_to_i64(verse))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.map(|r| r.try_get::<String, _>("verse_text").map_err(ser))
            .transpose()
    }

    async fn put_verse_text(
        &self,
        book_id: BookId,
        chapter: u32,
        verse: u32,
        text: &str,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO verses (book_id, chapter_number, verse_number, verse_text)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(book_id, chapter_number, verse_number) DO UPDATE SET
                verse_text = excluded.verse_text
            ",
        )
        .bind(book_id_to_i64(book_id)?)
        .bind(u32_to_i64(chapter))
        .bind(u32_to_i64(verse))
        .bind(text)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn chapter_verses(
        &self,
        book_id: BookId,
        chapter: u32,
    ) -> Result<Vec<(u32, String)>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT verse_number, verse_text FROM verses
            WHERE book_id = ?1 AND chapter_number = ?2
            ORDER BY verse_number ASC
            ",
        )
        .bind(book_id_to_i64(book_id)?)
        .bind(u32_to_i64(chapter))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let verse: i64 = row.try_get("verse_number").map_err(ser)?;
                let text: String = row.try_get("verse_text").map_err(ser)?;
                Ok((
                    u32::try_from(verse).map_err(|_| {
                        StorageError::Serialization(format!("invalid verse_number: {verse}"))
                    })?,
                    text,
                ))
            })
            .collect()
    }
}
