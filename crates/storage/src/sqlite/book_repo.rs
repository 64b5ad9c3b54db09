use lectio_core::model::{Book, BookId};

use super::SqliteRepository;
use super::mapping::{book_id_to_i64, map_book_row, u32_to_i64};
use crate::repository::{BookRepository, StorageError};

#[async_trait::async_trait]
impl BookRepository for SqliteRepository {
    async fn seed_books(&self, books: &[Book]) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for book in books {
            sqlx::query(
                r"
                INSERT INTO books (id, name, book_order, chapter_count)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO NOTHING
                ",
            )
            .bind(book_id_to_i64(book.id())?)
            .bind(book.name())
            .bind(u32_to_i64(book.order()))
            .bind(u32_to_i64(book.chapter_count()))
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    async fn list_books(&self) -> Result<Vec<Book>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, book_order, chapter_count
            FROM books
            ORDER BY book_order ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_book_row).collect()
    }

    async fn get_book(&self, id: BookId) -> Result<Option<Book>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, book_order, chapter_count
            FROM books
            WHERE id = ?1
            ",
        )
        .bind(book_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_book_row).transpose()
    }

    async fn get_book_by_name(&self, name: &str) -> Result<Option<Book>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, book_order, chapter_count
            FROM books
            WHERE name = ?1
            ",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_book_row).transpose()
    }
}
