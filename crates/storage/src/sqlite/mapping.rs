use chrono::NaiveDate;
use lectio_core::model::{Book, BookId, ReadingEvent};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn book_id_from_i64(v: i64) -> Result<BookId, StorageError> {
    Ok(BookId::new(i64_to_u64("book_id", v)?))
}

pub(crate) fn book_id_to_i64(id: BookId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("book_id overflow".into()))
}

pub(crate) fn map_book_row(row: &SqliteRow) -> Result<Book, StorageError> {
    let id = book_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let name: String = row.try_get("name").map_err(ser)?;
    let order = i64_to_u32("book_order", row.try_get::<i64, _>("book_order").map_err(ser)?)?;
    let chapter_count = i64_to_u32(
        "chapter_count",
        row.try_get::<i64, _>("chapter_count").map_err(ser)?,
    )?;

    Book::new(id, name, order, chapter_count).map_err(ser)
}

pub(crate) fn map_event_row(row: &SqliteRow) -> Result<ReadingEvent, StorageError> {
    Ok(ReadingEvent {
        book_id: book_id_from_i64(row.try_get::<i64, _>("book_id").map_err(ser)?)?,
        chapter: i64_to_u32(
            "chapter_number",
            row.try_get::<i64, _>("chapter_number").map_err(ser)?,
        )?,
        verse: i64_to_u32(
            "verse_number",
            row.try_get::<i64, _>("verse_number").map_err(ser)?,
        )?,
        recorded_at: row.try_get("recorded_at").map_err(ser)?,
    })
}

/// Parse the `substr(recorded_at, 1, 10)` day projection used by the
/// per-day aggregation queries.
pub(crate) fn parse_day(s: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(ser)
}

pub(crate) fn u32_to_i64(v: u32) -> i64 {
    i64::from(v)
}
