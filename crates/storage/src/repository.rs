use async_trait::async_trait;
use chrono::NaiveDate;
use lectio_core::model::{Book, BookId, ReadingEvent};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
///
/// Absence is `Ok(None)` and duplicate inserts are no-ops at the trait
/// level, so only infrastructure failures need variants here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the static book reference table.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Insert books that are not yet present. Existing rows are left
    /// untouched, so seeding is idempotent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the books cannot be stored.
    async fn seed_books(&self, books: &[Book]) -> Result<(), StorageError>;

    /// All books in reading order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn list_books(&self) -> Result<Vec<Book>, StorageError>;

    /// Fetch a book by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures; a missing book is `Ok(None)`.
    async fn get_book(&self, id: BookId) -> Result<Option<Book>, StorageError>;

    /// Fetch a book by its exact name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures; a missing book is `Ok(None)`.
    async fn get_book_by_name(&self, name: &str) -> Result<Option<Book>, StorageError>;
}

/// Repository contract for cached per-chapter verse counts.
///
/// Entries are monotonic: added once, never changed or evicted. The first
/// stored count becomes permanent truth for that chapter.
#[async_trait]
pub trait ChapterMetaRepository: Send + Sync {
    /// Cached verse count for a chapter, if known.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn verse_count(&self, book_id: BookId, chapter: u32) -> Result<Option<u32>, StorageError>;

    /// Store a verse count. If the chapter already has one, the existing
    /// value wins and this call is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the count cannot be stored.
    async fn put_verse_count(
        &self,
        book_id: BookId,
        chapter: u32,
        count: u32,
    ) -> Result<(), StorageError>;

    /// All cached `(chapter_number, verse_count)` pairs for a book, ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn counts_for_book(&self, book_id: BookId) -> Result<Vec<(u32, u32)>, StorageError>;
}

/// The unified append-only reading log.
///
/// One table, two read views: `latest_event` is the position pointer,
/// `all_events` is the audit trail statistics fold over. Ties on
/// `recorded_at` resolve by insertion order, so a rollover row written in the
/// same transaction as its mark wins the position view.
#[async_trait]
pub trait ReadingLogRepository: Send + Sync {
    /// Append events in the given order inside a single transaction: either
    /// every row becomes durable or none do.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the transaction fails; no partial writes remain.
    async fn append_events(&self, events: &[ReadingEvent]) -> Result<(), StorageError>;

    /// The most recently written event, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn latest_event(&self) -> Result<Option<ReadingEvent>, StorageError>;

    /// Every event ever written, ascending by time of write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn all_events(&self) -> Result<Vec<ReadingEvent>, StorageError>;

    /// The most recent `limit` events, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn recent_events(&self, limit: u32) -> Result<Vec<ReadingEvent>, StorageError>;

    /// Events recorded against one book.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn events_for_book(&self, book_id: BookId) -> Result<Vec<ReadingEvent>, StorageError>;

    /// Total number of events. Counts every event, not distinct positions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn count_events(&self) -> Result<u64, StorageError>;

    /// The most recent `limit` distinct calendar days with at least one
    /// event, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn distinct_days(&self, limit: u32) -> Result<Vec<NaiveDate>, StorageError>;

    /// Event count per calendar day, ascending by day.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn day_counts(&self) -> Result<Vec<(NaiveDate, u64)>, StorageError>;

    /// Delete every event and write `initial` as the sole entry, in one
    /// transaction. Not reversible.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the transaction fails; the old log survives intact.
    async fn reset(&self, initial: ReadingEvent) -> Result<(), StorageError>;
}

/// Repository contract for the verse text cache.
#[async_trait]
pub trait VerseTextRepository: Send + Sync {
    /// Cached text for a verse, if present.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn verse_text(
        &self,
        book_id: BookId,
        chapter: u32,
        verse: u32,
    ) -> Result<Option<String>, StorageError>;

    /// Store or replace the text for a verse.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the text cannot be stored.
    async fn put_verse_text(
        &self,
        book_id: BookId,
        chapter: u32,
        verse: u32,
        text: &str,
    ) -> Result<(), StorageError>;

    /// All cached `(verse_number, text)` pairs for a chapter, ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn chapter_verses(
        &self,
        book_id: BookId,
        chapter: u32,
    ) -> Result<Vec<(u32, String)>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct InMemoryState {
    books: Vec<Book>,
    chapters: HashMap<(BookId, u32), u32>,
    events: Vec<ReadingEvent>,
    verses: HashMap<(BookId, u32, u32), String>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl BookRepository for InMemoryRepository {
    async fn seed_books(&self, books: &[Book]) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        for book in books {
            if !guard.books.iter().any(|b| b.id() == book.id()) {
                guard.books.push(book.clone());
            }
        }
        guard.books.sort_by_key(Book::order);
        Ok(())
    }

    async fn list_books(&self) -> Result<Vec<Book>, StorageError> {
        Ok(self.lock()?.books.clone())
    }

    async fn get_book(&self, id: BookId) -> Result<Option<Book>, StorageError> {
        Ok(self.lock()?.books.iter().find(|b| b.id() == id).cloned())
    }

    async fn get_book_by_name(&self, name: &str) -> Result<Option<Book>, StorageError> {
        Ok(self
            .lock()?
            .books
            .iter()
            .find(|b| b.name() == name)
            .cloned())
    }
}

#[async_trait]
impl ChapterMetaRepository for InMemoryRepository {
    async fn verse_count(&self, book_id: BookId, chapter: u32) -> Result<Option<u32>, StorageError> {
        Ok(self.lock()?.chapters.get(&(book_id, chapter)).copied())
    }

    async fn put_verse_count(
        &self,
        book_id: BookId,
        chapter: u32,
        count: u32,
    ) -> Result<(), StorageError> {
        self.lock()?.chapters.entry((book_id, chapter)).or_insert(count);
        Ok(())
    }

    async fn counts_for_book(&self, book_id: BookId) -> Result<Vec<(u32, u32)>, StorageError> {
        let guard = self.lock()?;
        let mut counts: Vec<(u32, u32)> = guard
            .chapters
            .iter()
            .filter(|((b, _), _)| *b == book_id)
            .map(|((_, chapter), count)| (*chapter, *count))
            .collect();
        counts.sort_unstable();
        Ok(counts)
    }
}

#[async_trait]
impl ReadingLogRepository for InMemoryRepository {
    async fn append_events(&self, events: &[ReadingEvent]) -> Result<(), StorageError> {
        self.lock()?.events.extend_from_slice(events);
        Ok(())
    }

    async fn latest_event(&self) -> Result<Option<ReadingEvent>, StorageError> {
        // max_by_key keeps the last maximum, which preserves insertion order
        // for equal timestamps.
        Ok(self
            .lock()?
            .events
            .iter()
            .max_by_key(|e| e.recorded_at)
            .copied())
    }

    async fn all_events(&self) -> Result<Vec<ReadingEvent>, StorageError> {
        let mut events = self.lock()?.events.clone();
        events.sort_by_key(|e| e.recorded_at);
        Ok(events)
    }

    async fn recent_events(&self, limit: u32) -> Result<Vec<ReadingEvent>, StorageError> {
        let mut events = self.all_events().await?;
        events.reverse();
        events.truncate(limit as usize);
        Ok(events)
    }

    async fn events_for_book(&self, book_id: BookId) -> Result<Vec<ReadingEvent>, StorageError> {
        Ok(self
            .all_events()
            .await?
            .into_iter()
            .filter(|e| e.book_id == book_id)
            .collect())
    }

    async fn count_events(&self) -> Result<u64, StorageError> {
        Ok(self.lock()?.events.len() as u64)
    }

    async fn distinct_days(&self, limit: u32) -> Result<Vec<NaiveDate>, StorageError> {
        let mut days: Vec<NaiveDate> = self.all_events().await?.iter().map(ReadingEvent::day).collect();
        days.sort_unstable();
        days.dedup();
        days.reverse();
        days.truncate(limit as usize);
        Ok(days)
    }

    async fn day_counts(&self) -> Result<Vec<(NaiveDate, u64)>, StorageError> {
        let mut counts: HashMap<NaiveDate, u64> = HashMap::new();
        for event in self.lock()?.events.iter() {
            *counts.entry(event.day()).or_insert(0) += 1;
        }
        let mut counts: Vec<(NaiveDate, u64)> = counts.into_iter().collect();
        counts.sort_unstable_by_key(|(day, _)| *day);
        Ok(counts)
    }

    async fn reset(&self, initial: ReadingEvent) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.events.clear();
        guard.events.push(initial);
        Ok(())
    }
}

#[async_trait]
impl VerseTextRepository for InMemoryRepository {
    async fn verse_text(
        &self,
        book_id: BookId,
        chapter: u32,
        verse: u32,
    ) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.verses.get(&(book_id, chapter, verse)).cloned())
    }

    async fn put_verse_text(
        &self,
        book_id: BookId,
        chapter: u32,
        verse: u32,
        text: &str,
    ) -> Result<(), StorageError> {
        self.lock()?
            .verses
            .insert((book_id, chapter, verse), text.to_owned());
        Ok(())
    }

    async fn chapter_verses(
        &self,
        book_id: BookId,
        chapter: u32,
    ) -> Result<Vec<(u32, String)>, StorageError> {
        let guard = self.lock()?;
        let mut verses: Vec<(u32, String)> = guard
            .verses
            .iter()
            .filter(|((b, c, _), _)| *b == book_id && *c == chapter)
            .map(|((_, _, v), text)| (*v, text.clone()))
            .collect();
        verses.sort_by_key(|(v, _)| *v);
        Ok(verses)
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the four repositories behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub books: Arc<dyn BookRepository>,
    pub chapters: Arc<dyn ChapterMetaRepository>,
    pub log: Arc<dyn ReadingLogRepository>,
    pub verses: Arc<dyn VerseTextRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            books: Arc::new(repo.clone()),
            chapters: Arc::new(repo.clone()),
            log: Arc::new(repo.clone()),
            verses: Arc::new(repo),
        }
    }
}
