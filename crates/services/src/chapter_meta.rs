//! Lazily populated, permanently cached chapter verse counts.

use std::sync::Arc;

use lectio_core::model::Book;
use storage::repository::{ChapterMetaRepository, StorageError};

use crate::fetch::VerseFetcher;

/// Verse count assumed when the external source cannot supply one. Once
/// cached it is permanent truth for that chapter, good or bad; stability is
/// preferred over accuracy here.
pub const DEFAULT_VERSE_COUNT: u32 = 30;

/// Cache-through access to per-chapter verse counts.
///
/// One miss = one fetch attempt = one cached result. Fetch failures and
/// ambiguous responses (zero verses) degrade to [`DEFAULT_VERSE_COUNT`] and
/// are still cached; they are logged, never surfaced.
#[derive(Clone)]
pub struct ChapterMetaService {
    chapters: Arc<dyn ChapterMetaRepository>,
    fetcher: Arc<dyn VerseFetcher>,
}

impl ChapterMetaService {
    #[must_use]
    pub fn new(chapters: Arc<dyn ChapterMetaRepository>, fetcher: Arc<dyn VerseFetcher>) -> Self {
        Self { chapters, fetcher }
    }

    /// Verse count for a chapter, fetching and caching on a miss.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for repository failures; fetch problems
    /// resolve to the default count.
    pub async fn verse_count(&self, book: &Book, chapter: u32) -> Result<u32, StorageError> {
        if let Some(count) = self.chapters.verse_count(book.id(), chapter).await? {
            return Ok(count);
        }

        let count = match self.fetcher.chapter_verse_count(book.name(), chapter).await {
            Ok(count) if count >= 1 => count,
            Ok(_) => {
                log::warn!(
                    "fetcher returned no verses for {} {chapter}; caching default",
                    book.name()
                );
                DEFAULT_VERSE_COUNT
            }
            Err(err) => {
                log::warn!(
                    "verse count fetch failed for {} {chapter}: {err}; caching default",
                    book.name()
                );
                DEFAULT_VERSE_COUNT
            }
        };

        self.chapters
            .put_verse_count(book.id(), chapter, count)
            .await?;

        // Re-read so a concurrent first writer still yields one stable value.
        Ok(self
            .chapters
            .verse_count(book.id(), chapter)
            .await?
            .unwrap_or(count))
    }

    /// Cached count or the default, without consulting the fetcher.
    ///
    /// Bulk statistics reads go through here so a stats call can never block
    /// on the network; only single-chapter lookups pay for a fetch.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    pub async fn cached_or_default(
        &self,
        book: &Book,
        chapter: u32,
    ) -> Result<u32, StorageError> {
        Ok(self
            .chapters
            .verse_count(book.id(), chapter)
            .await?
            .unwrap_or(DEFAULT_VERSE_COUNT))
    }

    /// Verse counts for every chapter of a book, index 0 = chapter 1, with
    /// uncached chapters filled by the default. Never fetches.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    pub async fn chapter_counts(&self, book: &Book) -> Result<Vec<u32>, StorageError> {
        let cached = self.chapters.counts_for_book(book.id()).await?;
        let mut counts = vec![DEFAULT_VERSE_COUNT; book.chapter_count() as usize];
        for (chapter, count) in cached {
            if let Some(slot) = counts.get_mut((chapter as usize).wrapping_sub(1)) {
                *slot = count;
            }
        }
        Ok(counts)
    }

    /// Total verses in a book, cached counts with defaults filled in.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    pub async fn book_total(&self, book: &Book) -> Result<u64, StorageError> {
        Ok(self
            .chapter_counts(book)
            .await?
            .iter()
            .map(|c| u64::from(*c))
            .sum())
    }
}
