//! On-demand verse text: cache first, one fetch on a miss, placeholder on
//! failure.

use std::sync::Arc;

use lectio_core::model::BookId;
use lectio_core::Canon;
use storage::repository::VerseTextRepository;

use crate::error::ReaderError;
use crate::fetch::VerseFetcher;

/// Shown when no cached text exists and the fetch fails. Placeholders are
/// never persisted, so a later fetch can still fill the cache.
pub const MISSING_VERSE_TEXT: &str = "Verse text not available.";

/// Read access to verse text, backed by the cache and the external fetcher.
#[derive(Clone)]
pub struct ReaderService {
    canon: Canon,
    verses: Arc<dyn VerseTextRepository>,
    fetcher: Arc<dyn VerseFetcher>,
}

impl ReaderService {
    #[must_use]
    pub fn new(
        canon: Canon,
        verses: Arc<dyn VerseTextRepository>,
        fetcher: Arc<dyn VerseFetcher>,
    ) -> Self {
        Self {
            canon,
            verses,
            fetcher,
        }
    }

    /// Text of a single verse. Cached text wins; a miss triggers one fetch,
    /// persisted on success; a failed fetch yields [`MISSING_VERSE_TEXT`].
    ///
    /// # Errors
    ///
    /// Returns `UnknownBook` or a storage error. Fetch failures degrade to
    /// the placeholder instead of erroring.
    pub async fn verse_text(
        &self,
        book_id: BookId,
        chapter: u32,
        verse: u32,
    ) -> Result<String, ReaderError> {
        let book = self
            .canon
            .by_id(book_id)
            .ok_or(ReaderError::UnknownBook(book_id))?;

        if let Some(text) = self.verses.verse_text(book_id, chapter, verse).await? {
            return Ok(text);
        }

        match self.fetcher.verse_text(book.name(), chapter, verse).await {
            Ok(text) => {
                self.verses
                    .put_verse_text(book_id, chapter, verse, &text)
                    .await?;
                Ok(text)
            }
            Err(err) => {
                log::warn!(
                    "verse fetch failed for {} {chapter}:{verse}: {err}",
                    book.name()
                );
                Ok(MISSING_VERSE_TEXT.to_string())
            }
        }
    }

    /// Every cached verse of a chapter, in verse order. Cache-only: browsing
    /// a chapter never triggers a fetch per verse.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBook` or a storage error.
    pub async fn chapter_text(
        &self,
        book_id: BookId,
        chapter: u32,
    ) -> Result<Vec<(u32, String)>, ReaderError> {
        if self.canon.by_id(book_id).is_none() {
            return Err(ReaderError::UnknownBook(book_id));
        }
        Ok(self.verses.chapter_verses(book_id, chapter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectio_core::model::Book;
    use storage::repository::InMemoryRepository;

    use crate::fetch::UnavailableFetcher;

    fn canon() -> Canon {
        Canon::from_books(vec![Book::new(BookId::new(1), "Alpha", 1, 2).unwrap()])
    }

    #[tokio::test]
    async fn cached_text_is_returned_without_fetching() {
        let repo = Arc::new(InMemoryRepository::new());
        repo.put_verse_text(BookId::new(1), 1, 1, "In the beginning")
            .await
            .unwrap();
        let reader = ReaderService::new(canon(), repo, Arc::new(UnavailableFetcher));

        let text = reader.verse_text(BookId::new(1), 1, 1).await.unwrap();
        assert_eq!(text, "In the beginning");
    }

    #[tokio::test]
    async fn fetch_failure_yields_placeholder_without_caching_it() {
        let repo = Arc::new(InMemoryRepository::new());
        let reader =
            ReaderService::new(canon(), Arc::clone(&repo) as _, Arc::new(UnavailableFetcher));

        let text = reader.verse_text(BookId::new(1), 1, 2).await.unwrap();
        assert_eq!(text, MISSING_VERSE_TEXT);
        assert_eq!(repo.verse_text(BookId::new(1), 1, 2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_book_is_rejected() {
        let repo = Arc::new(InMemoryRepository::new());
        let reader = ReaderService::new(canon(), repo, Arc::new(UnavailableFetcher));
        assert!(reader.verse_text(BookId::new(9), 1, 1).await.is_err());
    }

    #[tokio::test]
    async fn chapter_text_lists_cached_verses_in_order() {
        let repo = Arc::new(InMemoryRepository::new());
        repo.put_verse_text(BookId::new(1), 1, 2, "second").await.unwrap();
        repo.put_verse_text(BookId::new(1), 1, 1, "first").await.unwrap();
        let reader =
            ReaderService::new(canon(), Arc::clone(&repo) as _, Arc::new(UnavailableFetcher));

        let verses = reader.chapter_text(BookId::new(1), 1).await.unwrap();
        assert_eq!(
            verses,
            vec![(1, "first".to_string()), (2, "second".to_string())]
        );
    }
}
