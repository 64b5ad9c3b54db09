//! The advancement engine: marking progress, rollover, peeking, resetting.

use std::sync::Arc;

use lectio_core::model::{BookId, Position, ReadingEvent};
use lectio_core::progress::{peek_next, rollover_target};
use lectio_core::{Canon, Clock};
use storage::repository::ReadingLogRepository;

use crate::chapter_meta::ChapterMetaService;
use crate::error::ProgressError;

/// What a single `advance` call recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceOutcome {
    /// The position the caller marked as read.
    pub marked: Position,
    /// The follow-up position appended when the marked verse closed a
    /// chapter or book and auto-advance was requested.
    pub rollover: Option<Position>,
}

impl AdvanceOutcome {
    /// The position pointer after the call: the last event written.
    #[must_use]
    pub fn current(&self) -> Position {
        self.rollover.unwrap_or(self.marked)
    }
}

/// Drives the position pointer over the append-only reading log.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    canon: Canon,
    log: Arc<dyn ReadingLogRepository>,
    meta: ChapterMetaService,
}

impl ProgressService {
    #[must_use]
    pub fn new(canon: Canon, log: Arc<dyn ReadingLogRepository>, meta: ChapterMetaService) -> Self {
        Self::with_clock(Clock::default_clock(), canon, log, meta)
    }

    #[must_use]
    pub fn with_clock(
        clock: Clock,
        canon: Canon,
        log: Arc<dyn ReadingLogRepository>,
        meta: ChapterMetaService,
    ) -> Self {
        Self {
            clock,
            canon,
            log,
            meta,
        }
    }

    #[must_use]
    pub fn canon(&self) -> &Canon {
        &self.canon
    }

    /// The current reading position: the latest event, or the start of the
    /// first book when the log is empty.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCanon` if there are no books, or a storage error.
    pub async fn current_position(&self) -> Result<Position, ProgressError> {
        if let Some(event) = self.log.latest_event().await? {
            return Ok(event.position());
        }
        self.start_position()
    }

    /// Record that a verse was read. With `auto_advance`, a verse at or past
    /// the end of its chapter also appends a rollover event at the next
    /// chapter (or next book) verse 1, sharing the marked event's timestamp.
    ///
    /// Out-of-range chapters and verses are stored as given; only the
    /// rollover decision consults the cached chapter length.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBook` if the book id is not in the reference table,
    /// or a storage error.
    pub async fn advance(
        &self,
        book_id: BookId,
        chapter: u32,
        verse: u32,
        auto_advance: bool,
    ) -> Result<AdvanceOutcome, ProgressError> {
        let book = self
            .canon
            .by_id(book_id)
            .ok_or(ProgressError::UnknownBook(book_id))?;
        let marked = Position::new(book_id, chapter, verse);
        let recorded_at = self.clock.now();

        let rollover = if auto_advance {
            let verse_count = self.meta.verse_count(book, chapter).await?;
            rollover_target(&self.canon, book, marked, verse_count)
        } else {
            None
        };

        let mut events = vec![ReadingEvent::new(marked, recorded_at)];
        if let Some(next) = rollover {
            events.push(ReadingEvent::new(next, recorded_at));
        }
        self.log.append_events(&events).await?;

        if let Some(next) = rollover {
            log::info!("rolled over from {marked} to {next}");
        }
        Ok(AdvanceOutcome { marked, rollover })
    }

    /// Jump to an arbitrary position without rollover.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBook` or a storage error.
    pub async fn jump(
        &self,
        book_id: BookId,
        chapter: u32,
        verse: u32,
    ) -> Result<Position, ProgressError> {
        let outcome = self.advance(book_id, chapter, verse, false).await?;
        Ok(outcome.marked)
    }

    /// The position an auto-advancing mark of the current position would end
    /// at, without writing anything.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBook` if the stored position references a book no
    /// longer in the table, `EmptyCanon`, or a storage error.
    pub async fn peek(&self) -> Result<Position, ProgressError> {
        let position = self.current_position().await?;
        let book = self
            .canon
            .by_id(position.book_id)
            .ok_or(ProgressError::UnknownBook(position.book_id))?;
        let verse_count = self.meta.verse_count(book, position.chapter).await?;
        Ok(peek_next(&self.canon, book, position, verse_count))
    }

    /// Wipe the log and start over at the first book, chapter 1, verse 1.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCanon` or a storage error.
    pub async fn reset(&self) -> Result<Position, ProgressError> {
        let start = self.start_position()?;
        self.log
            .reset(ReadingEvent::new(start, self.clock.now()))
            .await?;
        log::info!("reading log reset to {start}");
        Ok(start)
    }

    fn start_position(&self) -> Result<Position, ProgressError> {
        let first = self.canon.first().ok_or(ProgressError::EmptyCanon)?;
        Ok(Position::new(first.id(), 1, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectio_core::model::Book;
    use lectio_core::time::fixed_clock;
    use storage::repository::{ChapterMetaRepository, InMemoryRepository};

    use crate::fetch::UnavailableFetcher;

    fn tiny_canon() -> Canon {
        Canon::from_books(vec![
            Book::new(BookId::new(1), "Alpha", 1, 2).unwrap(),
            Book::new(BookId::new(2), "Beta", 2, 1).unwrap(),
        ])
    }

    async fn service() -> (ProgressService, Arc<InMemoryRepository>) {
        let repo = Arc::new(InMemoryRepository::new());
        for (chapter, count) in [(1, 3), (2, 2)] {
            repo.put_verse_count(BookId::new(1), chapter, count)
                .await
                .unwrap();
        }
        repo.put_verse_count(BookId::new(2), 1, 5).await.unwrap();

        let meta = ChapterMetaService::new(Arc::clone(&repo) as _, Arc::new(UnavailableFetcher));
        let progress = ProgressService::with_clock(
            fixed_clock(),
            tiny_canon(),
            Arc::clone(&repo) as _,
            meta,
        );
        (progress, repo)
    }

    #[tokio::test]
    async fn empty_log_starts_at_first_book() {
        let (progress, _) = service().await;
        let pos = progress.current_position().await.unwrap();
        assert_eq!(pos, Position::new(BookId::new(1), 1, 1));
    }

    #[tokio::test]
    async fn mid_chapter_mark_does_not_roll_over() {
        let (progress, _) = service().await;
        let outcome = progress.advance(BookId::new(1), 1, 2, true).await.unwrap();
        assert_eq!(outcome.rollover, None);
        assert_eq!(outcome.current(), Position::new(BookId::new(1), 1, 2));
    }

    #[tokio::test]
    async fn chapter_end_rolls_into_next_chapter() {
        let (progress, _) = service().await;
        let outcome = progress.advance(BookId::new(1), 1, 3, true).await.unwrap();
        assert_eq!(outcome.rollover, Some(Position::new(BookId::new(1), 2, 1)));
        assert_eq!(
            progress.current_position().await.unwrap(),
            Position::new(BookId::new(1), 2, 1)
        );
    }

    #[tokio::test]
    async fn book_end_rolls_into_next_book() {
        let (progress, _) = service().await;
        let outcome = progress.advance(BookId::new(1), 2, 2, true).await.unwrap();
        assert_eq!(outcome.rollover, Some(Position::new(BookId::new(2), 1, 1)));
    }

    #[tokio::test]
    async fn last_verse_of_canon_is_terminal() {
        let (progress, _) = service().await;
        let outcome = progress.advance(BookId::new(2), 1, 5, true).await.unwrap();
        assert_eq!(outcome.rollover, None);
        assert_eq!(
            progress.peek().await.unwrap(),
            Position::new(BookId::new(2), 1, 5)
        );
    }

    #[tokio::test]
    async fn no_advance_flag_suppresses_rollover() {
        let (progress, _) = service().await;
        let outcome = progress.advance(BookId::new(1), 1, 3, false).await.unwrap();
        assert_eq!(outcome.rollover, None);
    }

    #[tokio::test]
    async fn peek_matches_what_advance_would_produce() {
        let (progress, _) = service().await;
        progress.jump(BookId::new(1), 1, 3).await.unwrap();

        let peeked = progress.peek().await.unwrap();
        let advanced = progress.advance(BookId::new(1), 1, 3, true).await.unwrap();
        assert_eq!(peeked, advanced.current());
    }

    #[tokio::test]
    async fn unknown_book_is_rejected() {
        let (progress, _) = service().await;
        let err = progress
            .advance(BookId::new(99), 1, 1, true)
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::UnknownBook(_)));
    }

    #[tokio::test]
    async fn reset_returns_to_the_start() {
        let (progress, repo) = service().await;
        progress.advance(BookId::new(1), 1, 3, true).await.unwrap();

        let start = progress.reset().await.unwrap();
        assert_eq!(start, Position::new(BookId::new(1), 1, 1));
        assert_eq!(repo.count_events().await.unwrap(), 1);
    }
}
