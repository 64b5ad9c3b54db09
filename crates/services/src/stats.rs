//! The statistics engine: pure, read-only folds over the reading log.
//!
//! Every figure here is recomputed from the event log on each call; nothing
//! is cached or maintained incrementally. At corpus scale (66 books, ~1,200
//! chapters) a full scan per call is cheap, and a single source of truth
//! cannot drift. Chapter lengths come from the cached metadata with the
//! default fill, never from the network, so no statistics call can block on
//! a fetch.

use std::sync::Arc;

use chrono::NaiveDate;
use lectio_core::model::{Book, BookId, Position};
use lectio_core::stats::{
    current_streak, estimate_days, percentage, reading_rate, FALLBACK_BOOK_ETA_DAYS,
    FALLBACK_CANON_ETA_DAYS,
};
use lectio_core::{Canon, Clock};
use storage::repository::ReadingLogRepository;

use crate::chapter_meta::ChapterMetaService;
use crate::error::StatsError;

/// Window of distinct reading days consulted for the streak walk.
const STREAK_DAY_WINDOW: u32 = 30;

/// Number of recent events summarized by [`StatsService::reading_summary`].
const SUMMARY_EVENT_LIMIT: u32 = 100;

/// Completion percentages at the current position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percentages {
    /// Progress through the current chapter.
    pub chapter: f64,
    /// Progress through the current book.
    pub book: f64,
    /// Raw event count over the canon's total verse count. Counts every
    /// event, so rereading inflates it past 100; accepted behavior.
    pub canon: f64,
}

/// Estimated days to finish, at the current reading rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionEstimate {
    pub book_days: u32,
    pub canon_days: u32,
}

/// A digest of recent reading activity.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingSummary {
    pub total_verses_read: u64,
    pub average_per_day: f64,
    pub streak: u32,
    pub most_productive_day: Option<(NaiveDate, u64)>,
    /// Recent positions grouped by day, newest day first.
    pub recent_by_day: Vec<(NaiveDate, Vec<Position>)>,
}

/// Read-only derivations over the log and the chapter metadata cache.
#[derive(Clone)]
pub struct StatsService {
    clock: Clock,
    canon: Canon,
    log: Arc<dyn ReadingLogRepository>,
    meta: ChapterMetaService,
}

impl StatsService {
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

    /// The current position as the statistics engine sees it: latest event,
    /// or the canon start for an empty log.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCanon` or a storage error.
    pub async fn current_position(&self) -> Result<Position, StatsError> {
        if let Some(event) = self.log.latest_event().await? {
            return Ok(event.position());
        }
        let first = self.canon.first().ok_or(StatsError::EmptyCanon)?;
        Ok(Position::new(first.id(), 1, 1))
    }

    /// Chapter, book, and canon completion percentages at the current
    /// position.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBook` if the stored position references a book not in
    /// the reference table, `EmptyCanon`, or a storage error.
    pub async fn percentages(&self) -> Result<Percentages, StatsError> {
        let position = self.current_position().await?;
        let book = self
            .canon
            .by_id(position.book_id)
            .ok_or(StatsError::UnknownBook(position.book_id))?;

        let counts = self.meta.chapter_counts(book).await?;
        let chapter_len = self.meta.cached_or_default(book, position.chapter).await?;

        let read_in_book: u64 = counts
            .iter()
            .take((position.chapter as usize).saturating_sub(1))
            .map(|c| u64::from(*c))
            .sum::<u64>()
            + u64::from(position.verse);
        let book_total: u64 = counts.iter().map(|c| u64::from(*c)).sum();

        let events = self.log.count_events().await?;
        let canon_total = self.canon_total().await?;

        Ok(Percentages {
            chapter: percentage(u64::from(position.verse), u64::from(chapter_len)),
            book: percentage(read_in_book, book_total),
            canon: percentage(events, canon_total),
        })
    }

    /// Average events per distinct reading day, with the fixed default when
    /// the log is too thin to divide meaningfully.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn reading_rate(&self) -> Result<f64, StatsError> {
        let total = self.log.count_events().await?;
        let days = self.log.day_counts().await?.len() as u64;
        Ok(reading_rate(total, days))
    }

    /// Consecutive reading days ending today or yesterday, over the most
    /// recent thirty distinct reading days.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn current_streak(&self) -> Result<u32, StatsError> {
        let days = self.log.distinct_days(STREAK_DAY_WINDOW).await?;
        Ok(current_streak(&days, self.clock.today()))
    }

    /// Days to finish the current book and the whole canon at the current
    /// rate, with fixed fallbacks when no usable rate exists.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBook`, `EmptyCanon`, or a storage error.
    pub async fn completion_estimate(&self) -> Result<CompletionEstimate, StatsError> {
        let position = self.current_position().await?;
        let book = self
            .canon
            .by_id(position.book_id)
            .ok_or(StatsError::UnknownBook(position.book_id))?;
        let rate = self.reading_rate().await?;

        let counts = self.meta.chapter_counts(book).await?;
        let current_idx = (position.chapter as usize).saturating_sub(1);
        let tail = counts
            .get(current_idx)
            .map(|c| u64::from(*c).saturating_sub(u64::from(position.verse)))
            .unwrap_or(0);
        let later_chapters: u64 = counts
            .iter()
            .skip(current_idx + 1)
            .map(|c| u64::from(*c))
            .sum();
        let remaining_book = tail + later_chapters;

        let mut remaining_canon = remaining_book;
        for later in self.canon.books().iter().filter(|b| b.order() > book.order()) {
            remaining_canon += self.meta.book_total(later).await?;
        }

        Ok(CompletionEstimate {
            book_days: estimate_days(remaining_book, rate, FALLBACK_BOOK_ETA_DAYS),
            canon_days: estimate_days(remaining_canon, rate, FALLBACK_CANON_ETA_DAYS),
        })
    }

    /// Chapters of a book some event has read to the end of.
    ///
    /// A chapter counts as complete when any event recorded a verse at or
    /// past the cached chapter length. Completion is recomputed from the log
    /// each call and is never assumed transitively.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBook` or a storage error.
    pub async fn completed_chapters(&self, book_id: BookId) -> Result<Vec<u32>, StatsError> {
        let book = self
            .canon
            .by_id(book_id)
            .ok_or(StatsError::UnknownBook(book_id))?;
        self.completed_chapters_of(book).await
    }

    /// Books whose every chapter is complete, in canon order.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn completed_books(&self) -> Result<Vec<Book>, StatsError> {
        let mut completed = Vec::new();
        for book in self.canon.books() {
            let chapters = self.completed_chapters_of(book).await?;
            if chapters.len() as u32 == book.chapter_count() {
                completed.push(book.clone());
            }
        }
        Ok(completed)
    }

    /// Totals, rate, streak, the most productive day, and the last hundred
    /// events grouped by day.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn reading_summary(&self) -> Result<ReadingSummary, StatsError> {
        let total_verses_read = self.log.count_events().await?;
        let average_per_day = self.reading_rate().await?;
        let streak = self.current_streak().await?;

        let most_productive_day = self
            .log
            .day_counts()
            .await?
            .into_iter()
            .max_by_key(|(_, count)| *count);

        let mut recent_by_day: Vec<(NaiveDate, Vec<Position>)> = Vec::new();
        for event in self.log.recent_events(SUMMARY_EVENT_LIMIT).await? {
            let day = event.day();
            match recent_by_day.last_mut() {
                Some((last_day, positions)) if *last_day == day => {
                    positions.push(event.position());
                }
                _ => recent_by_day.push((day, vec![event.position()])),
            }
        }

        Ok(ReadingSummary {
            total_verses_read,
            average_per_day,
            streak,
            most_productive_day,
            recent_by_day,
        })
    }

    async fn completed_chapters_of(&self, book: &Book) -> Result<Vec<u32>, StatsError> {
        let counts = self.meta.chapter_counts(book).await?;
        let events = self.log.events_for_book(book.id()).await?;

        let mut completed = Vec::new();
        for (idx, count) in counts.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let chapter = (idx + 1) as u32;
            if events
                .iter()
                .any(|e| e.chapter == chapter && e.verse >= *count)
            {
                completed.push(chapter);
            }
        }
        Ok(completed)
    }

    async fn canon_total(&self) -> Result<u64, StatsError> {
        let mut total = 0u64;
        for book in self.canon.books() {
            total += self.meta.book_total(book).await?;
        }
        Ok(total)
    }
}
