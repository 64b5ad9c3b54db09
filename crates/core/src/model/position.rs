use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::BookId;

//
// ─── POSITION ──────────────────────────────────────────────────────────────────
//

/// A verse-granular reading position: the smallest addressable unit.
///
/// A position carries no validity guarantee beyond `chapter >= 1` and
/// `verse >= 1` by convention; verse numbers beyond the cached chapter length
/// are tolerated (manual jumps) and only clamped at input boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub book_id: BookId,
    pub chapter: u32,
    pub verse: u32,
}

impl Position {
    #[must_use]
    pub fn new(book_id: BookId, chapter: u32, verse: u32) -> Self {
        Self {
            book_id,
            chapter,
            verse,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "book {} {}:{}", self.book_id, self.chapter, self.verse)
    }
}

//
// ─── READING EVENT ─────────────────────────────────────────────────────────────
//

/// A timestamped record of reading progress, append-only.
///
/// Events are the single source of truth: the current position is the event
/// with the greatest `recorded_at`, and every derived statistic is a fold over
/// the full event log. Events are never updated or deleted except by a full
/// reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingEvent {
    pub book_id: BookId,
    pub chapter: u32,
    pub verse: u32,
    pub recorded_at: DateTime<Utc>,
}

impl ReadingEvent {
    #[must_use]
    pub fn new(position: Position, recorded_at: DateTime<Utc>) -> Self {
        Self {
            book_id: position.book_id,
            chapter: position.chapter,
            verse: position.verse,
            recorded_at,
        }
    }

    #[must_use]
    pub fn position(&self) -> Position {
        Position::new(self.book_id, self.chapter, self.verse)
    }

    /// Calendar day (UTC) this event was recorded on.
    #[must_use]
    pub fn day(&self) -> chrono::NaiveDate {
        self.recorded_at.date_naive()
    }
}
