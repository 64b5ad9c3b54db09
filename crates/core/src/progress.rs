//! Advancement arithmetic: chapter and book rollover.
//!
//! This is the single implementation of the rollover rules. The progress
//! engine uses it when writing events and `peek_next` uses it read-only, so
//! the two can never disagree.

use crate::canon::Canon;
use crate::model::{Book, Position};

/// Where auto-advance lands after marking `position` in `book`, given the
/// cached verse count of the marked chapter.
///
/// Returns `Some(next)` only when the marked verse reaches (or passes) the end
/// of its chapter:
/// - mid-book: first verse of the next chapter,
/// - last chapter: first verse of the first chapter of the successor book.
///
/// Returns `None` when no rollover applies: either the chapter is not
/// finished, or the book is the last of the canon (terminal state, not an
/// error).
#[must_use]
pub fn rollover_target(
    canon: &Canon,
    book: &Book,
    position: Position,
    verse_count: u32,
) -> Option<Position> {
    if position.verse < verse_count {
        return None;
    }

    if position.chapter < book.chapter_count() {
        return Some(Position::new(book.id(), position.chapter + 1, 1));
    }

    canon
        .next_after(book.order())
        .map(|next| Position::new(next.id(), 1, 1))
}

/// The position `advance(.., auto_advance = true)` would leave as current.
///
/// Identical to [`rollover_target`] except that "no rollover" resolves to the
/// marked position itself.
#[must_use]
pub fn peek_next(canon: &Canon, book: &Book, position: Position, verse_count: u32) -> Position {
    rollover_target(canon, book, position, verse_count).unwrap_or(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Book, BookId};

    fn two_book_canon() -> Canon {
        Canon::from_books(vec![
            Book::new(BookId::new(1), "Alpha", 1, 2).unwrap(),
            Book::new(BookId::new(2), "Beta", 2, 1).unwrap(),
        ])
    }

    #[test]
    fn mid_chapter_has_no_rollover() {
        let canon = two_book_canon();
        let alpha = canon.by_id(BookId::new(1)).unwrap();
        let pos = Position::new(alpha.id(), 1, 2);
        assert_eq!(rollover_target(&canon, alpha, pos, 3), None);
        assert_eq!(peek_next(&canon, alpha, pos, 3), pos);
    }

    #[test]
    fn chapter_end_rolls_to_next_chapter() {
        let canon = two_book_canon();
        let alpha = canon.by_id(BookId::new(1)).unwrap();
        let pos = Position::new(alpha.id(), 1, 3);
        let next = rollover_target(&canon, alpha, pos, 3).unwrap();
        assert_eq!(next, Position::new(alpha.id(), 2, 1));
    }

    #[test]
    fn book_end_rolls_to_successor() {
        let canon = two_book_canon();
        let alpha = canon.by_id(BookId::new(1)).unwrap();
        let pos = Position::new(alpha.id(), 2, 2);
        let next = rollover_target(&canon, alpha, pos, 2).unwrap();
        assert_eq!(next, Position::new(BookId::new(2), 1, 1));
    }

    #[test]
    fn canon_end_is_terminal() {
        let canon = two_book_canon();
        let beta = canon.by_id(BookId::new(2)).unwrap();
        let pos = Position::new(beta.id(), 1, 5);
        assert_eq!(rollover_target(&canon, beta, pos, 5), None);
        // peek at the terminal position resolves to itself
        assert_eq!(peek_next(&canon, beta, pos, 5), pos);
    }

    #[test]
    fn overshoot_verse_still_rolls_over() {
        // Manual jumps may record a verse past the cached chapter length.
        let canon = two_book_canon();
        let alpha = canon.by_id(BookId::new(1)).unwrap();
        let pos = Position::new(alpha.id(), 1, 7);
        let next = rollover_target(&canon, alpha, pos, 3).unwrap();
        assert_eq!(next, Position::new(alpha.id(), 2, 1));
    }

    #[test]
    fn standard_canon_book_boundary() {
        let canon = Canon::standard();
        let genesis = canon.by_name("Genesis").unwrap();
        let pos = Position::new(genesis.id(), 50, 26);
        let next = rollover_target(&canon, genesis, pos, 26).unwrap();
        assert_eq!(next.book_id, canon.by_name("Exodus").unwrap().id());
        assert_eq!((next.chapter, next.verse), (1, 1));
    }
}
