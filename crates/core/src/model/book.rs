use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::BookId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BookError {
    #[error("book name cannot be empty")]
    EmptyName,

    #[error("book must have at least one chapter")]
    NoChapters,

    #[error("book order must be >= 1")]
    InvalidOrder,
}

//
// ─── BOOK ──────────────────────────────────────────────────────────────────────
//

/// A book-length division of the canon.
///
/// Books are static reference data: loaded once at startup and never mutated.
/// `order` defines the total reading order (in this canon it equals the id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    id: BookId,
    name: String,
    order: u32,
    chapter_count: u32,
}

impl Book {
    /// Creates a new Book.
    ///
    /// # Errors
    ///
    /// Returns `BookError::EmptyName` if the name is empty or whitespace-only,
    /// `BookError::NoChapters` if `chapter_count` is zero, and
    /// `BookError::InvalidOrder` if `order` is zero.
    pub fn new(
        id: BookId,
        name: impl Into<String>,
        order: u32,
        chapter_count: u32,
    ) -> Result<Self, BookError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BookError::EmptyName);
        }
        if chapter_count == 0 {
            return Err(BookError::NoChapters);
        }
        if order == 0 {
            return Err(BookError::InvalidOrder);
        }

        Ok(Self {
            id,
            name: name.trim().to_owned(),
            order,
            chapter_count,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> BookId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn chapter_count(&self) -> u32 {
        self.chapter_count
    }

    /// True if `chapter` is a valid chapter number for this book.
    #[must_use]
    pub fn contains_chapter(&self, chapter: u32) -> bool {
        (1..=self.chapter_count).contains(&chapter)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_new_rejects_empty_name() {
        let err = Book::new(BookId::new(1), "   ", 1, 50).unwrap_err();
        assert_eq!(err, BookError::EmptyName);
    }

    #[test]
    fn book_new_rejects_zero_chapters() {
        let err = Book::new(BookId::new(1), "Genesis", 1, 0).unwrap_err();
        assert_eq!(err, BookError::NoChapters);
    }

    #[test]
    fn book_new_rejects_zero_order() {
        let err = Book::new(BookId::new(1), "Genesis", 0, 50).unwrap_err();
        assert_eq!(err, BookError::InvalidOrder);
    }

    #[test]
    fn book_new_trims_name() {
        let book = Book::new(BookId::new(8), "  Ruth  ", 8, 4).unwrap();
        assert_eq!(book.name(), "Ruth");
        assert_eq!(book.chapter_count(), 4);
    }

    #[test]
    fn contains_chapter_bounds() {
        let book = Book::new(BookId::new(8), "Ruth", 8, 4).unwrap();
        assert!(book.contains_chapter(1));
        assert!(book.contains_chapter(4));
        assert!(!book.contains_chapter(0));
        assert!(!book.contains_chapter(5));
    }
}
