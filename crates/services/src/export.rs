//! JSON export: a pure projection of the verse cache and the book table.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use lectio_core::model::Book;
use lectio_core::Canon;
use storage::repository::VerseTextRepository;

use crate::error::ExportError;

#[derive(Debug, Serialize)]
pub struct VerseExport {
    pub verse: u32,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ChapterExport {
    pub chapter: u32,
    pub verses: Vec<VerseExport>,
}

#[derive(Debug, Serialize)]
pub struct BookExport {
    pub book: String,
    pub chapters: Vec<ChapterExport>,
}

/// One record per cached verse, for the flat layout.
#[derive(Debug, Serialize)]
pub struct FlatVerse {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
}

/// Serializes cached verse text, nested or flat, optionally filtered to one
/// book by name. Chapters with no cached verses are omitted.
#[derive(Clone)]
pub struct ExportService {
    canon: Canon,
    verses: Arc<dyn VerseTextRepository>,
}

impl ExportService {
    #[must_use]
    pub fn new(canon: Canon, verses: Arc<dyn VerseTextRepository>) -> Self {
        Self { canon, verses }
    }

    /// Book → chapter → verse projection.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBook` for a filter naming no book, or a storage error.
    pub async fn nested(&self, book_filter: Option<&str>) -> Result<Vec<BookExport>, ExportError> {
        let mut out = Vec::new();
        for book in self.selected_books(book_filter)? {
            let mut chapters = Vec::new();
            for chapter in 1..=book.chapter_count() {
                let verses = self.verses.chapter_verses(book.id(), chapter).await?;
                if verses.is_empty() {
                    continue;
                }
                chapters.push(ChapterExport {
                    chapter,
                    verses: verses
                        .into_iter()
                        .map(|(verse, text)| VerseExport { verse, text })
                        .collect(),
                });
            }
            out.push(BookExport {
                book: book.name().to_string(),
                chapters,
            });
        }
        Ok(out)
    }

    /// One record per cached verse, in canon order.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBook` for a filter naming no book, or a storage error.
    pub async fn flat(&self, book_filter: Option<&str>) -> Result<Vec<FlatVerse>, ExportError> {
        let mut out = Vec::new();
        for book in self.selected_books(book_filter)? {
            for chapter in 1..=book.chapter_count() {
                for (verse, text) in self.verses.chapter_verses(book.id(), chapter).await? {
                    out.push(FlatVerse {
                        book: book.name().to_string(),
                        chapter,
                        verse,
                        text,
                    });
                }
            }
        }
        Ok(out)
    }

    /// Pretty-printed JSON written as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns a serialization or I/O error.
    pub fn write_to<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), ExportError> {
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn selected_books(&self, filter: Option<&str>) -> Result<Vec<Book>, ExportError> {
        match filter {
            Some(name) => {
                let book = self
                    .canon
                    .by_name(name)
                    .ok_or_else(|| ExportError::UnknownBook(name.to_string()))?;
                Ok(vec![book.clone()])
            }
            None => Ok(self.canon.books().to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectio_core::model::BookId;
    use storage::repository::InMemoryRepository;

    fn canon() -> Canon {
        Canon::from_books(vec![
            Book::new(BookId::new(1), "Alpha", 1, 2).unwrap(),
            Book::new(BookId::new(2), "Beta", 2, 1).unwrap(),
        ])
    }

    async fn seeded() -> ExportService {
        let repo = Arc::new(InMemoryRepository::new());
        repo.put_verse_text(BookId::new(1), 1, 1, "a11").await.unwrap();
        repo.put_verse_text(BookId::new(1), 1, 2, "a12").await.unwrap();
        repo.put_verse_text(BookId::new(2), 1, 1, "b11").await.unwrap();
        ExportService::new(canon(), repo)
    }

    #[tokio::test]
    async fn nested_skips_empty_chapters() {
        let export = seeded().await;
        let books = export.nested(None).await.unwrap();

        assert_eq!(books.len(), 2);
        assert_eq!(books[0].book, "Alpha");
        assert_eq!(books[0].chapters.len(), 1);
        assert_eq!(books[0].chapters[0].verses.len(), 2);
    }

    #[tokio::test]
    async fn flat_filter_selects_one_book() {
        let export = seeded().await;
        let verses = export.flat(Some("beta")).await.unwrap();

        assert_eq!(verses.len(), 1);
        assert_eq!(verses[0].book, "Beta");
        assert_eq!(verses[0].text, "b11");
    }

    #[tokio::test]
    async fn unknown_filter_is_rejected() {
        let export = seeded().await;
        assert!(matches!(
            export.nested(Some("Gamma")).await,
            Err(ExportError::UnknownBook(_))
        ));
    }

    #[tokio::test]
    async fn write_to_produces_pretty_json() {
        let export = seeded().await;
        let verses = export.flat(None).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        export.write_to(&path, &verses).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with('['));
        assert!(text.contains("\"book\": \"Alpha\""));
    }
}
