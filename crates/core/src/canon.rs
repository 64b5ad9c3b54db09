//! The fixed, ordered reference table of the corpus: 66 books with known
//! chapter counts. Reading order equals book id.

use crate::model::{Book, BookId};

/// Book names and chapter counts in canonical order. Index + 1 = id = order.
const CANON_TABLE: [(&str, u32); 66] = [
    ("Genesis", 50),
    ("Exodus", 40),
    ("Leviticus", 27),
    ("Numbers", 36),
    ("Deuteronomy", 34),
    ("Joshua", 24),
    ("Judges", 21),
    ("Ruth", 4),
    ("1 Samuel", 31),
    ("2 Samuel", 24),
    ("1 Kings", 22),
    ("2 Kings", 25),
    ("1 Chronicles", 29),
    ("2 Chronicles", 36),
    ("Ezra", 10),
    ("Nehemiah", 13),
    ("Esther", 10),
    ("Job", 42),
    ("Psalms", 150),
    ("Proverbs", 31),
    ("Ecclesiastes", 12),
    ("Song of Solomon", 8),
    ("Isaiah", 66),
    ("Jeremiah", 52),
    ("Lamentations", 5),
    ("Ezekiel", 48),
    ("Daniel", 12),
    ("Hosea", 14),
    ("Joel", 3),
    ("Amos", 9),
    ("Obadiah", 1),
    ("Jonah", 4),
    ("Micah", 7),
    ("Nahum", 3),
    ("Habakkuk", 3),
    ("Zephaniah", 3),
    ("Haggai", 2),
    ("Zechariah", 14),
    ("Malachi", 4),
    ("Matthew", 28),
    ("Mark", 16),
    ("Luke", 24),
    ("John", 21),
    ("Acts", 28),
    ("Romans", 16),
    ("1 Corinthians", 16),
    ("2 Corinthians", 13),
    ("Galatians", 6),
    ("Ephesians", 6),
    ("Philippians", 4),
    ("Colossians", 4),
    ("1 Thessalonians", 5),
    ("2 Thessalonians", 3),
    ("1 Timothy", 6),
    ("2 Timothy", 4),
    ("Titus", 3),
    ("Philemon", 1),
    ("Hebrews", 13),
    ("James", 5),
    ("1 Peter", 5),
    ("2 Peter", 3),
    ("1 John", 5),
    ("2 John", 1),
    ("3 John", 1),
    ("Jude", 1),
    ("Revelation", 22),
];

/// The immutable book reference table.
///
/// Built once from the static canon data (or from arbitrary books in tests)
/// and shared read-only; the advancement and statistics engines consult it
/// for bounds and successor lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canon {
    books: Vec<Book>,
}

impl Canon {
    /// The standard 66-book canon.
    ///
    /// # Panics
    ///
    /// Never panics in practice: the static table has non-empty names and
    /// positive chapter counts, which is all `Book::new` validates.
    #[must_use]
    pub fn standard() -> Self {
        let books = CANON_TABLE
            .iter()
            .enumerate()
            .map(|(idx, (name, chapters))| {
                #[allow(clippy::cast_possible_truncation)]
                let order = (idx + 1) as u32;
                Book::new(BookId::new(order.into()), *name, order, *chapters)
                    .expect("static canon table entries are valid")
            })
            .collect();
        Self { books }
    }

    /// Build a canon from arbitrary books, sorted by order. Intended for
    /// tests and tooling that exercise small synthetic corpora.
    #[must_use]
    pub fn from_books(mut books: Vec<Book>) -> Self {
        books.sort_by_key(Book::order);
        Self { books }
    }

    #[must_use]
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// First book in reading order.
    #[must_use]
    pub fn first(&self) -> Option<&Book> {
        self.books.first()
    }

    #[must_use]
    pub fn by_id(&self, id: BookId) -> Option<&Book> {
        self.books.iter().find(|b| b.id() == id)
    }

    /// Exact name lookup, case-insensitive. Fuzzy matching belongs to the UI.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Book> {
        self.books
            .iter()
            .find(|b| b.name().eq_ignore_ascii_case(name.trim()))
    }

    /// The book with `order + 1`, if one exists.
    #[must_use]
    pub fn next_after(&self, order: u32) -> Option<&Book> {
        self.books.iter().find(|b| b.order() == order + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_canon_has_66_books_in_order() {
        let canon = Canon::standard();
        assert_eq!(canon.len(), 66);
        for (idx, book) in canon.books().iter().enumerate() {
            let expected = u32::try_from(idx + 1).unwrap();
            assert_eq!(book.order(), expected);
            assert_eq!(book.id().value(), u64::from(expected));
        }
    }

    #[test]
    fn standard_canon_endpoints() {
        let canon = Canon::standard();
        let first = canon.first().unwrap();
        assert_eq!(first.name(), "Genesis");
        assert_eq!(first.chapter_count(), 50);

        let last = canon.books().last().unwrap();
        assert_eq!(last.name(), "Revelation");
        assert_eq!(last.chapter_count(), 22);
        assert!(canon.next_after(last.order()).is_none());
    }

    #[test]
    fn by_name_is_case_insensitive_and_exact() {
        let canon = Canon::standard();
        assert_eq!(canon.by_name("psalms").unwrap().chapter_count(), 150);
        assert_eq!(canon.by_name("  Song of Solomon ").unwrap().order(), 22);
        assert!(canon.by_name("Psalm").is_none());
    }

    #[test]
    fn next_after_walks_the_order() {
        let canon = Canon::standard();
        let malachi = canon.by_name("Malachi").unwrap();
        let matthew = canon.next_after(malachi.order()).unwrap();
        assert_eq!(matthew.name(), "Matthew");
    }
}
