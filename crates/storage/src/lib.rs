#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    BookRepository, ChapterMetaRepository, InMemoryRepository, ReadingLogRepository, Storage,
    StorageError, VerseTextRepository,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
