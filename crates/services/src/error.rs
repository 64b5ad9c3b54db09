//! Shared error types for the services crate.

use thiserror::Error;

use lectio_core::model::{BookError, BookId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by verse fetchers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("verse fetching is not available")]
    Disabled,
    #[error("fetcher returned an empty response")]
    EmptyResponse,
    #[error("fetch request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("unknown book: {0}")]
    UnknownBook(BookId),
    #[error("reference table is empty")]
    EmptyCanon,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error("unknown book: {0}")]
    UnknownBook(BookId),
    #[error("reference table is empty")]
    EmptyCanon,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ReaderService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReaderError {
    #[error("unknown book: {0}")]
    UnknownBook(BookId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ExportService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    #[error("no book named {0:?}")]
    UnknownBook(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Book(#[from] BookError),
}
