#![forbid(unsafe_code)]

pub mod bootstrap;
pub mod chapter_meta;
pub mod error;
pub mod export;
pub mod fetch;
pub mod progress;
pub mod reader;
pub mod stats;

pub use lectio_core::Clock;

pub use bootstrap::AppServices;
pub use chapter_meta::{ChapterMetaService, DEFAULT_VERSE_COUNT};
pub use error::{
    AppServicesError, ExportError, FetchError, ProgressError, ReaderError, StatsError,
};
pub use export::{BookExport, ChapterExport, ExportService, FlatVerse, VerseExport};
pub use fetch::{UnavailableFetcher, VerseFetcher, WebFetcher, WebFetcherConfig};
pub use progress::{AdvanceOutcome, ProgressService};
pub use reader::{ReaderService, MISSING_VERSE_TEXT};
pub use stats::{CompletionEstimate, Percentages, ReadingSummary, StatsService};
