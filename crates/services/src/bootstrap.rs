//! First-run wiring: seed the book table, construct the services.

use std::sync::Arc;

use lectio_core::{Canon, Clock};
use storage::repository::Storage;

use crate::chapter_meta::ChapterMetaService;
use crate::error::AppServicesError;
use crate::export::ExportService;
use crate::fetch::VerseFetcher;
use crate::progress::ProgressService;
use crate::reader::ReaderService;
use crate::stats::StatsService;

/// The fully wired service layer an application front end talks to.
#[derive(Clone)]
pub struct AppServices {
    pub canon: Canon,
    pub progress: ProgressService,
    pub stats: StatsService,
    pub reader: ReaderService,
    pub export: ExportService,
}

impl AppServices {
    /// Seed the canon idempotently and wire all services over the given
    /// storage.
    ///
    /// The log is left untouched: events come only from `advance` and
    /// `reset`, and an empty log already reads as the canon start, so a
    /// fresh install carries no history and every statistic starts at zero.
    ///
    /// # Errors
    ///
    /// Returns a storage error; seeding a previously seeded database is not
    /// an error.
    pub async fn init(
        storage: &Storage,
        fetcher: Arc<dyn VerseFetcher>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        storage.books.seed_books(Canon::standard().books()).await?;
        let canon = Canon::from_books(storage.books.list_books().await?);

        let meta = ChapterMetaService::new(Arc::clone(&storage.chapters), Arc::clone(&fetcher));
        let progress = ProgressService::with_clock(
            clock,
            canon.clone(),
            Arc::clone(&storage.log),
            meta.clone(),
        );
        let stats = StatsService::with_clock(clock, canon.clone(), Arc::clone(&storage.log), meta);
        let reader = ReaderService::new(canon.clone(), Arc::clone(&storage.verses), fetcher);
        let export = ExportService::new(canon.clone(), Arc::clone(&storage.verses));

        Ok(Self {
            canon,
            progress,
            stats,
            reader,
            export,
        })
    }
}
