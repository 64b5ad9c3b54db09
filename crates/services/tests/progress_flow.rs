use std::sync::Arc;

use lectio_core::model::{Book, BookId, Position};
use lectio_core::time::fixed_clock;
use lectio_core::Canon;
use services::{ChapterMetaService, ProgressService, StatsService, UnavailableFetcher};
use storage::repository::{ChapterMetaRepository, InMemoryRepository, ReadingLogRepository};

// Two-book corpus: A has chapters of 3 and 2 verses, B one chapter of 5.
fn two_book_canon() -> Canon {
    Canon::from_books(vec![
        Book::new(BookId::new(1), "Alpha", 1, 2).unwrap(),
        Book::new(BookId::new(2), "Beta", 2, 1).unwrap(),
    ])
}

async fn build() -> (ProgressService, StatsService, Arc<InMemoryRepository>) {
    let repo = Arc::new(InMemoryRepository::new());
    repo.put_verse_count(BookId::new(1), 1, 3).await.unwrap();
    repo.put_verse_count(BookId::new(1), 2, 2).await.unwrap();
    repo.put_verse_count(BookId::new(2), 1, 5).await.unwrap();

    let canon = two_book_canon();
    let meta = ChapterMetaService::new(Arc::clone(&repo) as _, Arc::new(UnavailableFetcher));
    let progress = ProgressService::with_clock(
        fixed_clock(),
        canon.clone(),
        Arc::clone(&repo) as _,
        meta.clone(),
    );
    let stats = StatsService::with_clock(fixed_clock(), canon, Arc::clone(&repo) as _, meta);
    (progress, stats, repo)
}

#[tokio::test]
async fn reading_through_a_book_rolls_over_and_completes_it() {
    let (progress, stats, repo) = build().await;

    progress.reset().await.unwrap();
    assert_eq!(repo.count_events().await.unwrap(), 1);
    assert!(stats.completed_books().await.unwrap().is_empty());

    // Finishing Alpha chapter 1 lands at chapter 2 verse 1.
    let outcome = progress.advance(BookId::new(1), 1, 3, true).await.unwrap();
    assert_eq!(outcome.current(), Position::new(BookId::new(1), 2, 1));
    assert_eq!(
        progress.current_position().await.unwrap(),
        Position::new(BookId::new(1), 2, 1)
    );

    // Finishing Alpha chapter 2 rolls into Beta.
    let outcome = progress.advance(BookId::new(1), 2, 2, true).await.unwrap();
    assert_eq!(outcome.current(), Position::new(BookId::new(2), 1, 1));

    let completed = stats.completed_books().await.unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id(), BookId::new(1));
}

#[tokio::test]
async fn reset_erases_history_and_derived_completion() {
    let (progress, stats, repo) = build().await;

    progress.advance(BookId::new(1), 1, 3, true).await.unwrap();
    progress.advance(BookId::new(1), 2, 2, true).await.unwrap();
    assert!(!stats.completed_books().await.unwrap().is_empty());

    let start = progress.reset().await.unwrap();
    assert_eq!(start, Position::new(BookId::new(1), 1, 1));
    assert_eq!(repo.count_events().await.unwrap(), 1);
    assert!(stats.completed_books().await.unwrap().is_empty());
    assert_eq!(progress.current_position().await.unwrap(), start);
}

#[tokio::test]
async fn peek_agrees_with_advance_across_a_book_boundary() {
    let (progress, _, _) = build().await;

    progress.jump(BookId::new(1), 2, 2).await.unwrap();
    let peeked = progress.peek().await.unwrap();

    let outcome = progress.advance(BookId::new(1), 2, 2, true).await.unwrap();
    assert_eq!(peeked, outcome.current());
    assert_eq!(peeked, Position::new(BookId::new(2), 1, 1));
}

#[tokio::test]
async fn canon_percentage_reflects_every_event() {
    let (progress, stats, _) = build().await;

    // 4 events (2 marks + 2 rollovers) over a 10-verse canon.
    progress.advance(BookId::new(1), 1, 3, true).await.unwrap();
    progress.advance(BookId::new(1), 2, 2, true).await.unwrap();

    let p = stats.percentages().await.unwrap();
    assert!((p.canon - 40.0).abs() < f64::EPSILON);
}
