use chrono::Duration;
use lectio_core::model::{Book, BookId, Position, ReadingEvent};
use lectio_core::time::fixed_now;
use storage::repository::{
    BookRepository, ChapterMetaRepository, ReadingLogRepository, VerseTextRepository,
};
use storage::sqlite::SqliteRepository;

fn build_book(id: u64, name: &str, chapters: u32) -> Book {
    Book::new(BookId::new(id), name, u32::try_from(id).unwrap(), chapters).unwrap()
}

fn event(book: u64, chapter: u32, verse: u32, offset_secs: i64) -> ReadingEvent {
    ReadingEvent::new(
        Position::new(BookId::new(book), chapter, verse),
        fixed_now() + Duration::seconds(offset_secs),
    )
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_books_round_trip_and_seed_idempotence() {
    let repo = connect("memdb_books").await;

    let books = vec![build_book(1, "Genesis", 50), build_book(2, "Exodus", 40)];
    repo.seed_books(&books).await.unwrap();
    repo.seed_books(&books).await.unwrap();

    let listed = repo.list_books().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].name(), "Genesis");
    assert_eq!(listed[1].chapter_count(), 40);

    let by_name = repo.get_book_by_name("Exodus").await.unwrap().unwrap();
    assert_eq!(by_name.id(), BookId::new(2));
    assert!(repo.get_book(BookId::new(9)).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_chapter_meta_first_write_wins() {
    let repo = connect("memdb_chapters").await;
    repo.seed_books(&[build_book(1, "Genesis", 50)]).await.unwrap();

    assert!(repo.verse_count(BookId::new(1), 1).await.unwrap().is_none());

    repo.put_verse_count(BookId::new(1), 1, 31).await.unwrap();
    repo.put_verse_count(BookId::new(1), 1, 99).await.unwrap();
    assert_eq!(repo.verse_count(BookId::new(1), 1).await.unwrap(), Some(31));

    repo.put_verse_count(BookId::new(1), 2, 25).await.unwrap();
    let counts = repo.counts_for_book(BookId::new(1)).await.unwrap();
    assert_eq!(counts, vec![(1, 31), (2, 25)]);
}

#[tokio::test]
async fn sqlite_log_views_and_tiebreak() {
    let repo = connect("memdb_log").await;
    repo.seed_books(&[build_book(1, "Genesis", 50)]).await.unwrap();

    // A mark and its rollover share one timestamp; insertion order decides.
    repo.append_events(&[event(1, 1, 31, 0), event(1, 2, 1, 0)])
        .await
        .unwrap();

    let latest = repo.latest_event().await.unwrap().unwrap();
    assert_eq!(latest.position(), Position::new(BookId::new(1), 2, 1));

    let all = repo.all_events().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].position(), Position::new(BookId::new(1), 1, 31));

    let recent = repo.recent_events(1).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].position(), Position::new(BookId::new(1), 2, 1));

    assert_eq!(repo.count_events().await.unwrap(), 2);
}

#[tokio::test]
async fn sqlite_day_aggregates() {
    let repo = connect("memdb_days").await;
    repo.seed_books(&[build_book(1, "Genesis", 50)]).await.unwrap();

    let day = 86_400;
    repo.append_events(&[
        event(1, 1, 1, 0),
        event(1, 1, 2, 30),
        event(1, 1, 3, day),
        event(1, 1, 4, 3 * day),
    ])
    .await
    .unwrap();

    let days = repo.distinct_days(30).await.unwrap();
    assert_eq!(days.len(), 3);
    assert!(days[0] > days[1]);

    let limited = repo.distinct_days(2).await.unwrap();
    assert_eq!(limited.len(), 2);

    let counts = repo.day_counts().await.unwrap();
    assert_eq!(
        counts.iter().map(|(_, n)| *n).collect::<Vec<_>>(),
        vec![2, 1, 1]
    );
}

#[tokio::test]
async fn sqlite_reset_replaces_log_atomically() {
    let repo = connect("memdb_reset").await;
    repo.seed_books(&[build_book(1, "Genesis", 50), build_book(2, "Exodus", 40)])
        .await
        .unwrap();

    repo.append_events(&[event(2, 3, 4, 0), event(2, 3, 5, 10)])
        .await
        .unwrap();
    repo.reset(event(1, 1, 1, 20)).await.unwrap();

    assert_eq!(repo.count_events().await.unwrap(), 1);
    let latest = repo.latest_event().await.unwrap().unwrap();
    assert_eq!(latest.position(), Position::new(BookId::new(1), 1, 1));
}

#[tokio::test]
async fn sqlite_verse_text_upserts() {
    let repo = connect("memdb_verses").await;
    repo.seed_books(&[build_book(1, "Genesis", 50)]).await.unwrap();

    repo.put_verse_text(BookId::new(1), 1, 1, "first draft")
        .await
        .unwrap();
    repo.put_verse_text(BookId::new(1), 1, 1, "In the beginning…")
        .await
        .unwrap();
    repo.put_verse_text(BookId::new(1), 1, 2, "And the earth…")
        .await
        .unwrap();

    let text = repo.verse_text(BookId::new(1), 1, 1).await.unwrap();
    assert_eq!(text.as_deref(), Some("In the beginning…"));

    let chapter = repo.chapter_verses(BookId::new(1), 1).await.unwrap();
    assert_eq!(chapter.len(), 2);
    assert_eq!(chapter[1], (2, "And the earth…".to_string()));

    assert!(
        repo.verse_text(BookId::new(1), 2, 1)
            .await
            .unwrap()
            .is_none()
    );
}
