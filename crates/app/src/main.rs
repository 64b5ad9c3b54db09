use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use lectio_core::model::{Book, BookId};
use services::{AppServices, Clock, UnavailableFetcher, VerseFetcher, WebFetcher};
use storage::repository::Storage;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArg { name: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    UnknownBook { raw: String },
    NotConfirmed,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArg { name } => write!(f, "missing argument: {name}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::UnknownBook { raw } => write!(f, "unknown book: {raw}"),
            ArgsError::NotConfirmed => write!(f, "reset requires --yes"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage: cargo run -p app -- <command> [args] [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  status                          current position and percentages");
    eprintln!("  mark <book> <chapter> <verse>   record a verse as read [--no-advance]");
    eprintln!("  jump <book> <chapter> <verse>   move without rollover");
    eprintln!("  next                            where an auto-advancing mark would land");
    eprintln!("  read <book> <chapter> [verse]   show verse text");
    eprintln!("  stats                           rate, streak, ETA, summary");
    eprintln!("  books                           list books, completed ones marked");
    eprintln!("  chapters <book>                 completed chapters of a book");
    eprintln!("  reset --yes                     wipe history, restart at the beginning");
    eprintln!("  export [--flat] [--book <name>] [--out <path>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://lectio.sqlite3   (env: LECTIO_DB_URL)");
    eprintln!("  --out export.json");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Status,
    Mark,
    Jump,
    Next,
    Read,
    Stats,
    Books,
    Chapters,
    Reset,
    Export,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "status" => Some(Self::Status),
            "mark" => Some(Self::Mark),
            "jump" => Some(Self::Jump),
            "next" => Some(Self::Next),
            "read" => Some(Self::Read),
            "stats" => Some(Self::Stats),
            "books" => Some(Self::Books),
            "chapters" => Some(Self::Chapters),
            "reset" => Some(Self::Reset),
            "export" => Some(Self::Export),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    positional: Vec<String>,
    no_advance: bool,
    flat: bool,
    confirmed: bool,
    book_filter: Option<String>,
    out: PathBuf,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("LECTIO_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://lectio.sqlite3".into(), normalize_sqlite_url),
            positional: Vec::new(),
            no_advance: false,
            flat: false,
            confirmed: false,
            book_filter: None,
            out: PathBuf::from("export.json"),
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--no-advance" => parsed.no_advance = true,
                "--flat" => parsed.flat = true,
                "--yes" => parsed.confirmed = true,
                "--book" => parsed.book_filter = Some(require_value(args, "--book")?),
                "--out" => parsed.out = PathBuf::from(require_value(args, "--out")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => parsed.positional.push(arg),
            }
        }

        Ok(parsed)
    }

    fn positional(&self, index: usize, name: &'static str) -> Result<&str, ArgsError> {
        self.positional
            .get(index)
            .map(String::as_str)
            .ok_or(ArgsError::MissingArg { name })
    }

    /// Chapter/verse arguments are corrected to 1 rather than rejected:
    /// the engine tolerates out-of-range positions, bad input never aborts.
    fn number(&self, index: usize) -> u32 {
        self.positional
            .get(index)
            .and_then(|raw| raw.parse::<u32>().ok())
            .filter(|n| *n >= 1)
            .unwrap_or_else(|| {
                if let Some(raw) = self.positional.get(index) {
                    eprintln!("invalid number {raw:?}, using 1");
                }
                1
            })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") || raw.starts_with("sqlite:file:") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" || db_url.starts_with("sqlite:file:") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn resolve_book<'a>(services: &'a AppServices, raw: &str) -> Result<&'a Book, ArgsError> {
    if let Ok(id) = raw.parse::<u64>() {
        if let Some(book) = services.canon.by_id(BookId::new(id)) {
            return Ok(book);
        }
    }
    services
        .canon
        .by_name(raw)
        .ok_or_else(|| ArgsError::UnknownBook {
            raw: raw.to_string(),
        })
}

fn describe(services: &AppServices, book_id: BookId, chapter: u32, verse: u32) -> String {
    match services.canon.by_id(book_id) {
        Some(book) => format!("{} {chapter}:{verse}", book.name()),
        None => format!("book {book_id} {chapter}:{verse}"),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown command: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown command")
        })?,
    };
    argv.remove(0);

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite in the binary glue so services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;

    let fetcher: Arc<dyn VerseFetcher> = match WebFetcher::from_env() {
        Ok(fetcher) => Arc::new(fetcher),
        Err(err) => {
            log::warn!("verse fetcher unavailable: {err}");
            Arc::new(UnavailableFetcher)
        }
    };
    let services = AppServices::init(&storage, fetcher, Clock::default_clock()).await?;

    match cmd {
        Command::Status => {
            let position = services.progress.current_position().await?;
            let p = services.stats.percentages().await?;
            println!(
                "At {}",
                describe(&services, position.book_id, position.chapter, position.verse)
            );
            println!("Chapter {:.1}%  Book {:.1}%  Canon {:.1}%", p.chapter, p.book, p.canon);
        }
        Command::Mark => {
            let book = resolve_book(&services, args.positional(0, "book")?)?.clone();
            let chapter = args.number(1);
            let verse = args.number(2);
            let outcome = services
                .progress
                .advance(book.id(), chapter, verse, !args.no_advance)
                .await?;
            println!("Marked {} {chapter}:{verse}", book.name());
            if let Some(next) = outcome.rollover {
                println!(
                    "Now at {}",
                    describe(&services, next.book_id, next.chapter, next.verse)
                );
            }
        }
        Command::Jump => {
            let book = resolve_book(&services, args.positional(0, "book")?)?.clone();
            let position = services
                .progress
                .jump(book.id(), args.number(1), args.number(2))
                .await?;
            println!(
                "Jumped to {}",
                describe(&services, position.book_id, position.chapter, position.verse)
            );
        }
        Command::Next => {
            let next = services.progress.peek().await?;
            println!(
                "Next: {}",
                describe(&services, next.book_id, next.chapter, next.verse)
            );
        }
        Command::Read => {
            let book = resolve_book(&services, args.positional(0, "book")?)?.clone();
            let chapter = args.number(1);
            if args.positional.len() > 2 {
                let verse = args.number(2);
                let text = services.reader.verse_text(book.id(), chapter, verse).await?;
                println!("{} {chapter}:{verse}  {text}", book.name());
            } else {
                let verses = services.reader.chapter_text(book.id(), chapter).await?;
                if verses.is_empty() {
                    println!("No cached text for {} {chapter}.", book.name());
                }
                for (verse, text) in verses {
                    println!("{verse:>3}  {text}");
                }
            }
        }
        Command::Stats => {
            let summary = services.stats.reading_summary().await?;
            let estimate = services.stats.completion_estimate().await?;
            println!("Verses read:     {}", summary.total_verses_read);
            println!("Rate:            {:.1} verses/day", summary.average_per_day);
            println!("Streak:          {} day(s)", summary.streak);
            if let Some((day, count)) = summary.most_productive_day {
                println!("Best day:        {day} ({count} verses)");
            }
            println!("Book ETA:        {} day(s)", estimate.book_days);
            println!("Canon ETA:       {} day(s)", estimate.canon_days);
            for (day, positions) in summary.recent_by_day.iter().take(7) {
                println!("  {day}: {} reading(s)", positions.len());
            }
        }
        Command::Books => {
            let completed = services.stats.completed_books().await?;
            for book in services.canon.books() {
                let done = completed.iter().any(|b| b.id() == book.id());
                let flag = if done { "✔" } else { " " };
                println!(
                    "{flag} {:>2}. {}  ({} chapters)",
                    book.order(),
                    book.name(),
                    book.chapter_count()
                );
            }
        }
        Command::Chapters => {
            let book = resolve_book(&services, args.positional(0, "book")?)?.clone();
            let chapters = services.stats.completed_chapters(book.id()).await?;
            if chapters.is_empty() {
                println!("No completed chapters in {}.", book.name());
            } else {
                let listed: Vec<String> = chapters.iter().map(u32::to_string).collect();
                println!(
                    "{}: {}/{} complete ({})",
                    book.name(),
                    chapters.len(),
                    book.chapter_count(),
                    listed.join(", ")
                );
            }
        }
        Command::Reset => {
            if !args.confirmed {
                return Err(ArgsError::NotConfirmed.into());
            }
            let start = services.progress.reset().await?;
            println!(
                "History cleared. Back at {}",
                describe(&services, start.book_id, start.chapter, start.verse)
            );
        }
        Command::Export => {
            let filter = args.book_filter.as_deref();
            if args.flat {
                let verses = services.export.flat(filter).await?;
                services.export.write_to(&args.out, &verses)?;
                println!("Wrote {} verse(s) to {}", verses.len(), args.out.display());
            } else {
                let books = services.export.nested(filter).await?;
                services.export.write_to(&args.out, &books)?;
                println!("Wrote {} book(s) to {}", books.len(), args.out.display());
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
