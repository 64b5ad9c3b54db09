mod book;
mod ids;
mod position;

pub use book::{Book, BookError};
pub use ids::{BookId, ParseIdError};
pub use position::{Position, ReadingEvent};
