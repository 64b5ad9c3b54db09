#![forbid(unsafe_code)]

pub mod canon;
pub mod model;
pub mod progress;
pub mod stats;
pub mod time;

pub use canon::Canon;
pub use time::Clock;
