//! Statistics arithmetic: rates, streaks, ETAs, completion percentages.
//!
//! Pure functions over already-loaded history data. The statistics service
//! owns the queries; everything that can be unit-tested without storage lives
//! here.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};

/// Verses/day assumed when the history is too thin to measure (< 2 events).
pub const DEFAULT_READING_RATE: f64 = 10.0;

/// ETA fallback for the current book when no usable rate exists.
pub const FALLBACK_BOOK_ETA_DAYS: u32 = 30;

/// ETA fallback for the whole canon when no usable rate exists.
pub const FALLBACK_CANON_ETA_DAYS: u32 = 365;

/// Average verses read per reading day.
///
/// `total_events` counts every history event; `distinct_days` counts calendar
/// days with at least one event. Fewer than two events yields
/// [`DEFAULT_READING_RATE`] rather than a rate derived from near-zero data.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn reading_rate(total_events: u64, distinct_days: u64) -> f64 {
    if total_events < 2 || distinct_days == 0 {
        return DEFAULT_READING_RATE;
    }
    total_events as f64 / distinct_days as f64
}

/// Consecutive reading-day streak ending today or yesterday.
///
/// `days` is the set of distinct calendar days present in the most recent 30
/// days of history (by timestamp order, not a calendar window). The streak is
/// zero unless today or yesterday has an event; otherwise it starts at 1 and
/// walks backward from yesterday one day at a time until the first gap.
#[must_use]
pub fn current_streak(days: &[NaiveDate], today: NaiveDate) -> u32 {
    let set: HashSet<NaiveDate> = days.iter().copied().collect();
    let yesterday = today - Duration::days(1);

    if !set.contains(&today) && !set.contains(&yesterday) {
        return 0;
    }

    let mut streak = 1;
    let mut check = yesterday;
    while set.contains(&check) {
        streak += 1;
        check -= Duration::days(1);
    }
    streak
}

/// Days to finish `remaining` verses at `rate` verses/day, rounded up.
///
/// A non-positive rate falls back to `fallback` to avoid division by zero or
/// negative ETAs.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn estimate_days(remaining: u64, rate: f64, fallback: u32) -> u32 {
    if rate <= 0.0 {
        return fallback;
    }
    let days = (remaining as f64 / rate).ceil();
    if days >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        days as u32
    }
}

/// `read / total * 100`, treating a zero total as 1 to avoid division by zero.
///
/// The canon percentage feeds raw event counts through this, so re-reading
/// the same verse inflates it. Intentional; not a bug to silently fix.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(read: u64, total: u64) -> f64 {
    read as f64 / total.max(1) as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rate_defaults_below_two_events() {
        assert!((reading_rate(0, 0) - DEFAULT_READING_RATE).abs() < f64::EPSILON);
        assert!((reading_rate(1, 1) - DEFAULT_READING_RATE).abs() < f64::EPSILON);
    }

    #[test]
    fn rate_is_events_over_days() {
        assert!((reading_rate(10, 2) - 5.0).abs() < f64::EPSILON);
        assert!((reading_rate(7, 7) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn streak_zero_without_recent_day() {
        let today = day(2025, 3, 10);
        assert_eq!(current_streak(&[], today), 0);
        assert_eq!(current_streak(&[day(2025, 3, 7)], today), 0);
    }

    #[test]
    fn streak_counts_backward_until_gap() {
        // Events on D, D-1, D-2 with a gap at D-3.
        let today = day(2025, 3, 10);
        let days = vec![day(2025, 3, 10), day(2025, 3, 9), day(2025, 3, 8)];
        assert_eq!(current_streak(&days, today), 3);
    }

    #[test]
    fn streak_survives_missing_today() {
        // Read yesterday and the day before, nothing yet today.
        let today = day(2025, 3, 10);
        let days = vec![day(2025, 3, 9), day(2025, 3, 8)];
        assert_eq!(current_streak(&days, today), 3);
    }

    #[test]
    fn streak_today_only() {
        let today = day(2025, 3, 10);
        assert_eq!(current_streak(&[today], today), 1);
    }

    #[test]
    fn eta_rounds_up_and_falls_back() {
        assert_eq!(estimate_days(100, 10.0, 30), 10);
        assert_eq!(estimate_days(101, 10.0, 30), 11);
        assert_eq!(estimate_days(100, 0.0, 30), 30);
        assert_eq!(estimate_days(100, -1.0, 365), 365);
        assert_eq!(estimate_days(0, 10.0, 30), 0);
    }

    #[test]
    fn percentage_guards_zero_total() {
        assert!((percentage(5, 0) - 500.0).abs() < f64::EPSILON);
        assert!((percentage(5, 10) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn percentage_counts_raw_events() {
        // Re-reading pushes the metric past 100% by design.
        assert!((percentage(12, 10) - 120.0).abs() < f64::EPSILON);
    }
}
