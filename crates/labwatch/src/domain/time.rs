//! Time-of-day arithmetic for schedule blocks.
//!
//! Times are minutes since midnight. A block whose end is not after its
//! start crosses midnight.

use crate::errors::{MonitorError, MonitorResult};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parse `HH:MM` (or `HH:MM:SS`, as relational time columns render) into
/// minutes since midnight.
pub fn parse_time_to_minutes(time: &str) -> MonitorResult<u32> {
    let invalid = || MonitorError::InvalidFormat {
        value: time.to_string(),
    };

    let mut parts = time.trim().split(':');
    let (Some(hours), Some(minutes)) = (parts.next(), parts.next()) else {
        return Err(invalid());
    };
    if let Some(seconds) = parts.next() {
        if seconds.len() != 2
            || !seconds.bytes().all(|b| b.is_ascii_digit())
            || seconds.parse::<u32>().map_or(true, |s| s >= 60)
        {
            return Err(invalid());
        }
    }
    if parts.next().is_some() || hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    if hours >= 24 || minutes >= 60 {
        return Err(invalid());
    }

    Ok(hours * 60 + minutes)
}

/// Duration of a block in hours; never negative.
///
/// `end <= start` is read as an overnight block, so `22:00-02:00` is 4 hours
/// and `09:00-09:00` is a full day.
pub fn block_duration_hours(start: &str, end: &str) -> MonitorResult<f64> {
    let (start, end) = (parse_time_to_minutes(start)?, parse_time_to_minutes(end)?);
    Ok(f64::from(span_minutes(start, end)) / 60.0)
}

/// Half-open overlap test: `[s1, e1)` and `[s2, e2)` share time.
///
/// Back-to-back intervals do not overlap.
pub fn intervals_overlap(s1: u32, e1: u32, s2: u32, e2: u32) -> bool {
    s1 < e2 && s2 < e1
}

/// Overlap of two same-day blocks given as `HH:MM` strings.
///
/// Overnight blocks are unrolled past midnight before comparing, so
/// `22:00-02:00` collides with `23:00-23:30`.
pub fn blocks_overlap(
    (start1, end1): (&str, &str),
    (start2, end2): (&str, &str),
) -> MonitorResult<bool> {
    let s1 = parse_time_to_minutes(start1)?;
    let s2 = parse_time_to_minutes(start2)?;
    let e1 = s1 + span_minutes(s1, parse_time_to_minutes(end1)?);
    let e2 = s2 + span_minutes(s2, parse_time_to_minutes(end2)?);
    Ok(intervals_overlap(s1, e1, s2, e2))
}

fn span_minutes(start: u32, end: u32) -> u32 {
    if end <= start {
        end + MINUTES_PER_DAY - start
    } else {
        end - start
    }
}
