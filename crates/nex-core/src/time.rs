//! Lightweight UTC date/time utilities (no chrono dependency).
//!
//! Timestamps travel as ISO-8601 strings with millisecond precision
//! (`2026-02-21T00:00:00.000Z`). Conversion uses Howard Hinnant's
//! civil_from_days / days_from_civil algorithms.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current UTC time as Unix milliseconds.
pub fn now_unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
pub fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Current UTC timestamp in ISO-8601 format.
pub fn now_iso8601() -> String {
    unix_millis_to_iso8601(now_unix_millis())
}

/// Convert Unix milliseconds to an ISO-8601 UTC string.
pub fn unix_millis_to_iso8601(millis: u64) -> String {
    let secs = millis / 1000;
    let ms = millis % 1000;
    let days = (secs / 86400) as i64;
    let time_of_day = secs % 86400;
    let hours = time_of_day / 3600;
    let minutes = (time_of_day % 3600) / 60;
    let seconds = time_of_day % 60;

    let (y, m, d) = civil_from_days(days);
    format!("{y:04}-{m:02}-{d:02}T{hours:02}:{minutes:02}:{seconds:02}.{ms:03}Z")
}

/// Parse an ISO-8601 UTC timestamp back to Unix milliseconds.
///
/// Accepts `YYYY-MM-DDTHH:MM:SS[.fff]Z`. Anything else, including dates
/// before the epoch, yields `None`.
pub fn parse_iso8601(ts: &str) -> Option<u64> {
    let body = ts.strip_suffix('Z')?;
    let (date, time) = body.split_once('T')?;

    let mut date_parts = date.splitn(3, '-');
    let y: i64 = parse_digits(date_parts.next()?, 4)?;
    let m: u64 = parse_digits(date_parts.next()?, 2)?;
    let d: u64 = parse_digits(date_parts.next()?, 2)?;
    if !(1..=12).contains(&m) || !(1..=31).contains(&d) {
        return None;
    }

    let (clock, frac) = match time.split_once('.') {
        Some((clock, frac)) => (clock, Some(frac)),
        None => (time, None),
    };
    let mut clock_parts = clock.splitn(3, ':');
    let hh: u64 = parse_digits(clock_parts.next()?, 2)?;
    let mm: u64 = parse_digits(clock_parts.next()?, 2)?;
    let ss: u64 = parse_digits(clock_parts.next()?, 2)?;
    if hh > 23 || mm > 59 || ss > 60 {
        return None;
    }

    let ms = match frac {
        Some(f) if !f.is_empty() && f.len() <= 9 && f.bytes().all(|b| b.is_ascii_digit()) => {
            // Keep the first three digits, right-padded.
            let padded = format!("{f:0<3}");
            padded[..3].parse::<u64>().ok()?
        }
        Some(_) => return None,
        None => 0,
    };

    let days = days_from_civil(y, m, d);
    if days < 0 {
        return None;
    }
    let secs = days as u64 * 86400 + hh * 3600 + mm * 60 + ss;
    Some(secs * 1000 + ms)
}

fn parse_digits<T: std::str::FromStr>(s: &str, len: usize) -> Option<T> {
    if s.len() != len || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Howard Hinnant's civil_from_days: Unix epoch days → (year, month, day).
fn civil_from_days(days: i64) -> (i64, u64, u64) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}

/// Inverse of `civil_from_days`: (year, month, day) → Unix epoch days.
fn days_from_civil(y: i64, m: u64, d: u64) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u64;
    let mp = if m > 2 { m - 3 } else { m + 9 };
    let doy = (153 * mp + 2) / 5 + d - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146097 + doe as i64 - 719468
}
