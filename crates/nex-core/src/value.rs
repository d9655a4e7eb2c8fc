//! Abbreviated magnitude strings: `12300000` ⇄ `"12.3M"`.

use std::sync::LazyLock;

use regex::Regex;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Render a magnitude with a B/M/K suffix and one decimal place.
/// Below 1000 the rounded integer is printed with no suffix.
pub fn format_value(magnitude: f64) -> String {
    if magnitude >= 1e9 {
        format!("{:.1}B", magnitude / 1e9)
    } else if magnitude >= 1e6 {
        format!("{:.1}M", magnitude / 1e6)
    } else if magnitude >= 1e3 {
        format!("{:.1}K", magnitude / 1e3)
    } else {
        format!("{}", magnitude.round() as i64)
    }
}

/// Parse a display string such as `"$12.5M/s"` back to a magnitude.
///
/// The first numeric run is scaled by B, M or K (checked in that order)
/// when the string contains the letter. Returns 0 when there is no number.
pub fn parse_value(display: &str) -> f64 {
    let Some(m) = NUMBER.find(display) else {
        return 0.0;
    };
    let base: f64 = m.as_str().parse().unwrap_or(0.0);

    if display.contains('B') {
        base * 1e9
    } else if display.contains('M') {
        base * 1e6
    } else if display.contains('K') {
        base * 1e3
    } else {
        base
    }
}
