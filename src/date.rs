//! Journal dates: file name parsing and the Reflect header format.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static JOURNAL_FILE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})_(\d{2})_(\d{2})\.md$").unwrap());

/// Parses a LogSeq journal file name (`2025_04_14.md`) into a date.
///
/// Returns `None` for other names and for impossible dates such as `2025_02_30.md`.
#[must_use]
pub fn parse_journal_file_name(file_name: &str) -> Option<NaiveDate> {
    let caps = JOURNAL_FILE_NAME.captures(file_name)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Output file name for a journal date: `2025-04-14.md`.
#[must_use]
pub fn journal_output_name(date: NaiveDate) -> String {
    format!("{}.md", date.format("%Y-%m-%d"))
}

/// Header text for a journal date: `Mon, April 14th, 2025`.
#[must_use]
pub fn format_header_date(date: NaiveDate) -> String {
    let day = date.day();
    format!(
        "{}, {} {day}{}, {}",
        date.format("%a"),
        date.format("%B"),
        day_suffix(day),
        date.year()
    )
}

/// Link-index form of a date: `2025/04/14`.
#[must_use]
pub fn format_index_date(date: NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}

const fn day_suffix(day: u32) -> &'static str {
    match day {
        1 | 21 | 31 => "st",
        2 | 22 => "nd",
        3 | 23 => "rd",
        _ => "th",
    }
}
