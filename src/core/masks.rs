//! Conversions between raw keystrokes, display strings and canonical values
//! for date, phone and email fields.
//!
//! Masks are purely length-driven: `"99/99/9999"` is fine display text while
//! typing. Only [`unmask_date`] range-checks.

use std::sync::OnceLock;

use regex::Regex;

const DATE_DIGITS: usize = 8;
const PHONE_DIGITS: usize = 11;

static CANONICAL_DATE_REGEX: OnceLock<Regex> = OnceLock::new();
static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

fn digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Returns true if `value` has the `YYYY-MM-DD` shape. Ranges are not checked.
pub fn is_canonical_date(value: &str) -> bool {
    CANONICAL_DATE_REGEX
        .get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap())
        .is_match(value)
}

/// Progressive `DD/MM/YYYY` mask.
pub fn mask_date(raw: &str) -> String {
    let mut numbers = digits(raw);
    numbers.truncate(DATE_DIGITS);

    match numbers.len() {
        0..=2 => numbers,
        3..=4 => format!("{}/{}", &numbers[..2], &numbers[2..]),
        _ => format!("{}/{}/{}", &numbers[..2], &numbers[2..4], &numbers[4..]),
    }
}

/// Converts a `DD/MM/YYYY` display string to `YYYY-MM-DD`.
///
/// Returns `None` unless exactly eight digits are present and day, month and year
/// fall in [1, 31], [1, 12] and [1900, 2100]. Day-of-month is not checked against
/// the month, so `31/02/2024` passes.
pub fn unmask_date(display: &str) -> Option<String> {
    let numbers = digits(display);
    if numbers.len() != DATE_DIGITS {
        return None;
    }

    let (day, month, year) = (&numbers[..2], &numbers[2..4], &numbers[4..]);
    let day_num: u32 = day.parse().ok()?;
    let month_num: u32 = month.parse().ok()?;
    let year_num: u32 = year.parse().ok()?;

    if !(1..=31).contains(&day_num)
        || !(1..=12).contains(&month_num)
        || !(1900..=2100).contains(&year_num)
    {
        return None;
    }

    Some(format!("{}-{}-{}", year, month, day))
}

/// Converts `YYYY-MM-DD` to `DD/MM/YYYY`. Empty when the input is absent or
/// does not have three `-` separated parts.
pub fn format_date_to_brazilian(canonical: Option<&str>) -> String {
    let Some(canonical) = canonical.filter(|c| !c.is_empty()) else {
        return String::new();
    };

    let mut parts = canonical.split('-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(year), Some(month), Some(day))
            if !year.is_empty() && !month.is_empty() && !day.is_empty() =>
        {
            format!("{}/{}/{}", day, month, year)
        }
        _ => String::new(),
    }
}

fn phone_layout(numbers: &str) -> String {
    match numbers.len() {
        0 => String::new(),
        1..=2 => format!("({}", numbers),
        3..=7 => format!("({}) {}", &numbers[..2], &numbers[2..]),
        8..=10 => format!("({}) {}-{}", &numbers[..2], &numbers[2..6], &numbers[6..]),
        _ => format!("({}) {}-{}", &numbers[..2], &numbers[2..7], &numbers[7..]),
    }
}

/// Progressive `(DD) DDDDD-DDDD` mask, `(DD) DDDD-DDDD` for ten digits or fewer.
pub fn mask_phone(raw: &str) -> String {
    let mut numbers = digits(raw);
    numbers.truncate(PHONE_DIGITS);
    phone_layout(&numbers)
}

/// Formats a stored phone for read-only display. Unlike [`mask_phone`] nothing is dropped.
pub fn format_phone(phone: Option<&str>) -> String {
    phone_layout(&digits(phone.unwrap_or_default()))
}

pub fn unmask_phone(display: &str) -> String {
    digits(display)
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// An empty address is valid since the field is optional.
pub fn is_valid_email(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }

    EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
        .is_match(value)
}
