//! Session date handling
//!
//! Sheet dates arrive either as full ISO instants or as `D/M/Y` strings typed
//! by hand. Calendar-only dates are pinned to 12:00 UTC so that rendering in
//! any local timezone between UTC-12 and UTC+11 keeps the same calendar day.
//! Never build these from local midnight.
//!
//! A bare `YYYY-MM-DD` is accepted as well and pinned the same way. The sheet
//! itself never produces that shape; it is an extension for hand-built
//! payloads, which would otherwise fall back to the current instant like any
//! other unrecognized string.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Hour of day (UTC) used for calendar-only dates
pub const MIDDAY_HOUR: u32 = 12;

/// Parse a sheet date into an instant. Total: anything unrecognized (or
/// empty) yields the current instant.
pub fn parse_date(raw: &str) -> DateTime<Utc> {
    parse_date_at(raw, Utc::now())
}

/// [`parse_date`] with an explicit fallback instant
pub fn parse_date_at(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return now;
    }

    let parsed = if trimmed.contains('T') {
        parse_instant(trimmed)
    } else if trimmed.contains('/') {
        parse_day_month_year(trimmed)
    } else {
        parse_canonical_day(trimmed).and_then(at_midday)
    };

    parsed.unwrap_or(now)
}

/// Pin a calendar day to 12:00 UTC
pub fn at_midday(day: NaiveDate) -> Option<DateTime<Utc>> {
    day.and_hms_opt(MIDDAY_HOUR, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// `YYYY-MM-DD` form of the instant's UTC calendar day
pub fn canonical_day(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d").to_string()
}

/// Reformat `YYYY-MM-DD` as `DD/MM/YYYY`; any other text passes through.
pub fn localize_date(raw: &str) -> String {
    if !is_canonical_day(raw) {
        return raw.to_string();
    }
    let (year, rest) = raw.split_at(4);
    let month = &rest[1..3];
    let day = &rest[4..6];
    format!("{day}/{month}/{year}")
}

fn is_canonical_day(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offset-less timestamps are read as UTC
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_day_month_year(raw: &str) -> Option<DateTime<Utc>> {
    // Ignore a trailing time-of-day such as "15/03/2024 10:30"
    let date_part = raw.split_whitespace().next()?;
    let parts: Vec<&str> = date_part.split('/').collect();
    if parts.len() != 3 {
        return None;
    }

    let day: u32 = parts[0].trim().parse().ok()?;
    let month: u32 = parts[1].trim().parse().ok()?;
    let year_text = parts[2].trim();
    let year: i32 = year_text.parse().ok()?;
    let year = if year_text.len() <= 2 { 2000 + year } else { year };

    NaiveDate::from_ymd_opt(year, month, day).and_then(at_midday)
}

fn parse_canonical_day(raw: &str) -> Option<NaiveDate> {
    if !is_canonical_day(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
