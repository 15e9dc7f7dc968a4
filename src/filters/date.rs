//! `date` filter with Luxon-style format tokens
//!
//! ```ignore
//! {{ page.date | date(format="yyyy-MM-dd") }}           -> "2024-03-05"
//! {{ page.date | date(format="LLLL d, yyyy") }}         -> "March 5, 2024"
//! {{ page.date | date(format="HH:mm", zone="Europe/Oslo") }}
//! ```

use chrono::{DateTime, Datelike, Offset, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use std::collections::HashMap;
use tera::Value;

use super::{string_arg, Filter, FilterError, FilterResult};
use crate::content::parse_date_string;

const NAME: &str = "date";

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(
        r"(?s)'(?:[^']|'')*'|y+|M+|L+|d+|E+|H+|h+|m+|s+|S+|a|o+|Z+|."
    )
    .unwrap();
}

/// The `date` filter
pub fn date_filter() -> Filter {
    Filter::new(NAME, apply)
}

fn apply(value: &Value, args: &HashMap<String, Value>) -> FilterResult {
    let format = string_arg(NAME, args, "format")?;
    let date = to_datetime(value)?;

    let formatted = match args.get("zone") {
        None => format_luxon(&date, &format),
        Some(Value::String(zone)) => {
            let tz: Tz = zone.parse().map_err(|_| FilterError::InvalidArg {
                filter: NAME.to_string(),
                arg: "zone".to_string(),
                message: format!("unknown time zone {:?}", zone),
            })?;
            format_luxon(&date.with_timezone(&tz), &format)
        }
        Some(other) => {
            return Err(FilterError::InvalidArg {
                filter: NAME.to_string(),
                arg: "zone".to_string(),
                message: format!("expected a string, got {}", other),
            })
        }
    };

    Ok(json!(formatted))
}

/// Interpret a template value as a date.
///
/// Strings go through the front-matter date parser; integers are
/// milliseconds since the Unix epoch. Anything else is rejected.
pub fn to_datetime(value: &Value) -> Result<DateTime<Utc>, FilterError> {
    let parsed = match value {
        Value::String(s) => parse_date_string(s),
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    };
    parsed.ok_or_else(|| FilterError::NotADate {
        filter: NAME.to_string(),
        value: value.to_string(),
    })
}

/// Format a date with Luxon `toFormat` tokens.
///
/// Unknown letters are copied through; quote literal text with `'...'`.
pub fn format_luxon<T: TimeZone>(date: &DateTime<T>, format: &str) -> String
where
    T::Offset: std::fmt::Display,
{
    let mut out = String::with_capacity(format.len() + 8);

    for token in TOKEN_RE.find_iter(format).map(|m| m.as_str()) {
        if token.starts_with('\'') && token.len() >= 2 && token.ends_with('\'') {
            if token == "''" {
                out.push('\'');
            } else {
                out.push_str(&token[1..token.len() - 1].replace("''", "'"));
            }
            continue;
        }

        let Some(first) = token.chars().next() else {
            continue;
        };
        let len = token.len();

        match (first, len) {
            ('y', 1) => out.push_str(&date.year().to_string()),
            ('y', 2) => out.push_str(&format!("{:02}", date.year().rem_euclid(100))),
            ('y', _) => out.push_str(&format!("{:04}", date.year())),
            ('M' | 'L', 1) => out.push_str(&date.month().to_string()),
            ('M' | 'L', 2) => out.push_str(&format!("{:02}", date.month())),
            ('M' | 'L', 3) => out.push_str(&date.format("%b").to_string()),
            ('M' | 'L', _) => out.push_str(&date.format("%B").to_string()),
            ('d', 1) => out.push_str(&date.day().to_string()),
            ('d', _) => out.push_str(&format!("{:02}", date.day())),
            ('E', 1 | 2) => out.push_str(&date.weekday().number_from_monday().to_string()),
            ('E', 3) => out.push_str(&date.format("%a").to_string()),
            ('E', _) => out.push_str(&date.format("%A").to_string()),
            ('H', 1) => out.push_str(&date.hour().to_string()),
            ('H', _) => out.push_str(&format!("{:02}", date.hour())),
            ('h', 1) => out.push_str(&date.hour12().1.to_string()),
            ('h', _) => out.push_str(&format!("{:02}", date.hour12().1)),
            ('m', 1) => out.push_str(&date.minute().to_string()),
            ('m', _) => out.push_str(&format!("{:02}", date.minute())),
            ('s', 1) => out.push_str(&date.second().to_string()),
            ('s', _) => out.push_str(&format!("{:02}", date.second())),
            ('S', 1) => out.push_str(&millis(date).to_string()),
            ('S', _) => out.push_str(&format!("{:03}", millis(date))),
            ('a', _) => out.push_str(if date.hour12().0 { "PM" } else { "AM" }),
            ('o', 3) => out.push_str(&format!("{:03}", date.ordinal())),
            ('o', _) => out.push_str(&date.ordinal().to_string()),
            ('Z', 1) => out.push_str(&offset_short(date)),
            ('Z', 2) => out.push_str(&offset_long(date, true)),
            ('Z', _) => out.push_str(&offset_long(date, false)),
            _ => out.push_str(token),
        }
    }

    out
}

fn millis<T: TimeZone>(date: &DateTime<T>) -> u32 {
    // Leap seconds report >= 1000ms
    (date.nanosecond() / 1_000_000).min(999)
}

fn offset_minutes<T: TimeZone>(date: &DateTime<T>) -> i32 {
    date.offset().fix().local_minus_utc() / 60
}

fn offset_short<T: TimeZone>(date: &DateTime<T>) -> String {
    let minutes = offset_minutes(date);
    let sign = if minutes < 0 { '-' } else { '+' };
    let (h, m) = (minutes.abs() / 60, minutes.abs() % 60);
    if m == 0 {
        format!("{}{}", sign, h)
    } else {
        format!("{}{}:{:02}", sign, h, m)
    }
}

fn offset_long<T: TimeZone>(date: &DateTime<T>, colon: bool) -> String {
    let minutes = offset_minutes(date);
    let sign = if minutes < 0 { '-' } else { '+' };
    let (h, m) = (minutes.abs() / 60, minutes.abs() % 60);
    if colon {
        format!("{}{:02}:{:02}", sign, h, m)
    } else {
        format!("{}{:02}{:02}", sign, h, m)
    }
}
