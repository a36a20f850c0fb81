//! Serial number template rendering.
//!
//! Templates are plain strings with placeholders:
//!
//! - `{year}` four digit year
//! - `{month:2}` / `{day:2}` zero-padded to the given width
//! - `{counter:N}` running counter zero-padded to N digits
//!
//! Rendering is pure; counter persistence lives in the serial number
//! service. A placeholder the engine does not recognize is left verbatim so
//! a typo in a stored template produces a visible artifact instead of a
//! silent drop.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(year|month|day|counter)(?::(\d+))?\}").expect("valid regex"));

/// Renders `template` for a given date and counter value.
pub fn render_template(template: &str, date: NaiveDate, counter: i64) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let width: usize = caps
                .get(2)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            match &caps[1] {
                "year" => pad(date.year() as i64, width.max(4)),
                "month" => pad(date.month() as i64, width),
                "day" => pad(date.day() as i64, width),
                "counter" => pad(counter, width),
                _ => unreachable!("pattern restricts placeholder names"),
            }
        })
        .into_owned()
}

/// Fallback numbering when neither global cross-numbering nor a category
/// template applies: `{year}-{digits of the order number}-{sequence}`.
pub fn fallback_serial(order_number: &str, date: NaiveDate, sequence: u32) -> String {
    let digits: String = order_number.chars().filter(char::is_ascii_digit).collect();
    format!("{}-{}-{:03}", date.year(), digits, sequence)
}

fn pad(value: i64, width: usize) -> String {
    format!("{:0width$}", value, width = width)
}
