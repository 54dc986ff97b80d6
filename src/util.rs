// Utility helpers for date parsing, percentages and console formatting.
//
// Display dates arrive in inconsistent shapes ("Full inspection - 03/04/2024",
// " 3/4/2024 ", free text), so everything that reads one goes through
// `DateParser` and the rest of the code can assume a clean `NaiveDate` or a
// verbatim fallback key.
use crate::config::DEFAULT_DATE_FORMAT;
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Parses the day/month/year part of a report's display date.
///
/// Constructed explicitly and passed to whoever needs it; there is no shared
/// formatter state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParser {
    format: String,
}

impl Default for DateParser {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

impl DateParser {
    pub fn new(format: impl Into<String>) -> Self {
        Self { format: format.into() }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// The trailing component after the last `" - "`, trimmed.
    pub fn normalize<'a>(&self, raw: &'a str) -> &'a str {
        match raw.rfind(" - ") {
            Some(idx) => raw[idx + 3..].trim(),
            None => raw.trim(),
        }
    }

    pub fn parse(&self, raw: &str) -> Option<NaiveDate> {
        let s = self.normalize(raw);
        if s.is_empty() {
            return None;
        }
        NaiveDate::parse_from_str(s, &self.format).ok()
    }

    /// Grouping key for a display date: the parsed date re-rendered in the
    /// canonical pattern, or the raw string verbatim when it does not parse.
    pub fn group_key(&self, raw: &str) -> (String, Option<NaiveDate>) {
        match self.parse(raw) {
            Some(d) => (d.format(&self.format).to_string(), Some(d)),
            None => (raw.to_string(), None),
        }
    }
}

/// `count / total` as a percentage floored to one decimal place.
///
/// Integer arithmetic keeps the floor exact: `percentage_of(1, 3)` is `33.3`
/// and `percentage_of(3, 5)` is `60.0`. A zero total yields `0.0`.
pub fn percentage_of(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let tenths = (count as u128 * 1000) / total as u128;
    tenths as f64 / 10.0
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234.5`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
