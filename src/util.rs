// ABOUTME: Utility functions for dates, months, and student-name matching
// ABOUTME: Provides the fuzzy name key and YYYY-MM month filtering

use crate::{Error, Result};
use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{300}'..='\u{36f}';

static DATE_RE: OnceLock<Regex> = OnceLock::new();

fn date_regex() -> &'static Regex {
    DATE_RE.get_or_init(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("valid date regex"))
}

/// Matching key for student names: diacritics stripped, lowercased, trimmed,
/// internal whitespace collapsed. Other scripts and punctuation are kept.
pub fn normalize_student_name(name: &str) -> String {
    name.nfd()
        .filter(|c| !COMBINING_MARKS.contains(c))
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn names_match(a: &str, b: &str) -> bool {
    normalize_student_name(a) == normalize_student_name(b)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDate {
    pub full: String,
    pub year: String,
    pub month: String,
    pub day: String,
}

/// First `YYYY-MM-DD` found anywhere in `text`.
pub fn extract_date_from_text(text: &str) -> Option<ExtractedDate> {
    let caps = date_regex().captures(text)?;
    Some(ExtractedDate {
        full: caps[0].to_string(),
        year: caps[1].to_string(),
        month: caps[2].to_string(),
        day: caps[3].to_string(),
    })
}

pub fn contains_date(text: &str) -> bool {
    date_regex().is_match(text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || Error::Config(format!("Invalid month '{}', expected YYYY-MM", s));

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        if !year.chars().chain(month.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;

        Ok(Month { year, month })
    }

    pub fn current() -> Self {
        let today = Local::now().date_naive();
        Month {
            year: today.year(),
            month: today.month(),
        }
    }

    pub fn contains(&self, date: &ExtractedDate) -> bool {
        date.full.starts_with(&self.to_string())
    }

    pub fn summary_file_name(&self) -> String {
        format!("summaries_{}.md", self)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
