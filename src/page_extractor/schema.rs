//! Shapes returned by the page scripts and their conversion into store fields

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::store::ExtensionFields;

/// Hrefs matched by one candidate selector
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorHits {
    pub selector: String,
    #[serde(default)]
    pub hrefs: Vec<String>,
}

/// Detail page text exactly as the page script read it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawExtensionDetail {
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub downloads: String,
    pub installs: String,
    pub last_updated: String,
    pub rating: String,
    pub review_count: String,
    pub repository: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("Invalid decimal regex"));

impl RawExtensionDetail {
    /// Parse counts, rating and date; blank text becomes `None`.
    ///
    /// Zero counts survive: `"0 installs"` is `Some(0)`.
    #[must_use]
    pub fn into_fields(self, url: &str) -> ExtensionFields {
        ExtensionFields {
            name: Some(self.name),
            description: Some(self.description),
            version: Some(self.version),
            author: Some(self.author),
            url: Some(url.to_string()),
            repository: Some(self.repository),
            downloads: parse_count(&self.downloads),
            installs: parse_count(&self.installs),
            review_count: parse_count(&self.review_count),
            rating: parse_rating(&self.rating),
            categories: Some(self.categories),
            tags: Some(self.tags),
            last_updated: parse_date(&self.last_updated),
        }
        .normalized()
    }
}

/// Digits only: `"1,234,567 installs"` → 1234567. No digits → `None`.
#[must_use]
pub fn parse_count(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// First decimal number in the text, comma decimal separators accepted
#[must_use]
pub fn parse_rating(text: &str) -> Option<f64> {
    let found = DECIMAL.find(text)?;
    found
        .as_str()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
}

const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y, %I:%M:%S %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y, %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"];

/// Best-effort date parse. Unparseable text is not an error, just `None`.
#[must_use]
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(text, format) {
            return parsed.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    log::debug!("Unparseable date text: {text:?}");
    None
}
