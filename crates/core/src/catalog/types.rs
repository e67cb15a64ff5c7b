//! Types for the ebook catalog (Calibre library).

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::converter::TargetFormat;

/// A book as reported by `calibredb list --for-machine`.
///
/// Only `id`, `title` and `formats` are used by the conversion pipeline; the
/// remaining metadata is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Calibre book id.
    pub id: i64,
    /// Book title.
    #[serde(default)]
    pub title: String,
    /// Paths of every file stored for this book, one per format.
    #[serde(default, deserialize_with = "null_as_default")]
    pub formats: Vec<PathBuf>,
    /// Authors, joined by Calibre with " & ".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    /// Path to the cover image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<PathBuf>,
    /// External identifiers (isbn, amazon, goodreads, ...).
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub identifiers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    /// RFC 3339 timestamp, e.g. `2015-04-06T17:14:50+00:00`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubdate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_index: Option<f64>,
    /// Size of the largest format in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,
    /// When the book was added to the library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

/// calibredb prints `null` for empty list fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl BookRecord {
    /// Creates a record with just the fields the pipeline needs.
    pub fn new(id: i64, title: impl Into<String>, formats: Vec<PathBuf>) -> Self {
        Self {
            id,
            title: title.into(),
            formats,
            ..Default::default()
        }
    }

    /// Whether any stored file already has the given format.
    pub fn has_format(&self, format: &TargetFormat) -> bool {
        self.formats.iter().any(|p| format.matches(p))
    }

    /// Parsed `last_modified` timestamp.
    pub fn last_modified_time(&self) -> Option<Result<DateTime<FixedOffset>, chrono::ParseError>> {
        self.last_modified.as_deref().map(DateTime::parse_from_rfc3339)
    }

    /// Parsed `pubdate` timestamp.
    pub fn pubdate_time(&self) -> Option<Result<DateTime<FixedOffset>, chrono::ParseError>> {
        self.pubdate.as_deref().map(DateTime::parse_from_rfc3339)
    }
}

/// Keeps only the books that have no file in `format`.
pub fn books_missing_format(books: Vec<BookRecord>, format: &TargetFormat) -> Vec<BookRecord> {
    books.into_iter().filter(|b| !b.has_format(format)).collect()
}

/// Orders books by title.
pub fn by_title(a: &BookRecord, b: &BookRecord) -> Ordering {
    a.title.cmp(&b.title)
}

/// Sorts books by title so they are processed (and logged) in a stable order.
pub fn sort_by_title(books: &mut [BookRecord]) {
    books.sort_by(by_title);
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// calibredb binary not found.
    #[error("calibredb not found at path: {path}")]
    NotFound { path: PathBuf },

    /// calibredb ran but reported failure.
    #[error("calibredb {command} failed: {reason}")]
    CommandFailed {
        command: String,
        reason: String,
        stderr: Option<String>,
    },

    /// calibredb output could not be parsed.
    #[error("Failed to parse catalog output: {0}")]
    Parse(#[from] serde_json::Error),

    /// I/O error while talking to calibredb.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// Creates a command failure error.
    pub fn command_failed(
        command: impl Into<String>,
        reason: impl Into<String>,
        stderr: Option<String>,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            reason: reason.into(),
            stderr,
        }
    }
}
