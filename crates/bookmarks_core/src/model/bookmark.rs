//! Bookmark domain model.
//!
//! # Responsibility
//! - Define the draft (`NewBookmark`) and persisted (`Bookmark`) records.
//! - Enforce required-field and length rules before any storage access.
//!
//! # Invariants
//! - `Bookmark::id` is assigned by storage and never reused.
//! - `url` is unique across all persisted bookmarks.
//! - Length limits count characters, not bytes.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::model::keyword::normalize_keyword;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Storage-assigned bookmark identifier.
pub type BookmarkId = i64;

pub const URL_MAX_CHARS: usize = 255;
pub const TITLE_MAX_CHARS: usize = 100;
pub const AUTHOR_NAME_MAX_CHARS: usize = 100;

/// Validation failure raised before a bookmark touches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkValidationError {
    /// Required text field is empty or whitespace only.
    MissingField(&'static str),
    /// Text field exceeds its character limit.
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    /// Keyword label is empty after normalization.
    BlankKeyword(String),
}

impl Display for BookmarkValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "`{field}` is required"),
            Self::TooLong { field, max, actual } => {
                write!(f, "`{field}` exceeds {max} characters (got {actual})")
            }
            Self::BlankKeyword(raw) => write!(f, "invalid keyword: `{raw}`"),
        }
    }
}

impl Error for BookmarkValidationError {}

/// Bookmark draft as received from callers, before an id is assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookmark {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author_name: String,
    /// Epoch milliseconds. Defaults to insert time when absent.
    #[serde(default)]
    pub added_date: Option<i64>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Seconds, meaningful for video links only.
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Persisted bookmark with its current keyword set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: BookmarkId,
    pub url: String,
    pub title: String,
    pub author_name: String,
    /// Epoch milliseconds.
    pub added_date: i64,
    pub width: u32,
    pub height: u32,
    pub duration: u32,
    /// Normalized labels. Order carries no meaning.
    pub keywords: Vec<String>,
}

/// Link properties fetched from an embed provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMetadata {
    pub title: String,
    pub author_name: String,
    pub width: u32,
    pub height: u32,
    pub duration: u32,
}

impl NewBookmark {
    /// Creates a draft with required fields and zeroed link properties.
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        author_name: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            author_name: author_name.into(),
            ..Self::default()
        }
    }

    /// Builder-style keyword assignment.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Checks required fields, length limits and keyword labels.
    ///
    /// # Errors
    /// - `MissingField` when url/title/author_name is blank.
    /// - `TooLong` when a field exceeds its character limit.
    /// - `BlankKeyword` when a keyword normalizes to nothing.
    pub fn validate(&self) -> Result<(), BookmarkValidationError> {
        check_text("url", &self.url, URL_MAX_CHARS)?;
        check_text("title", &self.title, TITLE_MAX_CHARS)?;
        check_text("author_name", &self.author_name, AUTHOR_NAME_MAX_CHARS)?;
        for keyword in &self.keywords {
            if normalize_keyword(keyword).is_none() {
                return Err(BookmarkValidationError::BlankKeyword(keyword.clone()));
            }
        }
        Ok(())
    }

    /// Returns the added date, falling back to the current time.
    pub fn added_date_or_now(&self) -> i64 {
        self.added_date.unwrap_or_else(now_epoch_ms)
    }

    /// Fills empty properties from fetched link metadata.
    ///
    /// Values already present on the draft are kept.
    pub fn fill_from_link(&mut self, link: &LinkMetadata) {
        if self.title.is_empty() {
            self.title = link.title.clone();
        }
        if self.author_name.is_empty() {
            self.author_name = link.author_name.clone();
        }
        if self.width == 0 {
            self.width = link.width;
        }
        if self.height == 0 {
            self.height = link.height;
        }
        if self.duration == 0 {
            self.duration = link.duration;
        }
    }
}

fn check_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), BookmarkValidationError> {
    if value.trim().is_empty() {
        return Err(BookmarkValidationError::MissingField(field));
    }
    let actual = value.chars().count();
    if actual > max {
        return Err(BookmarkValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
