//! Bookmark use-case service.
//!
//! # Responsibility
//! - Provide page/get/create/keyword/delete entry points for request handlers.
//! - Check bookmark existence before keyword replacement and deletion.
//! - Retry the keyword-label race once; never retry url conflicts.
//!
//! # Invariants
//! - Page numbers below 1 are normalized to 1 before a pager is built.
//! - `delete` returns the bookmark as it was before removal.

use crate::model::bookmark::{Bookmark, BookmarkId, NewBookmark};
use crate::model::pager::{normalize_page, Pager};
use crate::repo::bookmark_repo::{BookmarkFilter, BookmarkRepository, RepoError, RepoResult};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for bookmark use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Page size must be at least 1.
    InvalidPageSize(u32),
    /// Target bookmark does not exist.
    BookmarkNotFound(BookmarkId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPageSize(size) => write!(f, "invalid page size: {size}"),
            Self::BookmarkNotFound(id) => write!(f, "bookmark not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent bookmark state: {details}")
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::BookmarkNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// One rendered page of bookmarks plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkPage {
    pub items: Vec<Bookmark>,
    /// Full match count, independent of the window.
    pub total: usize,
    /// Effective 1-based page after normalization.
    pub page: u32,
    /// Zero when there are no bookmarks.
    pub last_page: u32,
    /// `1..=last_page`.
    pub pages: Vec<u32>,
}

/// Runs `op`, running it a second time only when it failed on the keyword race.
pub fn retry_keyword_conflict<T>(mut op: impl FnMut() -> RepoResult<T>) -> RepoResult<T> {
    match op() {
        Err(err) if err.is_retryable() => op(),
        other => other,
    }
}

/// Bookmark service facade over repository implementations.
pub struct BookmarkService<R: BookmarkRepository> {
    repo: R,
}

impl<R: BookmarkRepository> BookmarkService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Lists one page of bookmarks. `page` below 1 is treated as page 1.
    pub fn list_page(&self, page: i64, page_size: u32) -> Result<BookmarkPage, ServiceError> {
        let page = normalize_page(page);
        let pager = Pager::new(page, page_size).ok_or(ServiceError::InvalidPageSize(page_size))?;
        let (items, total) = self.repo.list(&BookmarkFilter {
            id: None,
            pager: Some(pager),
        })?;

        Ok(BookmarkPage {
            items,
            total,
            page,
            last_page: pager.page_count(total),
            pages: pager.page_numbers(total),
        })
    }

    /// Lists every bookmark without paging.
    pub fn list_all(&self) -> RepoResult<Vec<Bookmark>> {
        let (items, _) = self.repo.list(&BookmarkFilter::default())?;
        Ok(items)
    }

    pub fn get(&self, id: BookmarkId) -> RepoResult<Option<Bookmark>> {
        self.repo.by_id(id)
    }

    /// Persists a new bookmark.
    pub fn create(&mut self, draft: &NewBookmark) -> Result<Bookmark, ServiceError> {
        let repo = &mut self.repo;
        Ok(retry_keyword_conflict(|| repo.insert(draft))?)
    }

    /// Replaces the keyword set of an existing bookmark and returns it.
    pub fn set_keywords(
        &mut self,
        id: BookmarkId,
        keywords: Vec<String>,
    ) -> Result<Bookmark, ServiceError> {
        if self.repo.by_id(id)?.is_none() {
            return Err(ServiceError::BookmarkNotFound(id));
        }

        let repo = &mut self.repo;
        retry_keyword_conflict(|| repo.update_keywords(id, &keywords))?;

        self.repo
            .by_id(id)?
            .ok_or(ServiceError::InconsistentState(
                "bookmark missing after keyword replacement",
            ))
    }

    /// Deletes an existing bookmark and returns its last persisted state.
    pub fn delete(&mut self, id: BookmarkId) -> Result<Bookmark, ServiceError> {
        let existing = self
            .repo
            .by_id(id)?
            .ok_or(ServiceError::BookmarkNotFound(id))?;
        self.repo.delete(id)?;
        Ok(existing)
    }

    /// Lists every keyword label known by storage.
    pub fn list_keywords(&self) -> RepoResult<Vec<String>> {
        self.repo.list_keywords()
    }
}

#[cfg(test)]
mod tests {
    use super::retry_keyword_conflict;
    use crate::repo::bookmark_repo::{ConflictKind, RepoError};

    #[test]
    fn keyword_conflict_is_retried_exactly_once() {
        let mut calls = 0;
        let result = retry_keyword_conflict(|| {
            calls += 1;
            if calls == 1 {
                Err(RepoError::Conflict(ConflictKind::KeywordLabel("new".into())))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 2);
    }

    #[test]
    fn second_keyword_conflict_is_surfaced() {
        let mut calls = 0;
        let result: Result<(), RepoError> = retry_keyword_conflict(|| {
            calls += 1;
            Err(RepoError::Conflict(ConflictKind::KeywordLabel("new".into())))
        });
        assert!(matches!(result, Err(RepoError::Conflict(_))));
        assert_eq!(calls, 2);
    }

    #[test]
    fn url_conflict_is_not_retried() {
        let mut calls = 0;
        let result: Result<(), RepoError> = retry_keyword_conflict(|| {
            calls += 1;
            Err(RepoError::Conflict(ConflictKind::DuplicateUrl("u".into())))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
