//! Bookmark repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Own bookmark CRUD over the `bookmarks` table.
//! - Compose `KeywordStore` for keyword reconciliation and `Pager` for list windows.
//!
//! # Invariants
//! - Write paths call `NewBookmark::validate()` before a transaction is opened.
//! - Every mutation runs in exactly one transaction and commits or rolls back
//!   as a unit; a rollback failure never replaces the original error.
//! - List reads every matching row; the pager only decides which rows are
//!   materialized, so the returned total is the full match count.
//! - A bookmark's keyword set is exactly its `bookmark_keywords` rows.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::db::{DbError, StorageHandle};
use crate::logging::EventLogger;
use crate::model::bookmark::{Bookmark, BookmarkId, BookmarkValidationError, NewBookmark};
use crate::model::keyword::{normalize_keyword, normalized_keyword_set};
use crate::model::pager::Pager;
use crate::repo::keyword_store::KeywordStore;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, Row, Transaction};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const BOOKMARK_SELECT_SQL: &str = "SELECT
    id,
    url,
    title,
    author_name,
    added_date,
    width,
    height,
    duration
FROM bookmarks";

pub type RepoResult<T> = Result<T, RepoError>;

/// Uniqueness conflicts reported separately from generic storage failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// Another bookmark already uses this url. Never retry.
    DuplicateUrl(String),
    /// A concurrent writer created this keyword label first. Retry once.
    KeywordLabel(String),
}

/// Repository error for bookmark persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(BookmarkValidationError),
    Conflict(ConflictKind),
    NotFound(BookmarkId),
    Db(DbError),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// True only for the keyword-label race, which callers may retry once.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(ConflictKind::KeywordLabel(_)))
    }

    /// Stable code for log lines; never carries user data.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::Conflict(ConflictKind::DuplicateUrl(_)) => "duplicate_url",
            Self::Conflict(ConflictKind::KeywordLabel(_)) => "keyword_conflict",
            Self::NotFound(_) => "not_found",
            Self::Db(_) => "db_error",
            Self::InvalidData(_) => "invalid_data",
            Self::MissingRequiredTable(_) | Self::MissingRequiredColumn { .. } => "schema_not_ready",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict(ConflictKind::DuplicateUrl(url)) => {
                write!(f, "bookmark already exists for url `{url}`")
            }
            Self::Conflict(ConflictKind::KeywordLabel(label)) => {
                write!(f, "keyword `{label}` was created concurrently")
            }
            Self::NotFound(id) => write!(f, "bookmark not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted bookmark data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BookmarkValidationError> for RepoError {
    fn from(value: BookmarkValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Returns whether `err` is a UNIQUE violation on `table.column`.
pub(crate) fn is_unique_violation_on(err: &rusqlite::Error, qualified_column: &str) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, Some(message))
            if code.code == ErrorCode::ConstraintViolation =>
        {
            message
                .strip_prefix("UNIQUE constraint failed: ")
                .is_some_and(|columns| columns.split(", ").any(|c| c == qualified_column))
        }
        _ => false,
    }
}

/// Selection options for [`BookmarkRepository::list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookmarkFilter {
    /// Optional exact id match.
    pub id: Option<BookmarkId>,
    /// Page window; `None` behaves like `Pager::All`.
    pub pager: Option<Pager>,
}

/// Repository interface consumed by services and request handlers.
pub trait BookmarkRepository {
    /// Returns visible bookmarks and the total number of matching rows.
    fn list(&self, filter: &BookmarkFilter) -> RepoResult<(Vec<Bookmark>, usize)>;
    /// Gets one bookmark by id. Missing ids are `Ok(None)`.
    fn by_id(&self, id: BookmarkId) -> RepoResult<Option<Bookmark>>;
    /// Validates and persists a bookmark with its keywords.
    fn insert(&mut self, bookmark: &NewBookmark) -> RepoResult<Bookmark>;
    /// Replaces the full keyword set of one bookmark.
    fn update_keywords(&mut self, id: BookmarkId, keywords: &[String]) -> RepoResult<()>;
    /// Deletes one bookmark and its associations. Missing ids are a no-op.
    fn delete(&mut self, id: BookmarkId) -> RepoResult<()>;
    /// Returns all known keyword labels sorted by name.
    fn list_keywords(&self) -> RepoResult<Vec<String>>;
}

/// SQLite-backed bookmark repository, generic over the storage handle.
pub struct SqliteBookmarkRepository<H: StorageHandle> {
    handle: H,
    keywords: KeywordStore,
    logger: EventLogger,
}

impl<H: StorageHandle> SqliteBookmarkRepository<H> {
    /// Constructs a repository from a migrated/ready handle.
    pub fn try_new(handle: H, logger: EventLogger) -> RepoResult<Self> {
        ensure_bookmark_schema_ready(handle.conn())?;
        Ok(Self {
            handle,
            keywords: KeywordStore::new(logger),
            logger,
        })
    }

    /// Borrows the wrapped handle.
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Runs `work` inside one write transaction, committing on success.
    fn in_transaction<T>(
        &mut self,
        event: &'static str,
        work: impl FnOnce(&Transaction<'_>, &KeywordStore) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let started_at = Instant::now();
        let tx = self.handle.begin()?;

        match work(&tx, &self.keywords) {
            Ok(value) => {
                if let Err(err) = tx.commit() {
                    self.logger.error(format_args!(
                        "event={event} module=repo status=error duration_ms={} error_code=commit_failed error={err}",
                        started_at.elapsed().as_millis()
                    ));
                    return Err(err.into());
                }
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    self.logger.warn(format_args!(
                        "event={event} module=repo status=error error_code=rollback_failed error={rollback_err}"
                    ));
                }
                self.logger.warn(format_args!(
                    "event={event} module=repo status=rolled_back duration_ms={} error_code={}",
                    started_at.elapsed().as_millis(),
                    err.code()
                ));
                Err(err)
            }
        }
    }
}

impl<H: StorageHandle> BookmarkRepository for SqliteBookmarkRepository<H> {
    fn list(&self, filter: &BookmarkFilter) -> RepoResult<(Vec<Bookmark>, usize)> {
        let conn = self.handle.conn();
        let pager = filter.pager.unwrap_or_default();
        let mut sql = String::from(BOOKMARK_SELECT_SQL);
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(id) = filter.id {
            sql.push_str(" WHERE id = ?");
            bind_values.push(Value::Integer(id));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut bookmarks = Vec::new();
        let mut matched = 0usize;
        while let Some(row) = rows.next()? {
            let index = matched;
            matched += 1;
            if !pager.is_visible(index) {
                continue;
            }
            let mut bookmark = parse_bookmark_row(row)?;
            bookmark.keywords = self.keywords.load(conn, bookmark.id)?;
            bookmarks.push(bookmark);
        }

        Ok((bookmarks, matched))
    }

    fn by_id(&self, id: BookmarkId) -> RepoResult<Option<Bookmark>> {
        let filter = BookmarkFilter {
            id: Some(id),
            pager: None,
        };
        let (bookmarks, _) = self.list(&filter)?;
        Ok(bookmarks.into_iter().next())
    }

    fn insert(&mut self, bookmark: &NewBookmark) -> RepoResult<Bookmark> {
        if let Err(err) = bookmark.validate() {
            self.logger.info(format_args!(
                "event=bookmark_insert module=repo status=invalid error_code=validation_failed"
            ));
            return Err(err.into());
        }

        let added_date = bookmark.added_date_or_now();
        let labels = normalized_keyword_set(&bookmark.keywords);

        let persisted = self.in_transaction("bookmark_insert", |tx, keywords| {
            let id = insert_bookmark_row(tx, bookmark, added_date)?;
            let resolved = keywords.assign(tx, id, &labels)?;
            Ok(Bookmark {
                id,
                url: bookmark.url.clone(),
                title: bookmark.title.clone(),
                author_name: bookmark.author_name.clone(),
                added_date,
                width: bookmark.width,
                height: bookmark.height,
                duration: bookmark.duration,
                keywords: resolved.into_keys().collect(),
            })
        })?;

        self.logger.info(format_args!(
            "event=bookmark_insert module=repo status=ok id={} keywords={}",
            persisted.id,
            persisted.keywords.len()
        ));
        Ok(persisted)
    }

    fn update_keywords(&mut self, id: BookmarkId, keywords: &[String]) -> RepoResult<()> {
        for keyword in keywords {
            if normalize_keyword(keyword).is_none() {
                return Err(BookmarkValidationError::BlankKeyword(keyword.clone()).into());
            }
        }
        let labels = normalized_keyword_set(keywords);

        self.in_transaction("bookmark_update_keywords", |tx, store| {
            if !bookmark_exists_in_tx(tx, id)? {
                return Err(RepoError::NotFound(id));
            }
            store.assign(tx, id, &labels)?;
            Ok(())
        })?;

        self.logger.info(format_args!(
            "event=bookmark_update_keywords module=repo status=ok id={} keywords={}",
            id,
            labels.len()
        ));
        Ok(())
    }

    fn delete(&mut self, id: BookmarkId) -> RepoResult<()> {
        let removed = self.in_transaction("bookmark_delete", |tx, store| {
            store.delete_associations(tx, id)?;
            let removed = tx.execute("DELETE FROM bookmarks WHERE id = ?1;", params![id])?;
            Ok(removed)
        })?;

        self.logger.info(format_args!(
            "event=bookmark_delete module=repo status=ok id={id} removed={removed}"
        ));
        Ok(())
    }

    fn list_keywords(&self) -> RepoResult<Vec<String>> {
        self.keywords.list_all(self.handle.conn())
    }
}

fn insert_bookmark_row(
    tx: &Transaction<'_>,
    bookmark: &NewBookmark,
    added_date: i64,
) -> RepoResult<BookmarkId> {
    let inserted = tx.execute(
        "INSERT INTO bookmarks (
            url,
            title,
            author_name,
            added_date,
            width,
            height,
            duration
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            bookmark.url.as_str(),
            bookmark.title.as_str(),
            bookmark.author_name.as_str(),
            added_date,
            bookmark.width,
            bookmark.height,
            bookmark.duration,
        ],
    );

    match inserted {
        Ok(_) => Ok(tx.last_insert_rowid()),
        Err(err) if is_unique_violation_on(&err, "bookmarks.url") => Err(RepoError::Conflict(
            ConflictKind::DuplicateUrl(bookmark.url.clone()),
        )),
        Err(err) => Err(err.into()),
    }
}

fn bookmark_exists_in_tx(tx: &Transaction<'_>, id: BookmarkId) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM bookmarks WHERE id = ?1);",
        params![id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_bookmark_row(row: &Row<'_>) -> RepoResult<Bookmark> {
    let id: BookmarkId = row.get("id")?;
    let url: String = row.get("url")?;
    if url.is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty url in bookmarks.url for id {id}"
        )));
    }

    Ok(Bookmark {
        id,
        url,
        title: row.get("title")?,
        author_name: row.get("author_name")?,
        added_date: row.get("added_date")?,
        width: row.get("width")?,
        height: row.get("height")?,
        duration: row.get("duration")?,
        keywords: Vec::new(),
    })
}

fn ensure_bookmark_schema_ready(conn: &Connection) -> RepoResult<()> {
    const REQUIRED: &[(&str, &[&str])] = &[
        (
            "bookmarks",
            &[
                "id",
                "url",
                "title",
                "author_name",
                "added_date",
                "width",
                "height",
                "duration",
            ],
        ),
        ("keywords", &["id", "name"]),
        ("bookmark_keywords", &["bookmark_id", "keyword_id"]),
    ];

    for &(table, columns) in REQUIRED {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{is_unique_violation_on, ConflictKind, RepoError};
    use rusqlite::Connection;

    #[test]
    fn unique_violation_is_matched_by_qualified_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE keywords (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);
             INSERT INTO keywords (name) VALUES ('rust');",
        )
        .unwrap();

        let err = conn
            .execute("INSERT INTO keywords (name) VALUES ('rust');", [])
            .unwrap_err();
        assert!(is_unique_violation_on(&err, "keywords.name"));
        assert!(!is_unique_violation_on(&err, "bookmarks.url"));
    }

    #[test]
    fn only_keyword_conflicts_are_retryable() {
        assert!(RepoError::Conflict(ConflictKind::KeywordLabel("x".into())).is_retryable());
        assert!(!RepoError::Conflict(ConflictKind::DuplicateUrl("u".into())).is_retryable());
        assert!(!RepoError::NotFound(1).is_retryable());
    }
}
