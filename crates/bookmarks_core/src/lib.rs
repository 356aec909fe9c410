//! Persistence core for bookmarks and their keywords.
//! This crate is the single source of truth for storage invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, EventLogger};
pub use model::bookmark::{Bookmark, BookmarkId, BookmarkValidationError, LinkMetadata, NewBookmark};
pub use model::keyword::KeywordId;
pub use model::pager::{normalize_page, Pager};
pub use repo::bookmark_repo::{
    BookmarkFilter, BookmarkRepository, ConflictKind, RepoError, RepoResult,
    SqliteBookmarkRepository,
};
pub use repo::keyword_store::KeywordStore;
pub use service::bookmark_service::{BookmarkPage, BookmarkService, ServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
