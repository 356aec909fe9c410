//! Domain model for bookmarks, keywords and list paging.
//!
//! # Responsibility
//! - Define the records exchanged between callers and the persistence engine.
//! - Keep validation and normalization rules next to the data they guard.
//!
//! # Invariants
//! - Bookmarks are validated before any storage access.
//! - Keyword labels are normalized before they are resolved to ids.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod bookmark;
pub mod keyword;
pub mod pager;
