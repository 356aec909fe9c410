//! SQLite storage bootstrap, schema migrations and the transactional handle.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the bookmarks core.
//! - Apply schema migrations in deterministic order.
//! - Expose the `StorageHandle` capability repositories are generic over.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.
//! - Write transactions are scoped to a single repository call.
//!
//! # See also
//! - docs/architecture/data-model.md

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_db_with_timeout, DEFAULT_BUSY_TIMEOUT};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Transactional relational handle the repository runs against.
///
/// Reads go through `conn()`. Every mutation opens its own transaction with
/// `begin()`; dropping the transaction without commit rolls it back.
pub trait StorageHandle {
    /// Live connection for read-only queries.
    fn conn(&self) -> &Connection;
    /// Opens one write transaction.
    fn begin(&mut self) -> DbResult<Transaction<'_>>;
}

impl StorageHandle for Connection {
    fn conn(&self) -> &Connection {
        self
    }

    fn begin(&mut self) -> DbResult<Transaction<'_>> {
        // IMMEDIATE takes the write lock up front so concurrent writers queue
        // on busy_timeout instead of failing at commit.
        Ok(self.transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

impl<H: StorageHandle + ?Sized> StorageHandle for &mut H {
    fn conn(&self) -> &Connection {
        (**self).conn()
    }

    fn begin(&mut self) -> DbResult<Transaction<'_>> {
        (**self).begin()
    }
}
