//! Keyword resolution and bookmark/keyword association storage.
//!
//! # Responsibility
//! - Map normalized labels to keyword ids, creating missing rows lazily.
//! - Replace a bookmark's association rows as a unit.
//!
//! # Invariants
//! - Mutating calls take a `Transaction`, so partial state never escapes the
//!   caller's transaction scope.
//! - One label resolves to exactly one id per call; existing labels are never
//!   inserted twice.
//! - Keyword rows are never deleted, even when no bookmark references them.
//! - Concurrent creators of the same new label are arbitrated by the
//!   `keywords.name` unique constraint; the loser gets
//!   `ConflictKind::KeywordLabel`, which is retryable.

use crate::logging::EventLogger;
use crate::model::bookmark::BookmarkId;
use crate::model::keyword::KeywordId;
use crate::repo::bookmark_repo::{is_unique_violation_on, ConflictKind, RepoError, RepoResult};
use rusqlite::{params, params_from_iter, Connection, Transaction};
use std::collections::{BTreeMap, BTreeSet};

/// Labels bound per `IN (...)` lookup, below SQLite's host parameter limit.
pub const LOOKUP_CHUNK_SIZE: usize = 500;

/// Label -> id mapping returned by [`KeywordStore::resolve`].
pub type KeywordMap = BTreeMap<String, KeywordId>;

/// Keyword table and association table access.
#[derive(Debug, Clone, Copy)]
pub struct KeywordStore {
    logger: EventLogger,
}

impl KeywordStore {
    pub fn new(logger: EventLogger) -> Self {
        Self { logger }
    }

    /// Resolves every label to its keyword id, creating rows for unknown labels.
    ///
    /// Existing labels are fetched in batches of [`LOOKUP_CHUNK_SIZE`]; unknown
    /// ones are inserted one at a time because each generated id is needed.
    pub fn resolve(&self, tx: &Transaction<'_>, labels: &BTreeSet<String>) -> RepoResult<KeywordMap> {
        let mut resolved = KeywordMap::new();
        if labels.is_empty() {
            return Ok(resolved);
        }

        let wanted: Vec<&String> = labels.iter().collect();
        for chunk in wanted.chunks(LOOKUP_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!("SELECT id, name FROM keywords WHERE name IN ({placeholders});");
            let mut stmt = tx.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                let id: KeywordId = row.get("id")?;
                let name: String = row.get("name")?;
                resolved.insert(name, id);
            }
        }

        let mut created = 0usize;
        for label in labels {
            if resolved.contains_key(label) {
                continue;
            }
            let id = create_keyword(tx, label)?;
            resolved.insert(label.clone(), id);
            created += 1;
        }

        self.logger.debug(format_args!(
            "event=keyword_resolve module=keywords status=ok requested={} created={}",
            labels.len(),
            created
        ));
        Ok(resolved)
    }

    /// Deletes every association of `bookmark_id`, then links it to `keyword_ids`.
    ///
    /// Full replace: association identity is not preserved across calls.
    /// Duplicate ids in the input collapse to one row.
    pub fn replace_associations(
        &self,
        tx: &Transaction<'_>,
        bookmark_id: BookmarkId,
        keyword_ids: &[KeywordId],
    ) -> RepoResult<()> {
        let removed = self.delete_associations(tx, bookmark_id)?;

        let unique: BTreeSet<KeywordId> = keyword_ids.iter().copied().collect();
        let mut stmt = tx.prepare_cached(
            "INSERT INTO bookmark_keywords (bookmark_id, keyword_id) VALUES (?1, ?2);",
        )?;
        for keyword_id in &unique {
            stmt.execute(params![bookmark_id, keyword_id])?;
        }

        self.logger.debug(format_args!(
            "event=keyword_associate module=keywords status=ok bookmark_id={} removed={} inserted={}",
            bookmark_id,
            removed,
            unique.len()
        ));
        Ok(())
    }

    /// Resolves `labels` and makes them the complete keyword set of `bookmark_id`.
    pub fn assign(
        &self,
        tx: &Transaction<'_>,
        bookmark_id: BookmarkId,
        labels: &BTreeSet<String>,
    ) -> RepoResult<KeywordMap> {
        let resolved = self.resolve(tx, labels)?;
        let ids: Vec<KeywordId> = resolved.values().copied().collect();
        self.replace_associations(tx, bookmark_id, &ids)?;
        Ok(resolved)
    }

    /// Removes all association rows of one bookmark and returns how many went away.
    pub fn delete_associations(&self, tx: &Transaction<'_>, bookmark_id: BookmarkId) -> RepoResult<usize> {
        let removed = tx.execute(
            "DELETE FROM bookmark_keywords WHERE bookmark_id = ?1;",
            params![bookmark_id],
        )?;
        Ok(removed)
    }

    /// Returns the labels currently linked to one bookmark, sorted by name.
    pub fn load(&self, conn: &Connection, bookmark_id: BookmarkId) -> RepoResult<Vec<String>> {
        let mut stmt = conn.prepare_cached(
            "SELECT kw.name
             FROM bookmark_keywords bkw
             INNER JOIN keywords kw ON kw.id = bkw.keyword_id
             WHERE bkw.bookmark_id = ?1
             ORDER BY kw.name ASC;",
        )?;
        let mut rows = stmt.query(params![bookmark_id])?;
        let mut keywords = Vec::new();
        while let Some(row) = rows.next()? {
            keywords.push(row.get(0)?);
        }
        Ok(keywords)
    }

    /// Returns every known label, including ones no bookmark uses anymore.
    pub fn list_all(&self, conn: &Connection) -> RepoResult<Vec<String>> {
        let mut stmt = conn.prepare("SELECT name FROM keywords ORDER BY name ASC;")?;
        let mut rows = stmt.query([])?;
        let mut keywords = Vec::new();
        while let Some(row) = rows.next()? {
            keywords.push(row.get(0)?);
        }
        Ok(keywords)
    }
}

fn create_keyword(tx: &Transaction<'_>, label: &str) -> RepoResult<KeywordId> {
    let mut stmt = tx.prepare_cached("INSERT INTO keywords (name) VALUES (?1);")?;
    match stmt.insert(params![label]) {
        Ok(id) => Ok(id),
        Err(err) if is_unique_violation_on(&err, "keywords.name") => Err(RepoError::Conflict(
            ConflictKind::KeywordLabel(label.to_string()),
        )),
        Err(err) => Err(err.into()),
    }
}
