use std::collections::HashSet;

use anyhow::Result;
use rusqlite::Connection;

use toolindex_core::engagement::{self, EngagementKind, EngagementRecord, EngagementStore, StoreError, ToggleOutcome};

use crate::Database;
use crate::queries::{OptionalExt, is_unique_violation, placeholders};

/// Table and subject column holding each kind of record.
fn table(kind: EngagementKind) -> (&'static str, &'static str) {
    match kind {
        EngagementKind::ToolFavorite => ("user_favorites", "tool_id"),
        EngagementKind::ReviewVote => ("review_votes", "review_id"),
        EngagementKind::PostLike => ("community_post_likes", "post_id"),
        EngagementKind::CommentLike => ("community_comment_likes", "comment_id"),
    }
}

/// Engagement records on one locked connection. Uniqueness comes from the
/// `(subject, user_id)` primary key of each table.
pub struct SqliteEngagements<'a>(pub &'a Connection);

impl EngagementStore for SqliteEngagements<'_> {
    fn find_one(
        &self,
        kind: EngagementKind,
        subject_id: &str,
        actor_id: &str,
    ) -> Result<Option<EngagementRecord>, StoreError> {
        let (table, subject) = table(kind);
        let sql = format!("SELECT {subject}, user_id FROM {table} WHERE {subject} = ?1 AND user_id = ?2");
        let record = self
            .0
            .query_row(&sql, (subject_id, actor_id), |row| {
                Ok(EngagementRecord {
                    subject_id: row.get(0)?,
                    actor_id: row.get(1)?,
                })
            })
            .optional()?;
        Ok(record)
    }

    fn insert(&self, kind: EngagementKind, subject_id: &str, actor_id: &str) -> Result<(), StoreError> {
        let (table, subject) = table(kind);
        let sql = format!("INSERT INTO {table} ({subject}, user_id) VALUES (?1, ?2)");
        self.0
            .execute(&sql, (subject_id, actor_id))
            .map_err(map_insert_error)?;
        Ok(())
    }

    fn delete(&self, kind: EngagementKind, subject_id: &str, actor_id: &str) -> Result<(), StoreError> {
        let (table, subject) = table(kind);
        let sql = format!("DELETE FROM {table} WHERE {subject} = ?1 AND user_id = ?2");
        self.0
            .execute(&sql, (subject_id, actor_id))
            .map_err(anyhow::Error::from)?;
        Ok(())
    }
}

/// A duplicate key means another request got there first. Foreign key
/// failures stay ordinary errors.
fn map_insert_error(e: rusqlite::Error) -> StoreError {
    if is_unique_violation(&e) {
        StoreError::Conflict
    } else {
        StoreError::Backend(e.into())
    }
}

impl Database {
    /// Toggle under the connection lock, so toggles through this handle
    /// are serialized.
    pub fn toggle_engagement(&self, kind: EngagementKind, subject_id: &str, actor_id: &str) -> Result<ToggleOutcome> {
        self.with_conn(|conn| Ok(engagement::toggle(&SqliteEngagements(conn), kind, subject_id, actor_id)?))
    }

    pub fn engagement_count(&self, kind: EngagementKind, subject_id: &str) -> Result<u32> {
        let (table, subject) = table(kind);
        self.with_conn(|conn| {
            let sql = format!("SELECT COUNT(*) FROM {table} WHERE {subject} = ?1");
            Ok(conn.query_row(&sql, [subject_id], |row| row.get(0))?)
        })
    }

    /// Which of `subject_ids` the actor has engaged with.
    pub fn engaged_subjects(
        &self,
        kind: EngagementKind,
        actor_id: &str,
        subject_ids: &[String],
    ) -> Result<HashSet<String>> {
        if subject_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let (table, subject) = table(kind);
        self.with_conn(|conn| {
            // ?1 is the actor, subjects follow
            let sql = format!(
                "SELECT {subject} FROM {table} WHERE user_id = ?1 AND {subject} IN ({})",
                placeholders(2, subject_ids.len())
            );
            let params = std::iter::once(actor_id).chain(subject_ids.iter().map(String::as_str));
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(params), |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<HashSet<_>, _>>()?;
            Ok(rows)
        })
    }
}
