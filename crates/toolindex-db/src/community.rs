use anyhow::Result;
use rusqlite::Row;
use tracing::warn;

use toolindex_types::models::{MediaKind, MediaReference};

use crate::Database;
use crate::models::{CommentRow, NewPost, PostMediaRow, PostRow};
use crate::queries::{OptionalExt, placeholders};

const POST_COLUMNS: &str = "
    p.id, p.title, p.content, p.post_type, p.author_id,
    CASE WHEN p.show_author = 1 THEN COALESCE(u.display_name, u.username) END,
    p.tags, p.external_url, p.media_urls,
    (SELECT COUNT(*) FROM community_post_likes l WHERE l.post_id = p.id),
    (SELECT COUNT(*) FROM community_comments c WHERE c.post_id = p.id),
    p.created_at, p.show_author
    FROM community_posts p
    LEFT JOIN users u ON u.id = p.author_id";

const COMMENT_COLUMNS: &str = "
    c.id, c.post_id, c.parent_id, c.author_id,
    CASE WHEN c.show_author = 1 THEN COALESCE(u.display_name, u.username) END,
    c.content,
    (SELECT COUNT(*) FROM community_comment_likes l WHERE l.comment_id = c.id),
    c.created_at, c.show_author
    FROM community_comments c
    LEFT JOIN users u ON u.id = c.author_id";

impl Database {
    // -- Posts --

    /// Insert a post. Media is written to the join table only.
    pub fn insert_post(&self, post: &NewPost<'_>, media: &[MediaReference]) -> Result<()> {
        let tags = serde_json::to_string(post.tags)?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO community_posts (id, title, content, post_type, author_id, show_author, tags, external_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    post.id,
                    post.title,
                    post.content,
                    post.post_type,
                    post.author_id,
                    post.show_author,
                    tags,
                    post.external_url,
                ],
            )?;

            for item in media {
                tx.execute(
                    "INSERT INTO post_media (post_id, url, kind, display_order) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![post.id, item.url, kind_name(item.kind), item.order],
                )?;
            }

            tx.commit()?;
            Ok(())
        })
    }

    /// Posts, newest first, optionally of one type.
    pub fn list_posts(&self, post_type: Option<&str>, limit: u32) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {POST_COLUMNS}
                 WHERE (?1 IS NULL OR p.post_type = ?1)
                 ORDER BY p.created_at DESC, p.rowid DESC
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![post_type, limit], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Posts a user published under their name, newest first.
    pub fn list_posts_by_author(&self, user_id: &str, limit: u32) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {POST_COLUMNS}
                 WHERE p.author_id = ?1 AND p.show_author = 1
                 ORDER BY p.created_at DESC, p.rowid DESC
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {POST_COLUMNS} WHERE p.id = ?1");
            conn.query_row(&sql, [id], map_post).optional()
        })
    }

    /// Batch-fetch join-table media for a set of posts, in display order.
    pub fn get_media_for_posts(&self, post_ids: &[String]) -> Result<Vec<PostMediaRow>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT post_id, url, kind, display_order FROM post_media
                 WHERE post_id IN ({}) ORDER BY post_id, display_order",
                placeholders(1, post_ids.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(post_ids), |row| {
                    Ok(PostMediaRow {
                        post_id: row.get(0)?,
                        url: row.get(1)?,
                        kind: row.get(2)?,
                        display_order: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Delete a post with its media, comments and likes.
    pub fn delete_post(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM community_comment_likes
                 WHERE comment_id IN (SELECT id FROM community_comments WHERE post_id = ?1)",
                [id],
            )?;
            tx.execute("DELETE FROM community_comments WHERE post_id = ?1", [id])?;
            tx.execute("DELETE FROM community_post_likes WHERE post_id = ?1", [id])?;
            tx.execute("DELETE FROM post_media WHERE post_id = ?1", [id])?;
            tx.execute("DELETE FROM community_posts WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }

    // -- Comments --

    pub fn insert_comment(
        &self,
        id: &str,
        post_id: &str,
        parent_id: Option<&str>,
        author_id: &str,
        show_author: bool,
        content: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO community_comments (id, post_id, parent_id, author_id, show_author, content)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, post_id, parent_id, author_id, show_author, content],
            )?;
            Ok(())
        })
    }

    /// Comments of a post in creation order, ready for threading.
    pub fn get_comments(&self, post_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {COMMENT_COLUMNS} WHERE c.post_id = ?1 ORDER BY c.created_at ASC, c.rowid ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([post_id], map_comment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {COMMENT_COLUMNS} WHERE c.id = ?1");
            conn.query_row(&sql, [id], map_comment).optional()
        })
    }

    /// Delete one comment and its likes. Replies are left in place.
    pub fn delete_comment(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM community_comment_likes WHERE comment_id = ?1", [id])?;
            tx.execute("DELETE FROM community_comments WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }
}

pub fn kind_name(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "image",
        MediaKind::Video => "video",
    }
}

/// Unknown kinds are read as images.
pub fn parse_kind(raw: &str) -> MediaKind {
    match raw {
        "video" => MediaKind::Video,
        _ => MediaKind::Image,
    }
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    let id: String = row.get(0)?;
    let raw_tags: String = row.get(6)?;
    let tags = serde_json::from_str(&raw_tags).unwrap_or_else(|e| {
        warn!("Corrupt tags '{}' on post '{}': {}", raw_tags, id, e);
        Vec::new()
    });

    Ok(PostRow {
        title: row.get(1)?,
        content: row.get(2)?,
        post_type: row.get(3)?,
        author_id: row.get(4)?,
        author_name: row.get(5)?,
        tags,
        external_url: row.get(7)?,
        legacy_media: row.get(8)?,
        like_count: row.get(9)?,
        comment_count: row.get(10)?,
        created_at: row.get(11)?,
        show_author: row.get(12)?,
        id,
    })
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        parent_id: row.get(2)?,
        author_id: row.get(3)?,
        author_name: row.get(4)?,
        content: row.get(5)?,
        like_count: row.get(6)?,
        created_at: row.get(7)?,
        show_author: row.get(8)?,
    })
}
