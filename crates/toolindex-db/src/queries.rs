use crate::Database;
use crate::models::{NewTool, ReviewRow, ScreenshotRow, ToolFilter, ToolRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, Row};

const TOOL_COLUMNS: &str = "
    t.id, t.name, t.description, t.url, t.category, t.pricing, t.logo_url,
    t.submitted_by, CASE WHEN t.show_author = 1 THEN COALESCE(u.display_name, u.username) END,
    t.is_approved, t.is_featured,
    (SELECT COUNT(*) FROM user_favorites f WHERE f.tool_id = t.id),
    (SELECT AVG(r.rating) FROM reviews r WHERE r.tool_id = t.id),
    (SELECT COUNT(r.rating) FROM reviews r WHERE r.tool_id = t.id),
    t.created_at,
    (SELECT COUNT(*) FROM tool_views v WHERE v.tool_id = t.id),
    (SELECT COUNT(*) FROM tool_clicks k WHERE k.tool_id = t.id)
    FROM tools t
    LEFT JOIN users u ON u.id = t.submitted_by";

const REVIEW_COLUMNS: &str = "
    r.id, r.tool_id, r.user_id, COALESCE(u.display_name, u.username), r.content, r.rating,
    (SELECT COUNT(*) FROM review_votes v WHERE v.review_id = r.id),
    r.created_at
    FROM reviews r
    LEFT JOIN users u ON u.id = r.user_id";

impl Database {
    // -- Users --

    /// Returns `false` when the username is already taken.
    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            ) {
                Ok(_) => Ok(true),
                Err(e) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Tools --

    /// Insert a tool with its screenshots and tags. The first screenshot is
    /// the primary one; display order follows the slice.
    pub fn insert_tool(&self, tool: &NewTool<'_>, screenshots: &[String], tags: &[String]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO tools (id, name, description, url, category, pricing, logo_url, submitted_by, show_author, is_approved)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    tool.id,
                    tool.name,
                    tool.description,
                    tool.url,
                    tool.category,
                    tool.pricing,
                    tool.logo_url,
                    tool.submitted_by,
                    tool.show_author,
                    tool.is_approved,
                ],
            )?;

            for (index, url) in screenshots.iter().enumerate() {
                tx.execute(
                    "INSERT INTO tool_screenshots (tool_id, image_url, is_primary, display_order) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![tool.id, url, index == 0, index as i64],
                )?;
            }

            for tag in tags {
                tx.execute(
                    "INSERT OR IGNORE INTO tool_tags (tool_id, tag) VALUES (?1, ?2)",
                    (tool.id, tag),
                )?;
            }

            tx.commit()?;
            Ok(())
        })
    }

    /// Name of the tool already registered under `url`, if any.
    pub fn find_tool_name_by_url(&self, url: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT name FROM tools WHERE url = ?1", [url], |row| row.get(0))
                .optional()
        })
    }

    /// Approved tools, featured first, then newest.
    pub fn list_tools(&self, filter: &ToolFilter<'_>) -> Result<Vec<ToolRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {TOOL_COLUMNS}
                 WHERE t.is_approved = 1
                   AND (?1 IS NULL OR t.name LIKE '%' || ?1 || '%' OR t.description LIKE '%' || ?1 || '%')
                   AND (?2 IS NULL OR t.category = ?2)
                   AND (?3 IS NULL OR t.pricing = ?3)
                 ORDER BY t.is_featured DESC, t.created_at DESC, t.rowid DESC
                 LIMIT ?4"
            );
            let mut stmt = conn.prepare(&sql)?;
            let params = rusqlite::params![filter.search, filter.category, filter.pricing, filter.limit];
            let rows = stmt
                .query_map(params, map_tool)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_tool(&self, id: &str) -> Result<Option<ToolRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {TOOL_COLUMNS} WHERE t.id = ?1");
            conn.query_row(&sql, [id], map_tool).optional()
        })
    }

    /// Approved tools a user published under their name, newest first.
    pub fn list_tools_by_submitter(&self, user_id: &str, limit: u32) -> Result<Vec<ToolRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {TOOL_COLUMNS}
                 WHERE t.submitted_by = ?1 AND t.is_approved = 1 AND t.show_author = 1
                 ORDER BY t.created_at DESC, t.rowid DESC
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], map_tool)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn record_tool_view(&self, tool_id: &str, user_id: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("INSERT INTO tool_views (tool_id, user_id) VALUES (?1, ?2)", (tool_id, user_id))?;
            Ok(())
        })
    }

    pub fn record_tool_click(&self, tool_id: &str, user_id: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("INSERT INTO tool_clicks (tool_id, user_id) VALUES (?1, ?2)", (tool_id, user_id))?;
            Ok(())
        })
    }

    /// Batch-fetch `(tool_id, tag)` pairs for a set of tools.
    pub fn get_tags_for_tools(&self, tool_ids: &[String]) -> Result<Vec<(String, String)>> {
        if tool_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT tool_id, tag FROM tool_tags WHERE tool_id IN ({}) ORDER BY tag",
                placeholders(1, tool_ids.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(tool_ids), |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Screenshots in storage order; gallery ordering is up to the caller.
    pub fn get_screenshots(&self, tool_id: &str) -> Result<Vec<ScreenshotRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT tool_id, image_url, is_primary, display_order
                 FROM tool_screenshots WHERE tool_id = ?1 ORDER BY display_order",
            )?;
            let rows = stmt
                .query_map([tool_id], |row| {
                    Ok(ScreenshotRow {
                        tool_id: row.get(0)?,
                        image_url: row.get(1)?,
                        is_primary: row.get(2)?,
                        display_order: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Delete a tool and everything hanging off it.
    pub fn delete_tool(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM review_votes WHERE review_id IN (SELECT id FROM reviews WHERE tool_id = ?1)",
                [id],
            )?;
            tx.execute("DELETE FROM reviews WHERE tool_id = ?1", [id])?;
            tx.execute("DELETE FROM user_favorites WHERE tool_id = ?1", [id])?;
            tx.execute("DELETE FROM tool_views WHERE tool_id = ?1", [id])?;
            tx.execute("DELETE FROM tool_clicks WHERE tool_id = ?1", [id])?;
            tx.execute("DELETE FROM tool_screenshots WHERE tool_id = ?1", [id])?;
            tx.execute("DELETE FROM tool_tags WHERE tool_id = ?1", [id])?;
            tx.execute("DELETE FROM tools WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }

    // -- Reviews --

    pub fn insert_review(
        &self,
        id: &str,
        tool_id: &str,
        user_id: &str,
        content: &str,
        rating: Option<u8>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reviews (id, tool_id, user_id, content, rating) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, tool_id, user_id, content, rating],
            )?;
            Ok(())
        })
    }

    /// Reviews of a tool, newest first.
    pub fn get_reviews(&self, tool_id: &str) -> Result<Vec<ReviewRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {REVIEW_COLUMNS} WHERE r.tool_id = ?1 ORDER BY r.created_at DESC, r.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([tool_id], map_review)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_review(&self, id: &str) -> Result<Option<ReviewRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {REVIEW_COLUMNS} WHERE r.id = ?1");
            conn.query_row(&sql, [id], map_review).optional()
        })
    }

    pub fn delete_review(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM review_votes WHERE review_id = ?1", [id])?;
            tx.execute("DELETE FROM reviews WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT id, username, password, created_at FROM users WHERE {column} = ?1");
    conn.query_row(&sql, [value], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
            created_at: row.get(3)?,
        })
    })
    .optional()
}

fn map_tool(row: &Row<'_>) -> rusqlite::Result<ToolRow> {
    Ok(ToolRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        url: row.get(3)?,
        category: row.get(4)?,
        pricing: row.get(5)?,
        logo_url: row.get(6)?,
        submitted_by: row.get(7)?,
        submitter_name: row.get(8)?,
        is_approved: row.get(9)?,
        is_featured: row.get(10)?,
        favorite_count: row.get(11)?,
        rating: row.get(12)?,
        rating_count: row.get(13)?,
        created_at: row.get(14)?,
        view_count: row.get(15)?,
        click_count: row.get(16)?,
    })
}

fn map_review(row: &Row<'_>) -> rusqlite::Result<ReviewRow> {
    Ok(ReviewRow {
        id: row.get(0)?,
        tool_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row
            .get::<_, Option<String>>(3)?
            .unwrap_or_else(|| "unknown".to_string()),
        content: row.get(4)?,
        rating: row.get(5)?,
        helpful_count: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// `?first, ?first+1, ...` for an `IN (...)` clause of `count` values.
pub(crate) fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Primary key or unique constraint failure.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
