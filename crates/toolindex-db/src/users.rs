use anyhow::Result;
use rusqlite::Row;

use crate::Database;
use crate::models::{ProfileRow, ProfileUpdate};
use crate::queries::OptionalExt;

const PROFILE_COLUMNS: &str = "
    u.id, u.username, u.display_name, u.full_name, u.bio,
    u.website_url, u.twitter_handle, u.github_handle, u.show_as_author,
    (SELECT COUNT(*) FROM tools t
     WHERE t.submitted_by = u.id AND t.is_approved = 1 AND t.show_author = 1),
    (SELECT COUNT(*) FROM community_posts p
     WHERE p.author_id = u.id AND p.show_author = 1),
    u.created_at
    FROM users u";

impl Database {
    // -- Profiles --

    pub fn get_profile(&self, user_id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {PROFILE_COLUMNS} WHERE u.id = ?1");
            conn.query_row(&sql, [user_id], map_profile).optional()
        })
    }

    /// Overwrite the editable profile fields. Returns `false` for an unknown
    /// user.
    pub fn update_profile(&self, user_id: &str, profile: &ProfileUpdate<'_>) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET
                    display_name = ?2, full_name = ?3, bio = ?4, website_url = ?5,
                    twitter_handle = ?6, github_handle = ?7, show_as_author = ?8,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                rusqlite::params![
                    user_id,
                    profile.display_name,
                    profile.full_name,
                    profile.bio,
                    profile.website_url,
                    profile.twitter_handle,
                    profile.github_handle,
                    profile.show_as_author,
                ],
            )?;
            Ok(changed > 0)
        })
    }

    /// The user's default for showing their name on new content.
    pub fn show_as_author(&self, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let shown = conn
                .query_row("SELECT show_as_author FROM users WHERE id = ?1", [user_id], |row| row.get(0))
                .optional()?;
            Ok(shown.unwrap_or(true))
        })
    }
}

fn map_profile(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        full_name: row.get(3)?,
        bio: row.get(4)?,
        website_url: row.get(5)?,
        twitter_handle: row.get(6)?,
        github_handle: row.get(7)?,
        show_as_author: row.get(8)?,
        tool_count: row.get(9)?,
        post_count: row.get(10)?,
        created_at: row.get(11)?,
    })
}
