use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            username        TEXT NOT NULL UNIQUE,
            password        TEXT NOT NULL,
            display_name    TEXT,
            full_name       TEXT,
            bio             TEXT,
            website_url     TEXT,
            twitter_handle  TEXT,
            github_handle   TEXT,
            show_as_author  INTEGER NOT NULL DEFAULT 1,
            created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            updated_at      TEXT
        );

        -- Tools directory

        CREATE TABLE IF NOT EXISTS tools (
            id            TEXT PRIMARY KEY,
            name          TEXT NOT NULL,
            description   TEXT NOT NULL,
            url           TEXT NOT NULL UNIQUE,
            category      TEXT,
            pricing       TEXT,
            logo_url      TEXT,
            submitted_by  TEXT NOT NULL REFERENCES users(id),
            show_author   INTEGER NOT NULL DEFAULT 1,
            is_approved   INTEGER NOT NULL DEFAULT 0,
            is_featured   INTEGER NOT NULL DEFAULT 0,
            created_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_tools_listing
            ON tools(is_approved, is_featured, created_at);

        CREATE TABLE IF NOT EXISTS tool_tags (
            tool_id  TEXT NOT NULL REFERENCES tools(id),
            tag      TEXT NOT NULL,
            PRIMARY KEY (tool_id, tag)
        );

        CREATE TABLE IF NOT EXISTS tool_screenshots (
            tool_id        TEXT NOT NULL REFERENCES tools(id),
            image_url      TEXT NOT NULL,
            is_primary     INTEGER NOT NULL DEFAULT 0,
            display_order  INTEGER NOT NULL,
            PRIMARY KEY (tool_id, display_order)
        );

        CREATE TABLE IF NOT EXISTS reviews (
            id          TEXT PRIMARY KEY,
            tool_id     TEXT NOT NULL REFERENCES tools(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            content     TEXT NOT NULL,
            rating      INTEGER CHECK (rating BETWEEN 1 AND 5),
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        -- Anonymous visitors have no user_id
        CREATE TABLE IF NOT EXISTS tool_views (
            tool_id     TEXT NOT NULL REFERENCES tools(id),
            user_id     TEXT REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_tool_views_tool ON tool_views(tool_id);

        CREATE TABLE IF NOT EXISTS tool_clicks (
            tool_id     TEXT NOT NULL REFERENCES tools(id),
            user_id     TEXT REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_tool_clicks_tool ON tool_clicks(tool_id);

        CREATE INDEX IF NOT EXISTS idx_reviews_tool
            ON reviews(tool_id, created_at);

        -- Community

        CREATE TABLE IF NOT EXISTS community_posts (
            id            TEXT PRIMARY KEY,
            title         TEXT NOT NULL,
            content       TEXT NOT NULL,
            post_type     TEXT NOT NULL DEFAULT 'discussion',
            author_id     TEXT NOT NULL REFERENCES users(id),
            show_author   INTEGER NOT NULL DEFAULT 1,
            tags          TEXT NOT NULL DEFAULT '[]',
            external_url  TEXT,
            -- Pre-join-table posts: one URL, a comma list or a JSON array.
            -- Read only; new media goes to post_media.
            media_urls    TEXT,
            created_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_posts_created
            ON community_posts(created_at);

        CREATE TABLE IF NOT EXISTS post_media (
            post_id        TEXT NOT NULL REFERENCES community_posts(id),
            url            TEXT NOT NULL,
            kind           TEXT NOT NULL,
            display_order  INTEGER NOT NULL,
            PRIMARY KEY (post_id, display_order)
        );

        -- parent_id has no foreign key: deleting a comment leaves its
        -- replies in place as orphans.
        CREATE TABLE IF NOT EXISTS community_comments (
            id           TEXT PRIMARY KEY,
            post_id      TEXT NOT NULL REFERENCES community_posts(id),
            parent_id    TEXT,
            author_id    TEXT NOT NULL REFERENCES users(id),
            show_author  INTEGER NOT NULL DEFAULT 1,
            content      TEXT NOT NULL,
            created_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_post
            ON community_comments(post_id, created_at);

        -- Engagement records: one row per (subject, user)

        CREATE TABLE IF NOT EXISTS user_favorites (
            tool_id     TEXT NOT NULL REFERENCES tools(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            PRIMARY KEY (tool_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS review_votes (
            review_id   TEXT NOT NULL REFERENCES reviews(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            PRIMARY KEY (review_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS community_post_likes (
            post_id     TEXT NOT NULL REFERENCES community_posts(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            PRIMARY KEY (post_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS community_comment_likes (
            comment_id  TEXT NOT NULL REFERENCES community_comments(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            PRIMARY KEY (comment_id, user_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
