//! Row to API model conversion.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use toolindex_core::media::{parse_media_text, to_references};
use toolindex_db::community::parse_kind;
use toolindex_db::models::{CommentRow, PostMediaRow, PostRow, ProfileRow, ReviewRow, ToolRow};
use toolindex_types::api::PostResponse;
use toolindex_types::models::{Comment, MediaReference, PostType, Review, Tool, UserProfile};

pub fn parse_timestamp(raw: &str, owner: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand or older builds use SQLite's
            // "YYYY-MM-DD HH:MM:SS" without timezone. Treat as UTC.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on '{}': {}", raw, owner, e);
            DateTime::default()
        })
}

/// Comma-separated tags, trimmed, blanks and repeats removed.
pub fn split_tags(raw: Option<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty() && seen.insert(tag.to_lowercase()))
        .map(String::from)
        .collect()
}

pub fn tool_from_row(row: ToolRow, tags: Vec<String>) -> Tool {
    Tool {
        created_at: parse_timestamp(&row.created_at, &row.id),
        id: row.id,
        name: row.name,
        description: row.description,
        url: row.url,
        category: row.category,
        pricing: row.pricing,
        logo_url: row.logo_url,
        tags,
        is_featured: row.is_featured,
        favorite_count: row.favorite_count,
        view_count: row.view_count,
        click_count: row.click_count,
        rating: row.rating,
        rating_count: row.rating_count,
        submitted_by: row.submitter_name,
    }
}

pub fn review_from_row(row: ReviewRow, viewer_found_helpful: bool) -> Review {
    Review {
        created_at: parse_timestamp(&row.created_at, &row.id),
        id: row.id,
        tool_id: row.tool_id,
        author_id: row.user_id,
        author_name: row.username,
        content: row.content,
        rating: row.rating,
        helpful_count: row.helpful_count,
        viewer_found_helpful,
    }
}

/// Anonymous content keeps its author id from everyone but the author.
fn visible_author(author_id: String, show_author: bool, viewer: Option<&str>) -> Option<String> {
    (show_author || viewer == Some(author_id.as_str())).then_some(author_id)
}

pub fn comment_from_row(row: CommentRow, viewer_has_liked: bool, viewer: Option<&str>) -> Comment {
    Comment {
        created_at: parse_timestamp(&row.created_at, &row.id),
        author_id: visible_author(row.author_id, row.show_author, viewer),
        id: row.id,
        parent_id: row.parent_id,
        author_name: row.author_name,
        content: row.content,
        like_count: row.like_count,
        viewer_has_liked,
    }
}

/// Join-table media when present, otherwise the legacy text column.
pub fn post_media(legacy: Option<&str>, joined: Vec<PostMediaRow>) -> Vec<MediaReference> {
    if joined.is_empty() {
        return to_references(parse_media_text(legacy.unwrap_or_default()));
    }

    joined
        .into_iter()
        .map(|m| MediaReference {
            kind: parse_kind(&m.kind),
            url: m.url,
            order: m.display_order,
        })
        .collect()
}

pub fn post_from_row(
    row: PostRow,
    media: Vec<PostMediaRow>,
    viewer_has_liked: bool,
    viewer: Option<&str>,
) -> PostResponse {
    let media = toolindex_core::media::to_items(post_media(row.legacy_media.as_deref(), media));
    let post_type = PostType::parse(&row.post_type).unwrap_or_else(|| {
        warn!("Unknown post_type '{}' on post '{}'", row.post_type, row.id);
        PostType::default()
    });

    PostResponse {
        created_at: parse_timestamp(&row.created_at, &row.id),
        id: row.id,
        title: row.title,
        content: row.content,
        post_type,
        author_id: visible_author(row.author_id, row.show_author, viewer),
        author_name: row.author_name,
        tags: row.tags,
        media,
        external_url: row.external_url,
        like_count: row.like_count,
        comment_count: row.comment_count,
        viewer_has_liked,
    }
}

pub fn profile_from_row(row: ProfileRow) -> UserProfile {
    UserProfile {
        created_at: parse_timestamp(&row.created_at, &row.id),
        id: row.id,
        username: row.username,
        display_name: row.display_name,
        full_name: row.full_name,
        bio: row.bio,
        website_url: row.website_url,
        twitter_handle: row.twitter_handle,
        github_handle: row.github_handle,
        show_as_author: row.show_as_author,
        tool_count: row.tool_count,
        post_count: row.post_count,
    }
}
