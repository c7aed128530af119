use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::info;
use url::Url;
use uuid::Uuid;

use toolindex_core::engagement::EngagementKind;
use toolindex_db::Database;
use toolindex_db::models::{PostMediaRow, ProfileUpdate};
use toolindex_types::api::{Claims, ProfileResponse, UpdateProfileRequest};

use crate::auth::AppState;
use crate::blocking;
use crate::convert::{post_from_row, profile_from_row, tool_from_row};
use crate::engagement::viewer_engagements;
use crate::error::ApiError;
use crate::middleware::Viewer;

/// Recent items shown on a profile.
const RECENT_LIMIT: u32 = 3;

pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id.to_string();
    let profile = blocking(&state, move |db| load_profile(db, &user_id, viewer.user_id().as_deref())).await?;
    Ok(Json(profile))
}

fn load_profile(db: &Database, user_id: &str, viewer: Option<&str>) -> Result<ProfileResponse, ApiError> {
    let row = db.get_profile(user_id)?.ok_or(ApiError::NotFound("User"))?;

    let tools = db.list_tools_by_submitter(user_id, RECENT_LIMIT)?;
    let tool_ids: Vec<String> = tools.iter().map(|t| t.id.clone()).collect();
    let mut tags: HashMap<String, Vec<String>> = HashMap::new();
    for (tool_id, tag) in db.get_tags_for_tools(&tool_ids)? {
        tags.entry(tool_id).or_default().push(tag);
    }
    let recent_tools = tools
        .into_iter()
        .map(|row| {
            let tool_tags = tags.remove(&row.id).unwrap_or_default();
            tool_from_row(row, tool_tags)
        })
        .collect();

    let posts = db.list_posts_by_author(user_id, RECENT_LIMIT)?;
    let post_ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
    let mut media: HashMap<String, Vec<PostMediaRow>> = HashMap::new();
    for item in db.get_media_for_posts(&post_ids)? {
        media.entry(item.post_id.clone()).or_default().push(item);
    }
    let liked = viewer_engagements(db, EngagementKind::PostLike, viewer, &post_ids)?;
    let recent_posts = posts
        .into_iter()
        .map(|row| {
            let post_media = media.remove(&row.id).unwrap_or_default();
            let viewer_has_liked = liked.contains(&row.id);
            post_from_row(row, post_media, viewer_has_liked, viewer)
        })
        .collect();

    Ok(ProfileResponse {
        profile: profile_from_row(row),
        recent_tools,
        recent_posts,
    })
}

pub async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.sub != user_id {
        return Err(ApiError::Forbidden("You can only edit your own profile"));
    }

    let website_url = trimmed(req.website_url);
    if let Some(url) = website_url.as_deref() {
        if Url::parse(url).is_err() {
            return Err(ApiError::bad_request("Please enter a valid website URL"));
        }
    }

    let display_name = trimmed(req.display_name);
    if display_name.as_deref().is_some_and(|name| name.chars().count() > 64) {
        return Err(ApiError::bad_request("Display name must be at most 64 characters"));
    }

    let full_name = trimmed(req.full_name);
    let bio = trimmed(req.bio);
    let twitter_handle = handle(req.twitter_handle);
    let github_handle = handle(req.github_handle);
    let show_as_author = req.show_as_author;
    let user_id = user_id.to_string();

    let profile = blocking(&state, move |db| {
        let updated = db.update_profile(
            &user_id,
            &ProfileUpdate {
                display_name: display_name.as_deref(),
                full_name: full_name.as_deref(),
                bio: bio.as_deref(),
                website_url: website_url.as_deref(),
                twitter_handle: twitter_handle.as_deref(),
                github_handle: github_handle.as_deref(),
                show_as_author,
            },
        )?;
        if !updated {
            return Err(ApiError::NotFound("User"));
        }

        load_profile(db, &user_id, Some(user_id.as_str()))
    })
    .await?;

    info!("Profile updated for {}", claims.username);
    Ok(Json(profile))
}

fn trimmed(raw: String) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Social handles are stored without the leading `@`.
fn handle(raw: String) -> Option<String> {
    trimmed(raw).and_then(|h| trimmed(h.trim_start_matches('@').to_string()))
}
