use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use toolindex_core::engagement::EngagementKind;
use toolindex_core::media::{parse_media_urls, to_references};
use toolindex_core::thread::{MAX_REPLY_DEPTH, build_tree, can_reply, reply_depth};
use toolindex_db::Database;
use toolindex_db::models::{NewPost, PostMediaRow};
use toolindex_types::api::{Claims, CreateCommentRequest, CreatePostRequest, PostResponse};
use toolindex_types::models::{Comment, PostType};

use crate::auth::AppState;
use crate::blocking;
use crate::convert::{comment_from_row, post_from_row, split_tags};
use crate::engagement::{toggle_and_count, viewer_engagements};
use crate::error::ApiError;
use crate::middleware::Viewer;

#[derive(Debug, Deserialize)]
pub struct PostQuery {
    #[serde(rename = "type")]
    pub post_type: Option<PostType>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

// -- Posts --

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.min(200);
    let post_type = query.post_type.map(|t| t.as_str());

    let posts = blocking(&state, move |db| {
        let viewer = viewer.user_id();
        let rows = db.list_posts(post_type, limit)?;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();

        let mut media: HashMap<String, Vec<PostMediaRow>> = HashMap::new();
        for item in db.get_media_for_posts(&ids)? {
            media.entry(item.post_id.clone()).or_default().push(item);
        }
        let liked = viewer_engagements(db, EngagementKind::PostLike, viewer.as_deref(), &ids)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let post_media = media.remove(&row.id).unwrap_or_default();
                let viewer_has_liked = liked.contains(&row.id);
                post_from_row(row, post_media, viewer_has_liked, viewer.as_deref())
            })
            .collect::<Vec<PostResponse>>())
    })
    .await?;

    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = post_id.to_string();
    let post = blocking(&state, move |db| load_post(db, &post_id, viewer.user_id().as_deref())).await?;
    Ok(Json(post))
}

fn load_post(db: &Database, post_id: &str, viewer: Option<&str>) -> Result<PostResponse, ApiError> {
    let row = db.get_post(post_id)?.ok_or(ApiError::NotFound("Post"))?;
    let ids = [post_id.to_string()];
    let media = db.get_media_for_posts(&ids)?;
    let liked = viewer_engagements(db, EngagementKind::PostLike, viewer, &ids)?;
    Ok(post_from_row(row, media, liked.contains(post_id), viewer))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = req.title.trim().to_string();
    let content = req.content.trim().to_string();
    if title.is_empty() || content.is_empty() {
        return Err(ApiError::bad_request("Title and content are required"));
    }

    let post_type = req.post_type.unwrap_or_default();
    let tags = split_tags(req.tags.as_deref());
    let media = to_references(parse_media_urls(req.media.as_ref()));
    let external_url = req
        .external_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    let post_id = Uuid::new_v4().to_string();
    let user_id = claims.sub.to_string();

    let post = blocking(&state, move |db| {
        let show_author = match req.show_author {
            Some(show) => show,
            None => db.show_as_author(&user_id)?,
        };

        db.insert_post(
            &NewPost {
                id: &post_id,
                title: &title,
                content: &content,
                post_type: post_type.as_str(),
                author_id: &user_id,
                show_author,
                tags: &tags,
                external_url: external_url.as_deref(),
            },
            &media,
        )?;

        load_post(db, &post_id, Some(user_id.as_str()))
    })
    .await?;

    info!(
        "Post {} created by {} with {} media item(s)",
        post.id,
        claims.username,
        post.media.len()
    );
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = post_id.to_string();
    let user_id = claims.sub.to_string();

    blocking(&state, move |db| {
        let post = db.get_post(&post_id)?.ok_or(ApiError::NotFound("Post"))?;
        if post.author_id != user_id {
            return Err(ApiError::Forbidden("You can only delete your own posts"));
        }
        db.delete_post(&post_id)?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_post_like(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = post_id.to_string();

    let lookup = post_id.clone();
    blocking(&state, move |db| {
        db.get_post(&lookup)?.ok_or(ApiError::NotFound("Post"))?;
        Ok(())
    })
    .await?;

    let response = toggle_and_count(&state, EngagementKind::PostLike, post_id, claims.sub.to_string()).await?;
    Ok(Json(response))
}

// -- Comments --

pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = post_id.to_string();

    let tree = blocking(&state, move |db| {
        db.get_post(&post_id)?.ok_or(ApiError::NotFound("Post"))?;
        let comments = load_comments(db, &post_id, viewer.user_id().as_deref())?;
        Ok(build_tree(comments))
    })
    .await?;

    Ok(Json(tree))
}

/// Comments of a post in creation order, flat.
fn load_comments(db: &Database, post_id: &str, viewer: Option<&str>) -> Result<Vec<Comment>, ApiError> {
    let rows = db.get_comments(post_id)?;
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let liked = viewer_engagements(db, EngagementKind::CommentLike, viewer, &ids)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let viewer_has_liked = liked.contains(&row.id);
            comment_from_row(row, viewer_has_liked, viewer)
        })
        .collect())
}

pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::bad_request("Comment content is required"));
    }

    let post_id = post_id.to_string();
    let comment_id = Uuid::new_v4().to_string();
    let user_id = claims.sub.to_string();
    let parent_id = req.parent_id.filter(|p| !p.trim().is_empty());

    let comment = blocking(&state, move |db| {
        db.get_post(&post_id)?.ok_or(ApiError::NotFound("Post"))?;

        if let Some(parent) = parent_id.as_deref() {
            let thread = load_comments(db, &post_id, None)?;
            let depth = reply_depth(&thread, parent)
                .ok_or_else(|| ApiError::bad_request("Parent comment not found on this post"))?;
            if !can_reply(depth) {
                debug!("Rejected reply to {} at depth {}", parent, depth);
                return Err(ApiError::BadRequest(format!(
                    "Replies are limited to {} levels",
                    MAX_REPLY_DEPTH
                )));
            }
        }

        let show_author = match req.show_author {
            Some(show) => show,
            None => db.show_as_author(&user_id)?,
        };
        db.insert_comment(
            &comment_id,
            &post_id,
            parent_id.as_deref(),
            &user_id,
            show_author,
            &content,
        )?;

        let row = db
            .get_comment(&comment_id)?
            .ok_or_else(|| anyhow::anyhow!("comment {} vanished after insert", comment_id))?;
        Ok(comment_from_row(row, false, Some(user_id.as_str())))
    })
    .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn toggle_comment_like(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let comment_id = comment_id.to_string();

    let lookup = comment_id.clone();
    blocking(&state, move |db| {
        db.get_comment(&lookup)?.ok_or(ApiError::NotFound("Comment"))?;
        Ok(())
    })
    .await?;

    let response = toggle_and_count(&state, EngagementKind::CommentLike, comment_id, claims.sub.to_string()).await?;
    Ok(Json(response))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let comment_id = comment_id.to_string();
    let user_id = claims.sub.to_string();

    blocking(&state, move |db| {
        let comment = db.get_comment(&comment_id)?.ok_or(ApiError::NotFound("Comment"))?;
        if comment.author_id != user_id {
            return Err(ApiError::Forbidden("You can only delete your own comments"));
        }
        db.delete_comment(&comment_id)?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
