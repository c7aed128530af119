use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use toolindex_core::engagement::EngagementKind;
use toolindex_core::media::{order_screenshots, parse_media_urls, to_items, to_references};
use toolindex_db::Database;
use toolindex_db::models::{NewTool, ToolFilter, ToolRow};
use toolindex_types::api::{Claims, SubmitToolRequest, ToolDetailResponse};
use toolindex_types::models::Tool;

use crate::auth::AppState;
use crate::blocking;
use crate::convert::{split_tags, tool_from_row};
use crate::engagement::{toggle_and_count, viewer_engagements};
use crate::error::ApiError;
use crate::middleware::Viewer;

#[derive(Debug, Deserialize)]
pub struct ToolQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub pricing: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

pub async fn list_tools(
    State(state): State<AppState>,
    Query(query): Query<ToolQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.min(200);
    let search = query.q.filter(|q| !q.trim().is_empty());

    let tools = blocking(&state, move |db| {
        let rows = db.list_tools(&ToolFilter {
            search: search.as_deref(),
            category: non_empty(query.category.as_deref()),
            pricing: non_empty(query.pricing.as_deref()),
            limit,
        })?;

        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut tags: HashMap<String, Vec<String>> = HashMap::new();
        for (tool_id, tag) in db.get_tags_for_tools(&ids)? {
            tags.entry(tool_id).or_default().push(tag);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let tool_tags = tags.remove(&row.id).unwrap_or_default();
                tool_from_row(row, tool_tags)
            })
            .collect::<Vec<Tool>>())
    })
    .await?;

    Ok(Json(tools))
}

pub async fn get_tool(
    State(state): State<AppState>,
    Path(tool_id): Path<Uuid>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, ApiError> {
    let tool_id = tool_id.to_string();
    let detail = blocking(&state, move |db| tool_detail(db, &tool_id, viewer.user_id().as_deref())).await?;
    Ok(Json(detail))
}

/// Look up a tool as `viewer` sees it. Unapproved tools are only visible to
/// their submitter; everyone else gets a 404.
pub(crate) fn visible_tool(db: &Database, tool_id: &str, viewer: Option<&str>) -> Result<ToolRow, ApiError> {
    db.get_tool(tool_id)?
        .filter(|row| row.is_approved || viewer == Some(row.submitted_by.as_str()))
        .ok_or(ApiError::NotFound("Tool"))
}

fn tool_detail(db: &Database, tool_id: &str, viewer: Option<&str>) -> Result<ToolDetailResponse, ApiError> {
    let row = visible_tool(db, tool_id, viewer)?;

    let mut shots = db.get_screenshots(tool_id)?;
    order_screenshots(&mut shots, |s| s.is_primary, |s| s.display_order);
    let urls = shots.into_iter().map(|s| s.image_url).collect();

    let tags = db
        .get_tags_for_tools(&[tool_id.to_string()])?
        .into_iter()
        .map(|(_, tag)| tag)
        .collect();

    let favorited = viewer_engagements(db, EngagementKind::ToolFavorite, viewer, &[tool_id.to_string()])?;

    Ok(ToolDetailResponse {
        viewer_has_favorited: favorited.contains(tool_id),
        screenshots: to_items(to_references(urls)),
        tool: tool_from_row(row, tags),
    })
}

pub async fn submit_tool(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitToolRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim().to_string();
    let description = req.description.trim().to_string();
    let url = req.url.trim().to_string();

    if name.is_empty() || description.is_empty() || url.is_empty() {
        return Err(ApiError::bad_request("Name, description, and URL are required"));
    }
    if Url::parse(&url).is_err() {
        return Err(ApiError::bad_request("Please enter a valid URL"));
    }

    let screenshots = parse_media_urls(req.screenshots.as_ref());
    let tags = split_tags(req.tags.as_deref());
    let tool_id = Uuid::new_v4().to_string();
    let user_id = claims.sub.to_string();
    let is_approved = state.auto_approve;

    let detail = blocking(&state, move |db| {
        let show_author = match req.show_author {
            Some(show) => show,
            None => db.show_as_author(&user_id)?,
        };

        if let Some(existing) = db.find_tool_name_by_url(&url)? {
            return Err(ApiError::Conflict(format!(
                "This tool URL is already listed as \"{}\"",
                existing
            )));
        }

        db.insert_tool(
            &NewTool {
                id: &tool_id,
                name: &name,
                description: &description,
                url: &url,
                category: non_empty(req.category.as_deref()),
                pricing: non_empty(req.pricing.as_deref()),
                logo_url: non_empty(req.logo_url.as_deref()),
                submitted_by: &user_id,
                show_author,
                is_approved,
            },
            &screenshots,
            &tags,
        )?;

        tool_detail(db, &tool_id, Some(user_id.as_str()))
    })
    .await?;

    info!("Tool {} submitted by {}", detail.tool.id, claims.username);
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn delete_tool(
    State(state): State<AppState>,
    Path(tool_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let tool_id = tool_id.to_string();
    let user_id = claims.sub.to_string();

    blocking(&state, move |db| {
        let tool = visible_tool(db, &tool_id, Some(user_id.as_str()))?;
        if tool.submitted_by != user_id {
            return Err(ApiError::Forbidden("You can only delete tools you submitted"));
        }
        db.delete_tool(&tool_id)?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(tool_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let tool_id = tool_id.to_string();
    let user_id = claims.sub.to_string();

    let (lookup, viewer) = (tool_id.clone(), user_id.clone());
    blocking(&state, move |db| {
        visible_tool(db, &lookup, Some(viewer.as_str()))?;
        Ok(())
    })
    .await?;

    let response = toggle_and_count(&state, EngagementKind::ToolFavorite, tool_id, user_id).await?;
    Ok(Json(response))
}

/// Which counter a visit lands in.
#[derive(Debug, Clone, Copy)]
enum Visit {
    View,
    Click,
}

pub async fn track_view(
    State(state): State<AppState>,
    Path(tool_id): Path<Uuid>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, ApiError> {
    record_visit(&state, tool_id, viewer, Visit::View).await
}

pub async fn track_click(
    State(state): State<AppState>,
    Path(tool_id): Path<Uuid>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, ApiError> {
    record_visit(&state, tool_id, viewer, Visit::Click).await
}

async fn record_visit(state: &AppState, tool_id: Uuid, viewer: Viewer, visit: Visit) -> Result<StatusCode, ApiError> {
    let tool_id = tool_id.to_string();

    blocking(state, move |db| {
        let user_id = viewer.user_id();
        visible_tool(db, &tool_id, user_id.as_deref())?;
        match visit {
            Visit::View => db.record_tool_view(&tool_id, user_id.as_deref())?,
            Visit::Click => db.record_tool_click(&tool_id, user_id.as_deref())?,
        }
        debug!("Recorded {:?} on tool {}", visit, tool_id);
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
