use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use toolindex_core::engagement::EngagementKind;
use toolindex_types::api::{Claims, ReviewListResponse, SubmitReviewRequest};

use crate::auth::AppState;
use crate::blocking;
use crate::convert::review_from_row;
use crate::engagement::{toggle_and_count, viewer_engagements};
use crate::error::ApiError;
use crate::middleware::Viewer;
use crate::tools::visible_tool;

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(tool_id): Path<Uuid>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, ApiError> {
    let tool_id = tool_id.to_string();

    let reviews = blocking(&state, move |db| {
        let viewer = viewer.user_id();
        visible_tool(db, &tool_id, viewer.as_deref())?;

        let rows = db.get_reviews(&tool_id)?;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let helpful = viewer_engagements(db, EngagementKind::ReviewVote, viewer.as_deref(), &ids)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let found_helpful = helpful.contains(&row.id);
                review_from_row(row, found_helpful)
            })
            .collect())
    })
    .await?;

    Ok(Json(ReviewListResponse { reviews }))
}

pub async fn submit_review(
    State(state): State<AppState>,
    Path(tool_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::bad_request("Review content is required"));
    }
    if let Some(rating) = req.rating {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::bad_request("Rating must be between 1 and 5"));
        }
    }

    let tool_id = tool_id.to_string();
    let review_id = Uuid::new_v4().to_string();
    let user_id = claims.sub.to_string();

    let review = blocking(&state, move |db| {
        visible_tool(db, &tool_id, Some(user_id.as_str()))?;
        db.insert_review(&review_id, &tool_id, &user_id, &content, req.rating)?;

        let row = db
            .get_review(&review_id)?
            .ok_or_else(|| anyhow::anyhow!("review {} vanished after insert", review_id))?;
        Ok(review_from_row(row, false))
    })
    .await?;

    info!("Review {} posted on tool {}", review.id, review.tool_id);
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let review_id = review_id.to_string();
    let user_id = claims.sub.to_string();

    blocking(&state, move |db| {
        let review = db.get_review(&review_id)?.ok_or(ApiError::NotFound("Review"))?;
        if review.user_id != user_id {
            return Err(ApiError::Forbidden("You can only delete your own reviews"));
        }
        db.delete_review(&review_id)?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_helpful(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let review_id = review_id.to_string();
    let user_id = claims.sub.to_string();

    let (lookup, viewer) = (review_id.clone(), user_id.clone());
    blocking(&state, move |db| {
        let review = db.get_review(&lookup)?.ok_or(ApiError::NotFound("Review"))?;
        visible_tool(db, &review.tool_id, Some(viewer.as_str()))?;
        Ok(())
    })
    .await?;

    let response = toggle_and_count(&state, EngagementKind::ReviewVote, review_id, user_id).await?;
    Ok(Json(response))
}
