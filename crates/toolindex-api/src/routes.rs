use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::{self, AppState};
use crate::community;
use crate::middleware::{attach_viewer, require_auth};
use crate::reviews;
use crate::tools;
use crate::users;

/// The HTTP API. Reads are public and see the optional viewer, writes
/// require a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/tools", get(tools::list_tools))
        .route("/tools/{tool_id}", get(tools::get_tool))
        .route("/tools/{tool_id}/reviews", get(reviews::list_reviews))
        .route("/tools/{tool_id}/view", post(tools::track_view))
        .route("/tools/{tool_id}/click", post(tools::track_click))
        .route("/users/{user_id}", get(users::get_profile))
        .route("/community/posts", get(community::list_posts))
        .route("/community/posts/{post_id}", get(community::get_post))
        .route("/community/posts/{post_id}/comments", get(community::list_comments))
        .layer(middleware::from_fn_with_state(state.clone(), attach_viewer))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/tools", post(tools::submit_tool))
        .route("/tools/{tool_id}", delete(tools::delete_tool))
        .route("/tools/{tool_id}/favorite", post(tools::toggle_favorite))
        .route("/tools/{tool_id}/reviews", post(reviews::submit_review))
        .route("/reviews/{review_id}", delete(reviews::delete_review))
        .route("/reviews/{review_id}/helpful", post(reviews::toggle_helpful))
        .route("/community/posts", post(community::create_post))
        .route("/community/posts/{post_id}", delete(community::delete_post))
        .route("/community/posts/{post_id}/like", post(community::toggle_post_like))
        .route("/community/posts/{post_id}/comments", post(community::create_comment))
        .route("/community/comments/{comment_id}", delete(community::delete_comment))
        .route("/community/comments/{comment_id}/like", post(community::toggle_comment_like))
        .route("/users/{user_id}", put(users::update_profile))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
