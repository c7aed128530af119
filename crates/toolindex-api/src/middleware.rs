use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use toolindex_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// The signed-in user on public routes, if any.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<Claims>);

impl Viewer {
    pub fn user_id(&self) -> Option<String> {
        self.0.as_ref().map(|claims| claims.sub.to_string())
    }
}

/// Extract and validate JWT from Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = bearer_claims(req.headers(), &state.jwt_secret).ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Like `require_auth`, but anonymous requests pass through. A bad token is
/// treated as anonymous.
pub async fn attach_viewer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let viewer = Viewer(bearer_claims(req.headers(), &state.jwt_secret));

    req.extensions_mut().insert(viewer);
    next.run(req).await
}

fn bearer_claims(headers: &HeaderMap, secret: &str) -> Option<Claims> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?
        .strip_prefix("Bearer ")?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}
