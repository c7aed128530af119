use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{MediaField, MediaReference, PostType, Review, Tool, UserProfile, VideoEmbed};

// -- JWT Claims --

/// JWT claims shared by the auth handlers and the request middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Engagement --

/// Result of a like / favorite / helpful toggle. `count` already includes
/// the change.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub liked: bool,
    pub count: u32,
}

// -- Media --

/// A media reference as returned to clients. Video items carry their embed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(flatten)]
    pub reference: MediaReference,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub video: Option<VideoEmbed>,
}

// -- Tools --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitToolRequest {
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub pricing: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub screenshots: Option<MediaField>,
    /// Comma-separated tag names.
    #[serde(default)]
    pub tags: Option<String>,
    /// Falls back to the author's `show_as_author` preference.
    #[serde(default)]
    pub show_author: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolDetailResponse {
    #[serde(flatten)]
    pub tool: Tool,
    pub screenshots: Vec<MediaItem>,
    pub viewer_has_favorited: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitReviewRequest {
    pub content: String,
    #[serde(default)]
    pub rating: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<Review>,
}

// -- Community --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub post_type: Option<PostType>,
    /// Comma-separated tag names.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub media: Option<MediaField>,
    #[serde(default)]
    pub external_url: Option<String>,
    /// Falls back to the author's `show_as_author` preference.
    #[serde(default)]
    pub show_author: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub post_type: PostType,
    /// Hidden from everyone but the author when they posted anonymously.
    pub author_id: Option<String>,
    pub author_name: Option<String>,
    pub tags: Vec<String>,
    pub media: Vec<MediaItem>,
    pub external_url: Option<String>,
    pub like_count: u32,
    pub comment_count: u32,
    pub viewer_has_liked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Falls back to the author's `show_as_author` preference.
    #[serde(default)]
    pub show_author: Option<bool>,
}

// -- Users --

/// Full replacement of the editable profile fields. Blank strings clear a
/// field.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub website_url: String,
    #[serde(default)]
    pub twitter_handle: String,
    #[serde(default)]
    pub github_handle: String,
    #[serde(default = "default_true")]
    pub show_as_author: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub recent_tools: Vec<Tool>,
    pub recent_posts: Vec<PostResponse>,
}

fn default_true() -> bool {
    true
}
