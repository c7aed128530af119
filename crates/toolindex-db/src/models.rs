//! Database row types. These map directly to SQLite rows and stay
//! independent of the API models in toolindex-types.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct ProfileRow {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub website_url: Option<String>,
    pub twitter_handle: Option<String>,
    pub github_handle: Option<String>,
    pub show_as_author: bool,
    /// Approved tools published under the user's name.
    pub tool_count: u32,
    /// Posts published under the user's name.
    pub post_count: u32,
    pub created_at: String,
}

/// Editable profile fields. `None` clears the column.
pub struct ProfileUpdate<'a> {
    pub display_name: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub website_url: Option<&'a str>,
    pub twitter_handle: Option<&'a str>,
    pub github_handle: Option<&'a str>,
    pub show_as_author: bool,
}

pub struct ToolRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub category: Option<String>,
    pub pricing: Option<String>,
    pub logo_url: Option<String>,
    pub submitted_by: String,
    /// Submitter's username, `None` when they hid it.
    pub submitter_name: Option<String>,
    pub is_approved: bool,
    pub is_featured: bool,
    pub favorite_count: u32,
    pub rating: Option<f64>,
    pub rating_count: u32,
    pub created_at: String,
    pub view_count: u32,
    pub click_count: u32,
}

/// Directory listing filters. `None` matches everything.
pub struct ToolFilter<'a> {
    pub search: Option<&'a str>,
    pub category: Option<&'a str>,
    pub pricing: Option<&'a str>,
    pub limit: u32,
}

impl Default for ToolFilter<'_> {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            pricing: None,
            limit: 50,
        }
    }
}

/// Fields of a tool being submitted.
pub struct NewTool<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub url: &'a str,
    pub category: Option<&'a str>,
    pub pricing: Option<&'a str>,
    pub logo_url: Option<&'a str>,
    pub submitted_by: &'a str,
    pub show_author: bool,
    pub is_approved: bool,
}

pub struct ScreenshotRow {
    pub tool_id: String,
    pub image_url: String,
    pub is_primary: bool,
    pub display_order: i64,
}

pub struct ReviewRow {
    pub id: String,
    pub tool_id: String,
    pub user_id: String,
    pub username: String,
    pub content: String,
    pub rating: Option<u8>,
    pub helpful_count: u32,
    pub created_at: String,
}

pub struct PostRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub post_type: String,
    pub author_id: String,
    pub author_name: Option<String>,
    pub show_author: bool,
    pub tags: Vec<String>,
    pub external_url: Option<String>,
    pub legacy_media: Option<String>,
    pub like_count: u32,
    pub comment_count: u32,
    pub created_at: String,
}

/// Fields of a post being created.
pub struct NewPost<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub post_type: &'a str,
    pub author_id: &'a str,
    pub show_author: bool,
    pub tags: &'a [String],
    pub external_url: Option<&'a str>,
}

pub struct PostMediaRow {
    pub post_id: String,
    pub url: String,
    pub kind: String,
    pub display_order: u32,
}

pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub parent_id: Option<String>,
    pub author_id: String,
    pub author_name: Option<String>,
    pub show_author: bool,
    pub content: String,
    pub like_count: u32,
    pub created_at: String,
}
