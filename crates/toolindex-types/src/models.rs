use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -- Media --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// One attachment of a tool or post, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    pub url: String,
    pub kind: MediaKind,
    pub order: u32,
}

/// A persisted media field as it may appear in stored rows or request bodies.
///
/// Older rows hold a single URL, a comma-separated list or a JSON-encoded
/// array in one text column; newer clients send a proper array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaField {
    List(Vec<String>),
    Text(String),
}

impl From<&str> for MediaField {
    fn from(raw: &str) -> Self {
        Self::Text(raw.to_string())
    }
}

impl From<String> for MediaField {
    fn from(raw: String) -> Self {
        Self::Text(raw)
    }
}

impl From<Vec<String>> for MediaField {
    fn from(urls: Vec<String>) -> Self {
        Self::List(urls)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoProvider {
    Youtube,
    Vimeo,
    Direct,
}

/// How a video URL should be embedded. `Direct` videos are played with a
/// native video element and `embed_url` is the source URL itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEmbed {
    pub provider: VideoProvider,
    pub embed_url: String,
    pub thumbnail_url: Option<String>,
}

// -- Comments --

/// A community comment. Only `like_count` and `viewer_has_liked` change after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub parent_id: Option<String>,
    /// Hidden from everyone but the author when they posted anonymously.
    pub author_id: Option<String>,
    /// `None` when the author chose to stay anonymous.
    pub author_name: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub like_count: u32,
    pub viewer_has_liked: bool,
}

/// A comment with its replies, in input order. Derived on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentNode<T = Comment> {
    #[serde(flatten)]
    pub comment: T,
    pub replies: Vec<CommentNode<T>>,
}

// -- Tools --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub id: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub category: Option<String>,
    pub pricing: Option<String>,
    pub logo_url: Option<String>,
    pub tags: Vec<String>,
    pub is_featured: bool,
    pub favorite_count: u32,
    pub view_count: u32,
    pub click_count: u32,
    pub rating: Option<f64>,
    pub rating_count: u32,
    /// `None` when the submitter hid their name.
    pub submitted_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub tool_id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub rating: Option<u8>,
    pub helpful_count: u32,
    pub viewer_found_helpful: bool,
    pub created_at: DateTime<Utc>,
}

// -- Community --

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    #[default]
    Discussion,
    Question,
    Showcase,
    Resource,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discussion => "discussion",
            Self::Question => "question",
            Self::Showcase => "showcase",
            Self::Resource => "resource",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "discussion" => Some(Self::Discussion),
            "question" => Some(Self::Question),
            "showcase" => Some(Self::Showcase),
            "resource" => Some(Self::Resource),
            _ => None,
        }
    }
}

// -- Users --

/// Public profile of a user. Counts only include approved tools and posts
/// published under the user's name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub website_url: Option<String>,
    pub twitter_handle: Option<String>,
    pub github_handle: Option<String>,
    /// Default for `show_author` on new tools, posts and comments.
    pub show_as_author: bool,
    pub tool_count: u32,
    pub post_count: u32,
    pub created_at: DateTime<Utc>,
}
