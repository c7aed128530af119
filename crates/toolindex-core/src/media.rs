use serde_json::Value;
use tracing::debug;

use toolindex_types::api::MediaItem;
use toolindex_types::models::{MediaField, MediaKind, MediaReference, VideoProvider};

use crate::video;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "m4v", "ogv", "mkv", "avi", "m3u8"];

/// Normalize a stored media field into an ordered list of URLs.
///
/// Lists pass through with blank entries removed. Text is tried as a JSON
/// array first (only when it looks like JSON), then as a comma-separated
/// list, then as a single URL. Never fails: unusable input yields an empty
/// list. Feeding the output back in as a list returns it unchanged.
pub fn parse_media_urls(raw: Option<&MediaField>) -> Vec<String> {
    match raw {
        None => Vec::new(),
        Some(MediaField::List(urls)) => urls
            .iter()
            .filter(|url| !url.trim().is_empty())
            .cloned()
            .collect(),
        Some(MediaField::Text(text)) => parse_media_text(text),
    }
}

/// Text branch of [`parse_media_urls`], for legacy text columns.
pub fn parse_media_text(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Array(items)) => {
                return items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(String::from)
                    .collect();
            }
            Ok(_) => debug!("Media field is JSON but not an array, falling back to text"),
            Err(e) => debug!("Media field is not valid JSON ({}), falling back to text", e),
        }
    }

    if trimmed.contains(',') {
        return trimmed
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(String::from)
            .collect();
    }

    vec![trimmed.to_string()]
}

/// Image or video, judged by known video hosts and file extensions.
pub fn media_kind(url: &str) -> MediaKind {
    if video::classify(url).provider != VideoProvider::Direct {
        return MediaKind::Video;
    }

    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .to_ascii_lowercase();
    let is_video_file = path
        .rsplit_once('.')
        .is_some_and(|(_, ext)| VIDEO_EXTENSIONS.contains(&ext));

    if is_video_file {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

/// Number URLs in sequence, starting at zero.
pub fn to_references(urls: Vec<String>) -> Vec<MediaReference> {
    urls.into_iter()
        .enumerate()
        .map(|(order, url)| MediaReference {
            kind: media_kind(&url),
            url,
            order: order as u32,
        })
        .collect()
}

/// Attach embed details to video references for rendering.
pub fn to_items(references: Vec<MediaReference>) -> Vec<MediaItem> {
    references
        .into_iter()
        .map(|reference| {
            let video = match reference.kind {
                MediaKind::Video => Some(video::classify(&reference.url)),
                MediaKind::Image => None,
            };
            MediaItem { reference, video }
        })
        .collect()
}

/// Gallery order: the primary screenshot first, then by display order.
/// Stable for equal keys.
pub fn order_screenshots<T>(
    shots: &mut [T],
    is_primary: impl Fn(&T) -> bool,
    display_order: impl Fn(&T) -> i64,
) {
    shots.sort_by_key(|shot| (!is_primary(shot), display_order(shot)));
}
