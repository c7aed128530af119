use url::Url;

use toolindex_types::models::{VideoEmbed, VideoProvider};

const YOUTUBE_ID_LEN: usize = 11;

/// Work out how a video URL should be embedded.
///
/// Recognizes YouTube (`watch?v=`, `embed/`, `v/`, `e/`, `youtu.be/`) and
/// numeric Vimeo URLs. Anything else is a direct file and is returned as-is.
/// Nothing is fetched; embed and thumbnail URLs are only constructed.
pub fn classify(raw: &str) -> VideoEmbed {
    let parsed = parse_loose(raw.trim());

    if let Some(id) = parsed.as_ref().and_then(youtube_id) {
        return VideoEmbed {
            provider: VideoProvider::Youtube,
            embed_url: format!("https://www.youtube.com/embed/{id}?rel=0"),
            thumbnail_url: Some(format!("https://img.youtube.com/vi/{id}/maxresdefault.jpg")),
        };
    }

    if let Some(id) = parsed.as_ref().and_then(vimeo_id) {
        return VideoEmbed {
            provider: VideoProvider::Vimeo,
            embed_url: format!("https://player.vimeo.com/video/{id}"),
            thumbnail_url: None,
        };
    }

    VideoEmbed {
        provider: VideoProvider::Direct,
        embed_url: raw.to_string(),
        thumbnail_url: None,
    }
}

/// Users paste links without a scheme often enough to accept them.
fn parse_loose(raw: &str) -> Option<Url> {
    if raw.is_empty() {
        return None;
    }

    Url::parse(raw)
        .ok()
        .filter(|url| url.has_host())
        .or_else(|| Url::parse(&format!("https://{raw}")).ok())
}

/// Host without the `www.` / `m.` prefix, lowercased.
fn bare_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(&host);
    Some(host.to_string())
}

fn youtube_id(url: &Url) -> Option<String> {
    let host = bare_host(url)?;

    let candidate = match host.as_str() {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => {
            let mut segments = url.path_segments()?;
            match segments.next()? {
                "watch" => url
                    .query_pairs()
                    .find_map(|(key, value)| (key == "v").then(|| value.into_owned())),
                "embed" | "v" | "e" => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    };

    candidate.filter(|id| is_youtube_id(id))
}

fn is_youtube_id(id: &str) -> bool {
    id.len() == YOUTUBE_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn vimeo_id(url: &Url) -> Option<String> {
    if bare_host(url)? != "vimeo.com" {
        return None;
    }

    url.path_segments()?
        .next()
        .filter(|segment| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
}
