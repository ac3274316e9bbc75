use std::fmt;

use url::Url;

const VIDEO_ID_LEN: usize = 11;

/// Canonical 11-character video identifier extracted from a locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoId(String);

impl VideoId {
    /// Accepts `raw` only if it is a well-formed identifier token.
    pub fn parse(raw: &str) -> Option<Self> {
        is_video_id(raw).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the video identifier from free-form user input.
///
/// Recognized shapes:
/// - watch: `youtube.com/watch?v=ID`
/// - short link: `youtu.be/ID`
/// - embed: `youtube.com/embed/ID`
///
/// The scheme may be omitted. Anything else yields `None`.
pub fn extract_video_id(input: &str) -> Option<VideoId> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return None;
    }

    let url = if trimmed.contains("://") {
        Url::parse(trimmed).ok()?
    } else {
        Url::parse(&format!("https://{trimmed}")).ok()?
    };
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    let candidate = match host.as_str() {
        "youtu.be" | "www.youtu.be" => segments.next()?.to_string(),
        "youtube.com" | "www.youtube.com" | "m.youtube.com" => match segments.next()? {
            "watch" if segments.next().is_none() => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())?,
            "embed" => segments.next()?.to_string(),
            _ => return None,
        },
        _ => return None,
    };

    VideoId::parse(&candidate)
}

fn is_video_id(token: &str) -> bool {
    token.len() == VIDEO_ID_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
