use once_cell::sync::Lazy;
use regex::Regex;

/// Known YouTube URL shapes, each capturing the 11-character video id.
///
/// Protocol and `www.` are optional in every shape. Patterns are searched, not anchored,
/// so surrounding text (tracking params, pasted prefixes) does not prevent a match.
static URL_SHAPES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:https?://)?(?:www\.)?youtube\.com/watch\?v=([A-Za-z0-9_-]{11})",
        r"(?:https?://)?(?:www\.)?youtu\.be/([A-Za-z0-9_-]{11})",
        r"(?:https?://)?(?:www\.)?youtube\.com/embed/([A-Za-z0-9_-]{11})",
        r"(?:https?://)?(?:www\.)?youtube\.com/v/([A-Za-z0-9_-]{11})",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static YouTube URL pattern is valid"))
    .collect()
});

/// Extract the video id from a YouTube URL.
///
/// Returns `None` for anything that is not one of the watch, short-link or embed shapes.
pub fn extract_video_id(url: &str) -> Option<String> {
    URL_SHAPES.iter().find_map(|shape| {
        shape
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|id| id.as_str().to_string())
    })
}

/// Check whether the input is a YouTube URL we can extract a video id from
pub fn is_valid_youtube_url(url: &str) -> bool {
    extract_video_id(url).is_some()
}
