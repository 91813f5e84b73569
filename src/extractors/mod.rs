use serde::{Deserialize, Serialize};

pub mod youtube;

pub use youtube::{extract_video_id, is_valid_youtube_url};

use crate::StudioError;

/// Message returned for input that matches none of the known YouTube URL shapes
pub const INVALID_URL_MESSAGE: &str =
    "Invalid YouTube URL format. Please provide a valid YouTube video URL.";

/// A validated YouTube URL together with its canonical video id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoReference {
    /// The URL as the user supplied it
    pub url: String,

    /// 11-character YouTube video id
    pub video_id: String,
}

impl VideoReference {
    /// Parse user input into a reference, failing fast on unknown URL shapes
    pub fn parse(url: &str) -> Result<Self, StudioError> {
        let trimmed = url.trim();
        let video_id = extract_video_id(trimmed)
            .ok_or_else(|| StudioError::InvalidInput(INVALID_URL_MESSAGE.to_string()))?;

        Ok(Self {
            url: trimmed.to_string(),
            video_id,
        })
    }

    /// Canonical long-form watch URL for this video
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}
