use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod gemini;
pub mod image;
pub mod style;
pub mod text;

pub use gemini::GeminiClient;
pub use image::{build_image_prompt, classify_error, synthesize_image};
pub use style::InfographicStyle;
pub use text::{generate_image_prompt, generate_summary, synthesize};

use crate::StudioError;

/// Uniform outcome of a generation stage.
///
/// `success == true` always comes with `data`; failures carry `error` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> GenerationResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> GenerationResult<U> {
        GenerationResult {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
        }
    }

    /// Convert to a `Result`, for callers that want `?`
    pub fn into_result(self) -> std::result::Result<T, String> {
        match self.data {
            Some(data) if self.success => Ok(data),
            _ => Err(self
                .error
                .unwrap_or_else(|| "Generation failed without an error message".to_string())),
        }
    }
}

impl<T> From<StudioError> for GenerationResult<T> {
    fn from(err: StudioError) -> Self {
        Self::failed(err.to_string())
    }
}

/// One part of a multimodal model response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Text(String),
    InlineData { mime_type: String, data: String },
}

/// Single-turn text generation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Single-turn image generation returning raw response parts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageModel: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> anyhow::Result<Vec<ResponsePart>>;
}
