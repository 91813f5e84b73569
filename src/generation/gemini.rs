//! Gemini `generateContent` client used for both text and image generation.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ImageModel, ResponsePart, TextModel};
use crate::config::GeminiConfig;
use crate::StudioError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_modalities: &'a [&'a str],
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Parts of the first candidate, in response order
    pub fn into_parts(self) -> Vec<ResponsePart> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(ResponsePart::Text(text)),
                Part::InlineData { inline_data } => Some(ResponsePart::InlineData {
                    mime_type: inline_data.mime_type,
                    data: inline_data.data,
                }),
                Part::Other(value) => {
                    tracing::debug!("Ignoring unrecognised response part: {}", value);
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// HTTP client for the Gemini API
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    api_base: String,
    text_model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn from_config(config: &GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
        }
    }

    fn api_key(&self) -> Result<&str, StudioError> {
        self.api_key.as_deref().ok_or_else(|| {
            StudioError::Configuration("GEMINI_API_KEY environment variable is not set".to_string())
        })
    }

    async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
        response_modalities: Option<&[&str]>,
    ) -> anyhow::Result<GenerateContentResponse> {
        let api_key = self.api_key()?;
        let url = format!("{}/models/{}:generateContent", self.api_base, model);

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::Text {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: response_modalities.map(|modalities| GenerationConfig {
                response_modalities: modalities,
            }),
        };

        tracing::debug!("Calling {} ({} prompt chars)", model, prompt.len());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {model}"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<ApiErrorEnvelope>(&text) {
                Ok(envelope) => format!("{}: {}", envelope.error.status, envelope.error.message),
                Err(_) => text,
            };
            anyhow::bail!("Gemini API returned {}: {}", status, detail);
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .context("Failed to parse Gemini response")
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> anyhow::Result<String> {
        let parts = self
            .generate_content(&self.text_model, prompt, None)
            .await?
            .into_parts();

        Ok(parts
            .into_iter()
            .filter_map(|part| match part {
                ResponsePart::Text(text) => Some(text),
                ResponsePart::InlineData { .. } => None,
            })
            .collect::<Vec<_>>()
            .join(""))
    }
}

#[async_trait]
impl ImageModel for GeminiClient {
    async fn generate_image(&self, prompt: &str) -> anyhow::Result<Vec<ResponsePart>> {
        Ok(self
            .generate_content(&self.image_model, prompt, Some(&["TEXT", "IMAGE"][..]))
            .await?
            .into_parts())
    }
}
