use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::endpoints::{resolve_candidates, RuntimeContext, LOCAL_START_HINT};
use crate::extractors::VideoReference;

pub mod client;
pub mod failover;

pub use client::HttpTranscriptBackend;

use failover::{AttemptFailure, Exhausted};

/// Request body accepted by the transcript backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptRequest {
    pub url: String,
    pub max_length: usize,
    pub language: String,
}

/// Response body returned by the transcript backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TranscriptResponse {
    #[serde(default)]
    pub success: bool,
    pub transcript: Option<String>,
    pub video_id: Option<String>,
    pub detected_language: Option<String>,
    pub title: Option<String>,
    pub error: Option<String>,
}

/// Outcome of a transcript fetch; `transcript` is set on success, `error` on failure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranscriptResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Why one endpoint attempt failed
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    #[error("transcript service returned HTTP {0}")]
    Status(u16),

    #[error("{0}")]
    Backend(String),

    #[error("No transcript available for this video")]
    EmptyTranscript,

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid response from transcript service: {0}")]
    Decode(String),
}

impl AttemptError {
    /// The backend was reached and explained the failure itself
    pub fn is_specific(&self) -> bool {
        matches!(self, AttemptError::Backend(_) | AttemptError::EmptyTranscript)
    }
}

/// Transport to a single transcript endpoint
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptBackend: Send + Sync {
    /// POST the request to `endpoint`; non-success statuses are errors
    async fn post_transcript(
        &self,
        endpoint: &str,
        request: &TranscriptRequest,
    ) -> Result<TranscriptResponse, AttemptError>;
}

/// Fetches transcripts from the first candidate endpoint that answers
pub struct TranscriptFetcher {
    backend: Arc<dyn TranscriptBackend>,
    context: RuntimeContext,
    timeout: Duration,
    language: String,
}

impl TranscriptFetcher {
    pub fn new(backend: Arc<dyn TranscriptBackend>, context: RuntimeContext, timeout: Duration) -> Self {
        Self {
            backend,
            context,
            timeout,
            language: "en".to_string(),
        }
    }

    /// Build a fetcher talking HTTP, wired from configuration
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let backend = HttpTranscriptBackend::new(config.deployment.origin.as_deref())?;
        let mut fetcher = Self::new(
            Arc::new(backend),
            config.runtime_context(),
            config.transcript_timeout(),
        );
        fetcher.language = config.transcript.language.clone();
        Ok(fetcher)
    }

    /// Candidate endpoints in the order they will be tried
    pub fn candidates(&self) -> Vec<String> {
        resolve_candidates(&self.context)
    }

    /// Fetch a transcript. Never fails: every error is folded into the result.
    pub async fn fetch(&self, url: &str, max_length: usize) -> TranscriptResult {
        let reference = match VideoReference::parse(url) {
            Ok(reference) => reference,
            Err(err) => {
                tracing::warn!("Rejected transcript request for {:?}: {}", url, err);
                return TranscriptResult::failure(err.to_string());
            }
        };

        let request = TranscriptRequest {
            url: reference.url.clone(),
            max_length,
            language: self.language.clone(),
        };
        let candidates = self.candidates();
        let backend = self.backend.as_ref();
        let request_ref = &request;

        tracing::info!(
            "Fetching transcript for video {} ({} candidate endpoints)",
            reference.video_id,
            candidates.len()
        );

        let outcome = failover::first_success(&candidates, self.timeout, |endpoint| async move {
            let response = backend.post_transcript(endpoint, request_ref).await?;
            accept_response(response)
        })
        .await;

        match outcome {
            Ok(success) => {
                tracing::info!(
                    "Transcript fetched from {} after {} attempt(s)",
                    success.candidate,
                    success.attempts
                );
                let mut result = success.value;
                if result.video_id.is_none() {
                    result.video_id = Some(reference.video_id);
                }
                result
            }
            Err(exhausted) => TranscriptResult::failure(unavailable_message(&exhausted)),
        }
    }
}

/// Turn a parsed backend response into a successful result or an attempt error
fn accept_response(response: TranscriptResponse) -> Result<TranscriptResult, AttemptError> {
    if !response.success {
        let reason = response
            .error
            .filter(|error| !error.trim().is_empty())
            .unwrap_or_else(|| "Transcript service reported an unknown error".to_string());
        return Err(AttemptError::Backend(reason));
    }

    let transcript = response
        .transcript
        .as_deref()
        .map(normalize_transcript)
        .filter(|text| !text.is_empty())
        .ok_or(AttemptError::EmptyTranscript)?;

    Ok(TranscriptResult {
        success: true,
        transcript: Some(transcript),
        title: response.title,
        video_id: response.video_id,
        detected_language: Some(
            response
                .detected_language
                .unwrap_or_else(|| "en".to_string()),
        ),
        error: None,
    })
}

fn unavailable_message(exhausted: &Exhausted<AttemptError>) -> String {
    let specific = exhausted.attempts.iter().rev().find_map(|(_, failure)| match failure {
        AttemptFailure::Failed(err) if err.is_specific() => Some(err),
        _ => None,
    });

    if let Some(err) = specific {
        return format!("Transcript service unavailable: {err}");
    }

    match exhausted.last() {
        Some(last) => format!(
            "Transcript service unavailable after {} attempt(s) (last error: {last}). To run locally, {LOCAL_START_HINT}.",
            exhausted.attempts.len()
        ),
        None => format!("Transcript service unavailable: no endpoints to try. To run locally, {LOCAL_START_HINT}."),
    }
}

static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").expect("valid regex"));
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strip control characters, collapse whitespace runs and trim
pub fn normalize_transcript(text: &str) -> String {
    let without_controls = CONTROL_CHARS.replace_all(text, "");
    WHITESPACE_RUNS
        .replace_all(&without_controls, " ")
        .trim()
        .to_string()
}
