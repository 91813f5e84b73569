use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{AttemptError, TranscriptBackend, TranscriptRequest, TranscriptResponse};
use crate::endpoints::service_base;
use crate::Result;

/// Health endpoint response
#[derive(Debug, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Transcript backend reached over HTTP
pub struct HttpTranscriptBackend {
    client: Client,
    origin: Option<Url>,
}

impl HttpTranscriptBackend {
    /// Create a backend; `origin` resolves same-origin relative endpoints
    pub fn new(origin: Option<&str>) -> Result<Self> {
        let origin = origin
            .map(|raw| Url::parse(raw).with_context(|| format!("Invalid origin URL: {raw}")))
            .transpose()?;

        Ok(Self {
            client: Client::new(),
            origin,
        })
    }

    /// Turn a candidate endpoint into an absolute URL
    fn resolve(&self, endpoint: &str) -> std::result::Result<Url, AttemptError> {
        if let Ok(absolute) = Url::parse(endpoint) {
            return Ok(absolute);
        }

        match &self.origin {
            Some(origin) => origin
                .join(endpoint)
                .map_err(|e| AttemptError::Transport(format!("cannot join {endpoint} onto {origin}: {e}"))),
            None => Err(AttemptError::Transport(format!(
                "relative endpoint {endpoint} needs a configured origin"
            ))),
        }
    }

    /// Query `<base>/health` for the service behind a transcript endpoint
    pub async fn health(&self, endpoint: &str) -> Result<HealthStatus> {
        let url = self.resolve(&format!("{}/health", service_base(endpoint)))?;
        tracing::debug!("Checking health at {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to reach {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("Health check failed: HTTP {}", response.status());
        }

        response
            .json::<HealthStatus>()
            .await
            .context("Failed to parse health response")
    }
}

#[async_trait]
impl TranscriptBackend for HttpTranscriptBackend {
    async fn post_transcript(
        &self,
        endpoint: &str,
        request: &TranscriptRequest,
    ) -> std::result::Result<TranscriptResponse, AttemptError> {
        let url = self.resolve(endpoint)?;
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status.as_u16()));
        }

        response
            .json::<TranscriptResponse>()
            .await
            .map_err(|e| AttemptError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_absolute_endpoint() {
        let backend = HttpTranscriptBackend::new(None).unwrap();
        let url = backend.resolve("http://localhost:8001/transcript").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8001/transcript");
    }

    #[test]
    fn test_resolve_relative_endpoint_against_origin() {
        let backend = HttpTranscriptBackend::new(Some("https://app.example.com/some/page")).unwrap();
        let url = backend.resolve("/api/transcript").unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/api/transcript");
    }

    #[test]
    fn test_relative_endpoint_without_origin_is_a_transport_error() {
        let backend = HttpTranscriptBackend::new(None).unwrap();
        assert!(matches!(
            backend.resolve("/api/transcript"),
            Err(AttemptError::Transport(_))
        ));
    }

    #[test]
    fn test_invalid_origin_is_rejected() {
        assert!(HttpTranscriptBackend::new(Some("not an origin")).is_err());
    }

    #[test]
    fn test_response_decoding_tolerates_missing_fields() {
        let response: TranscriptResponse =
            serde_json::from_str(r#"{"success": true, "transcript": "hi", "duration": 212}"#).unwrap();
        assert!(response.success);
        assert_eq!(response.transcript.as_deref(), Some("hi"));
        assert!(response.title.is_none());

        let health: HealthStatus = serde_json::from_str(r#"{"status": "healthy"}"#).unwrap();
        assert!(health.is_healthy());
    }
}
