use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;
use crate::extractors::VideoReference;
use crate::generation::{
    generate_image_prompt, generate_summary, synthesize_image, GeminiClient, GenerationResult, ImageModel,
    InfographicStyle, TextModel,
};
use crate::session::{ImageVersion, SessionStore, Stage};
use crate::transcript::{TranscriptFetcher, TranscriptResult};
use crate::StudioError;

/// What the one-shot pipeline produced, stage by stage
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub transcript: TranscriptResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<GenerationResult<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<GenerationResult<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<GenerationResult<ImageVersion>>,
}

/// Orchestrates transcript, text and image stages over one session
pub struct InfographicPipeline {
    config: Config,
    fetcher: TranscriptFetcher,
    text_model: Arc<dyn TextModel>,
    image_model: Arc<dyn ImageModel>,
    session: SessionStore,
}

impl InfographicPipeline {
    /// Create a pipeline talking to the configured HTTP backends
    pub fn new(config: Config) -> crate::Result<Self> {
        let fetcher = TranscriptFetcher::from_config(&config)?;
        let gemini = Arc::new(GeminiClient::from_config(&config.gemini));

        Ok(Self::with_components(config, fetcher, gemini.clone(), gemini))
    }

    pub fn with_components(
        config: Config,
        fetcher: TranscriptFetcher,
        text_model: Arc<dyn TextModel>,
        image_model: Arc<dyn ImageModel>,
    ) -> Self {
        Self {
            config,
            fetcher,
            text_model,
            image_model,
            session: SessionStore::new(),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Fetch the transcript for `url` and store it in the session.
    ///
    /// Loading a new video replaces the previous transcript, summary and prompt; a failed
    /// load clears them.
    pub async fn load_transcript(&self, url: &str) -> TranscriptResult {
        let epoch = self.session.epoch();
        self.session.begin(epoch, Stage::Transcript);

        let result = self.fetcher.fetch(url, self.config.transcript.max_length).await;
        let video = VideoReference::parse(url).ok();

        // A failed load leaves no transcript behind
        let applied = self.session.finish(epoch, Stage::Transcript, result.error.clone(), |state| {
            if result.success {
                state.video = video;
                state.title = result.title.clone();
                state.detected_language = result.detected_language.clone();
                state.transcript = result.transcript.clone();
            } else {
                state.video = None;
                state.title = None;
                state.detected_language = None;
                state.transcript = None;
            }
            state.summary = None;
            state.prompt = None;
        });

        if !applied {
            tracing::warn!("Session was cleared while the transcript was loading; result discarded");
        }
        result
    }

    /// Generate the summary from the session transcript
    pub async fn generate_summary(&self) -> GenerationResult<String> {
        self.run_text_stage(Stage::Summary).await
    }

    /// Generate the image prompt from the session transcript
    pub async fn generate_prompt(&self) -> GenerationResult<String> {
        self.run_text_stage(Stage::Prompt).await
    }

    /// Run summary and prompt generation concurrently; neither waits on the other's outcome
    pub async fn generate_insights(&self) -> (GenerationResult<String>, GenerationResult<String>) {
        tokio::join!(self.generate_summary(), self.generate_prompt())
    }

    async fn run_text_stage(&self, stage: Stage) -> GenerationResult<String> {
        let epoch = self.session.epoch();
        let Some(transcript) = self.session.snapshot().transcript else {
            let result: GenerationResult<String> =
                StudioError::InvalidInput("No transcript loaded. Fetch a transcript first.".to_string()).into();
            self.session
                .record_error(epoch, stage, result.error.clone().unwrap_or_default());
            return result;
        };

        self.session.begin(epoch, stage);
        tracing::info!("Generating {:?} ({} transcript chars)", stage, transcript.len());

        let result = match stage {
            Stage::Prompt => generate_image_prompt(self.text_model.as_ref(), &transcript).await,
            _ => generate_summary(self.text_model.as_ref(), &transcript).await,
        };

        self.session.finish(epoch, stage, result.error.clone(), |state| {
            if let Some(text) = &result.data {
                match stage {
                    Stage::Prompt => state.prompt = Some(text.clone()),
                    _ => state.summary = Some(text.clone()),
                }
            }
        });
        result
    }

    /// Generate a new image version and append it to the session.
    ///
    /// `prompt` overrides the session prompt and `style` the active style; both are
    /// remembered for the next regeneration. Concurrent calls each append their own version
    /// in completion order.
    pub async fn generate_image(
        &self,
        prompt: Option<String>,
        style: Option<InfographicStyle>,
    ) -> GenerationResult<ImageVersion> {
        let epoch = self.session.epoch();
        let snapshot = self.session.snapshot();
        let style = style.unwrap_or(snapshot.active_style);

        let Some(prompt) = prompt.or(snapshot.prompt).filter(|p| !p.trim().is_empty()) else {
            let err = StudioError::InvalidInput(
                "No image prompt available. Generate or enter a prompt first.".to_string(),
            );
            self.session.record_error(epoch, Stage::Image, err.to_string());
            return err.into();
        };

        self.session.update(epoch, |state| {
            state.prompt = Some(prompt.clone());
            state.active_style = style;
        });
        self.session.begin(epoch, Stage::Image);

        let image_url = synthesize_image(self.image_model.as_ref(), &prompt, style).await;
        let result = image_url.map(|image_url| self.session.new_version(image_url, prompt, style));

        let applied = self.session.finish(epoch, Stage::Image, result.error.clone(), |state| {
            if let Some(version) = &result.data {
                state.push_image(version.clone());
            }
        });

        if let Some(version) = &result.data {
            if applied {
                tracing::info!("Appended image version {}", version.id);
            } else {
                tracing::warn!("Session was cleared during image generation; version {} discarded", version.id);
            }
        }
        result
    }

    /// Full one-shot flow: transcript, then summary and prompt, then one image
    pub async fn run(&self, url: &str, style: InfographicStyle) -> PipelineReport {
        self.session.set_style(style);

        let transcript = self.load_transcript(url).await;
        if !transcript.success {
            return PipelineReport {
                transcript,
                summary: None,
                prompt: None,
                image: None,
            };
        }

        let (summary, prompt) = self.generate_insights().await;
        let image = if prompt.success {
            Some(self.generate_image(prompt.data.clone(), Some(style)).await)
        } else {
            None
        };

        PipelineReport {
            transcript,
            summary: Some(summary),
            prompt: Some(prompt),
            image,
        }
    }

    /// Reset the session; in-flight results will be discarded when they arrive
    pub fn clear(&self) {
        self.session.clear();
    }
}
