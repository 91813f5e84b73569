//! YT Infographic - turn a YouTube video into an AI summary and infographic images
//!
//! This library fetches a transcript for a YouTube URL from whichever transcript backend
//! answers first, asks a text model for a summary and an image prompt, and asks an image
//! model for infographic versions in a selectable visual style.

pub mod cli;
pub mod config;
pub mod endpoints;
pub mod extractors;
pub mod generation;
pub mod output;
pub mod pipeline;
pub mod session;
pub mod transcript;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use endpoints::{resolve_candidates, RuntimeContext};
pub use extractors::VideoReference;
pub use generation::{GenerationResult, InfographicStyle};
pub use pipeline::InfographicPipeline;
pub use session::{ImageVersion, SessionState, SessionStore};
pub use transcript::{TranscriptFetcher, TranscriptResult};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Failure classes surfaced to the user by the pipeline stages
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StudioError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    BackendUnavailable(String),

    #[error("{0}")]
    EmptyResult(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid API key. Please check your GEMINI_API_KEY configuration.")]
    InvalidCredentials,

    #[error("API quota exceeded. Please try again later or check your billing settings.")]
    QuotaExceeded,

    #[error("Image generation model is unavailable. Please try again later.")]
    ModelUnavailable,

    #[error("Failed to generate image: {0}")]
    GenerationFailed(String),
}
