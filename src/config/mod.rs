use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::endpoints::RuntimeContext;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Gemini API settings
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Transcript backend settings
    #[serde(default)]
    pub transcript: TranscriptConfig,

    /// Deployment hints used for endpoint resolution
    #[serde(default)]
    pub deployment: DeploymentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key; only ever read from the environment or the config file, never written back
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// API base URL
    pub api_base: String,

    /// Model used for summaries and image prompts
    pub text_model: String,

    /// Model used for infographic images
    pub image_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Explicit backend base, absolute URL or path-only
    pub backend_base: Option<String>,

    /// Per-endpoint attempt timeout in milliseconds
    pub timeout_ms: u64,

    /// Maximum transcript length requested from the backend
    pub max_length: usize,

    /// Preferred transcript language
    pub language: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Same-origin base URL; makes the context client-like
    pub origin: Option<String>,

    /// Running inside a hosted serverless deployment
    pub hosted: bool,

    /// Hostname provided by the hosting platform
    pub hostname: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "gemini-2.5-flash-image-preview".to_string(),
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            backend_base: None,
            timeout_ms: 15_000,
            max_length: 50_000,
            language: "en".to_string(),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then the config file, then the environment.
    ///
    /// `explicit` replaces the config file search; `.env` is only read when `env_file` is set.
    pub fn load(explicit: Option<&Path>, env_file: bool) -> Result<Self> {
        if env_file {
            load_env_file(None);
        }

        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.with_env(|name| std::env::var(name).ok())
    }

    /// Apply environment overrides, then validate the merged result
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        self.apply_env(lookup);
        self.validate()?;
        Ok(self)
    }

    /// Read a YAML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Write this configuration as YAML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        fs_err::write(path, content)?;
        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Option<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir().map(|dir| dir.join("yt-infographic").join("config.yaml"))
    }

    /// Override fields from environment variables looked up through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = var("GEMINI_API_KEY").or_else(|| var("GOOGLE_API_KEY")) {
            self.gemini.api_key = Some(key);
        }

        if let Some(base) = var("TRANSCRIPT_API_URL") {
            self.transcript.backend_base = Some(base);
        }

        if let Some(raw) = var("TRANSCRIPT_TIMEOUT_MS") {
            match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => self.transcript.timeout_ms = ms,
                _ => tracing::warn!("Ignoring invalid TRANSCRIPT_TIMEOUT_MS value: {}", raw),
            }
        }

        if let Some(origin) = var("APP_ORIGIN") {
            self.deployment.origin = Some(origin);
        }

        if let Some(flag) = var("VERCEL") {
            self.deployment.hosted = matches!(flag.to_lowercase().as_str(), "1" | "true");
        }

        if let Some(host) = var("VERCEL_URL") {
            self.deployment.hostname = Some(host);
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.transcript.timeout_ms == 0 {
            anyhow::bail!("transcript.timeout_ms must be greater than zero");
        }

        if self.transcript.max_length == 0 {
            anyhow::bail!("transcript.max_length must be greater than zero");
        }

        if let Some(origin) = &self.deployment.origin {
            url::Url::parse(origin).with_context(|| format!("Invalid deployment.origin: {origin}"))?;
        }

        Ok(())
    }

    /// Endpoint resolution inputs derived from this configuration
    pub fn runtime_context(&self) -> RuntimeContext {
        RuntimeContext {
            origin: self.deployment.origin.clone(),
            backend_base: self.transcript.backend_base.clone(),
            hosted: self.deployment.hosted,
            deployment_host: self.deployment.hostname.clone(),
        }
    }

    pub fn transcript_timeout(&self) -> Duration {
        Duration::from_millis(self.transcript.timeout_ms)
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!(
            "  Gemini API Key: {}",
            if self.gemini.api_key.is_some() { "set" } else { "not set" }
        );
        println!("  Text Model: {}", self.gemini.text_model);
        println!("  Image Model: {}", self.gemini.image_model);
        println!(
            "  Transcript Backend: {}",
            self.transcript.backend_base.as_deref().unwrap_or("(auto)")
        );
        println!("  Transcript Timeout: {}ms", self.transcript.timeout_ms);
        println!("  Max Transcript Length: {}", self.transcript.max_length);
        if let Some(origin) = &self.deployment.origin {
            println!("  Origin: {}", origin);
        }
        if self.deployment.hosted {
            println!(
                "  Hosted Deployment: {}",
                self.deployment.hostname.as_deref().unwrap_or("(no hostname)")
            );
        }
        if let Some(path) = Self::config_path() {
            println!("  Config File: {}", path.display());
        }
    }
}

/// Load `path`, or search for `.env` from the working directory up. Returns whether a file
/// was loaded; a missing file is silent, a malformed one is logged.
pub fn load_env_file(path: Option<&Path>) -> bool {
    let result = match path {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };

    match result {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            true
        }
        Err(err) if err.not_found() => false,
        Err(err) => {
            tracing::warn!("Ignoring malformed .env file: {}", err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.transcript.timeout_ms, 15_000);
        assert_eq!(config.transcript.max_length, 50_000);
        assert_eq!(config.transcript.language, "en");
        assert!(config.gemini.api_key.is_none());
        assert_eq!(config.runtime_context(), RuntimeContext::default());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("GOOGLE_API_KEY", "fallback-key"),
            ("TRANSCRIPT_API_URL", "https://transcripts.example.com/"),
            ("TRANSCRIPT_TIMEOUT_MS", "2500"),
            ("VERCEL", "1"),
            ("VERCEL_URL", "my-app.vercel.app"),
        ]));

        assert_eq!(config.gemini.api_key.as_deref(), Some("fallback-key"));
        assert_eq!(config.transcript_timeout(), Duration::from_millis(2500));

        let context = config.runtime_context();
        assert_eq!(context.backend_base.as_deref(), Some("https://transcripts.example.com/"));
        assert!(context.hosted);
        assert_eq!(context.deployment_host.as_deref(), Some("my-app.vercel.app"));
        assert!(!context.is_client_like());
    }

    #[test]
    fn test_primary_key_wins_and_bad_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("GEMINI_API_KEY", "primary"),
            ("GOOGLE_API_KEY", "fallback"),
            ("TRANSCRIPT_TIMEOUT_MS", "soon"),
            ("VERCEL", "0"),
            ("APP_ORIGIN", "   "),
        ]));

        assert_eq!(config.gemini.api_key.as_deref(), Some("primary"));
        assert_eq!(config.transcript.timeout_ms, 15_000);
        assert!(!config.deployment.hosted);
        assert!(config.deployment.origin.is_none());
    }

    #[test]
    fn test_from_file_merges_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "transcript:\n  backend_base: /python-api\n  timeout_ms: 500\ndeployment:\n  origin: https://app.example.com"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.transcript.backend_base.as_deref(), Some("/python-api"));
        assert_eq!(config.transcript.timeout_ms, 500);
        assert_eq!(config.transcript.max_length, 50_000);
        assert_eq!(config.gemini.text_model, "gemini-2.5-flash");
        assert!(config.runtime_context().is_client_like());
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "transcript:\n  timeout_ms: 0").unwrap();
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_environment_values_are_validated() {
        let err = Config::default()
            .with_env(env(&[("APP_ORIGIN", "not an origin")]))
            .unwrap_err();
        assert!(err.to_string().contains("Invalid deployment.origin"));

        let config = Config::default()
            .with_env(env(&[("APP_ORIGIN", "https://app.example.com")]))
            .unwrap();
        assert!(config.runtime_context().is_client_like());
    }

    #[test]
    fn test_explicit_config_file_replaces_search() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "transcript:\n  max_length: 750").unwrap();

        let config = Config::load(Some(file.path()), false).unwrap();
        assert_eq!(config.transcript.max_length, 750);
        assert!(Config::load(Some(Path::new("/nonexistent/config.yaml")), false).is_err());
    }

    #[test]
    fn test_missing_or_malformed_env_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!load_env_file(Some(&dir.path().join(".env"))));

        let malformed = dir.path().join("broken.env");
        std::fs::write(&malformed, "YT_INFOGRAPHIC_TEST_KEY='unterminated\n").unwrap();
        assert!(!load_env_file(Some(&malformed)));
        assert!(std::env::var("YT_INFOGRAPHIC_TEST_KEY").is_err());
    }

    #[test]
    fn test_saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let mut config = Config::default();
        config.transcript.backend_base = Some("https://api.example.com".into());

        config.save(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.transcript.backend_base, config.transcript.backend_base);
        assert_eq!(loaded.gemini.image_model, config.gemini.image_model);
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let mut config = Config::default();
        config.gemini.api_key = Some("secret".into());
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("secret"));
    }
}
