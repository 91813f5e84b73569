//! Session state shared between the pipeline stages.
//!
//! Stage completions are applied through an [`Epoch`] captured when the stage started.
//! `clear()` bumps the epoch, so results from requests issued before a reset are dropped
//! instead of leaking into the fresh session.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::extractors::VideoReference;
use crate::generation::InfographicStyle;
use crate::StudioError;

/// Session generation token; results carrying a stale epoch are discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Epoch(u64);

/// One generated infographic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVersion {
    /// `<unix-millis>-<sequence>`, unique for the lifetime of the store
    pub id: String,
    /// `data:` URI or absolute URL
    pub image_url: String,
    /// Prompt the image was generated from, before style enhancement
    pub prompt: String,
    pub style: InfographicStyle,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Loading and error flags for one stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStatus {
    /// Requests issued in the current epoch that have not completed yet
    pub in_flight: u32,
    pub error: Option<String>,
}

impl StageStatus {
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}

/// Pipeline stages tracked by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transcript,
    Summary,
    Prompt,
    Image,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFlags {
    pub transcript: StageStatus,
    pub summary: StageStatus,
    pub prompt: StageStatus,
    pub image: StageStatus,
}

impl StageFlags {
    pub fn get(&self, stage: Stage) -> &StageStatus {
        match stage {
            Stage::Transcript => &self.transcript,
            Stage::Summary => &self.summary,
            Stage::Prompt => &self.prompt,
            Stage::Image => &self.image,
        }
    }

    fn get_mut(&mut self, stage: Stage) -> &mut StageStatus {
        match stage {
            Stage::Transcript => &mut self.transcript,
            Stage::Summary => &mut self.summary,
            Stage::Prompt => &mut self.prompt,
            Stage::Image => &mut self.image,
        }
    }
}

/// Everything the presentation layer renders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub video: Option<VideoReference>,
    pub title: Option<String>,
    pub detected_language: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub prompt: Option<String>,
    pub images: Vec<ImageVersion>,
    pub current_index: usize,
    pub active_style: InfographicStyle,
    pub stages: StageFlags,
}

impl SessionState {
    /// Image at `current_index`, if any image exists
    pub fn current_image(&self) -> Option<&ImageVersion> {
        self.images.get(self.current_index)
    }

    /// Append a version and select it
    pub fn push_image(&mut self, version: ImageVersion) {
        self.images.push(version);
        self.current_index = self.images.len() - 1;
    }
}

struct Inner {
    epoch: u64,
    state: SessionState,
}

/// Mutex-guarded session with epoch-checked updates
pub struct SessionStore {
    inner: Mutex<Inner>,
    next_sequence: AtomicU64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                epoch: 0,
                state: SessionState::default(),
            }),
            next_sequence: AtomicU64::new(1),
        }
    }

    /// Current epoch; capture it before issuing a request
    pub fn epoch(&self) -> Epoch {
        Epoch(self.inner.lock().epoch)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SessionState {
        self.inner.lock().state.clone()
    }

    /// Apply `update` only if no reset happened since `epoch` was captured.
    ///
    /// Returns whether the update was applied.
    pub fn update(&self, epoch: Epoch, update: impl FnOnce(&mut SessionState)) -> bool {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch.0 {
            tracing::debug!("Discarding result from epoch {} (now {})", epoch.0, inner.epoch);
            return false;
        }
        update(&mut inner.state);
        true
    }

    /// Mark a stage as started and clear its previous error
    pub fn begin(&self, epoch: Epoch, stage: Stage) -> bool {
        self.update(epoch, |state| {
            let status = state.stages.get_mut(stage);
            status.in_flight += 1;
            status.error = None;
        })
    }

    /// Mark a stage as finished, recording `error` if it failed, then apply `update`
    pub fn finish(
        &self,
        epoch: Epoch,
        stage: Stage,
        error: Option<String>,
        update: impl FnOnce(&mut SessionState),
    ) -> bool {
        self.update(epoch, |state| {
            let status = state.stages.get_mut(stage);
            status.in_flight = status.in_flight.saturating_sub(1);
            if error.is_some() {
                status.error = error;
            }
            update(state);
        })
    }

    /// Record a stage failure that happened before any request was issued
    pub fn record_error(&self, epoch: Epoch, stage: Stage, error: impl Into<String>) -> bool {
        let error = error.into();
        self.update(epoch, |state| state.stages.get_mut(stage).error = Some(error))
    }

    /// Build a version with a fresh id; does not append it
    pub fn new_version(&self, image_url: String, prompt: String, style: InfographicStyle) -> ImageVersion {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let created_at = chrono::Utc::now();

        ImageVersion {
            id: format!("{}-{}", created_at.timestamp_millis(), sequence),
            image_url,
            prompt,
            style,
            created_at,
        }
    }

    /// Append a version and select it; no-op if the session was reset since `epoch`
    pub fn append_image(&self, epoch: Epoch, version: ImageVersion) -> bool {
        self.update(epoch, |state| state.push_image(version))
    }

    /// Select an image version by index
    pub fn set_current_index(&self, index: usize) -> Result<(), StudioError> {
        let mut inner = self.inner.lock();
        let count = inner.state.images.len();
        if index >= count {
            return Err(StudioError::InvalidInput(format!(
                "Image index {index} is out of range ({count} versions)"
            )));
        }
        inner.state.current_index = index;
        Ok(())
    }

    /// Step to the previous version, staying on the first one
    pub fn previous(&self) -> Option<ImageVersion> {
        let mut inner = self.inner.lock();
        let state = &mut inner.state;
        state.current_index = state.current_index.saturating_sub(1);
        state.current_image().cloned()
    }

    /// Step to the next version, staying on the newest one
    pub fn next(&self) -> Option<ImageVersion> {
        let mut inner = self.inner.lock();
        let state = &mut inner.state;
        if state.current_index + 1 < state.images.len() {
            state.current_index += 1;
        }
        state.current_image().cloned()
    }

    /// Replace the image prompt, e.g. after the user edits it
    pub fn set_prompt(&self, prompt: impl Into<String>) {
        self.inner.lock().state.prompt = Some(prompt.into());
    }

    pub fn set_style(&self, style: InfographicStyle) {
        self.inner.lock().state.active_style = style;
    }

    /// Reset every field and invalidate all in-flight results in one step
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.epoch += 1;
        inner.state = SessionState::default();
        tracing::info!("Session cleared (epoch {})", inner.epoch);
    }
}
