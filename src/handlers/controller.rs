use std::sync::{Arc, Mutex};

use crate::models::{AnalysisResult, LifecycleState};
use crate::services::{encode_image, AnalysisError, AnalysisService, PreviewStore};

/// The raw file the user picked, plus its live preview token.
struct SelectedImage {
    bytes: Vec<u8>,
    declared_mime: Option<String>,
    preview_token: u64,
}

struct ControllerInner {
    state: LifecycleState,
    selected: Option<SelectedImage>,
    /// Ticket of the most recent request. An in-flight call may only
    /// apply its outcome while its ticket is still the current one;
    /// anything older is stale and dropped.
    generation: u64,
}

/// Owns the single request lifecycle: idle → loading → succeeded/failed.
/// All transitions happen here, under one lock, in response to user
/// actions or completion of the in-flight call. Lock scopes are short
/// and never cross an await point.
pub struct AnalysisController {
    service: Arc<dyn AnalysisService>,
    previews: Arc<PreviewStore>,
    inner: Mutex<ControllerInner>,
}

impl AnalysisController {
    pub fn new(service: Arc<dyn AnalysisService>, previews: Arc<PreviewStore>) -> Self {
        Self {
            service,
            previews,
            inner: Mutex::new(ControllerInner {
                state: LifecycleState::Idle,
                selected: None,
                generation: 0,
            }),
        }
    }

    /// Select a new image from any state: the previous preview is
    /// released, the new one registered, prior result/error cleared, and
    /// any in-flight call superseded. Returns the generation ticket to
    /// pass to `run_analysis`.
    pub fn select_image(&self, bytes: Vec<u8>, declared_mime: Option<String>) -> u64 {
        let mut inner = self.lock();
        inner.generation += 1;
        let generation = inner.generation;

        if let Some(old) = inner.selected.take() {
            self.previews.remove(old.preview_token);
        }

        let preview_mime = declared_mime.as_deref().unwrap_or("application/octet-stream");
        let preview_token = self.previews.insert(preview_mime, bytes.clone());

        log::info!(
            "📸 Image selected ({} bytes, request #{})",
            bytes.len(),
            generation
        );

        inner.selected = Some(SelectedImage {
            bytes,
            declared_mime,
            preview_token,
        });
        inner.state = LifecycleState::Loading;
        generation
    }

    /// Re-issue the held image through the same path as a fresh
    /// selection. Only meaningful from `Failed`; anywhere else it is a
    /// no-op. The preview token stays, it is still the same image.
    pub fn retry(&self) -> Option<u64> {
        let mut inner = self.lock();
        if !matches!(inner.state, LifecycleState::Failed(_)) {
            log::warn!("⚠️ Retry requested outside the failed state, ignoring");
            return None;
        }
        if inner.selected.is_none() {
            log::warn!("⚠️ Retry requested with no image selected, ignoring");
            return None;
        }

        inner.generation += 1;
        inner.state = LifecycleState::Loading;
        log::info!("🔁 Retrying analysis as request #{}", inner.generation);
        Some(inner.generation)
    }

    /// Back to the start screen from any state. Releases the preview and
    /// invalidates any in-flight call.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        if let Some(old) = inner.selected.take() {
            self.previews.remove(old.preview_token);
        }
        inner.state = LifecycleState::Idle;
        log::info!("↩️ Reset to idle");
    }

    /// Drive the request identified by `generation` to completion:
    /// encode, call the analysis service once, apply the outcome. Does
    /// nothing if the request has already been superseded.
    pub async fn run_analysis(&self, generation: u64) {
        let snapshot = {
            let inner = self.lock();
            if inner.generation != generation {
                log::debug!("⏭️ Request #{} superseded before start", generation);
                return;
            }
            inner
                .selected
                .as_ref()
                .map(|s| (s.bytes.clone(), s.declared_mime.clone()))
        };
        let Some((bytes, declared_mime)) = snapshot else {
            return;
        };

        let encoded = match encode_image(&bytes, declared_mime.as_deref()) {
            Ok(encoded) => encoded,
            Err(e) => {
                self.apply_outcome(generation, Err(e));
                return;
            }
        };

        let outcome = self.service.analyze(&encoded).await;
        self.apply_outcome(generation, outcome);
    }

    /// Apply a completed call's outcome, unless a newer request has been
    /// issued in the meantime. A stale outcome must never overwrite the
    /// state of a later request, whichever order they resolve in.
    pub fn apply_outcome(
        &self,
        generation: u64,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) {
        let mut inner = self.lock();
        if inner.generation != generation {
            log::info!(
                "⏭️ Dropping stale outcome for request #{} (current is #{})",
                generation,
                inner.generation
            );
            return;
        }

        inner.state = match outcome {
            Ok(result) => {
                log::info!("✅ Request #{} succeeded: '{}'", generation, result.dish_name);
                LifecycleState::Succeeded(result)
            }
            Err(e) => {
                log::error!("❌ Request #{} failed: {}", generation, e);
                LifecycleState::Failed(e.to_string())
            }
        };
    }

    /// Select then drive to completion. The single entry point used by
    /// the web layer.
    pub async fn analyze_image(&self, bytes: Vec<u8>, declared_mime: Option<String>) {
        let generation = self.select_image(bytes, declared_mime);
        self.run_analysis(generation).await;
    }

    /// Re-run the failed request to completion, if there is one.
    pub async fn retry_analysis(&self) {
        if let Some(generation) = self.retry() {
            self.run_analysis(generation).await;
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().state.clone()
    }

    pub fn preview_token(&self) -> Option<u64> {
        self.lock().selected.as_ref().map(|s| s.preview_token)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ControllerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for AnalysisController {
    fn drop(&mut self) {
        let mut inner = self.lock();
        if let Some(selected) = inner.selected.take() {
            self.previews.remove(selected.preview_token);
        }
    }
}
