//! Scripted replay backend
//!
//! Plays back recorded OCR output frame by frame. Used by the CLI to run a
//! scan session without a physical camera or model.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

use super::ocr::{ModelStatus, OcrError, OcrProvider};
use super::OcrDetection;
use crate::capture::frame::CapturedFrame;
use crate::capture::{CaptureError, CaptureProvider};

const FRAME_URI_PREFIX: &str = "replay://frame/";

/// Load a recorded session: one array of detections per frame
pub fn load_frames(path: &Path) -> Result<Vec<Vec<OcrDetection>>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read frames file: {:?}", path))?;
    let frames: Vec<Vec<OcrDetection>> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse frames file: {:?}", path))?;
    Ok(frames)
}

/// Load a single frame of detections
pub fn load_detections(path: &Path) -> Result<Vec<OcrDetection>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read detections file: {:?}", path))?;
    let detections: Vec<OcrDetection> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse detections file: {:?}", path))?;
    Ok(detections)
}

/// Camera stand-in that hands out sequential frame references
#[derive(Debug, Default)]
pub struct ReplayCamera {
    next_index: AtomicU64,
    /// Frames available before the camera runs dry (unbounded when `None`)
    limit: Option<u64>,
    released: AtomicBool,
}

impl ReplayCamera {
    /// Create a camera whose first frame has index 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a camera that stops returning frames after `limit` captures
    pub fn with_frame_limit(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

#[async_trait]
impl CaptureProvider for ReplayCamera {
    async fn capture(&self) -> Result<CapturedFrame, CaptureError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(CaptureError::Unavailable("replay camera released".to_string()));
        }
        let index = self.next_index.fetch_add(1, Ordering::SeqCst);
        if self.limit.is_some_and(|limit| index >= limit) {
            return Err(CaptureError::NoFrame);
        }
        Ok(CapturedFrame::new(format!("{}{}", FRAME_URI_PREFIX, index), index))
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// OCR stand-in returning recorded detections for each frame index
#[derive(Debug, Clone)]
pub struct ReplayOcr {
    frames: Vec<Vec<OcrDetection>>,
    /// Start over from the first frame once the recording is exhausted
    cycle: bool,
}

impl ReplayOcr {
    /// Wrap a recording; `cycle` restarts it once every frame was played
    pub fn new(frames: Vec<Vec<OcrDetection>>, cycle: bool) -> Self {
        Self { frames, cycle }
    }

    /// Number of recorded frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame_at(&self, index: u64) -> Vec<OcrDetection> {
        if self.frames.is_empty() {
            return vec![];
        }
        let index = index as usize;
        let slot = if self.cycle { index % self.frames.len() } else { index };
        self.frames.get(slot).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl OcrProvider for ReplayOcr {
    fn status(&self) -> ModelStatus {
        if self.frames.is_empty() {
            return ModelStatus::Failed("recording has no frames".to_string());
        }
        ModelStatus::Ready
    }

    async fn detect(&self, frame: &CapturedFrame) -> Result<Vec<OcrDetection>, OcrError> {
        if !frame.uri.starts_with(FRAME_URI_PREFIX) {
            return Err(OcrError::Inference(format!("not a replay frame: {}", frame.uri)));
        }
        let detections = self.frame_at(frame.index);
        debug!("Replay OCR: frame {} -> {} detections", frame.index, detections.len());
        Ok(detections)
    }
}
