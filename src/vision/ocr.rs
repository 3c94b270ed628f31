//! OCR (Optical Character Recognition) collaborator contract
//!
//! The text detection + recognition model is external; this module defines
//! what the scanner needs from it.

use async_trait::async_trait;
use thiserror::Error;

use super::OcrDetection;
use crate::capture::frame::CapturedFrame;

/// Errors reported by an OCR backend
#[derive(Debug, Clone, Error)]
pub enum OcrError {
    /// Inference on a single frame failed
    #[error("OCR inference failed: {0}")]
    Inference(String),
}

/// Loading state of the OCR model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelStatus {
    /// Model is still loading
    Loading,
    /// Model is ready for inference
    Ready,
    /// Model failed to load
    Failed(String),
}

impl ModelStatus {
    /// Human-readable status line
    pub fn describe(&self) -> String {
        match self {
            ModelStatus::Loading => "Loading OCR model...".to_string(),
            ModelStatus::Ready => "OCR model ready".to_string(),
            ModelStatus::Failed(e) => format!("Model error: {}", e),
        }
    }
}

/// OCR backend mapping a captured frame to text detections
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Current readiness of the underlying model
    fn status(&self) -> ModelStatus;

    /// Run text detection and recognition on a frame
    async fn detect(&self, frame: &CapturedFrame) -> Result<Vec<OcrDetection>, OcrError>;

    /// Release model resources. Called once when the scan session is torn down.
    fn release(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_status_describe() {
        assert_eq!(ModelStatus::Loading.describe(), "Loading OCR model...");
        assert_eq!(ModelStatus::Ready.describe(), "OCR model ready");
        assert_eq!(
            ModelStatus::Failed("no weights".to_string()).describe(),
            "Model error: no weights"
        );
    }

    #[test]
    fn test_error_display() {
        let err = OcrError::Inference("timeout".to_string());
        assert_eq!(err.to_string(), "OCR inference failed: timeout");
    }
}
