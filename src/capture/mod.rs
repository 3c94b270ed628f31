//! Camera Capture Layer
//!
//! Contract for the camera collaborator. Device lifecycle and pixel handling
//! belong to the host; the scanner only asks for one frame per tick.

pub mod frame;

use async_trait::async_trait;
use thiserror::Error;

use frame::CapturedFrame;

/// Errors reported by a camera backend
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    /// Camera returned without a frame
    #[error("no frame returned by camera")]
    NoFrame,

    /// Camera is not attached or has been released
    #[error("camera unavailable: {0}")]
    Unavailable(String),
}

/// Camera backend producing one frame per request
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Capture a single frame
    async fn capture(&self) -> Result<CapturedFrame, CaptureError>;

    /// Release the camera. Called once when the scan session is torn down.
    fn release(&self) {}
}
