//! Message types sent from in-flight capture work back to the scan loop

use crate::capture::CaptureError;
use crate::vision::{OcrDetection, OcrError};

/// Outcome of one capture + OCR cycle
#[derive(Debug, Clone)]
pub enum TickMessage {
    /// Camera returned no frame
    CaptureFailed(CaptureError),
    /// OCR inference failed on the captured frame
    InferenceFailed(OcrError),
    /// OCR finished for the given frame
    Detections {
        frame_index: u64,
        detections: Vec<OcrDetection>,
    },
}
