//! Frame references for captured camera content

use std::time::Instant;

/// A frame captured from the camera.
///
/// Pixel data stays with the camera collaborator; the scanner only passes
/// the reference on to OCR.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Location of the captured image (e.g. `file:///tmp/frame.jpg`)
    pub uri: String,
    /// Sequence number within the capture session
    pub index: u64,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl CapturedFrame {
    /// Create a new captured frame reference
    pub fn new(uri: impl Into<String>, index: u64) -> Self {
        Self {
            uri: uri.into(),
            index,
            timestamp: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frame() {
        let frame = CapturedFrame::new("file:///tmp/photo.jpg", 3);
        assert_eq!(frame.uri, "file:///tmp/photo.jpg");
        assert_eq!(frame.index, 3);
        assert!(frame.timestamp <= Instant::now());
    }
}
