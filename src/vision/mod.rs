//! Vision/OCR Layer
//!
//! Text detections produced by an OCR collaborator for each captured frame.
//! The OCR model itself lives outside this crate; backends plug in through
//! [`OcrProvider`].

pub mod ocr;
pub mod replay;

use serde::{Deserialize, Serialize};

pub use ocr::{ModelStatus, OcrError, OcrProvider};
pub use replay::{load_detections, load_frames, ReplayCamera, ReplayOcr};

/// Corner point of a detection's bounding polygon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BboxPoint {
    pub x: f32,
    pub y: f32,
}

/// Detected text region from OCR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrDetection {
    /// Recognized text content
    pub text: String,
    /// Recognition confidence (0.0 - 1.0); unscored detections count as certain
    #[serde(default = "full_confidence")]
    pub score: f32,
    /// Bounding polygon corners, top-left first
    #[serde(default)]
    pub bbox: Option<Vec<BboxPoint>>,
}

fn full_confidence() -> f32 {
    1.0
}

impl OcrDetection {
    /// Create a detection without a bounding box
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            score: full_confidence(),
            bbox: None,
        }
    }

    /// Top-left corner of the bounding polygon, if one was reported
    pub fn top_left(&self) -> Option<BboxPoint> {
        self.bbox.as_ref().and_then(|points| points.first().copied())
    }
}

/// Drop detections scoring below the recognition threshold
pub fn filter_by_score(detections: Vec<OcrDetection>, threshold: f32) -> Vec<OcrDetection> {
    if threshold <= 0.0 {
        return detections;
    }
    detections
        .into_iter()
        .filter(|d| d.score >= threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_left() {
        assert_eq!(OcrDetection::new("x").top_left(), None);

        let boxed = OcrDetection {
            bbox: Some(vec![BboxPoint { x: 10.0, y: 20.0 }, BboxPoint { x: 90.0, y: 20.0 }]),
            ..OcrDetection::new("x")
        };
        assert_eq!(boxed.top_left(), Some(BboxPoint { x: 10.0, y: 20.0 }));

        let empty = OcrDetection {
            text: "x".to_string(),
            score: 0.5,
            bbox: Some(vec![]),
        };
        assert_eq!(empty.top_left(), None);
    }

    #[test]
    fn test_detection_deserialize_without_bbox() {
        let json = r#"[
            {"text": "4111", "score": 0.9},
            {"text": "JOHN", "bbox": [{"x": 1, "y": 2}]}
        ]"#;
        let parsed: Vec<OcrDetection> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].bbox.is_none());
        assert_eq!(parsed[1].score, 1.0);
        assert_eq!(parsed[1].top_left(), Some(BboxPoint { x: 1.0, y: 2.0 }));
    }

    #[test]
    fn test_filter_by_score() {
        let mut low = OcrDetection::new("low");
        low.score = 0.2;
        let high = OcrDetection::new("high");

        let kept = filter_by_score(vec![low.clone(), high.clone()], 0.5);
        assert_eq!(kept, vec![high.clone()]);

        let all = filter_by_score(vec![low, high], 0.0);
        assert_eq!(all.len(), 2);

        let unscored: Vec<OcrDetection> = serde_json::from_str(r#"[{"text": "4111"}]"#).unwrap();
        assert_eq!(filter_by_score(unscored, 0.5).len(), 1);
    }
}
