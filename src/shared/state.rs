//! Live scanner status shared with the consumer

use crate::analysis::{ParsedCardFields, ScannedCard};
use crate::vision::ModelStatus;

/// Snapshot of a scan session, readable while the session runs
#[derive(Debug, Clone)]
pub struct ScannerStatus {
    /// Session identifier
    pub session_id: String,
    /// OCR model status text
    pub model_status: String,
    /// Model error (if any)
    pub model_error: Option<String>,
    /// Whether the OCR model is ready
    pub is_model_ready: bool,
    /// Whether the scan loop is running
    pub is_scanning: bool,
    /// Seconds left before timeout
    pub countdown: u32,
    /// Number of frames that reached the accumulators
    pub ticks: u64,
    /// Fields to display this tick
    pub display_fields: ParsedCardFields,
    /// Terminal result, once the session finished
    pub result: Option<ScannedCard>,
}

impl ScannerStatus {
    /// Create the initial status for a session
    pub fn new(session_id: impl Into<String>, timeout_secs: u32) -> Self {
        Self {
            session_id: session_id.into(),
            model_status: ModelStatus::Loading.describe(),
            model_error: None,
            is_model_ready: false,
            is_scanning: false,
            countdown: timeout_secs,
            ticks: 0,
            display_fields: ParsedCardFields::default(),
            result: None,
        }
    }

    /// Record the OCR model status
    pub fn set_model_status(&mut self, status: &ModelStatus) {
        self.model_status = status.describe();
        self.is_model_ready = *status == ModelStatus::Ready;
        if let ModelStatus::Failed(e) = status {
            self.model_error = Some(e.clone());
        }
    }

    /// Record the terminal result and stop scanning
    pub fn finish(&mut self, result: ScannedCard) {
        self.is_scanning = false;
        self.result = Some(result);
    }

    /// Lifecycle phase of the session
    pub fn phase(&self) -> &'static str {
        if self.is_scanning {
            "scanning"
        } else if self.result.is_some() {
            "finished"
        } else if self.is_model_ready {
            "stopped"
        } else {
            "not started"
        }
    }

    /// One-line status report
    pub fn summary(&self) -> String {
        format!(
            "Session {} {} ({}): {} frame(s) accumulated, {}s left",
            self.session_id,
            self.phase(),
            self.model_status,
            self.ticks,
            self.countdown
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_status() {
        let status = ScannerStatus::new("abc", 120);
        assert_eq!(status.countdown, 120);
        assert_eq!(status.model_status, "Loading OCR model...");
        assert!(!status.is_model_ready);
        assert!(status.result.is_none());
    }

    #[test]
    fn test_model_failure_recorded() {
        let mut status = ScannerStatus::new("abc", 120);
        status.set_model_status(&ModelStatus::Failed("missing weights".to_string()));
        assert_eq!(status.model_error.as_deref(), Some("missing weights"));
        assert_eq!(status.model_status, "Model error: missing weights");
        assert!(!status.is_model_ready);

        status.set_model_status(&ModelStatus::Ready);
        assert!(status.is_model_ready);
    }

    #[test]
    fn test_summary_reports_phase() {
        let mut status = ScannerStatus::new("abc", 120);
        assert_eq!(status.phase(), "not started");

        status.set_model_status(&ModelStatus::Ready);
        status.is_scanning = true;
        status.ticks = 3;
        status.countdown = 117;
        assert_eq!(
            status.summary(),
            "Session abc scanning (OCR model ready): 3 frame(s) accumulated, 117s left"
        );

        status.is_scanning = false;
        assert_eq!(status.phase(), "stopped");

        status.finish(ScannedCard::default());
        assert_eq!(status.phase(), "finished");
    }

    #[test]
    fn test_finish() {
        let mut status = ScannerStatus::new("abc", 120);
        status.is_scanning = true;
        status.finish(ScannedCard::default());
        assert!(!status.is_scanning);
        assert!(status.result.is_some());
    }
}
