//! Scan Orchestrator
//!
//! Drives one card scan session: waits for the OCR model, then interleaves a
//! capture -> OCR -> parse -> accumulate tick with a one-second countdown
//! until every required field is locked or the timeout expires.
//!
//! Accumulation state is owned by the session loop and only touched from
//! inside a tick. Capture and OCR run in a spawned task that reports back
//! over a channel; at most one such task is in flight at a time.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::analysis::{
    build_scanned_card, display_fields, ocr_text_summary, parse_card_from_detections,
    update_accumulator, AccumulatorState, CardField, EventEmitter, ParsedCardFields, ScanEvent,
    ScanObserver, ScannedCard,
};
use crate::capture::CaptureProvider;
use crate::config::{CompletionPolicy, ConfigError, OcrSettings, ScannerSettings};
use crate::shared::{ScannerStatus, TickMessage};
use crate::vision::{filter_by_score, ModelStatus, OcrDetection, OcrProvider};

/// Errors that end a scan session without a result
#[derive(Debug, Error)]
pub enum ScanError {
    /// No camera was supplied to the builder
    #[error("no capture provider configured")]
    MissingCapture,

    /// No OCR backend was supplied to the builder
    #[error("no OCR provider configured")]
    MissingOcr,

    /// Scanner settings cannot be used
    #[error("invalid scanner configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// OCR model failed to initialize; recreate the scanner to retry
    #[error("OCR model unavailable: {0}")]
    ModelUnavailable(String),

    /// The consumer closed the scanner before it finished
    #[error("scan session cancelled")]
    Cancelled,
}

/// Outcome of feeding one frame into a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickResult {
    /// Session already finished; the frame was discarded
    Stale,
    /// Frame held no detections
    Empty,
    /// Frame was parsed and accumulated
    Progress(TickProgress),
}

/// What changed during an accumulated tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickProgress {
    /// Fields parsed from this frame alone
    pub parsed: ParsedCardFields,
    /// Fields to show the user
    pub display: ParsedCardFields,
    /// Fields that locked on this tick
    pub newly_locked: Vec<(CardField, String)>,
    /// Whether the completion policy is now satisfied
    pub complete: bool,
}

/// Accumulation state for one scan session
#[derive(Debug, Clone)]
pub struct ScanSession {
    state: AccumulatorState,
    locked: ParsedCardFields,
    required_ticks: u32,
    completion: CompletionPolicy,
    finished: bool,
}

impl ScanSession {
    /// Create an empty session
    pub fn new(required_ticks: u32, completion: CompletionPolicy) -> Self {
        Self {
            state: AccumulatorState::default(),
            locked: ParsedCardFields::default(),
            required_ticks,
            completion,
            finished: false,
        }
    }

    /// Fields locked so far
    pub fn locked(&self) -> &ParsedCardFields {
        &self.locked
    }

    /// Parse a frame and fold it into the accumulators
    pub fn apply(&mut self, detections: &[OcrDetection]) -> TickResult {
        if self.finished {
            return TickResult::Stale;
        }
        if detections.is_empty() {
            return TickResult::Empty;
        }

        let parsed = parse_card_from_detections(detections);
        let update = update_accumulator(&self.state, &self.locked, &parsed, self.required_ticks);

        let newly_locked = CardField::ALL
            .iter()
            .filter(|field| field.get(&self.locked).is_none())
            .filter_map(|field| field.get(&update.locked).map(|v| (*field, v.to_string())))
            .collect();
        let complete = match self.completion {
            CompletionPolicy::AllFields => update.all_locked,
            CompletionPolicy::Essentials => update.locked.has_essentials(),
        };
        let display = display_fields(&update.locked, &parsed, &update.state.expiry_digits);

        self.state = update.state;
        self.locked = update.locked;

        TickResult::Progress(TickProgress {
            parsed,
            display,
            newly_locked,
            complete,
        })
    }

    /// Freeze the session and build its terminal result
    pub fn finish(&mut self, timed_out: bool) -> ScannedCard {
        self.finished = true;
        build_scanned_card(&self.locked, timed_out)
    }
}

/// Builder wiring collaborators into a [`CardScanner`]
pub struct CardScannerBuilder {
    settings: ScannerSettings,
    ocr_settings: OcrSettings,
    camera: Option<Arc<dyn CaptureProvider>>,
    ocr: Option<Arc<dyn OcrProvider>>,
    events: EventEmitter,
}

impl CardScannerBuilder {
    /// Camera backend
    pub fn camera(mut self, camera: Arc<dyn CaptureProvider>) -> Self {
        self.camera = Some(camera);
        self
    }

    /// OCR backend
    pub fn ocr(mut self, ocr: Arc<dyn OcrProvider>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    /// OCR filtering settings
    pub fn ocr_settings(mut self, ocr_settings: OcrSettings) -> Self {
        self.ocr_settings = ocr_settings;
        self
    }

    /// Observer notified after every accumulated tick
    pub fn observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.events.subscribe(observer);
        self
    }

    /// Validate the configuration and create the scanner
    pub fn build(self) -> Result<CardScanner, ScanError> {
        self.settings.validate()?;
        let camera = self.camera.ok_or(ScanError::MissingCapture)?;
        let ocr = self.ocr.ok_or(ScanError::MissingOcr)?;

        let session_id = Uuid::new_v4();
        let status = ScannerStatus::new(session_id.to_string(), self.settings.timeout_secs);

        Ok(CardScanner {
            settings: self.settings,
            ocr_settings: self.ocr_settings,
            camera,
            ocr,
            events: self.events,
            status: Arc::new(RwLock::new(status)),
            shutdown: CancellationToken::new(),
            session_id,
        })
    }
}

/// A single card scan session over injected camera and OCR backends
pub struct CardScanner {
    settings: ScannerSettings,
    ocr_settings: OcrSettings,
    camera: Arc<dyn CaptureProvider>,
    ocr: Arc<dyn OcrProvider>,
    events: EventEmitter,
    status: Arc<RwLock<ScannerStatus>>,
    shutdown: CancellationToken,
    session_id: Uuid,
}

impl CardScanner {
    /// Start configuring a scanner
    pub fn builder(settings: ScannerSettings) -> CardScannerBuilder {
        CardScannerBuilder {
            settings,
            ocr_settings: OcrSettings::default(),
            camera: None,
            ocr: None,
            events: EventEmitter::new(),
        }
    }

    /// Session identifier
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Live status handle, readable while [`run`](Self::run) is in progress
    pub fn status(&self) -> Arc<RwLock<ScannerStatus>> {
        self.status.clone()
    }

    /// Token that closes the scanner when cancelled, stopping both loops and
    /// any in-flight capture
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the session to completion.
    ///
    /// Returns the scanned card once all required fields lock or the timeout
    /// expires. Camera and OCR are released when this returns.
    pub async fn run(self) -> Result<ScannedCard, ScanError> {
        let span = info_span!("scan", session = %self.session_id);
        let _guard = self.shutdown.clone().drop_guard();
        debug!("{} observer(s) attached", self.events.observer_count());

        let result = async {
            self.wait_for_model().await?;
            self.scan_loop().await
        }
        .instrument(span)
        .await;

        self.camera.release();
        self.ocr.release();
        result
    }

    fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.settings.scan_interval_ms)
    }

    async fn wait_for_model(&self) -> Result<(), ScanError> {
        info!("Loading OCR model...");
        loop {
            let model = self.ocr.status();
            self.status.write().set_model_status(&model);

            match model {
                ModelStatus::Ready => {
                    info!("OCR model ready");
                    return Ok(());
                }
                ModelStatus::Failed(e) => {
                    error!("OCR model error: {}", e);
                    return Err(ScanError::ModelUnavailable(e));
                }
                ModelStatus::Loading => debug!("OCR model still loading"),
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => return Err(ScanError::Cancelled),
                _ = tokio::time::sleep(self.scan_interval()) => {}
            }
        }
    }

    async fn scan_loop(&self) -> Result<ScannedCard, ScanError> {
        let mut session = ScanSession::new(self.settings.required_ticks, self.settings.completion);
        let (tx, mut rx) = mpsc::channel::<TickMessage>(1);
        let mut in_flight: Option<JoinHandle<()>> = None;

        let mut scan_timer = interval(self.scan_interval());
        scan_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let one_second = Duration::from_secs(1);
        let mut countdown_timer = interval_at(Instant::now() + one_second, one_second);
        let mut remaining = self.settings.timeout_secs;

        info!("Starting {}s countdown", remaining);
        {
            let mut status = self.status.write();
            status.is_scanning = true;
            status.countdown = remaining;
        }

        let outcome = loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    info!("Scanner closed");
                    break Err(ScanError::Cancelled);
                }
                Some(message) = rx.recv() => {
                    in_flight = None;
                    scan_timer.reset();
                    if let Some(card) = self.handle_tick(&mut session, message) {
                        break Ok(card);
                    }
                }
                _ = countdown_timer.tick() => {
                    remaining = remaining.saturating_sub(1);
                    self.status.write().countdown = remaining;
                    self.events.emit(ScanEvent::Countdown { remaining_secs: remaining });
                    if remaining == 0 {
                        info!("Scan timed out");
                        debug!("Locked at timeout: {:?}", session.locked());
                        break Ok(self.finish(&mut session, true));
                    }
                }
                _ = scan_timer.tick(), if in_flight.is_none() => {
                    in_flight = Some(self.spawn_capture(tx.clone()));
                }
            }
        };

        if let Some(handle) = in_flight.take() {
            debug!("Aborting in-flight capture");
            handle.abort();
        }
        self.status.write().is_scanning = false;
        outcome
    }

    /// Run one capture + OCR cycle in the background
    fn spawn_capture(&self, tx: mpsc::Sender<TickMessage>) -> JoinHandle<()> {
        let camera = self.camera.clone();
        let ocr = self.ocr.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(
            async move {
                let message = tokio::select! {
                    _ = shutdown.cancelled() => return,
                    message = capture_and_detect(camera.as_ref(), ocr.as_ref()) => message,
                };
                // Receiver is gone once the session finished
                let _ = tx.send(message).await;
            }
            .instrument(Span::current()),
        )
    }

    /// Fold a finished capture cycle into the session
    fn handle_tick(&self, session: &mut ScanSession, message: TickMessage) -> Option<ScannedCard> {
        let (frame_index, detections) = match message {
            TickMessage::CaptureFailed(e) => {
                debug!("Capture skipped: {}", e);
                return None;
            }
            TickMessage::InferenceFailed(e) => {
                warn!("{}", e);
                return None;
            }
            TickMessage::Detections {
                frame_index,
                detections,
            } => (frame_index, detections),
        };

        let detections = filter_by_score(detections, self.ocr_settings.recognition_threshold);
        debug!(
            frame = frame_index,
            "Detections: {:?}",
            detections.iter().map(|d| d.text.as_str()).collect::<Vec<_>>()
        );

        let progress = match session.apply(&detections) {
            TickResult::Stale => {
                debug!("Result arrived after session finished, discarding");
                return None;
            }
            TickResult::Empty => {
                debug!("No text detected");
                return None;
            }
            TickResult::Progress(progress) => progress,
        };

        debug!("Parsed: {:?}", progress.parsed);
        {
            let mut status = self.status.write();
            status.ticks += 1;
            status.display_fields = progress.display.clone();
        }
        self.events.ocr_text(&ocr_text_summary(&progress.display));
        for (field, value) in progress.newly_locked {
            debug!("Locked {:?}: {}", field, value);
            self.events.emit(ScanEvent::FieldLocked { field, value });
        }

        if progress.complete {
            info!("All required fields locked");
            debug!("Locked: {:?}", session.locked());
            return Some(self.finish(session, false));
        }
        None
    }

    fn finish(&self, session: &mut ScanSession, timed_out: bool) -> ScannedCard {
        let card = session.finish(timed_out);
        self.status.write().finish(card.clone());
        self.events.emit(ScanEvent::Finished { timed_out });
        card
    }
}

async fn capture_and_detect(camera: &dyn CaptureProvider, ocr: &dyn OcrProvider) -> TickMessage {
    let frame = match camera.capture().await {
        Ok(frame) => frame,
        Err(e) => return TickMessage::CaptureFailed(e),
    };
    debug!("Captured frame {}: {}", frame.index, frame.uri);

    let result = ocr.detect(&frame).await;
    debug!("OCR on frame {} took {:?}", frame.index, frame.timestamp.elapsed());
    match result {
        Ok(detections) => TickMessage::Detections {
            frame_index: frame.index,
            detections,
        },
        Err(e) => TickMessage::InferenceFailed(e),
    }
}
