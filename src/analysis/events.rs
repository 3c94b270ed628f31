//! Scan progress events
//!
//! Observers are notified synchronously from inside a tick, after the
//! display fields for that tick have been computed.

use std::sync::Arc;
use tracing::info;

use super::card::CardField;

/// Things that happen during a scan session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A field reached its lock threshold
    FieldLocked {
        field: CardField,
        value: String,
    },
    /// One second of the timeout elapsed
    Countdown {
        remaining_secs: u32,
    },
    /// The session reached a terminal state
    Finished {
        timed_out: bool,
    },
}

/// Receives live scan output
pub trait ScanObserver: Send + Sync {
    /// Live multi-line text summary of the fields seen so far
    fn on_ocr_text(&self, _summary: &str) {}

    /// Structured progress event
    fn on_event(&self, _event: &ScanEvent) {}
}

/// Observer that writes scan progress to the log
#[derive(Debug, Default)]
pub struct LogObserver;

impl ScanObserver for LogObserver {
    fn on_ocr_text(&self, summary: &str) {
        info!("Scan progress:\n{}", summary);
    }

    fn on_event(&self, event: &ScanEvent) {
        match event {
            ScanEvent::FieldLocked { field, value } => info!("Locked {}: {}", field.label(), value),
            ScanEvent::Countdown { .. } => {}
            ScanEvent::Finished { timed_out } => {
                let reason = if *timed_out { "timed out" } else { "fields locked" };
                info!("Scan finished ({})", reason)
            }
        }
    }
}

/// Event emitter for broadcasting scan progress
#[derive(Clone, Default)]
pub struct EventEmitter {
    observers: Vec<Arc<dyn ScanObserver>>,
}

impl EventEmitter {
    /// Create a new event emitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer
    pub fn subscribe(&mut self, observer: Arc<dyn ScanObserver>) {
        self.observers.push(observer);
    }

    /// Number of registered observers
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Send the live summary to all observers
    pub fn ocr_text(&self, summary: &str) {
        for observer in &self.observers {
            observer.on_ocr_text(summary);
        }
    }

    /// Emit an event to all observers
    pub fn emit(&self, event: ScanEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        texts: Mutex<Vec<String>>,
        events: Mutex<Vec<ScanEvent>>,
    }

    impl ScanObserver for Recorder {
        fn on_ocr_text(&self, summary: &str) {
            self.texts.lock().push(summary.to_string());
        }

        fn on_event(&self, event: &ScanEvent) {
            self.events.lock().push(event.clone());
        }
    }

    #[test]
    fn test_emitter_fans_out() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());

        let mut emitter = EventEmitter::new();
        emitter.subscribe(first.clone());
        emitter.subscribe(second.clone());
        assert_eq!(emitter.observer_count(), 2);

        emitter.ocr_text("Bank: ...");
        emitter.emit(ScanEvent::Finished { timed_out: true });

        for recorder in [&first, &second] {
            assert_eq!(recorder.texts.lock().as_slice(), ["Bank: ...".to_string()]);
            assert_eq!(
                recorder.events.lock().as_slice(),
                [ScanEvent::Finished { timed_out: true }]
            );
        }
    }

    #[test]
    fn test_empty_emitter() {
        let emitter = EventEmitter::new();
        emitter.emit(ScanEvent::Countdown { remaining_secs: 3 });
        assert_eq!(emitter.observer_count(), 0);
    }
}
