//! Card Analysis Layer
//!
//! Extracts card fields from OCR detections and decides, tick by tick,
//! which fields can be trusted. Everything here is pure and synchronous;
//! the scan loop in `app` owns the state between ticks.

pub mod accumulator;
pub mod card;
pub mod constants;
pub mod correction;
pub mod events;
pub mod parser;

pub use accumulator::{update_accumulator, AccumulatorState};
pub use card::{
    build_scanned_card, display_fields, ocr_text_summary, CardField, ParsedCardFields, ScannedCard,
};
pub use events::{EventEmitter, LogObserver, ScanEvent, ScanObserver};
pub use parser::parse_card_from_detections;
