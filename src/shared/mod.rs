//! Shared state and messaging for a scan session
//!
//! This module provides the status snapshot exposed to the consumer and the
//! messages passed from in-flight capture work back to the scan loop.

pub mod messages;
pub mod state;

pub use messages::TickMessage;
pub use state::ScannerStatus;
