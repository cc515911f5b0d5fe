//! RecordSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for sinks.

use crate::{TickRecord, TimeSyncError};

/// Record output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(RecordSink: Send)]
pub trait LocalRecordSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one tick record
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, record: &TickRecord) -> Result<(), TimeSyncError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), TimeSyncError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), TimeSyncError>;
}
