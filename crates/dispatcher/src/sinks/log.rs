//! LogSink - logs tick record summary via tracing

use contracts::{RecordSink, TickRecord, TimeSyncError};
use tracing::{info, instrument};

/// Sink that logs tick record summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_record_summary(&self, record: &TickRecord) {
        info!(
            sink = %self.name,
            sequence = record.sequence,
            tick_time = %record.tick_time,
            in_range = record.in_range,
            applied = record.applied.len(),
            reloading = record.reload_count(),
            skipped = record.skipped.len(),
            "TickRecord received"
        );
    }
}

impl RecordSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, record),
        fields(sink = %self.name, sequence = record.sequence)
    )]
    async fn write(&mut self, record: &TickRecord) -> Result<(), TimeSyncError> {
        self.log_record_summary(record);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), TimeSyncError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), TimeSyncError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
