//! FileSink - appends tick records to a JSON-lines file

use contracts::{RecordSink, TickRecord, TimeSyncError};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file path
    pub path: PathBuf,

    /// Truncate an existing file instead of appending
    pub truncate: bool,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./ticks.jsonl"));

        let truncate = params
            .get("truncate")
            .map(|v| v == "true")
            .unwrap_or(false);

        Self { path, truncate }
    }
}

/// Sink that appends one JSON line per tick record
pub struct FileSink {
    name: String,
    writer: BufWriter<File>,
    path: PathBuf,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(!config.truncate)
            .write(true)
            .truncate(config.truncate)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            writer: BufWriter::new(file),
            path: config.path,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    /// The file records are written to.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn append_record(&mut self, record: &TickRecord) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn persist_record(&mut self, record: &TickRecord) -> Result<(), TimeSyncError> {
        self.append_record(record).map_err(|e| {
            error!(sink = %self.name, sequence = record.sequence, error = %e, "Write failed");
            TimeSyncError::sink_write(&self.name, e.to_string())
        })
    }
}

impl RecordSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, record),
        fields(sink = %self.name, sequence = record.sequence)
    )]
    async fn write(&mut self, record: &TickRecord) -> Result<(), TimeSyncError> {
        self.persist_record(record)?;
        Ok(())
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), TimeSyncError> {
        self.writer
            .flush()
            .map_err(|e| TimeSyncError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), TimeSyncError> {
        self.writer
            .flush()
            .map_err(|e| TimeSyncError::sink_write(&self.name, e.to_string()))?;
        debug!(sink = %self.name, path = %self.path.display(), "FileSink closed");
        Ok(())
    }
}
