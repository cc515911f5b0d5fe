//! # Dispatcher
//!
//! Record dispatch module.
//!
//! Responsibilities:
//! - Consume `TickRecord`s from the timeline driver
//! - Fan-out to multiple sinks
//! - Isolate slow sinks so they cannot stall the tick loop

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{RecordSink, TickRecord};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, LogSink};
