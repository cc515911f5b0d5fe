//! # Layer Runtime
//!
//! Time-indexed layer implementations.
//!
//! Responsibilities:
//! - WMS request-parameter model with merge semantics
//! - Mock layer that simulates asynchronous reloads and emits
//!   load-start/load-end events, for testing and development without a
//!   map-rendering host
//!
//! # Example
//!
//! ```ignore
//! use layer_runtime::MockWmsLayer;
//!
//! let layer = MockWmsLayer::builder("radar").reload_ms(25).build();
//! let sub = layer.subscribe(Arc::new(|event| println!("{event:?}")));
//! ```

mod mock;
mod params;

pub use mock::{build_layers, MockWmsLayer, MockWmsLayerBuilder};
pub use params::WmsParams;

// Re-export contracts types
pub use contracts::{LayerEvent, LayerEventKind, LayerMetadata, TimeLayer};
