//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - All instants are UTC (`chrono::DateTime<Utc>`)
//! - Outgoing layer parameters are ISO-8601 strings (`YYYY-MM-DDTHH:MM:SSZ`)
//! - `RequestId` tags every layer reload with the tick generation it belongs to

mod agent;
mod blueprint;
mod error;
mod layer;
mod layer_id;
mod options;
mod record;
mod sink;
mod time;

pub use agent::*;
pub use blueprint::*;
pub use error::*;
pub use layer::*;
pub use layer_id::LayerId;
pub use options::*;
pub use record::*;
pub use sink::*;
pub use time::*;
