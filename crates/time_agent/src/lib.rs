//! # Time Agent
//!
//! Tick-driven synchronizer for time-indexed map layers.
//!
//! Responsibilities:
//! - Per-tick time resolution (interval snapping, range modes)
//! - Applying ISO-8601 time parameters to managed layers
//! - Gating tick advancement on pending layer reloads
//!
//! ## Usage example
//!
//! ```ignore
//! use contracts::{SyncOptions, TimeAgent, TimeRange, TimeTick};
//! use time_agent::WmsTimeAgent;
//!
//! let mut agent = WmsTimeAgent::new(SyncOptions::default(), range)?;
//! agent.add_layer(layer)?;
//!
//! let outcome = agent.on_tick(&TimeTick::at(now))?;
//! agent.wait_ready(std::time::Duration::from_secs(10)).await?;
//! ```

mod agent;
mod instants;
mod resolve;
mod units;

pub use agent::{SyncState, WmsTimeAgent};
pub use instants::{find_nearest_instants, InstantSearch};
pub use resolve::{resolve_time, TimeResolution};
pub use units::add_units;

// Re-export contracts types
pub use contracts::{
    IntervalMode, RangeMode, SyncOptions, TickOutcome, TimeAgent, TimeParam, TimeRange, TimeTick,
};
