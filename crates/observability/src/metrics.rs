//! Tick metric collection
//!
//! Collects and aggregates synchronizer metrics from `TickRecord`s.

use contracts::{SkipReason, TickRecord};
use metrics::{counter, gauge, histogram};

/// Record metrics from one TickRecord
///
/// Call once per tick, after the agent resolves the tick.
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_tick_metrics;
///
/// let record = driver.resolve_tick()?;
/// record_tick_metrics(&record);
/// ```
pub fn record_tick_metrics(record: &TickRecord) {
    // Tick sequence (detects gaps)
    gauge!("timesync_last_sequence").set(record.sequence as f64);

    let status = if record.in_range {
        "in_range"
    } else {
        "out_of_range"
    };
    counter!("timesync_records_total", "status" => status).increment(1);

    // Applied parameters and actual reloads
    histogram!("timesync_applied_per_tick").record(record.applied.len() as f64);
    let reloads = record.reload_count() as u64;
    if reloads > 0 {
        counter!("timesync_layer_reloads_total").increment(reloads);
    }

    // Skips by reason and layer
    for skipped in &record.skipped {
        let reason = match &skipped.reason {
            SkipReason::NoValidTime => "no_valid_time",
            SkipReason::ResolveFailed(_) => "resolve_failed",
        };
        counter!(
            "timesync_layer_skips_total",
            "layer_id" => skipped.layer_id.to_string(),
            "reason" => reason
        )
        .increment(1);
    }
}

/// Record how long the driver waited for layer reloads after a tick
pub fn record_ready_wait_ms(wait_ms: f64) {
    histogram!("timesync_ready_wait_ms").record(wait_ms);
}

/// Record a readiness stall (layers missed the per-tick deadline)
pub fn record_stall(pending: usize) {
    counter!("timesync_stalls_total").increment(1);
    gauge!("timesync_stalled_layers").set(pending as f64);
}

/// Record a tick record dispatched to a sink
pub fn record_record_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "timesync_records_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Tick metrics aggregator
///
/// Aggregates metrics in memory for summary reports.
#[derive(Debug, Clone, Default)]
pub struct TickMetricsAggregator {
    /// Total ticks seen
    pub total_ticks: u64,

    /// Ticks outside the active window
    pub out_of_range_ticks: u64,

    /// Total layer reloads started
    pub total_reloads: u64,

    /// Total layer skips
    pub total_skips: u64,

    /// Readiness stalls
    pub total_stalls: u64,

    /// Pending-at-start statistics
    pub pending_stats: RunningStats,

    /// Ready-wait statistics (milliseconds)
    pub ready_wait_stats: RunningStats,

    /// Per-layer skip counts
    pub skip_counts: std::collections::HashMap<String, u64>,
}

impl TickMetricsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one tick record into the aggregate
    pub fn update(&mut self, record: &TickRecord) {
        self.total_ticks += 1;
        if !record.in_range {
            self.out_of_range_ticks += 1;
        }

        self.total_reloads += record.reload_count() as u64;
        self.total_skips += record.skipped.len() as u64;
        self.pending_stats.push(record.pending_at_start as f64);

        for skipped in &record.skipped {
            *self
                .skip_counts
                .entry(skipped.layer_id.to_string())
                .or_insert(0) += 1;
        }
    }

    /// Fold one readiness wait into the aggregate
    pub fn record_wait(&mut self, wait_ms: f64) {
        self.ready_wait_stats.push(wait_ms);
    }

    /// Count a readiness stall
    pub fn record_stall(&mut self) {
        self.total_stalls += 1;
    }

    /// Produce a summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_ticks: self.total_ticks,
            out_of_range_ticks: self.out_of_range_ticks,
            total_reloads: self.total_reloads,
            total_skips: self.total_skips,
            total_stalls: self.total_stalls,
            out_of_range_rate: if self.total_ticks > 0 {
                self.out_of_range_ticks as f64 / self.total_ticks as f64 * 100.0
            } else {
                0.0
            },
            pending_at_start: StatsSummary::from(&self.pending_stats),
            ready_wait_ms: StatsSummary::from(&self.ready_wait_stats),
            layer_skip_counts: self.skip_counts.clone(),
        }
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metric summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub out_of_range_ticks: u64,
    pub total_reloads: u64,
    pub total_skips: u64,
    pub total_stalls: u64,
    pub out_of_range_rate: f64,
    pub pending_at_start: StatsSummary,
    pub ready_wait_ms: StatsSummary,
    pub layer_skip_counts: std::collections::HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Tick Metrics Summary ===")?;
        writeln!(f, "Total ticks: {}", self.total_ticks)?;
        writeln!(
            f,
            "Out-of-range ticks: {} ({:.2}%)",
            self.out_of_range_ticks, self.out_of_range_rate
        )?;
        writeln!(f, "Layer reloads: {}", self.total_reloads)?;
        writeln!(f, "Layer skips: {}", self.total_skips)?;
        writeln!(f, "Readiness stalls: {}", self.total_stalls)?;
        writeln!(f, "Pending at tick start: {}", self.pending_at_start)?;
        writeln!(f, "Ready wait (ms): {}", self.ready_wait_ms)?;

        if !self.layer_skip_counts.is_empty() {
            writeln!(f, "Layer skip counts:")?;
            for (layer, count) in &self.layer_skip_counts {
                writeln!(f, "  {}: {}", layer, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}
