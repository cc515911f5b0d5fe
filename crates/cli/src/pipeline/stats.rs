//! Animation statistics and metrics.

use std::time::Duration;

use observability::TickMetricsAggregator;

/// Statistics from an animation run
#[derive(Debug, Clone, Default)]
pub struct AnimationStats {
    /// Total ticks driven
    pub ticks: u64,

    /// Ticks inside the active window
    pub in_range_ticks: u64,

    /// Total layer reloads started
    pub reloads_started: u64,

    /// Ticks whose layers missed the readiness deadline
    pub stalls: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Number of managed layers
    pub active_layers: usize,

    /// Number of sinks that received records
    pub active_sinks: usize,

    /// Tick metrics aggregator
    pub tick_metrics: TickMetricsAggregator,
}

impl AnimationStats {
    /// Calculate ticks per second throughput
    pub fn ticks_per_second(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.ticks as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Calculate stall rate as percentage
    #[allow(dead_code)]
    pub fn stall_rate(&self) -> f64 {
        if self.ticks > 0 {
            (self.stalls as f64 / self.ticks as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Animation Statistics ===\n");

        println!("Overview");
        println!("   Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   Ticks driven: {}", self.ticks);
        println!("   In-range ticks: {}", self.in_range_ticks);
        println!("   Ticks/sec: {:.2}", self.ticks_per_second());
        println!("   Managed layers: {}", self.active_layers);
        println!("   Active sinks: {}", self.active_sinks);

        let summary = self.tick_metrics.summary();

        println!("\nSynchronizer Metrics");
        println!("   Layer reloads started: {}", self.reloads_started);
        println!("   Layer skips: {}", summary.total_skips);
        println!(
            "   Readiness stalls: {} ({:.2}%)",
            self.stalls,
            self.stall_rate()
        );
        println!("   Pending at tick start: {}", summary.pending_at_start);
        println!("   Ready wait (ms): {}", summary.ready_wait_ms);

        if !summary.layer_skip_counts.is_empty() {
            println!("\nLayer Skip Counts");
            for (layer, count) in &summary.layer_skip_counts {
                println!("   {}: {}", layer, count);
            }
        }

        println!();
    }
}
