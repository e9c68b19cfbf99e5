//! OS-level CPU and memory sampling.

use std::time::Duration;

use sysinfo::System;
use tokio::task::JoinHandle;
use tracing::warn;

use super::recorder::Metrics;

/// Spawns the background CPU sampler.
///
/// The task owns the `sysinfo` handle and refreshes CPU utilization on its
/// own period, storing each reading into the registry. Snapshots report
/// whatever value was stored last and never wait for a fresh sample; until
/// the first reading lands the reported value is 0.
pub fn spawn_cpu_sampler(metrics: Metrics, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut system = System::new();
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            system.refresh_cpu_usage();
            if system.cpus().is_empty() {
                warn!("CPU sample unavailable, keeping last known value");
                continue;
            }
            metrics.set_cpu_usage(f64::from(system.global_cpu_usage()));
        }
    })
}

/// Memory utilization percent, `(total - free) / total * 100`, rounded to
/// two decimal places. Computed synchronously at snapshot time.
pub fn memory_usage_percentage() -> f64 {
    let mut system = System::new();
    system.refresh_memory();
    let total = system.total_memory();
    if total == 0 {
        warn!("Memory sample unavailable, reporting 0");
        return 0.0;
    }
    let used = total.saturating_sub(system.free_memory());
    let percentage = used as f64 / total as f64 * 100.0;
    (percentage * 100.0).round() / 100.0
}
