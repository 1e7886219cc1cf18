//! System load sampling and worker pool sizing.

use std::sync::Mutex;
use sysinfo::System;
use tracing::info;

/// Point-in-time CPU and memory utilization, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceSample {
    pub cpu_percent: f32,
    pub mem_percent: f32,
}

/// Source of resource samples. Sampling never fails; unknown values read as 0.
pub trait ResourceMonitor: Send + Sync {
    fn sample(&self) -> ResourceSample;
}

/// Worker pool size for a resource sample.
///
/// Memory above 85% runs units one at a time, above 50% two at a time,
/// otherwise three. CPU is reported but does not affect the size.
pub fn worker_count(_cpu_percent: f32, mem_percent: f32) -> usize {
    if mem_percent > 85.0 {
        1
    } else if mem_percent > 50.0 {
        2
    } else {
        3
    }
}

/// Samples the host through `sysinfo`.
///
/// CPU usage is measured since the previous sample, so the first reading is 0.
pub struct SystemMonitor {
    system: Mutex<System>,
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemMonitor {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl ResourceMonitor for SystemMonitor {
    fn sample(&self) -> ResourceSample {
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        system.refresh_memory();
        system.refresh_cpu_usage();

        let total = system.total_memory();
        let mem_percent = if total == 0 {
            0.0
        } else {
            (system.used_memory() as f64 / total as f64 * 100.0) as f32
        };
        let cpu_percent = system.global_cpu_usage();

        let sample = ResourceSample {
            cpu_percent: if cpu_percent.is_finite() { cpu_percent } else { 0.0 },
            mem_percent,
        };
        info!(
            cpu_percent = sample.cpu_percent,
            mem_percent = sample.mem_percent,
            "System resources sampled"
        );
        sample
    }
}

/// Always reports the same sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedMonitor(pub ResourceSample);

impl FixedMonitor {
    pub fn new(cpu_percent: f32, mem_percent: f32) -> Self {
        Self(ResourceSample {
            cpu_percent,
            mem_percent,
        })
    }
}

impl ResourceMonitor for FixedMonitor {
    fn sample(&self) -> ResourceSample {
        self.0
    }
}
