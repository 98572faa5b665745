//! get_system_metrics — CPU, memory and disk usage snapshot

use anyhow::{Context, Result};
use nix::sys::statvfs::statvfs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use sysinfo::System;

use super::{bytes_to_gb, percent_of};
use crate::config::MetricsConfig;

/// sysinfo needs at least this long between CPU refreshes
const MIN_CPU_SAMPLE: Duration = Duration::from_millis(200);

#[derive(Deserialize)]
struct Input {}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub cpu_percent: f64,
    pub memory: MemoryUsage,
    pub disk: DiskUsage,
}

#[derive(Debug, Serialize)]
pub struct MemoryUsage {
    pub total_gb: f64,
    pub available_gb: f64,
    pub used_gb: f64,
    pub percent: f64,
}

#[derive(Debug, Serialize)]
pub struct DiskUsage {
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub percent: f64,
}

impl MemoryUsage {
    fn from_bytes(total: u64, available: u64, used: u64) -> Self {
        let used = used.min(total);
        Self {
            total_gb: bytes_to_gb(total),
            available_gb: bytes_to_gb(available.min(total)),
            used_gb: bytes_to_gb(used),
            percent: percent_of(total.saturating_sub(available), total),
        }
    }
}

impl DiskUsage {
    /// Build from statvfs block counts.
    ///
    /// `free` is what unprivileged users can still allocate, so the percentage
    /// is taken against `used + free` rather than the raw total.
    fn from_blocks(blocks: u64, blocks_free: u64, blocks_available: u64, fragment_size: u64) -> Self {
        let total = blocks.saturating_mul(fragment_size);
        let free = blocks_available.saturating_mul(fragment_size);
        let used = blocks.saturating_sub(blocks_free).saturating_mul(fragment_size);
        Self {
            total_gb: bytes_to_gb(total),
            used_gb: bytes_to_gb(used),
            free_gb: bytes_to_gb(free),
            percent: percent_of(used, used.saturating_add(free)),
        }
    }
}

pub fn execute(input: &[u8], settings: &MetricsConfig) -> Result<Vec<u8>> {
    let _input: Input = if input.is_empty() {
        Input {}
    } else {
        serde_json::from_slice(input).context("Invalid JSON input")?
    };

    let result = collect(settings)?;
    serde_json::to_vec(&result).context("Failed to serialize output")
}

/// Take a full snapshot. Blocks the calling thread for the CPU sampling window.
pub fn collect(settings: &MetricsConfig) -> Result<MetricsSnapshot> {
    let window = Duration::from_millis(settings.cpu_sample_ms).max(MIN_CPU_SAMPLE);

    let mut sys = System::new();
    sys.refresh_cpu();
    std::thread::sleep(window);
    sys.refresh_cpu();
    let cpu_percent = ((sys.global_cpu_info().cpu_usage() as f64 * 10.0).round() / 10.0)
        .clamp(0.0, 100.0);

    sys.refresh_memory();
    let memory = MemoryUsage::from_bytes(
        sys.total_memory(),
        sys.available_memory(),
        sys.used_memory(),
    );

    let disk = disk_usage(&settings.disk_path)?;

    Ok(MetricsSnapshot {
        cpu_percent,
        memory,
        disk,
    })
}

// statvfs field widths differ per platform
#[allow(clippy::unnecessary_cast)]
fn disk_usage(path: &str) -> Result<DiskUsage> {
    let stat = statvfs(path).with_context(|| format!("Failed to statvfs {path}"))?;

    Ok(DiskUsage::from_blocks(
        stat.blocks() as u64,
        stat.blocks_free() as u64,
        stat.blocks_available() as u64,
        stat.fragment_size() as u64,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn test_memory_usage_from_bytes() {
        let mem = MemoryUsage::from_bytes(16 * GB, 12 * GB, 4 * GB);
        assert_eq!(mem.total_gb, 16.0);
        assert_eq!(mem.available_gb, 12.0);
        assert_eq!(mem.used_gb, 4.0);
        assert_eq!(mem.percent, 25.0);
    }

    #[test]
    fn test_memory_usage_clamps_accounting_races() {
        let mem = MemoryUsage::from_bytes(8 * GB, 9 * GB, 10 * GB);
        assert!(mem.used_gb <= mem.total_gb);
        assert!(mem.available_gb <= mem.total_gb);
        assert_eq!(mem.percent, 0.0);
    }

    #[test]
    fn test_disk_usage_from_blocks() {
        // 100 GiB filesystem in 4 KiB fragments, 40 GiB used, 5 GiB reserved for root
        let frag = 4096;
        let blocks = 100 * GB / frag;
        let blocks_free = 60 * GB / frag;
        let blocks_available = 55 * GB / frag;

        let disk = DiskUsage::from_blocks(blocks, blocks_free, blocks_available, frag);
        assert_eq!(disk.total_gb, 100.0);
        assert_eq!(disk.used_gb, 40.0);
        assert_eq!(disk.free_gb, 55.0);
        assert_eq!(disk.percent, 42.1);
    }

    #[test]
    fn test_disk_usage_empty_filesystem() {
        let disk = DiskUsage::from_blocks(0, 0, 0, 4096);
        assert_eq!(disk.total_gb, 0.0);
        assert_eq!(disk.percent, 0.0);
    }

    #[test]
    fn test_collect_snapshot_within_bounds() {
        let settings = MetricsConfig {
            cpu_sample_ms: 200,
            disk_path: "/".into(),
        };
        let snapshot = collect(&settings).unwrap();

        assert!((0.0..=100.0).contains(&snapshot.cpu_percent));
        assert!((0.0..=100.0).contains(&snapshot.memory.percent));
        assert!((0.0..=100.0).contains(&snapshot.disk.percent));
        assert!(snapshot.memory.total_gb >= snapshot.memory.used_gb);
        assert!(snapshot.disk.total_gb >= snapshot.disk.used_gb);
        assert!(snapshot.disk.used_gb >= 0.0);
    }

    #[test]
    fn test_collect_blocks_for_sample_window() {
        let settings = MetricsConfig {
            cpu_sample_ms: 300,
            disk_path: "/".into(),
        };
        let start = std::time::Instant::now();
        collect(&settings).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[test]
    fn test_bad_disk_path_is_an_error() {
        let settings = MetricsConfig {
            cpu_sample_ms: 200,
            disk_path: "/definitely/not/a/mount/point".into(),
        };
        let err = collect(&settings).unwrap_err();
        assert!(err.to_string().contains("statvfs"));
    }

    #[test]
    fn test_execute_output_shape() {
        let settings = MetricsConfig {
            cpu_sample_ms: 200,
            disk_path: "/".into(),
        };
        let out = execute(b"{}", &settings).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert!(value["cpu_percent"].is_number());
        for key in ["total_gb", "available_gb", "used_gb", "percent"] {
            assert!(value["memory"][key].is_number(), "memory.{key}");
        }
        for key in ["total_gb", "used_gb", "free_gb", "percent"] {
            assert!(value["disk"][key].is_number(), "disk.{key}");
        }
    }
}
