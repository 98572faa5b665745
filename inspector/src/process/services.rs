//! list_running_services — busiest processes by CPU

use anyhow::{Context, Result};
use serde::Deserialize;

use super::table::{ProcessRecord, ProcessSample, ProcessTable};

/// Maximum number of entries returned
pub const MAX_SERVICES: usize = 20;

/// Processes at or below this memory share with no CPU usage are idle
const IDLE_MEMORY_PERCENT: f64 = 0.1;

#[derive(Deserialize)]
struct Input {}

pub fn execute(input: &[u8], table: &ProcessTable) -> Result<Vec<u8>> {
    let _input: Input = if input.is_empty() {
        Input {}
    } else {
        serde_json::from_slice(input).context("Invalid JSON input")?
    };

    let samples = table.snapshot()?;
    let result = select_services(&samples);

    serde_json::to_vec(&result).context("Failed to serialize output")
}

/// Drop idle processes, sort by CPU descending, keep the top `MAX_SERVICES`.
pub fn select_services(samples: &[ProcessSample]) -> Vec<ProcessRecord> {
    let mut services: Vec<ProcessRecord> = samples
        .iter()
        .filter(|s| s.cpu_percent > 0.0 || s.memory_percent > IDLE_MEMORY_PERCENT)
        .map(ProcessSample::to_record)
        .collect();

    // Stable sort on the rounded value keeps pid order among ties
    services.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
    services.truncate(MAX_SERVICES);
    services
}
