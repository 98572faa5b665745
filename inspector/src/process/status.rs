//! check_process_status — find running processes by name

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::table::{ProcessRecord, ProcessSample, ProcessTable};

#[derive(Deserialize)]
struct Input {
    process_name: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessQueryResult {
    pub running: bool,
    pub instances: Vec<ProcessRecord>,
}

pub fn execute(input: &[u8], table: &ProcessTable) -> Result<Vec<u8>> {
    let input: Input = serde_json::from_slice(input).context("Invalid JSON input")?;

    let samples = table.snapshot()?;
    let result = find_matching(&samples, &input.process_name);

    serde_json::to_vec(&result).context("Failed to serialize output")
}

/// Case-insensitive substring match of `needle` against process names
pub fn find_matching(samples: &[ProcessSample], needle: &str) -> ProcessQueryResult {
    let needle = needle.to_lowercase();

    let instances: Vec<ProcessRecord> = samples
        .iter()
        .filter(|s| s.name.to_lowercase().contains(&needle))
        .map(ProcessSample::to_record_with_create_time)
        .collect();

    ProcessQueryResult {
        running: !instances.is_empty(),
        instances,
    }
}
