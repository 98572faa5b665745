//! get_system_info — static host identity

use anyhow::{Context, Result};
use nix::sys::utsname::uname;
use serde::{Deserialize, Serialize};
use sysinfo::System;

use crate::time::format_local_ts;

#[derive(Deserialize)]
struct Input {}

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub hostname: String,
    pub platform: String,
    pub release: String,
    pub version: String,
    pub architecture: String,
    pub processor: String,
    pub os: Option<String>,
    pub runtime_version: String,
    pub boot_time: String,
}

pub fn execute(input: &[u8]) -> Result<Vec<u8>> {
    let _input: Input = if input.is_empty() {
        Input {}
    } else {
        serde_json::from_slice(input).context("Invalid JSON input")?
    };

    let result = collect()?;
    serde_json::to_vec(&result).context("Failed to serialize output")
}

pub fn collect() -> Result<SystemInfo> {
    let uts = uname().context("Failed to read uname")?;
    let architecture = uts.machine().to_string_lossy().into_owned();

    let mut sys = System::new();
    sys.refresh_cpu();
    let processor = sys
        .cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .filter(|brand| !brand.is_empty())
        .unwrap_or_else(|| architecture.clone());

    Ok(SystemInfo {
        hostname: uts.nodename().to_string_lossy().into_owned(),
        platform: uts.sysname().to_string_lossy().into_owned(),
        release: uts.release().to_string_lossy().into_owned(),
        version: uts.version().to_string_lossy().into_owned(),
        architecture,
        processor,
        os: System::long_os_version(),
        runtime_version: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        boot_time: format_local_ts(System::boot_time()).unwrap_or_else(|| "unknown".to_string()),
    })
}
