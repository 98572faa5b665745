//! check_network_connectivity — TCP reachability and connect latency

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{connect_any, resolve};
use crate::config::ProbesConfig;
use crate::monitor::round2;

#[derive(Deserialize)]
struct Input {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    timeout: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ConnectivityResult {
    pub connected: bool,
    pub latency_ms: Option<f64>,
    pub error: Option<String>,
}

pub fn execute(input: &[u8], settings: &ProbesConfig) -> Result<Vec<u8>> {
    let input: Input = if input.is_empty() {
        Input {
            host: None,
            port: None,
            timeout: None,
        }
    } else {
        serde_json::from_slice(input).context("Invalid JSON input")?
    };

    let host = input
        .host
        .unwrap_or_else(|| settings.connectivity_host.clone());
    let port = input.port.unwrap_or(settings.connectivity_port);
    let timeout_secs = input.timeout.unwrap_or(settings.connectivity_timeout_secs);
    let timeout = Duration::try_from_secs_f64(timeout_secs)
        .with_context(|| format!("Invalid timeout: {timeout_secs}"))?;

    let result = check(&host, port, timeout);
    serde_json::to_vec(&result).context("Failed to serialize output")
}

/// Attempt one TCP connection. Failures of any kind are reported in the result.
pub fn check(host: &str, port: u16, timeout: Duration) -> ConnectivityResult {
    let start = Instant::now();

    let attempt = resolve(host, port).and_then(|addrs| connect_any(&addrs, timeout));

    match attempt {
        Ok(stream) => {
            let latency = start.elapsed();
            drop(stream);
            ConnectivityResult {
                connected: true,
                latency_ms: Some(round2(latency.as_secs_f64() * 1000.0)),
                error: None,
            }
        }
        Err(e) => {
            debug!("Connectivity check to {host}:{port} failed: {e}");
            ConnectivityResult {
                connected: false,
                latency_ms: None,
                error: Some(e.to_string()),
            }
        }
    }
}
