//! host-inspector configuration loading and parsing

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "/etc/host-inspector/config.toml";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InspectorConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub probes: ProbesConfig,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Settings for `get_system_metrics`
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Length of the blocking CPU sampling window
    #[serde(default = "default_cpu_sample_ms")]
    pub cpu_sample_ms: u64,
    #[serde(default = "default_disk_path")]
    pub disk_path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            cpu_sample_ms: default_cpu_sample_ms(),
            disk_path: default_disk_path(),
        }
    }
}

/// Defaults for the active network probes
#[derive(Debug, Clone, Deserialize)]
pub struct ProbesConfig {
    #[serde(default = "default_connectivity_host")]
    pub connectivity_host: String,
    #[serde(default = "default_connectivity_port")]
    pub connectivity_port: u16,
    #[serde(default = "default_connectivity_timeout")]
    pub connectivity_timeout_secs: f64,
    #[serde(default = "default_port_check_host")]
    pub port_check_host: String,
    #[serde(default = "default_port_check_timeout")]
    pub port_check_timeout_secs: f64,
}

impl Default for ProbesConfig {
    fn default() -> Self {
        Self {
            connectivity_host: default_connectivity_host(),
            connectivity_port: default_connectivity_port(),
            connectivity_timeout_secs: default_connectivity_timeout(),
            port_check_host: default_port_check_host(),
            port_check_timeout_secs: default_port_check_timeout(),
        }
    }
}

/// Defaults for `analyze_log_file`
#[derive(Debug, Clone, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
    #[serde(default = "default_error_keywords")]
    pub error_keywords: Vec<String>,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            max_lines: default_max_lines(),
            error_keywords: default_error_keywords(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String { "0.0.0.0:8000".into() }
fn default_log_level() -> String { "info".into() }
fn default_cpu_sample_ms() -> u64 { 1000 }
fn default_disk_path() -> String { "/".into() }
fn default_connectivity_host() -> String { "8.8.8.8".into() }
fn default_connectivity_port() -> u16 { 53 }
fn default_connectivity_timeout() -> f64 { 3.0 }
fn default_port_check_host() -> String { "127.0.0.1".into() }
fn default_port_check_timeout() -> f64 { 1.0 }
fn default_max_lines() -> usize { 100 }
fn default_error_keywords() -> Vec<String> {
    vec!["error".into(), "exception".into(), "fail".into(), "critical".into()]
}

/// $HOST_INSPECTOR_CONFIG, or /etc/host-inspector/config.toml
pub fn config_path() -> PathBuf {
    std::env::var_os("HOST_INSPECTOR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn load_config_from(path: &Path) -> Result<InspectorConfig> {
    if !path.exists() {
        tracing::warn!("Config file not found at {}, using defaults", path.display());
        return Ok(InspectorConfig::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: InspectorConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", path.display()))?;
    Ok(config)
}
