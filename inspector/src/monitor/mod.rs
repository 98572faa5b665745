//! Monitoring tools — resource metrics snapshot and log file analysis.
//!
//! Each submodule exposes an `execute` entry point taking JSON input bytes and
//! returning JSON output bytes.

pub mod logs;
pub mod metrics;

use serde_json::json;

use crate::config::{LogsConfig, MetricsConfig};
use crate::registry::{make_tool, Registry};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convert a byte count to GiB, rounded to two decimals
pub fn bytes_to_gb(bytes: u64) -> f64 {
    round2(bytes as f64 / BYTES_PER_GB)
}

/// Percentage of `part` in `whole`, one decimal, clamped to [0, 100]
pub fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let pct = (part as f64 / whole as f64) * 100.0;
    ((pct * 10.0).round() / 10.0).clamp(0.0, 100.0)
}

/// Register every monitor tool with the registry.
pub fn register_tools(reg: &mut Registry, metrics: &MetricsConfig, logs: &LogsConfig) {
    reg.register_tool(
        make_tool(
            "get_system_metrics",
            "monitor",
            "Get basic system metrics: CPU usage sampled over a short window, memory usage and root disk usage",
            "low",
            true,
            metrics.cpu_sample_ms.saturating_add(5000),
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {}
        })),
    );

    reg.register_tool(
        make_tool(
            "analyze_log_file",
            "monitor",
            "Scan the tail of a log file for lines containing error keywords",
            "low",
            true,
            10000,
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "log_path": {"type": "string", "description": "Path to the log file"},
                "max_lines": {
                    "type": "integer",
                    "minimum": 1,
                    "default": logs.max_lines,
                    "description": "Number of lines to read from the end of the file"
                },
                "error_keywords": {
                    "type": ["array", "null"],
                    "items": {"type": "string"},
                    "default": logs.error_keywords,
                    "description": "Case-insensitive keywords marking a line as an error"
                }
            },
            "required": ["log_path"]
        })),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(1.235001), 1.24);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_bytes_to_gb() {
        assert_eq!(bytes_to_gb(0), 0.0);
        assert_eq!(bytes_to_gb(1024 * 1024 * 1024), 1.0);
        assert_eq!(bytes_to_gb(16 * 1024 * 1024 * 1024 + 512 * 1024 * 1024), 16.5);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(1, 4), 25.0);
        assert_eq!(percent_of(1, 3), 33.3);
        assert_eq!(percent_of(5, 0), 0.0);
        // Accounting races can report part > whole
        assert_eq!(percent_of(11, 10), 100.0);
    }

    #[test]
    fn test_register_tools() {
        let mut reg = Registry::new();
        register_tools(&mut reg, &MetricsConfig::default(), &LogsConfig::default());
        assert_eq!(reg.list_tools("monitor").len(), 2);

        let logs = reg.get_tool("analyze_log_file").unwrap();
        assert_eq!(logs.input_schema["required"][0], "log_path");
        assert_eq!(logs.input_schema["properties"]["max_lines"]["default"], 100);
    }

    #[test]
    fn test_metrics_timeout_saturates() {
        let mut reg = Registry::new();
        let metrics = MetricsConfig {
            cpu_sample_ms: u64::MAX,
            disk_path: "/".into(),
        };
        register_tools(&mut reg, &metrics, &LogsConfig::default());
        assert_eq!(reg.get_tool("get_system_metrics").unwrap().timeout_ms, u64::MAX);
    }
}
