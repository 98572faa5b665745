//! check_port_status — is a TCP port open, and who is listening on it

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::listeners::find_listener_owner;
use super::{connect_any, resolve};
use crate::config::ProbesConfig;

#[derive(Deserialize)]
struct Input {
    port: u16,
    #[serde(default)]
    host: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PortStatusResult {
    pub open: bool,
    pub status: String,
}

pub fn execute(input: &[u8], settings: &ProbesConfig) -> Result<Vec<u8>> {
    let input: Input = serde_json::from_slice(input).context("Invalid JSON input")?;

    let host = input.host.unwrap_or_else(|| settings.port_check_host.clone());
    let timeout = Duration::try_from_secs_f64(settings.port_check_timeout_secs)
        .context("Invalid port check timeout in configuration")?;

    let result = check(&host, input.port, timeout);
    serde_json::to_vec(&result).context("Failed to serialize output")
}

pub fn check(host: &str, port: u16, timeout: Duration) -> PortStatusResult {
    let addrs = match resolve(host, port) {
        Ok(addrs) => addrs,
        Err(e) => {
            return PortStatusResult {
                open: false,
                status: format!("Error checking port {port}: {e}"),
            }
        }
    };

    match connect_any(&addrs, timeout) {
        Ok(stream) => {
            drop(stream);
            let status = match find_listener_owner(port) {
                Some(owner) => format!(
                    "Port {port} is open, used by {} (PID: {})",
                    owner.name, owner.pid
                ),
                None => format!("Port {port} is open"),
            };
            PortStatusResult { open: true, status }
        }
        Err(e) => {
            debug!("Port {port} on {host} not reachable: {e}");
            PortStatusResult {
                open: false,
                status: format!("Port {port} is closed or filtered"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_open_port_with_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let result = check("127.0.0.1", port, Duration::from_secs(1));
        assert!(result.open);
        assert!(result.status.starts_with(&format!("Port {port} is open")));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_open_port_names_owner() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let result = check("127.0.0.1", port, Duration::from_secs(1));
        let expected_pid = format!("(PID: {})", std::process::id());
        assert!(result.status.contains("used by"), "{}", result.status);
        assert!(result.status.ends_with(&expected_pid), "{}", result.status);
    }

    #[test]
    fn test_closed_port() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = check("127.0.0.1", port, Duration::from_secs(1));
        assert!(!result.open);
        assert_eq!(result.status, format!("Port {port} is closed or filtered"));
    }

    #[test]
    fn test_unresolvable_host() {
        let result = check("definitely-not-a-real-host.invalid", 80, Duration::from_secs(1));
        assert!(!result.open);
        assert!(result.status.starts_with("Error checking port 80:"));
    }

    #[test]
    fn test_execute_defaults_to_localhost() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let input = serde_json::json!({ "port": port });

        let out = execute(&serde_json::to_vec(&input).unwrap(), &ProbesConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["open"], true);
        assert!(value["status"].is_string());
    }

    #[test]
    fn test_execute_requires_port() {
        assert!(execute(b"{}", &ProbesConfig::default()).is_err());
    }
}
