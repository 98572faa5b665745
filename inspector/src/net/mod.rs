//! Network tools — outbound connectivity and local port probing.
//!
//! Every probe opens a short-lived `TcpStream` that is dropped (and therefore
//! closed) before the result is returned, whatever the outcome.

pub mod connectivity;
pub mod listeners;
pub mod port_status;

use serde_json::json;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::config::ProbesConfig;
use crate::registry::{make_tool, Registry};

/// Upper bound accepted for caller-supplied connect timeouts, in seconds
pub const MAX_TIMEOUT_SECS: f64 = 60.0;

/// Resolve `host:port`, IPv4 addresses first.
pub fn resolve(host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
    let mut addrs: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
    addrs.sort_by_key(|a| a.is_ipv6());
    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses found for {host}"),
        ));
    }
    Ok(addrs)
}

/// Try each address in turn until one connects; all attempts share `timeout`.
pub fn connect_any(addrs: &[SocketAddr], timeout: Duration) -> io::Result<TcpStream> {
    let deadline = Instant::now() + timeout;
    let mut last_err = io::Error::new(io::ErrorKind::InvalidInput, "no addresses to connect to");

    for addr in addrs {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"));
        }
        match TcpStream::connect_timeout(addr, remaining) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = e,
        }
    }

    Err(last_err)
}

/// Register every network tool with the registry.
pub fn register_tools(reg: &mut Registry, probes: &ProbesConfig) {
    reg.register_tool(
        make_tool(
            "check_network_connectivity",
            "net",
            "Check network connectivity by opening a TCP connection to a host and measuring latency",
            "medium",
            true,
            (MAX_TIMEOUT_SECS as u64 + 5) * 1000,
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "host": {
                    "type": "string",
                    "default": probes.connectivity_host,
                    "description": "Host to connect to"
                },
                "port": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 65535,
                    "default": probes.connectivity_port
                },
                "timeout": {
                    "type": "number",
                    "exclusiveMinimum": 0,
                    "maximum": MAX_TIMEOUT_SECS,
                    "default": probes.connectivity_timeout_secs,
                    "description": "Connection timeout in seconds"
                }
            }
        })),
    );

    reg.register_tool(
        make_tool(
            "check_port_status",
            "net",
            "Check whether a TCP port is open on a host and which local process listens on it",
            "medium",
            true,
            10000,
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "port": {"type": "integer", "minimum": 1, "maximum": 65535},
                "host": {
                    "type": "string",
                    "default": probes.port_check_host
                }
            },
            "required": ["port"]
        })),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_resolve_localhost_literal() {
        let addrs = resolve("127.0.0.1", 80).unwrap();
        assert_eq!(addrs, vec!["127.0.0.1:80".parse::<SocketAddr>().unwrap()]);
    }

    #[test]
    fn test_resolve_invalid_host() {
        assert!(resolve("definitely-not-a-real-host.invalid", 80).is_err());
    }

    #[test]
    fn test_connect_any_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let stream = connect_any(&[addr], Duration::from_secs(1));
        assert!(stream.is_ok());
    }

    #[test]
    fn test_connect_any_empty() {
        let err = connect_any(&[], Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
