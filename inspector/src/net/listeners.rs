//! Owner lookup for listening TCP sockets
//!
//! Linux only: listening sockets come from `/proc/net/tcp{,6}` and are mapped
//! to a pid by scanning `/proc/<pid>/fd` for the matching socket inode.
//! Processes we are not allowed to inspect are skipped.

/// Process owning a listening socket
#[derive(Debug, Clone, PartialEq)]
pub struct ListenerOwner {
    pub pid: u32,
    pub name: String,
}

/// TCP state code for LISTEN in /proc/net/tcp
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
const TCP_LISTEN: &str = "0A";

/// Best-effort: find the process listening on local TCP `port`.
#[cfg(target_os = "linux")]
pub fn find_listener_owner(port: u16) -> Option<ListenerOwner> {
    let inodes: Vec<u64> = ["/proc/net/tcp", "/proc/net/tcp6"]
        .iter()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .flat_map(|content| parse_listen_inodes(&content, port))
        .collect();

    if inodes.is_empty() {
        return None;
    }

    let proc_entries = std::fs::read_dir("/proc").ok()?;
    for entry in proc_entries.flatten() {
        let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) else {
            continue;
        };
        if process_owns_inode(pid, &inodes) {
            let name = std::fs::read_to_string(format!("/proc/{pid}/comm"))
                .map(|s| s.trim().to_string())
                .unwrap_or_default();
            if name.is_empty() {
                continue;
            }
            return Some(ListenerOwner { pid, name });
        }
    }

    None
}

#[cfg(not(target_os = "linux"))]
pub fn find_listener_owner(_port: u16) -> Option<ListenerOwner> {
    None
}

#[cfg(target_os = "linux")]
fn process_owns_inode(pid: u32, inodes: &[u64]) -> bool {
    let Ok(fds) = std::fs::read_dir(format!("/proc/{pid}/fd")) else {
        return false;
    };

    fds.flatten().any(|fd| {
        std::fs::read_link(fd.path())
            .ok()
            .and_then(|target| target.to_str().and_then(parse_socket_link))
            .is_some_and(|inode| inodes.contains(&inode))
    })
}

/// Inodes of LISTEN sockets bound to `port` in a /proc/net/tcp table.
///
/// Line format: `sl local_address rem_address st ... uid timeout inode ...`
/// with addresses as `HEXIP:HEXPORT`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_listen_inodes(table: &str, port: u16) -> Vec<u64> {
    table
        .lines()
        .skip(1)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 10 || parts[3] != TCP_LISTEN {
                return None;
            }
            let local_port = parts[1].rsplit(':').next()?;
            if u16::from_str_radix(local_port, 16).ok()? != port {
                return None;
            }
            // inode 0: socket not visible from this namespace
            parts[9].parse::<u64>().ok().filter(|inode| *inode != 0)
        })
        .collect()
}

/// `socket:[12345]` -> 12345
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_socket_link(target: &str) -> Option<u64> {
    target
        .strip_prefix("socket:[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}
