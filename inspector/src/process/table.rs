//! Shared process table sampler
//!
//! Per-process CPU usage is the delta between two refreshes, so the table is
//! kept alive across calls: each scan reports usage since the previous scan.
//! The very first scan has no prior sample and reports 0 % CPU everywhere.
//!
//! Threads of user processes are listed by the kernel alongside processes and
//! are dropped here; kernel workers are kept.

use anyhow::Result;
use std::path::Path;
use std::sync::Mutex;
use sysinfo::{Pid, Process, ProcessRefreshKind, System, ThreadKind, UpdateKind};

use crate::monitor::round2;
use crate::time::format_local_ts;

/// Raw, unrounded observation of one process
#[derive(Debug, Clone)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    /// Start time, seconds since the epoch (0 = unknown)
    pub start_time: u64,
}

/// Rounded record returned to callers
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

impl ProcessSample {
    pub fn to_record(&self) -> ProcessRecord {
        ProcessRecord {
            pid: self.pid,
            name: self.name.clone(),
            cpu_percent: round2(self.cpu_percent),
            memory_percent: round2(self.memory_percent),
            create_time: None,
        }
    }

    pub fn to_record_with_create_time(&self) -> ProcessRecord {
        ProcessRecord {
            create_time: format_local_ts(self.start_time),
            ..self.to_record()
        }
    }
}

pub struct ProcessTable {
    system: Mutex<System>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    /// Refresh and return every readable process, ordered by pid.
    pub fn snapshot(&self) -> Result<Vec<ProcessSample>> {
        let mut sys = self
            .system
            .lock()
            .map_err(|e| anyhow::anyhow!("Process table lock error: {e}"))?;

        sys.refresh_memory();
        sys.refresh_processes_specifics(
            ProcessRefreshKind::new()
                .with_memory()
                .with_cpu()
                .with_exe(UpdateKind::OnlyIfNotSet)
                .with_cmd(UpdateKind::OnlyIfNotSet),
        );
        let total_memory = sys.total_memory();

        let mut samples: Vec<ProcessSample> = sys
            .processes()
            .iter()
            .filter_map(|(pid, process)| observe(*pid, process, total_memory))
            .collect();
        samples.sort_by_key(|s| s.pid);

        Ok(samples)
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Kernel `comm` names are cut to this many bytes
const COMM_MAX_LEN: usize = 15;

/// Read one process. `None` when it is a thread or has no usable identity
/// (exited mid-scan, kernel placeholder, unreadable name).
fn observe(pid: Pid, process: &Process, total_memory: u64) -> Option<ProcessSample> {
    let pid = pid.as_u32();
    let is_thread = process.thread_kind() == Some(ThreadKind::Userland);
    let name = process_name(pid, process.name(), is_thread, process.cmd(), process.exe())?;

    let memory_percent = if total_memory > 0 {
        process.memory() as f64 / total_memory as f64 * 100.0
    } else {
        0.0
    };

    Some(ProcessSample {
        pid,
        name,
        cpu_percent: f64::from(process.cpu_usage()).max(0.0),
        memory_percent,
        start_time: process.start_time(),
    })
}

/// Display name of a table entry, or `None` if the entry is skipped.
///
/// A `comm` at the kernel length limit is widened to the basename of the
/// first argument, or of the executable, when that starts with it.
fn process_name(
    pid: u32,
    comm: &str,
    is_thread: bool,
    cmd: &[String],
    exe: Option<&Path>,
) -> Option<String> {
    if pid == 0 || comm.is_empty() || is_thread {
        return None;
    }
    if comm.len() < COMM_MAX_LEN {
        return Some(comm.to_string());
    }

    let from_cmd = cmd.first().map(|arg0| Path::new(arg0.as_str()));
    let widened = [from_cmd, exe]
        .into_iter()
        .flatten()
        .filter_map(|path| path.file_name()?.to_str())
        .find(|base| base.starts_with(comm));
    Some(widened.unwrap_or(comm).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_contains_current_process() {
        let table = ProcessTable::new();
        let samples = table.snapshot().unwrap();
        let me = std::process::id();
        let own = samples.iter().find(|s| s.pid == me);
        assert!(own.is_some(), "own pid {me} missing from snapshot");
        assert!(own.unwrap().start_time > 0);
    }

    #[test]
    fn test_snapshot_sorted_and_positive() {
        let table = ProcessTable::new();
        let samples = table.snapshot().unwrap();
        assert!(samples.windows(2).all(|w| w[0].pid < w[1].pid));
        assert!(samples.iter().all(|s| s.pid > 0 && !s.name.is_empty()));
    }

    #[test]
    fn test_repeated_snapshots_reuse_table() {
        let table = ProcessTable::new();
        table.snapshot().unwrap();
        let second = table.snapshot().unwrap();
        assert!(!second.is_empty());
        assert!(second.iter().all(|s| s.cpu_percent >= 0.0));
    }

    #[test]
    fn test_process_name_skips_unusable_entries() {
        assert_eq!(process_name(0, "swapper", false, &[], None), None);
        assert_eq!(process_name(42, "", false, &[], None), None);
        assert_eq!(process_name(43, "worker", true, &[], None), None);
        assert_eq!(process_name(44, "nginx", false, &[], None), Some("nginx".into()));
    }

    #[test]
    fn test_process_name_widens_truncated_comm() {
        let cmd = vec!["/usr/lib/postgresql/bin/postgres_exporter".to_string(), "--web".to_string()];
        assert_eq!(
            process_name(50, "postgres_export", false, &cmd, None),
            Some("postgres_exporter".into())
        );

        // argv rewritten by the process: fall back to the executable
        let cmd = vec!["exporter: idle".to_string()];
        let exe = Path::new("/opt/bin/postgres_exporter");
        assert_eq!(
            process_name(51, "postgres_export", false, &cmd, Some(exe)),
            Some("postgres_exporter".into())
        );

        // nothing matches: keep the kernel name
        let cmd = vec!["/bin/other-binary-name".to_string()];
        assert_eq!(
            process_name(52, "postgres_export", false, &cmd, None),
            Some("postgres_export".into())
        );
    }

    #[test]
    fn test_process_name_short_comm_not_widened() {
        let cmd = vec!["/usr/sbin/sshd-session".to_string()];
        assert_eq!(process_name(60, "sshd", false, &cmd, None), Some("sshd".into()));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_snapshot_excludes_threads() {
        use std::sync::{Arc, Barrier};

        let release = Arc::new(Barrier::new(5));
        let workers: Vec<_> = (0..4)
            .map(|i| {
                let release = Arc::clone(&release);
                std::thread::Builder::new()
                    .name(format!("scan-worker-{i}"))
                    .spawn(move || {
                        release.wait();
                    })
                    .unwrap()
            })
            .collect();

        let samples = ProcessTable::new().snapshot().unwrap();
        release.wait();
        for worker in workers {
            worker.join().unwrap();
        }

        // /proc lists processes only; thread ids live under /proc/<pid>/task
        let listed: std::collections::HashSet<u32> = std::fs::read_dir("/proc")
            .unwrap()
            .flatten()
            .filter_map(|e| e.file_name().to_str()?.parse().ok())
            .collect();
        let me = std::process::id();
        let own: Vec<&ProcessSample> = samples.iter().filter(|s| s.pid == me).collect();
        assert_eq!(own.len(), 1);
        assert!(samples.iter().all(|s| !s.name.starts_with("scan-worker")));
        for sample in &samples {
            let still_alive = std::path::Path::new(&format!("/proc/{}", sample.pid)).exists();
            assert!(
                listed.contains(&sample.pid) || !still_alive,
                "pid {} ({}) is not a process",
                sample.pid,
                sample.name
            );
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_snapshot_reports_full_binary_name() {
        let exe = std::env::current_exe().unwrap();
        let full_name = exe.file_name().unwrap().to_str().unwrap().to_string();

        let samples = ProcessTable::new().snapshot().unwrap();
        let own = samples.iter().find(|s| s.pid == std::process::id()).unwrap();
        assert_eq!(own.name, full_name);
    }

    #[test]
    fn test_record_rounding() {
        let sample = ProcessSample {
            pid: 42,
            name: "nginx".into(),
            cpu_percent: 12.3456,
            memory_percent: 0.98765,
            start_time: 1_700_000_000,
        };
        let record = sample.to_record();
        assert_eq!(record.cpu_percent, 12.35);
        assert_eq!(record.memory_percent, 0.99);
        assert!(record.create_time.is_none());

        let with_time = sample.to_record_with_create_time();
        assert_eq!(with_time.create_time.unwrap().len(), 19);
    }

    #[test]
    fn test_record_serialization_omits_unknown_create_time() {
        let sample = ProcessSample {
            pid: 7,
            name: "sshd".into(),
            cpu_percent: 0.0,
            memory_percent: 0.5,
            start_time: 0,
        };
        let value = serde_json::to_value(sample.to_record_with_create_time()).unwrap();
        assert!(value.get("create_time").is_none());
        assert_eq!(value["pid"], 7);
        assert_eq!(value["name"], "sshd");
    }
}
