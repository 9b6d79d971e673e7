//! `bot.pid` single-instance enforcement, shared between the Hook (which
//! only ever reads it to decide whether to spawn the Bot) and the Bot
//! (which owns it exclusively). A PID-only check is insufficient — PIDs get
//! recycled by unrelated processes on long-running workstations — so every
//! record also carries a command-line fingerprint (spec.md §4.2, §9).

use crate::atomic::{atomic_write_json, read_json_tolerant};
use crate::error::IpcError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PidRecord {
    pub pid: u32,
    pub cmdline_fingerprint: String,
}

impl PidRecord {
    pub fn current(cmdline_fingerprint: impl Into<String>) -> Self {
        PidRecord { pid: std::process::id(), cmdline_fingerprint: cmdline_fingerprint.into() }
    }
}

/// Reads `bot.pid`, tolerating absence (returns `Ok(None)`, not an error —
/// "no pidfile" is the expected first-run state).
pub fn read_pidfile(path: &Path) -> Result<Option<PidRecord>, IpcError> {
    if !path.exists() {
        return Ok(None);
    }
    match read_json_tolerant::<PidRecord>(path) {
        Ok(record) => Ok(Some(record)),
        Err(IpcError::SchemaInvalid { .. }) => Ok(None), // corrupt pidfile == stale
        Err(e) => Err(e),
    }
}

pub fn write_pidfile(path: &Path, record: &PidRecord) -> Result<(), IpcError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let filename = path.file_name().and_then(|f| f.to_str()).unwrap_or("bot.pid");
    atomic_write_json(dir, filename, record)?;
    Ok(())
}

/// Checks whether `pid` is a live process. Unix-only: sends signal 0, which
/// performs existence/permission checks without affecting the process.
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    // kill(pid, 0) only probes existence/permission; it sends no actual
    // signal and cannot affect the target process's behavior.
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

#[cfg(not(unix))]
pub fn is_process_alive(_pid: u32) -> bool {
    // Non-Unix platforms are not a deployment target for this pipeline
    // (process supervision here assumes Unix signals); assume stale.
    false
}

/// Decides whether an existing pidfile record represents a live owner that
/// should block a new instance from starting.
pub fn record_is_live_owner(record: &PidRecord, expected_fingerprint: &str) -> bool {
    is_process_alive(record.pid) && record.cmdline_fingerprint == expected_fingerprint
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_pidfile_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.pid");
        assert_eq!(read_pidfile(&path).unwrap(), None);
    }

    #[test]
    fn write_then_read_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.pid");
        let record = PidRecord::current("orchestrator-bot");
        write_pidfile(&path, &record).unwrap();
        let read_back = read_pidfile(&path).unwrap().unwrap();
        assert_eq!(record, read_back);
    }

    #[test]
    fn corrupt_pidfile_reads_as_stale_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.pid");
        std::fs::write(&path, b"not json").unwrap();
        assert_eq!(read_pidfile(&path).unwrap(), None);
    }

    #[test]
    fn current_process_is_alive() {
        assert!(is_process_alive(std::process::id()));
    }

    #[test]
    fn fingerprint_mismatch_is_not_a_live_owner() {
        let record = PidRecord::current("orchestrator-bot");
        assert!(!record_is_live_owner(&record, "some-other-binary"));
    }

    #[test]
    fn dead_pid_is_not_a_live_owner_even_with_matching_fingerprint() {
        // A PID vanishingly unlikely to be in use; simulates a stale pidfile
        // left behind after the owning process exited or was recycled.
        let record = PidRecord { pid: 999_999, cmdline_fingerprint: "orchestrator-bot".to_string() };
        assert!(!record_is_live_owner(&record, "orchestrator-bot"));
    }
}
