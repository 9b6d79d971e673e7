//! Single-instance enforcement for the Bot (spec.md §4.2 "Lifecycle").
//! A stale pidfile — no live process, or a live process with a mismatched
//! command-line fingerprint — is atomically replaced rather than treated
//! as a startup error.

use ipc::pidfile::{read_pidfile, record_is_live_owner, write_pidfile, PidRecord};
use ipc::StateRoot;

pub const FINGERPRINT: &str = "orchestrator-bot";

#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("another orchestrator-bot instance (pid {0}) is already running")]
    AlreadyRunning(u32),
    #[error("pidfile error: {0}")]
    Ipc(#[from] ipc::IpcError),
}

/// Acquires exclusive ownership of `bot.pid`, replacing a stale record.
/// Returns an error only when a live instance already owns the file.
pub fn acquire(state_root: &StateRoot) -> Result<(), AcquireError> {
    let path = state_root.bot_pidfile_path();

    if let Some(existing) = read_pidfile(&path)? {
        if record_is_live_owner(&existing, FINGERPRINT) {
            return Err(AcquireError::AlreadyRunning(existing.pid));
        }
        tracing::info!(stale_pid = existing.pid, "replacing stale bot pidfile");
    }

    let record = PidRecord::current(FINGERPRINT);
    write_pidfile(&path, &record)?;
    Ok(())
}

/// Releases the pidfile on graceful shutdown (spec.md §4.2 "log
/// bot.shutdown, release the pidfile, exit 0").
pub fn release(state_root: &StateRoot) {
    ipc::unlink_tolerant(&state_root.bot_pidfile_path());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_succeeds_on_empty_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = StateRoot::new(dir.path());
        assert!(acquire(&root).is_ok());
        assert!(root.bot_pidfile_path().exists());
    }

    #[test]
    fn acquire_fails_when_a_live_owner_holds_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = StateRoot::new(dir.path());
        let record = PidRecord::current(FINGERPRINT);
        write_pidfile(&root.bot_pidfile_path(), &record).unwrap();

        let err = acquire(&root).unwrap_err();
        assert!(matches!(err, AcquireError::AlreadyRunning(_)));
    }

    #[test]
    fn acquire_replaces_a_stale_record() {
        let dir = tempfile::tempdir().unwrap();
        let root = StateRoot::new(dir.path());
        let stale = PidRecord { pid: 999_999, cmdline_fingerprint: FINGERPRINT.to_string() };
        write_pidfile(&root.bot_pidfile_path(), &stale).unwrap();

        assert!(acquire(&root).is_ok());
        let after = read_pidfile(&root.bot_pidfile_path()).unwrap().unwrap();
        assert_eq!(after.pid, std::process::id());
    }

    #[test]
    fn release_unlinks_pidfile() {
        let dir = tempfile::tempdir().unwrap();
        let root = StateRoot::new(dir.path());
        acquire(&root).unwrap();
        release(&root);
        assert!(!root.bot_pidfile_path().exists());
    }
}
