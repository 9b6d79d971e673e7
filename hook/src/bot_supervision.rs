//! Ensures the Bot Coordinator is running, spawning it detached if not.
//! Adapted from the teacher's `loom-cli` `backend/auto_start.rs`
//! spawn-detached-and-poll pattern: there it polls a WebSocket URL after
//! spawning `loom serve`; here it polls the pidfile's freshness after
//! spawning `orchestrator-bot`.

use ipc::pidfile::{read_pidfile, record_is_live_owner};
use ipc::StateRoot;
use std::process::Stdio;
use std::time::Duration;

const POLL_INTERVAL_MS: u64 = 200;
const MAX_WAIT_MS: u64 = 5000;

/// Checks the pidfile; spawns a detached Bot only if it is absent, stale,
/// or owned by a process whose fingerprint doesn't match. Never spawns
/// unconditionally.
pub async fn ensure_running(state_root: &StateRoot, bot_exe: &str, expected_fingerprint: &str) {
    let pidfile_path = state_root.bot_pidfile_path();

    let already_running = match read_pidfile(&pidfile_path) {
        Ok(Some(record)) => record_is_live_owner(&record, expected_fingerprint),
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read bot pidfile; assuming not running");
            false
        }
    };

    if already_running {
        tracing::debug!("bot already running, not spawning");
        return;
    }

    tracing::info!(bot_exe, "bot not running or stale pidfile; spawning detached");
    if let Err(e) = spawn_detached(bot_exe, state_root.root()) {
        tracing::warn!(error = %e, "failed to spawn bot");
        return;
    }

    wait_until_pidfile_fresh(&pidfile_path, expected_fingerprint).await;
}

fn spawn_detached(bot_exe: &str, state_root: &std::path::Path) -> std::io::Result<std::process::Child> {
    std::process::Command::new(bot_exe)
        .env("STATE_ROOT", state_root)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
}

async fn wait_until_pidfile_fresh(pidfile_path: &std::path::Path, expected_fingerprint: &str) {
    let start = std::time::Instant::now();
    let max_wait = Duration::from_millis(MAX_WAIT_MS);
    let interval = Duration::from_millis(POLL_INTERVAL_MS);

    while start.elapsed() < max_wait {
        if let Ok(Some(record)) = read_pidfile(pidfile_path) {
            if record_is_live_owner(&record, expected_fingerprint) {
                return;
            }
        }
        tokio::time::sleep(interval).await;
    }
    tracing::warn!("bot did not become ready within the spawn grace period");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipc::pidfile::{write_pidfile, PidRecord};

    #[tokio::test]
    async fn live_owner_with_matching_fingerprint_skips_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let root = StateRoot::new(dir.path());
        let record = PidRecord::current("orchestrator-bot");
        write_pidfile(&root.bot_pidfile_path(), &record).unwrap();

        // Spawning "/bin/false"-equivalent would fail loudly if attempted;
        // since the pidfile already reflects a live owner, ensure_running
        // must return without touching the filesystem further.
        ensure_running(&root, "does-not-exist-binary-xyz", "orchestrator-bot").await;
        let after = read_pidfile(&root.bot_pidfile_path()).unwrap().unwrap();
        assert_eq!(after, record);
    }
}
