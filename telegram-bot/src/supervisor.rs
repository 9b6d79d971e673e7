//! Crash-loop alerting. spec.md §4.2 delegates restart-on-exit and
//! crash-loop *detection* to an external supervisor but doesn't specify how
//! the operator is notified; this records each startup in `bot.restarts`
//! and has the Bot alert itself over chat when restarts cluster, since the
//! Bot is the only component with a channel back to the operator.

use ipc::StateRoot;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const WINDOW: Duration = Duration::from_secs(60);
const ALERT_THRESHOLD: usize = 5;

#[derive(Default, Serialize, Deserialize)]
struct RestartLog {
    #[serde(default)]
    starts: Vec<chrono::DateTime<chrono::Utc>>,
}

/// Records this startup and returns `true` if restarts within the trailing
/// window have reached the alert threshold.
pub fn record_startup_and_check_crash_loop(state_root: &StateRoot) -> bool {
    let path = state_root.restart_counter_path();
    let mut log: RestartLog = ipc::read_json_tolerant(&path).unwrap_or_default();

    let now = chrono::Utc::now();
    let cutoff = now - chrono::Duration::from_std(WINDOW).expect("WINDOW fits in chrono::Duration");
    log.starts.retain(|t| *t >= cutoff);
    log.starts.push(now);

    let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let filename = path.file_name().and_then(|f| f.to_str()).unwrap_or("bot.restarts");
    if let Err(e) = ipc::atomic_write_json(dir, filename, &log) {
        tracing::warn!(error = %e, "failed to persist restart log");
    }

    log.starts.len() >= ALERT_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_startup_does_not_trigger_alert() {
        let dir = tempfile::tempdir().unwrap();
        let root = StateRoot::new(dir.path());
        assert!(!record_startup_and_check_crash_loop(&root));
    }

    #[test]
    fn five_rapid_startups_trigger_alert() {
        let dir = tempfile::tempdir().unwrap();
        let root = StateRoot::new(dir.path());
        for _ in 0..4 {
            assert!(!record_startup_and_check_crash_loop(&root));
        }
        assert!(record_startup_and_check_crash_loop(&root));
    }

    #[test]
    fn stale_entries_outside_window_are_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let root = StateRoot::new(dir.path());
        let old = RestartLog {
            starts: vec![chrono::Utc::now() - chrono::Duration::hours(1); 4],
        };
        ipc::atomic_write_json(&dir.path(), "bot.restarts", &old).unwrap();
        // Only this startup is within the window, so no alert.
        assert!(!record_startup_and_check_crash_loop(&root));
    }
}
