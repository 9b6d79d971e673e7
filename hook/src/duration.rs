//! Reads and unlinks the session-start marker to compute `duration_seconds`.
//! The marker is written by a session-start hook outside this workspace;
//! absence is expected on some sessions and is not treated as an error.

use chrono::{DateTime, Utc};
use ipc::StateRoot;

/// Reads `session_timestamps/{session_id}.timestamp`, unlinks it, and
/// returns the elapsed seconds since the RFC 3339 timestamp it contains.
/// Returns 0 (and logs a warning) when the marker is absent or unreadable.
pub fn read_and_unlink_marker(state_root: &StateRoot, session_id: &str) -> u64 {
    let path = state_root
        .session_timestamps_dir()
        .join(StateRoot::session_timestamp_filename(session_id));

    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => {
            tracing::warn!(session_id, "summary.duration_marker_missing");
            return 0;
        }
    };

    ipc::unlink_tolerant(&path);

    let started = match DateTime::parse_from_rfc3339(contents.trim()) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(_) => {
            tracing::warn!(session_id, "summary.duration_marker_unparseable");
            return 0;
        }
    };

    let elapsed = Utc::now().signed_duration_since(started);
    elapsed.num_seconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_marker_yields_zero() {
        let dir = tempfile::tempdir().unwrap();
        let root = StateRoot::new(dir.path());
        std::fs::create_dir_all(root.session_timestamps_dir()).unwrap();
        assert_eq!(read_and_unlink_marker(&root, "sess-1"), 0);
    }

    #[test]
    fn marker_is_read_and_unlinked() {
        let dir = tempfile::tempdir().unwrap();
        let root = StateRoot::new(dir.path());
        std::fs::create_dir_all(root.session_timestamps_dir()).unwrap();
        let marker_path = root
            .session_timestamps_dir()
            .join(StateRoot::session_timestamp_filename("sess-2"));
        let started = Utc::now() - chrono::Duration::seconds(5);
        std::fs::write(&marker_path, started.to_rfc3339()).unwrap();

        let elapsed = read_and_unlink_marker(&root, "sess-2");
        assert!(elapsed >= 4 && elapsed < 60, "elapsed was {elapsed}");
        assert!(!marker_path.exists());
    }

    #[test]
    fn corrupt_marker_yields_zero_and_is_unlinked() {
        let dir = tempfile::tempdir().unwrap();
        let root = StateRoot::new(dir.path());
        std::fs::create_dir_all(root.session_timestamps_dir()).unwrap();
        let marker_path = root
            .session_timestamps_dir()
            .join(StateRoot::session_timestamp_filename("sess-3"));
        std::fs::write(&marker_path, "not-a-timestamp").unwrap();

        assert_eq!(read_and_unlink_marker(&root, "sess-3"), 0);
        assert!(!marker_path.exists());
    }
}
