//! Append-only SQLite event log: `session_events`, opened in WAL mode so a
//! single writer per process can coexist with any number of readers. This
//! store is purely observational — spec.md §4.5 and §9 are explicit that
//! the control path never reads from it to make a decision. It exists so a
//! `correlation_id` trace can be reconstructed for debugging and post-hoc
//! validation.

mod event;

pub use event::{Component, EventType, SessionEvent};

use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("metadata is not valid JSON: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// A handle on the shared `events.db`. Cheap to clone-by-reference (wrap in
/// `Arc` at the call site); internally serializes writes through a mutex the
/// same way `loom-workspace`'s `Store` serializes its own sqlite writes.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens (creating if absent) the event database, enables WAL mode, and
    /// ensures the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS session_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                correlation_id TEXT NOT NULL,
                workspace_id TEXT,
                session_id TEXT,
                component TEXT NOT NULL CHECK(component IN ('hook','bot','orchestrator','cli')),
                event_type TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                metadata TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_session_events_correlation_id
                ON session_events(correlation_id);
            CREATE INDEX IF NOT EXISTS idx_session_events_timestamp
                ON session_events(timestamp);
            "#,
        )?;
        Ok(Store { conn: Mutex::new(conn) })
    }

    /// Appends one event row. Never updates or deletes; a failed write is
    /// logged and dropped by the caller (spec.md §5 "best-effort"), so this
    /// returns a `Result` but callers are expected to `if let Err = ... { warn! }`
    /// rather than propagate.
    pub fn append(
        &self,
        correlation_id: &str,
        workspace_id: Option<&str>,
        session_id: Option<&str>,
        component: Component,
        event_type: EventType,
        metadata: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let metadata_str = serde_json::to_string(metadata)?;
        let timestamp = chrono::Utc::now().to_rfc3339();
        let conn = self.conn.lock().expect("event store mutex poisoned");
        conn.execute(
            "INSERT INTO session_events \
             (correlation_id, workspace_id, session_id, component, event_type, timestamp, metadata) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                correlation_id,
                workspace_id,
                session_id,
                component.as_str(),
                event_type.to_string(),
                timestamp,
                metadata_str,
            ],
        )?;
        Ok(())
    }

    /// Convenience wrapper: logs a warning instead of propagating, matching
    /// the "best-effort, never blocks the control path" policy.
    pub fn append_best_effort(
        &self,
        correlation_id: &str,
        workspace_id: Option<&str>,
        session_id: Option<&str>,
        component: Component,
        event_type: EventType,
        metadata: &serde_json::Value,
    ) {
        if let Err(e) = self.append(correlation_id, workspace_id, session_id, component, event_type, metadata) {
            tracing::warn!(error = %e, %correlation_id, "event store append failed, dropping");
        }
    }

    /// Returns the full trace for one correlation id, ordered by timestamp —
    /// the end-to-end reconstruction spec.md §4.5 describes.
    pub fn trace(&self, correlation_id: &str) -> Result<Vec<SessionEvent>, StoreError> {
        let conn = self.conn.lock().expect("event store mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, correlation_id, workspace_id, session_id, component, event_type, timestamp, metadata \
             FROM session_events WHERE correlation_id = ?1 ORDER BY timestamp ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![correlation_id], SessionEvent::from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn append_then_trace_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("events.db")).unwrap();

        store
            .append("cid-1", Some("ws"), Some("sess"), Component::Hook, EventType::HookStarted, &json!({}))
            .unwrap();
        store
            .append("cid-1", Some("ws"), Some("sess"), Component::Hook, EventType::HookCompleted, &json!({}))
            .unwrap();
        store
            .append("cid-2", Some("ws"), Some("sess"), Component::Hook, EventType::HookStarted, &json!({}))
            .unwrap();

        let trace = store.trace("cid-1").unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[0].event_type, EventType::HookStarted);
        assert_eq!(trace[1].event_type, EventType::HookCompleted);
    }

    #[test]
    fn event_type_display_matches_closed_vocabulary() {
        assert_eq!(EventType::SummaryCreated.to_string(), "summary.created");
        assert_eq!(EventType::ClaudeCliStarted.to_string(), "claude_cli.started");
        assert_eq!(EventType::WorkflowTemplateRendered.to_string(), "workflow.template_rendered");
    }

    #[test]
    fn failed_write_on_closed_db_is_dropped_not_propagated() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("events.db")).unwrap();
        // append_best_effort never panics or returns an error type, regardless
        // of outcome — this just exercises the happy path through that wrapper.
        store.append_best_effort("cid-3", None, None, Component::Bot, EventType::BotStarted, &json!({"ok": true}));
    }
}
