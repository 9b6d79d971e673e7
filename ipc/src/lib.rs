//! Shared state-file schemas, atomic JSON I/O, ID generation, and markup
//! balancing for the session orchestration pipeline (Hook, Bot,
//! Orchestrator). No component here suspends or blocks on anything but the
//! filesystem; it is pure plumbing shared by all three processes.

mod atomic;
mod error;
pub mod ids;
pub mod markup;
pub mod pidfile;
pub mod schema;

pub use atomic::{atomic_write_json, read_json_tolerant, unlink_tolerant};
pub use error::IpcError;
pub use ids::{CorrelationId, WorkspaceHash};

/// The fixed layout of the shared state root (spec.md §6).
pub struct StateRoot {
    root: std::path::PathBuf,
}

impl StateRoot {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        StateRoot { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    pub fn summaries_dir(&self) -> std::path::PathBuf {
        self.root.join("summaries")
    }

    pub fn selections_dir(&self) -> std::path::PathBuf {
        self.root.join("selections")
    }

    pub fn executions_dir(&self) -> std::path::PathBuf {
        self.root.join("executions")
    }

    pub fn completions_dir(&self) -> std::path::PathBuf {
        self.root.join("completions")
    }

    pub fn progress_dir(&self) -> std::path::PathBuf {
        self.root.join("progress")
    }

    pub fn callbacks_dir(&self) -> std::path::PathBuf {
        self.root.join("callbacks")
    }

    pub fn session_timestamps_dir(&self) -> std::path::PathBuf {
        self.root.join("session_timestamps")
    }

    pub fn events_db_path(&self) -> std::path::PathBuf {
        self.root.join("events.db")
    }

    pub fn bot_pidfile_path(&self) -> std::path::PathBuf {
        self.root.join("bot.pid")
    }

    pub fn workflows_registry_path(&self) -> std::path::PathBuf {
        self.root.join("workflows.json")
    }

    pub fn workspace_registry_path(&self) -> std::path::PathBuf {
        self.root.join("registry.json")
    }

    pub fn restart_counter_path(&self) -> std::path::PathBuf {
        self.root.join("bot.restarts")
    }

    pub fn summary_filename(session_id: &str, workspace_id: &WorkspaceHash) -> String {
        format!("summary_{session_id}_{workspace_id}.json")
    }

    pub fn selection_filename(session_id: &str, workspace_id: &WorkspaceHash) -> String {
        format!("selection_{session_id}_{workspace_id}.json")
    }

    pub fn execution_filename(
        session_id: &str,
        workspace_id: &WorkspaceHash,
        workflow_id: &str,
    ) -> String {
        format!("execution_{session_id}_{workspace_id}_{workflow_id}.json")
    }

    pub fn completion_filename(session_id: &str, workspace_id: &WorkspaceHash) -> String {
        format!("completion_{session_id}_{workspace_id}.json")
    }

    pub fn progress_filename(session_id: &str, workspace_id: &WorkspaceHash) -> String {
        format!("progress_{session_id}_{workspace_id}.json")
    }

    pub fn callback_filename(key: &str) -> String {
        format!("cb_{key}.json")
    }

    pub fn session_timestamp_filename(session_id: &str) -> String {
        format!("{session_id}.timestamp")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_match_spec_naming_convention() {
        let wsh = WorkspaceHash::of(std::path::Path::new("/tmp/proj"));
        assert_eq!(
            StateRoot::summary_filename("sess1", &wsh),
            format!("summary_sess1_{wsh}.json")
        );
        assert_eq!(
            StateRoot::execution_filename("sess1", &wsh, "prune-legacy"),
            format!("execution_sess1_{wsh}_prune-legacy.json")
        );
    }

    #[test]
    fn state_root_subdirectories_nest_under_root() {
        let root = StateRoot::new("/tmp/state");
        assert_eq!(root.summaries_dir(), std::path::Path::new("/tmp/state/summaries"));
        assert_eq!(root.events_db_path(), std::path::Path::new("/tmp/state/events.db"));
    }
}
