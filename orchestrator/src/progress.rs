//! Emits `ProgressUpdate` atomically at each stage transition, and unlinks
//! it once the workflow reaches a terminal state (spec.md §4.3 step b, e).

use ipc::schema::{ProgressStage, ProgressStatus, ProgressUpdate};
use ipc::{StateRoot, WorkspaceHash};

pub fn emit(
    state_root: &StateRoot,
    session_id: &str,
    workspace_id: &WorkspaceHash,
    workflow_id: &str,
    stage: ProgressStage,
    progress_percent: u8,
    message: impl Into<String>,
) {
    let status = match stage {
        ProgressStage::Completed => ProgressStatus::Completed,
        _ => ProgressStatus::Running,
    };
    let update = ProgressUpdate::new(
        workspace_id.clone(),
        session_id.to_string(),
        workflow_id.to_string(),
        status,
        stage,
        progress_percent,
        message.into(),
    );

    let filename = StateRoot::progress_filename(session_id, workspace_id);
    if let Err(e) = ipc::atomic_write_json(&state_root.progress_dir(), &filename, &update) {
        tracing::warn!(error = %e, "failed to emit progress update");
        return;
    }

    if stage == ProgressStage::Completed {
        let path = state_root.progress_dir().join(filename);
        ipc::unlink_tolerant(&path);
    }
}

/// Marks a failed stage as terminal without a success status, used when
/// template rendering fails before any subprocess runs (spec.md §4.3 step a).
pub fn emit_error(
    state_root: &StateRoot,
    session_id: &str,
    workspace_id: &WorkspaceHash,
    workflow_id: &str,
    message: impl Into<String>,
) {
    let update = ProgressUpdate::new(
        workspace_id.clone(),
        session_id.to_string(),
        workflow_id.to_string(),
        ProgressStatus::Error,
        ProgressStage::Completed,
        100,
        message.into(),
    );
    let filename = StateRoot::progress_filename(session_id, workspace_id);
    if let Err(e) = ipc::atomic_write_json(&state_root.progress_dir(), &filename, &update) {
        tracing::warn!(error = %e, "failed to emit error progress update");
        return;
    }
    let path = state_root.progress_dir().join(&filename);
    ipc::unlink_tolerant(&path);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_stage_is_written_then_unlinked() {
        let dir = tempfile::tempdir().unwrap();
        let root = StateRoot::new(dir.path());
        let wsh = WorkspaceHash::of(std::path::Path::new("/tmp/ws"));

        emit(&root, "s1", &wsh, "prune-legacy", ProgressStage::Starting, 0, "starting");
        let filename = StateRoot::progress_filename("s1", &wsh);
        assert!(root.progress_dir().join(&filename).exists());

        emit(&root, "s1", &wsh, "prune-legacy", ProgressStage::Completed, 100, "done");
        assert!(!root.progress_dir().join(&filename).exists());
    }
}
