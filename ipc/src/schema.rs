//! Wire schemas for every state-file artifact exchanged between the Hook,
//! Bot, and Orchestrator. Field names match §6 of the spec exactly so the
//! JSON on disk is the contract, not just this struct definition.

use crate::ids::{CorrelationId, WorkspaceHash};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GitStatus {
    pub branch: String,
    pub modified_files: u32,
    pub untracked_files: u32,
    pub staged_files: u32,
    pub ahead_commits: u32,
    pub behind_commits: u32,
}

impl Default for GitStatus {
    fn default() -> Self {
        GitStatus {
            branch: "unknown".to_string(),
            modified_files: 0,
            untracked_files: 0,
            staged_files: 0,
            ahead_commits: 0,
            behind_commits: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LycheeStatus {
    pub ran: bool,
    pub error_count: u32,
    pub details: String,
    pub results_file: Option<String>,
}

impl Default for LycheeStatus {
    fn default() -> Self {
        LycheeStatus {
            ran: false,
            error_count: 0,
            details: String::new(),
            results_file: None,
        }
    }
}

/// Produced once per session termination by the Hook, consumed by the Bot.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub correlation_id: CorrelationId,
    pub session_id: String,
    pub workspace_path: String,
    pub workspace_id: WorkspaceHash,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: u64,
    pub git_status: GitStatus,
    pub lychee_status: LycheeStatus,
    pub available_workflows: Vec<String>,
    pub user_prompt: String,
    pub last_response: String,
}

/// The chat's orchestration mode; always `Sequential` since no dependency
/// model exists (spec.md Non-goals).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationMode {
    Sequential,
}

/// Emitted by the Bot when the user taps a workflow button; carries the
/// summary inline since the summary file may already be gone by the time
/// the Orchestrator opens this selection.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkflowSelection {
    pub selection_type: String,
    pub correlation_id: CorrelationId,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub workflow_ids: Vec<String>,
    pub orchestration_mode: OrchestrationMode,
    pub workspace_path: String,
    pub workspace_id: WorkspaceHash,
    pub summary_data: SessionSummary,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Error,
    Timeout,
    Aborted,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Error => "error",
            ExecutionStatus::Timeout => "timeout",
            ExecutionStatus::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExecutionMetadata {
    pub estimated_duration: Option<String>,
    pub risk_level: Option<String>,
    pub category: Option<String>,
}

/// Written by the Orchestrator once a workflow's subprocess has finished.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkflowExecution {
    pub execution_id: String,
    pub correlation_id: CorrelationId,
    pub session_id: String,
    pub workflow_id: String,
    pub workflow_name: String,
    pub status: ExecutionStatus,
    pub exit_code: i32,
    pub duration_seconds: f64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub stdout: String,
    pub stderr: String,
    pub summary: String,
    pub metadata: ExecutionMetadata,
}

/// The compact sibling of [`WorkflowExecution`] that the Bot edits the chat
/// message from; written alongside the execution record.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Completion {
    pub correlation_id: CorrelationId,
    pub session_id: String,
    pub workspace_id: WorkspaceHash,
    pub workflow_id: String,
    pub workflow_name: String,
    pub status: ExecutionStatus,
    pub duration_seconds: f64,
    pub summary: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Running,
    Completed,
    Error,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Starting,
    Rendering,
    Executing,
    Waiting,
    Completed,
}

impl std::fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProgressStage::Starting => "starting",
            ProgressStage::Rendering => "rendering",
            ProgressStage::Executing => "executing",
            ProgressStage::Waiting => "waiting",
            ProgressStage::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Overwritten in place at each stage of one workflow's execution; a single
/// file per (session, workspace) pair. Deleted when `status == Completed`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressUpdate {
    pub workspace_id: WorkspaceHash,
    pub session_id: String,
    pub workflow_id: String,
    pub status: ProgressStatus,
    pub stage: ProgressStage,
    pub progress_percent: u8,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ProgressUpdate {
    /// Clamps `progress_percent` into `[0, 100]` on construction, since the
    /// invariant in spec.md §3 is an inclusive range and callers compute the
    /// value from arbitrary stage arithmetic.
    pub fn new(
        workspace_id: WorkspaceHash,
        session_id: String,
        workflow_id: String,
        status: ProgressStatus,
        stage: ProgressStage,
        progress_percent: u8,
        message: String,
    ) -> Self {
        ProgressUpdate {
            workspace_id,
            session_id,
            workflow_id,
            status,
            stage,
            progress_percent: progress_percent.min(100),
            message,
            timestamp: Utc::now(),
        }
    }
}

/// What the Bot stores under a short opaque callback key, so inline buttons
/// only ever carry the key, never the full selection payload.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CallbackEntry {
    pub workflow_id: String,
    pub session_id: String,
    pub workspace_id: WorkspaceHash,
    pub summary_data: SessionSummary,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::CorrelationId;

    fn sample_summary() -> SessionSummary {
        SessionSummary {
            correlation_id: CorrelationId::generate(),
            session_id: "sess-1".into(),
            workspace_path: "/tmp/ws".into(),
            workspace_id: WorkspaceHash::of(std::path::Path::new("/tmp/ws")),
            timestamp: Utc::now(),
            duration_seconds: 120,
            git_status: GitStatus::default(),
            lychee_status: LycheeStatus::default(),
            available_workflows: vec!["always-workflow".into()],
            user_prompt: "fix the bug".into(),
            last_response: "done".into(),
        }
    }

    #[test]
    fn session_summary_roundtrips_through_json() {
        let summary = sample_summary();
        let json = serde_json::to_string(&summary).unwrap();
        let back: SessionSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(summary, back);
    }

    #[test]
    fn execution_status_display_matches_wire_vocabulary() {
        assert_eq!(ExecutionStatus::Success.to_string(), "success");
        assert_eq!(ExecutionStatus::Timeout.to_string(), "timeout");
    }

    #[test]
    fn progress_percent_is_clamped() {
        let p = ProgressUpdate::new(
            WorkspaceHash::of(std::path::Path::new("/tmp")),
            "s".into(),
            "w".into(),
            ProgressStatus::Running,
            ProgressStage::Executing,
            250,
            "m".into(),
        );
        assert_eq!(p.progress_percent, 100);
    }
}
