//! `workflow-orchestrator`: spawned by the Bot with one argument (a
//! WorkflowSelection file path), runs each selected workflow to completion,
//! then exits (spec.md §4.3).

mod progress;
mod subprocess;

use clap::Parser;
use eventstore::{Component, EventType, Store};
use ipc::schema::{Completion, ExecutionMetadata, ExecutionStatus, ProgressStage, WorkflowExecution};
use ipc::StateRoot;
use registry::{render_template, TemplateContext, WorkflowRegistry};
use std::path::PathBuf;
use std::time::Duration;
use subprocess::InvocationMode;

#[derive(Parser, Debug)]
struct Cli {
    /// Path to the WorkflowSelection file to execute.
    selection_path: PathBuf,

    /// Render each workflow's prompt and print it without spawning the CLI.
    #[arg(long)]
    dry_run: bool,
}

const DEFAULT_WORKFLOW_TIMEOUT_SECS: u64 = 600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = config::load_and_apply("orchestrator-pipeline", None);
    let _ = config::logging::init();

    let cli = Cli::parse();
    let state_root_path = std::env::var("STATE_ROOT").unwrap_or_else(|_| "./state".to_string());
    let state_root = StateRoot::new(state_root_path);

    let registry = WorkflowRegistry::load(state_root.workflows_registry_path())
        .map_err(|e| anyhow::anyhow!("failed to load workflow registry: {e}"))?;

    let bytes = std::fs::read(&cli.selection_path)
        .map_err(|e| anyhow::anyhow!("failed to read selection file {}: {e}", cli.selection_path.display()))?;
    let selection: ipc::schema::WorkflowSelection = serde_json::from_slice(&bytes)
        .map_err(|e| anyhow::anyhow!("malformed selection file {}: {e}", cli.selection_path.display()))?;

    let store = Store::open(state_root.events_db_path()).ok();
    if let Some(store) = &store {
        store.append_best_effort(
            selection.correlation_id.as_str(),
            Some(selection.workspace_id.as_str()),
            Some(selection.session_id.as_str()),
            Component::Orchestrator,
            EventType::SelectionReceived,
            &serde_json::json!({"workflow_ids": selection.workflow_ids}),
        );
    }
    let timeout = Duration::from_secs(
        std::env::var("WORKFLOW_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_WORKFLOW_TIMEOUT_SECS),
    );
    let mode = InvocationMode::from_env();

    for workflow_id in &selection.workflow_ids {
        run_one_workflow(&state_root, &registry, &selection, workflow_id, store.as_ref(), timeout, mode, cli.dry_run)
            .await;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_one_workflow(
    state_root: &StateRoot,
    registry: &WorkflowRegistry,
    selection: &ipc::schema::WorkflowSelection,
    workflow_id: &str,
    store: Option<&Store>,
    timeout: Duration,
    mode: InvocationMode,
    dry_run: bool,
) {
    let summary = &selection.summary_data;
    let correlation_id = selection.correlation_id.as_str();
    let session_id = &selection.session_id;
    let workspace_id = &selection.workspace_id;

    let Some(entry) = registry.get(workflow_id) else {
        tracing::warn!(workflow_id, "unknown workflow id in selection, skipping");
        return;
    };

    let ctx = TemplateContext::from_summary(summary);
    let prompt = match render_template(&entry.prompt_template, &ctx) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(workflow_id, error = %e, "template rendering failed");
            progress::emit_error(state_root, session_id, workspace_id, workflow_id, e.to_string());
            write_error_execution(state_root, store, selection, entry, &format!("template error: {e}"));
            return;
        }
    };

    if let Some(store) = store {
        store.append_best_effort(
            correlation_id,
            Some(workspace_id.as_str()),
            Some(session_id),
            Component::Orchestrator,
            EventType::WorkflowTemplateRendered,
            &serde_json::json!({"workflow_id": workflow_id}),
        );
    }

    if dry_run {
        println!("--- prompt for {workflow_id} ---\n{prompt}\n");
        return;
    }

    progress::emit(state_root, session_id, workspace_id, workflow_id, ProgressStage::Starting, 0, "starting");

    if let Some(store) = store {
        store.append_best_effort(
            correlation_id,
            Some(workspace_id.as_str()),
            Some(session_id),
            Component::Orchestrator,
            EventType::WorkflowStarted,
            &serde_json::json!({"workflow_id": workflow_id}),
        );
    }

    progress::emit(state_root, session_id, workspace_id, workflow_id, ProgressStage::Executing, 25, "running");
    if let Some(store) = store {
        store.append_best_effort(
            correlation_id,
            Some(workspace_id.as_str()),
            Some(session_id),
            Component::Orchestrator,
            EventType::ClaudeCliStarted,
            &serde_json::json!({"workflow_id": workflow_id}),
        );
    }

    let started_at = chrono::Utc::now();
    let result = subprocess::run(&prompt, &summary.workspace_path, timeout, mode).await;
    let completed_at = chrono::Utc::now();

    progress::emit(state_root, session_id, workspace_id, workflow_id, ProgressStage::Completed, 100, "finished");

    if let Some(store) = store {
        store.append_best_effort(
            correlation_id,
            Some(workspace_id.as_str()),
            Some(session_id),
            Component::Orchestrator,
            EventType::ClaudeCliCompleted,
            &serde_json::json!({"workflow_id": workflow_id, "status": result.status.to_string()}),
        );
    }

    let execution_id = ipc::CorrelationId::generate().as_str().to_string();
    let trailing_summary = trailing_summary_line(&result.stdout, &result.stderr);

    let execution = WorkflowExecution {
        execution_id,
        correlation_id: selection.correlation_id.clone(),
        session_id: session_id.clone(),
        workflow_id: workflow_id.to_string(),
        workflow_name: entry.name.clone(),
        status: result.status,
        exit_code: result.exit_code,
        duration_seconds: result.elapsed.as_secs_f64(),
        started_at,
        completed_at,
        stdout: result.stdout,
        stderr: result.stderr,
        summary: trailing_summary.clone(),
        metadata: ExecutionMetadata {
            estimated_duration: entry.estimated_duration.clone(),
            risk_level: entry.risk_level.clone(),
            category: entry.category.clone(),
        },
    };

    let execution_filename = StateRoot::execution_filename(session_id, workspace_id, workflow_id);
    if let Err(e) = ipc::atomic_write_json(&state_root.executions_dir(), &execution_filename, &execution) {
        tracing::warn!(error = %e, workflow_id, "failed to write execution record");
    }

    let completion = Completion {
        correlation_id: selection.correlation_id.clone(),
        session_id: session_id.clone(),
        workspace_id: workspace_id.clone(),
        workflow_id: workflow_id.to_string(),
        workflow_name: entry.name.clone(),
        status: execution.status,
        duration_seconds: execution.duration_seconds,
        summary: trailing_summary,
    };
    let completion_filename = StateRoot::completion_filename(session_id, workspace_id);
    if let Err(e) = ipc::atomic_write_json(&state_root.completions_dir(), &completion_filename, &completion) {
        tracing::warn!(error = %e, workflow_id, "failed to write completion record");
    }

    if let Some(store) = store {
        store.append_best_effort(
            correlation_id,
            Some(workspace_id.as_str()),
            Some(session_id),
            Component::Orchestrator,
            EventType::WorkflowCompleted,
            &serde_json::json!({"workflow_id": workflow_id, "status": execution.status.to_string()}),
        );
        store.append_best_effort(
            correlation_id,
            Some(workspace_id.as_str()),
            Some(session_id),
            Component::Orchestrator,
            EventType::ExecutionCreated,
            &serde_json::json!({"workflow_id": workflow_id}),
        );
    }
}

fn write_error_execution(
    state_root: &StateRoot,
    store: Option<&Store>,
    selection: &ipc::schema::WorkflowSelection,
    entry: &registry::WorkflowEntry,
    detail: &str,
) {
    let now = chrono::Utc::now();
    let completion = Completion {
        correlation_id: selection.correlation_id.clone(),
        session_id: selection.session_id.clone(),
        workspace_id: selection.workspace_id.clone(),
        workflow_id: entry.id.clone(),
        workflow_name: entry.name.clone(),
        status: ExecutionStatus::Error,
        duration_seconds: 0.0,
        summary: detail.to_string(),
    };
    let filename = StateRoot::completion_filename(&selection.session_id, &selection.workspace_id);
    if let Err(e) = ipc::atomic_write_json(&state_root.completions_dir(), &filename, &completion) {
        tracing::warn!(error = %e, "failed to write error completion record");
    }
    if let Some(store) = store {
        store.append_best_effort(
            selection.correlation_id.as_str(),
            Some(selection.workspace_id.as_str()),
            Some(selection.session_id.as_str()),
            Component::Orchestrator,
            EventType::WorkflowCompleted,
            &serde_json::json!({"workflow_id": entry.id, "status": "error"}),
        );
    }
    let _ = now;
}

fn trailing_summary_line(stdout: &str, stderr: &str) -> String {
    let source = if !stdout.trim().is_empty() { stdout } else { stderr };
    source
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("(no output)")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_summary_prefers_stdout_last_nonblank_line() {
        let summary = trailing_summary_line("first\nsecond\n\n", "ignored");
        assert_eq!(summary, "second");
    }

    #[test]
    fn trailing_summary_falls_back_to_stderr_when_stdout_empty() {
        let summary = trailing_summary_line("   \n", "oops\nfatal error");
        assert_eq!(summary, "fatal error");
    }
}
