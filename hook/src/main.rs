//! `session-summary-hook`: invoked once per AI-coding-session termination.
//! Reads the session's git/validator state, computes eligible workflows,
//! writes a `SessionSummary`, and ensures the Bot Coordinator is running.
//!
//! Fail-open: every step except the final atomic write degrades to a
//! default/zeroed field plus a logged warning rather than aborting.

mod bot_supervision;
mod duration;
mod git;
mod validator;

use eventstore::{Component, EventType, Store};
use ipc::schema::SessionSummary;
use ipc::{CorrelationId, StateRoot, WorkspaceHash};
use registry::WorkflowRegistry;
use std::path::PathBuf;
use std::time::Duration;

const EXPECTED_BOT_FINGERPRINT: &str = "orchestrator-bot";
const VALIDATOR_TIMEOUT_SECS: u64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = config::load_and_apply("orchestrator-pipeline", None);
    let _ = config::logging::init();

    let session_id = std::env::var("SESSION_ID")
        .map_err(|_| anyhow::anyhow!("SESSION_ID not set in environment"))?;
    let workspace_path = std::env::var("WORKSPACE_PATH")
        .map_err(|_| anyhow::anyhow!("WORKSPACE_PATH not set in environment"))?;
    let workspace_path = PathBuf::from(workspace_path);
    let state_root_path = std::env::var("STATE_ROOT").unwrap_or_else(|_| "./state".to_string());
    let state_root = StateRoot::new(state_root_path);

    tracing::info!(session_id, "hook.started");
    let correlation_id = CorrelationId::generate();
    let workspace_id = WorkspaceHash::of(&workspace_path);

    let store = Store::open(state_root.events_db_path()).ok();
    if let Some(store) = &store {
        store.append_best_effort(
            correlation_id.as_str(),
            Some(workspace_id.as_str()),
            Some(session_id.as_str()),
            Component::Hook,
            EventType::HookStarted,
            &serde_json::json!({}),
        );
    }

    let duration_seconds = duration::read_and_unlink_marker(&state_root, &session_id);

    let timeout = Duration::from_secs(VALIDATOR_TIMEOUT_SECS);
    let lychee_status = validator::run(&workspace_path, timeout).await;
    let git_status = git::collect_status(&workspace_path).await;

    let last_user_prompt = std::env::var("LAST_USER_PROMPT").unwrap_or_default();
    let last_response = std::env::var("LAST_RESPONSE").unwrap_or_default();

    let registry = match WorkflowRegistry::load(state_root.workflows_registry_path()) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load workflow registry; no workflows eligible");
            WorkflowRegistry::empty()
        }
    };

    let mut summary = SessionSummary {
        correlation_id: correlation_id.clone(),
        session_id: session_id.clone(),
        workspace_path: workspace_path.to_string_lossy().to_string(),
        workspace_id: workspace_id.clone(),
        timestamp: chrono::Utc::now(),
        duration_seconds,
        git_status,
        lychee_status,
        available_workflows: Vec::new(),
        user_prompt: last_user_prompt,
        last_response,
    };
    summary.available_workflows = registry.eligible_workflow_ids(&summary);

    let summaries_dir = state_root.summaries_dir();
    let filename = StateRoot::summary_filename(&session_id, &workspace_id);

    match ipc::atomic_write_json(&summaries_dir, &filename, &summary) {
        Ok(path) => {
            tracing::info!(path = %path.display(), "summary.created");
            if let Some(store) = &store {
                store.append_best_effort(
                    correlation_id.as_str(),
                    Some(workspace_id.as_str()),
                    Some(session_id.as_str()),
                    Component::Hook,
                    EventType::HookCompleted,
                    &serde_json::json!({}),
                );
                store.append_best_effort(
                    correlation_id.as_str(),
                    Some(workspace_id.as_str()),
                    Some(session_id.as_str()),
                    Component::Hook,
                    EventType::SummaryCreated,
                    &serde_json::json!({
                        "error_count": summary.lychee_status.error_count,
                        "summary_file": filename,
                    }),
                );
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to write summary file, aborting");
            std::process::exit(1);
        }
    }

    let bot_exe = std::env::var("BOT_EXE").unwrap_or_else(|_| "orchestrator-bot".to_string());
    bot_supervision::ensure_running(&state_root, &bot_exe, EXPECTED_BOT_FINGERPRINT).await;

    Ok(())
}
