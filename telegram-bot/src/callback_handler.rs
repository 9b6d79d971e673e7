//! Handles inline-button presses (spec.md §4.2.3).

use crate::markup::prepare_outbound;
use crate::rate_limit::with_retry;
use crate::state::AppState;
use eventstore::{Component, EventType};
use ipc::schema::{OrchestrationMode, WorkflowSelection};
use ipc::StateRoot;
use std::process::Stdio;
use std::sync::Arc;
use teloxide::payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters};
use teloxide::requests::Requester;
use teloxide::types::{CallbackQuery, ParseMode};

pub async fn handle(state: &Arc<AppState>, query: CallbackQuery) {
    state.touch_activity();

    let Some(data) = query.data.as_deref() else {
        return;
    };
    let Some(message) = query.message.as_ref() else {
        return;
    };

    let Some(entry) = crate::callbacks::lookup(&state.state_root, data) else {
        let _ = with_retry(|| {
            state
                .bot
                .answer_callback_query(query.id.clone())
                .text("This session has expired — rerun it to pick a workflow again.")
                .send()
        })
        .await;
        return;
    };

    let workflow_name = state
        .workflow_registry
        .get(&entry.workflow_id)
        .map(|w| w.name.clone())
        .unwrap_or_else(|| entry.workflow_id.clone());

    let _ = with_retry(|| {
        state
            .bot
            .edit_message_text(
                message.chat.id,
                message.id,
                prepare_outbound(&format!("⏳ Starting {workflow_name}…")),
            )
            .parse_mode(ParseMode::MarkdownV2)
            .send()
    })
    .await;

    let _ = with_retry(|| state.bot.answer_callback_query(query.id.clone()).send()).await;

    let selection = WorkflowSelection {
        selection_type: "workflow_selection".to_string(),
        correlation_id: entry.summary_data.correlation_id.clone(),
        session_id: entry.session_id.clone(),
        timestamp: chrono::Utc::now(),
        workflow_ids: vec![entry.workflow_id.clone()],
        orchestration_mode: OrchestrationMode::Sequential,
        workspace_path: entry.summary_data.workspace_path.clone(),
        workspace_id: entry.workspace_id.clone(),
        summary_data: entry.summary_data.clone(),
    };

    let filename = StateRoot::selection_filename(&entry.session_id, &entry.workspace_id);
    match ipc::atomic_write_json(&state.state_root.selections_dir(), &filename, &selection) {
        Ok(path) => {
            spawn_orchestrator(&path);
            state.store.append_best_effort(
                selection.correlation_id.as_str(),
                Some(entry.workspace_id.as_str()),
                Some(entry.session_id.as_str()),
                Component::Bot,
                EventType::SelectionCreated,
                &serde_json::json!({"workflow_id": entry.workflow_id}),
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to write workflow selection");
        }
    }
}

fn spawn_orchestrator(selection_path: &std::path::Path) {
    let exe = std::env::var("ORCHESTRATOR_EXE").unwrap_or_else(|_| "workflow-orchestrator".to_string());
    match std::process::Command::new(&exe)
        .arg(selection_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(_) => tracing::info!(exe, path = %selection_path.display(), "spawned orchestrator"),
        Err(e) => tracing::warn!(error = %e, exe, "failed to spawn orchestrator"),
    }
}
