//! Edits the tracked chat message to its final result when a workflow
//! finishes (spec.md §4.2.6).

use crate::markup::prepare_outbound;
use crate::rate_limit::with_retry;
use crate::state::AppState;
use eventstore::{Component, EventType};
use ipc::schema::{Completion, ExecutionStatus};
use std::path::Path;
use std::sync::Arc;
use teloxide::payloads::EditMessageTextSetters;
use teloxide::requests::Requester;
use teloxide::types::ParseMode;

pub async fn process(state: &Arc<AppState>, path: &Path) {
    let completion: Completion = match ipc::read_json_tolerant(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "malformed completion file");
            ipc::unlink_tolerant(path);
            return;
        }
    };

    let key = (completion.session_id.clone(), completion.workspace_id.to_string());
    let icon = match completion.status {
        ExecutionStatus::Success => "✅",
        ExecutionStatus::Error => "❌",
        ExecutionStatus::Timeout => "⏱️",
        ExecutionStatus::Aborted => "🚫",
    };
    // Chat wording intentionally diverges from `ExecutionStatus::Display`
    // ("success"/"timeout"), which is for logs: the chat reads "completed
    // in Ns" on success and "timeout after Ns" everywhere else.
    let (verb, preposition) = match completion.status {
        ExecutionStatus::Success => ("completed", "in"),
        ExecutionStatus::Timeout => ("timeout", "after"),
        ExecutionStatus::Error => ("error", "after"),
        ExecutionStatus::Aborted => ("aborted", "after"),
    };
    let text = format!(
        "{icon} *{name}* — {verb} {preposition} {duration:.1}s\n{summary}",
        name = completion.workflow_name,
        duration = completion.duration_seconds,
        summary = completion.summary,
    );

    if let Some(message_id) = state.lookup_message(&key) {
        let _ = with_retry(|| {
            state
                .bot
                .edit_message_text(state.chat_id, message_id, prepare_outbound(&text))
                .parse_mode(ParseMode::MarkdownV2)
                .send()
        })
        .await;
        state.forget_message(&key);
    } else {
        tracing::warn!(?key, "completion for an untracked message, sending as a new message");
        let _ = with_retry(|| state.bot.send_message(state.chat_id, prepare_outbound(&text)).send()).await;
    }

    state.store.append_best_effort(
        completion.correlation_id.as_str(),
        Some(completion.workspace_id.as_str()),
        Some(completion.session_id.as_str()),
        Component::Bot,
        EventType::WorkflowCompleted,
        &serde_json::json!({"status": completion.status.to_string()}),
    );

    ipc::unlink_tolerant(path);
}
