//! Edits the tracked chat message in place as workflow progress arrives
//! (spec.md §4.2.5). Progress files are overwrite-in-place signals, not
//! discrete events, so this runs its own ~2s poll rather than reacting to
//! the watcher.

use crate::markup::prepare_outbound;
use crate::rate_limit::with_retry;
use crate::state::AppState;
use eventstore::{Component, EventType};
use ipc::schema::{ProgressStatus, ProgressUpdate};
use std::sync::Arc;
use std::time::Duration;
use teloxide::payloads::EditMessageTextSetters;
use teloxide::requests::Requester;
use teloxide::types::ParseMode;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub async fn run(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(POLL_INTERVAL);
    // Coalesce: only the most recent update per (session, workspace) survives
    // a scan, so a message whose progress moved twice within one poll window
    // is only edited once (spec.md §4.2.5 "earlier ones are discarded").
    loop {
        interval.tick().await;
        scan_once(&state).await;
    }
}

async fn scan_once(state: &Arc<AppState>) {
    let dir = state.state_root.progress_dir();
    let Ok(read_dir) = std::fs::read_dir(&dir) else {
        return;
    };

    for entry in read_dir.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Ok(update) = ipc::read_json_tolerant::<ProgressUpdate>(&path) else {
            continue;
        };

        let key = (update.session_id.clone(), update.workspace_id.to_string());
        let Some(message_id) = state.lookup_message(&key) else {
            tracing::debug!(?key, "progress update for an untracked message, skipping");
            if update.status == ProgressStatus::Completed {
                ipc::unlink_tolerant(&path);
            }
            continue;
        };

        let text = format!(
            "⏳ *{stage}* — {percent}%\n{message}",
            stage = update.stage,
            percent = update.progress_percent,
            message = update.message,
        );
        let _ = with_retry(|| {
            state
                .bot
                .edit_message_text(state.chat_id, message_id, prepare_outbound(&text))
                .parse_mode(ParseMode::MarkdownV2)
                .send()
        })
        .await;

        // ProgressUpdate carries no correlation_id (spec.md §3) — the event
        // row is still indexed and queryable by workspace_id/session_id.
        state.store.append_best_effort(
            "progress",
            Some(update.workspace_id.as_str()),
            Some(update.session_id.as_str()),
            Component::Bot,
            EventType::ProgressEmitted,
            &serde_json::json!({"stage": update.stage.to_string()}),
        );

        if update.status == ProgressStatus::Completed {
            ipc::unlink_tolerant(&path);
        }
    }
}
