//! Turns a new `SessionSummary` file into an inline-keyboard chat message
//! (spec.md §4.2.2).

use crate::markup::{prepare_outbound, truncate_field};
use crate::rate_limit::with_retry;
use crate::state::AppState;
use eventstore::{Component, EventType};
use ipc::schema::SessionSummary;
use std::path::Path;
use std::sync::Arc;
use teloxide::payloads::SendMessageSetters;
use teloxide::requests::Requester;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

const BUTTONS_PER_ROW: usize = 2;

pub async fn process(state: &Arc<AppState>, path: &Path) {
    let summary: SessionSummary = match ipc::read_json_tolerant(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "malformed session summary");
            let _ = with_retry(|| {
                state.bot.send_message(
                    state.chat_id,
                    prepare_outbound(&format!(
                        "⚠️ Received a malformed session summary and discarded it: {e}"
                    )),
                )
                .send()
            })
            .await;
            ipc::unlink_tolerant(path);
            return;
        }
    };

    state.store.append_best_effort(
        summary.correlation_id.as_str(),
        Some(summary.workspace_id.as_str()),
        Some(summary.session_id.as_str()),
        Component::Bot,
        EventType::SummaryReceived,
        &serde_json::json!({}),
    );

    // Defense-in-depth: re-filter eligible workflows rather than trusting
    // the hook's advisory list (spec.md §4.2.2 step 3).
    let groups = state.workflow_registry.eligible_grouped_by_category(&summary);
    let keyboard = build_keyboard(state, &summary, &groups);

    let body = build_body(state, &summary);

    let send_result = with_retry(|| {
        state
            .bot
            .send_message(state.chat_id, prepare_outbound(&body))
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(keyboard.clone())
            .send()
    })
    .await;

    match send_result {
        Ok(message) => {
            state.remember_message(
                (summary.session_id.clone(), summary.workspace_id.to_string()),
                message.id,
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to send session summary message");
        }
    }

    state.store.append_best_effort(
        summary.correlation_id.as_str(),
        Some(summary.workspace_id.as_str()),
        Some(summary.session_id.as_str()),
        Component::Bot,
        EventType::SummaryProcessed,
        &serde_json::json!({}),
    );

    ipc::unlink_tolerant(path);
}

fn build_keyboard(
    state: &Arc<AppState>,
    summary: &SessionSummary,
    groups: &[(String, Vec<&registry::WorkflowEntry>)],
) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();

    for (_category, entries) in groups {
        for chunk in entries.chunks(BUTTONS_PER_ROW) {
            let mut row = Vec::new();
            for entry in chunk {
                let label = match &entry.icon {
                    Some(icon) => format!("{icon} {}", entry.name),
                    None => entry.name.clone(),
                };
                let key = crate::callbacks::allocate(
                    &state.state_root,
                    &entry.id,
                    &summary.session_id,
                    &summary.workspace_id,
                    summary,
                )
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, workflow_id = %entry.id, "failed to persist callback entry");
                    String::new()
                });
                row.push(InlineKeyboardButton::callback(label, key));
            }
            rows.push(row);
        }
    }

    InlineKeyboardMarkup::new(rows)
}

fn build_body(state: &Arc<AppState>, summary: &SessionSummary) -> String {
    let workspace_label = state.workspace_registry.display_label(summary.workspace_id.as_str());
    let git = &summary.git_status;
    let lychee_summary = if summary.lychee_status.ran {
        format!("{} broken link(s)", summary.lychee_status.error_count)
    } else {
        "not run".to_string()
    };

    format!(
        "*{workspace}*\n\
         ```\n\
         branch: {branch}\n\
         modified: {modified}  staged: {staged}  untracked: {untracked}\n\
         ```\n\
         Link check: {lychee}\n\
         Duration: {duration}s\n\n\
         *Last prompt:*\n{prompt}\n\n\
         *Last response:*\n{response}",
        workspace = workspace_label,
        branch = git.branch,
        modified = git.modified_files,
        staged = git.staged_files,
        untracked = git.untracked_files,
        lychee = lychee_summary,
        duration = summary.duration_seconds,
        prompt = truncate_field(&summary.user_prompt),
        response = truncate_field(&summary.last_response),
    )
}
