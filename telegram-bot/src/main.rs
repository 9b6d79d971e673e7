//! `orchestrator-bot`: the single long-lived Bot Coordinator process
//! (spec.md §4.2). Cooperative single-threaded event loop: chat long-poll,
//! filesystem watch events, and periodic timers are all multiplexed here.

mod callback_handler;
mod callbacks;
mod completion_processor;
mod idle;
mod markup;
mod pidfile;
mod progress_streamer;
mod rate_limit;
mod state;
mod summary_processor;
mod supervisor;
mod watcher;
mod workspace_registry;

use eventstore::{Component, EventType, Store};
use ipc::StateRoot;
use registry::WorkflowRegistry;
use state::AppState;
use std::sync::Arc;
use std::time::Duration;
use teloxide::requests::Requester;
use teloxide::types::{ChatId, UpdateKind};
use workspace_registry::WorkspaceRegistry;

const UPDATE_POLL_TIMEOUT_SECS: u32 = 30;
const DEFAULT_CALLBACK_RETENTION_DAYS: u64 = 30;
const CALLBACK_GC_INTERVAL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = config::load_and_apply("orchestrator-pipeline", None);
    let _ = config::logging::init();

    let state_root_path = std::env::var("STATE_ROOT").unwrap_or_else(|_| "./state".to_string());
    let state_root = StateRoot::new(state_root_path);
    for dir in [
        state_root.summaries_dir(),
        state_root.completions_dir(),
        state_root.progress_dir(),
        state_root.callbacks_dir(),
        state_root.selections_dir(),
    ] {
        std::fs::create_dir_all(&dir)?;
    }

    if let Err(e) = pidfile::acquire(&state_root) {
        tracing::error!(error = %e, "refusing to start a second bot instance");
        anyhow::bail!(e);
    }

    let store = Store::open(state_root.events_db_path())?;
    let crash_looping = supervisor::record_startup_and_check_crash_loop(&state_root);

    let chat_id: i64 = std::env::var("CHAT_ID")
        .map_err(|_| anyhow::anyhow!("CHAT_ID not set in environment"))?
        .parse()
        .map_err(|_| anyhow::anyhow!("CHAT_ID is not a valid integer"))?;
    let chat_id = ChatId(chat_id);

    let bot = teloxide::Bot::from_env();

    let workflow_registry = WorkflowRegistry::load(state_root.workflows_registry_path()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load workflow registry");
        WorkflowRegistry::empty()
    });
    let workspace_registry = WorkspaceRegistry::load(state_root.workspace_registry_path());

    let state = Arc::new(AppState::new(
        bot.clone(),
        chat_id,
        store,
        workflow_registry,
        workspace_registry,
        StateRoot::new(state_root.root()),
    ));

    state.store.append_best_effort(
        "bot-lifecycle",
        None,
        None,
        Component::Bot,
        EventType::BotStarted,
        &serde_json::json!({}),
    );

    if crash_looping {
        let _ = rate_limit::with_retry(|| {
            state.bot.send_message(
                state.chat_id,
                "⚠️ orchestrator-bot has restarted 5+ times in the last minute. Something is wrong — check the logs.",
            ).send()
        })
        .await;
    }

    let (watch_tx, mut watch_rx) = tokio::sync::mpsc::channel(64);
    tokio::spawn(watcher::run(state_root.summaries_dir(), state_root.completions_dir(), watch_tx));

    tokio::spawn(progress_streamer::run(state.clone()));
    let retention_days: u64 = std::env::var("CALLBACK_RETENTION_DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_CALLBACK_RETENTION_DAYS);
    tokio::spawn(callback_gc_loop(state.clone(), Duration::from_secs(retention_days * 86400)));

    let idle_window_secs: u64 = std::env::var("BOT_IDLE_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let idle_state = state.clone();
    let mut idle_handle = tokio::spawn(idle::watch(idle_state, Duration::from_secs(idle_window_secs)));

    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut offset: i32 = 0;

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, shutting down gracefully");
                break;
            }
            _ = &mut idle_handle => {
                tracing::info!("idle timeout elapsed, shutting down");
                break;
            }
            Some(event) = watch_rx.recv() => {
                state.touch_activity();
                match event.kind {
                    watcher::WatchKind::Summary => summary_processor::process(&state, &event.path).await,
                    watcher::WatchKind::Completion => completion_processor::process(&state, &event.path).await,
                }
            }
            updates = bot.get_updates().offset(offset).timeout(UPDATE_POLL_TIMEOUT_SECS).send() => {
                match updates {
                    Ok(updates) => {
                        for update in updates {
                            offset = update.id + 1;
                            state.touch_activity();
                            if let UpdateKind::CallbackQuery(query) = update.kind {
                                callback_handler::handle(&state, query).await;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "get_updates failed; backing off");
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        }
    }

    state.store.append_best_effort(
        "bot-lifecycle",
        None,
        None,
        Component::Bot,
        EventType::BotShutdown,
        &serde_json::json!({}),
    );
    pidfile::release(&state_root);
    Ok(())
}

async fn callback_gc_loop(state: Arc<AppState>, retention: Duration) {
    let mut interval = tokio::time::interval(CALLBACK_GC_INTERVAL);
    loop {
        interval.tick().await;
        callbacks::garbage_collect(&state.state_root, retention);
    }
}
