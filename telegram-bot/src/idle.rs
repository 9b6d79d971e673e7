//! Idle-shutdown timer (spec.md §4.2 "Idle shutdown"). A configured idle
//! window of 0 disables the feature entirely — used for deployments where
//! the Bot is meant to be the canonical long-running process rather than
//! something an external supervisor restarts on demand.

use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;

/// Runs until the Bot has observed no activity (`AppState::touch_activity`)
/// for `idle_window`. A zero window never returns, disabling idle shutdown.
pub async fn watch(state: Arc<AppState>, idle_window: Duration) {
    if idle_window.is_zero() {
        tracing::debug!("idle shutdown disabled (idle window = 0)");
        std::future::pending::<()>().await;
        return;
    }

    let mut check = tokio::time::interval(Duration::from_secs(5).min(idle_window));
    loop {
        check.tick().await;
        if state.idle_for() >= idle_window {
            tracing::info!(idle_secs = idle_window.as_secs(), "idle window elapsed, shutting down");
            return;
        }
    }
}
