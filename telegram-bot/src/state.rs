//! Shared, event-loop-owned state (spec.md §5 "all mutable shared state ...
//! lives on the event loop and is only mutated from it"). Nothing here is
//! behind a lock that's held across an `.await` point from more than one
//! call site; the bot is conceptually single-threaded even though Tokio
//! may run it on multiple OS threads.

use crate::workspace_registry::WorkspaceRegistry;
use eventstore::Store;
use registry::WorkflowRegistry;
use std::collections::HashMap;
use std::sync::Mutex;
use teloxide::types::{ChatId, MessageId};

/// Keys the message-identifier map by the pair a progress/completion file
/// is also keyed by.
pub type SessionWorkspaceKey = (String, String);

pub struct AppState {
    pub bot: teloxide::Bot,
    pub chat_id: ChatId,
    pub store: Store,
    pub workflow_registry: WorkflowRegistry,
    pub workspace_registry: WorkspaceRegistry,
    pub state_root: ipc::StateRoot,
    messages: Mutex<HashMap<SessionWorkspaceKey, MessageId>>,
    last_activity: Mutex<std::time::Instant>,
}

impl AppState {
    pub fn new(
        bot: teloxide::Bot,
        chat_id: ChatId,
        store: Store,
        workflow_registry: WorkflowRegistry,
        workspace_registry: WorkspaceRegistry,
        state_root: ipc::StateRoot,
    ) -> Self {
        AppState {
            bot,
            chat_id,
            store,
            workflow_registry,
            workspace_registry,
            state_root,
            messages: Mutex::new(HashMap::new()),
            last_activity: Mutex::new(std::time::Instant::now()),
        }
    }

    pub fn remember_message(&self, key: SessionWorkspaceKey, message_id: MessageId) {
        self.messages.lock().expect("message map poisoned").insert(key, message_id);
    }

    pub fn lookup_message(&self, key: &SessionWorkspaceKey) -> Option<MessageId> {
        self.messages.lock().expect("message map poisoned").get(key).copied()
    }

    pub fn forget_message(&self, key: &SessionWorkspaceKey) {
        self.messages.lock().expect("message map poisoned").remove(key);
    }

    pub fn touch_activity(&self) {
        *self.last_activity.lock().expect("activity clock poisoned") = std::time::Instant::now();
    }

    pub fn idle_for(&self) -> std::time::Duration {
        self.last_activity.lock().expect("activity clock poisoned").elapsed()
    }
}
