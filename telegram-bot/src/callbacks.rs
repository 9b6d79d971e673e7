//! Callback-key allocation and `callbacks/cb_{key}.json` persistence
//! (spec.md §3 "Callback Mapping"). Telegram's inline-button callback data
//! is capped at 64 bytes, far too short for a full `(workflow_id,
//! session_id, workspace_id, summary_data)` tuple, so only an opaque key
//! travels on the button; the real payload lives on disk.

use ipc::schema::{CallbackEntry, SessionSummary};
use ipc::{StateRoot, WorkspaceHash};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::time::Duration;

const KEY_LEN_HEX: usize = 6;
const RANDOM_TAIL_LEN: usize = 4;
const RANDOM_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Allocates a short opaque key and writes the callback entry for it.
/// Returns the key as placed on the button's callback data.
pub fn allocate(
    state_root: &StateRoot,
    workflow_id: &str,
    session_id: &str,
    workspace_id: &WorkspaceHash,
    summary: &SessionSummary,
) -> std::io::Result<String> {
    let key = generate_key(workflow_id, session_id, workspace_id.as_str());
    let entry = CallbackEntry {
        workflow_id: workflow_id.to_string(),
        session_id: session_id.to_string(),
        workspace_id: workspace_id.clone(),
        summary_data: summary.clone(),
        created_at: chrono::Utc::now(),
    };
    ipc::atomic_write_json(
        &state_root.callbacks_dir(),
        &StateRoot::callback_filename(&key),
        &entry,
    )
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    Ok(key)
}

fn generate_key(workflow_id: &str, session_id: &str, workspace_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(workflow_id.as_bytes());
    hasher.update(session_id.as_bytes());
    hasher.update(workspace_id.as_bytes());
    let digest = hasher.finalize();
    let prefix = hex::encode(&digest[..KEY_LEN_HEX / 2]);

    let mut rng = rand::thread_rng();
    let tail: String = (0..RANDOM_TAIL_LEN)
        .map(|_| RANDOM_ALPHABET[rng.gen_range(0..RANDOM_ALPHABET.len())] as char)
        .collect();

    format!("{prefix}{tail}")
}

/// Looks up a callback entry by key, treating a missing/unreadable file as
/// "aged out" (spec.md §4.2.3 step 1: "if missing (aged out) respond with
/// an expired toast").
pub fn lookup(state_root: &StateRoot, key: &str) -> Option<CallbackEntry> {
    let path = state_root.callbacks_dir().join(StateRoot::callback_filename(key));
    ipc::read_json_tolerant(&path).ok()
}

/// Removes callback entries older than `retention`. Run periodically from
/// the bot's timer set (spec.md §3 "entries age out after a configured
/// retention window").
pub fn garbage_collect(state_root: &StateRoot, retention: Duration) {
    let dir = state_root.callbacks_dir();
    let Ok(read_dir) = std::fs::read_dir(&dir) else {
        return;
    };
    let cutoff = chrono::Utc::now() - chrono::Duration::from_std(retention).unwrap_or_default();

    for entry in read_dir.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Ok(cb) = ipc::read_json_tolerant::<CallbackEntry>(&path) else {
            continue;
        };
        if cb.created_at < cutoff {
            ipc::unlink_tolerant(&path);
        }
    }
}
