//! Watches `summaries/` and `completions/` for new `.json` files (spec.md
//! §4.2.1). Uses native filesystem notifications via `notify` when the
//! platform watcher can be installed; falls back to a bounded-interval scan
//! otherwise. Every new file is enqueued exactly once, deduplicated by
//! filename — `notify` can fire more than once for a single rename-into-
//! place, and the fallback scan would otherwise re-report a file every
//! tick until its consumer unlinks it.

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::time::Duration;
use tokio::sync::mpsc;

const FALLBACK_SCAN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub enum WatchKind {
    Summary,
    Completion,
}

#[derive(Debug, Clone)]
pub struct WatchEvent {
    pub kind: WatchKind,
    pub path: PathBuf,
}

/// Runs until the channel receiver is dropped. Spawns blocking-scan work on
/// a dedicated OS thread when native notifications are unavailable, so the
/// bot's own async worker pool isn't tied up polling directories.
pub async fn run(summaries_dir: PathBuf, completions_dir: PathBuf, tx: mpsc::Sender<WatchEvent>) {
    match try_native_watch(&summaries_dir, &completions_dir, tx.clone()) {
        Ok(_watcher) => {
            tracing::info!("watcher: using native filesystem notifications");
            // Keep this task alive for the lifetime of the bot; the watcher
            // itself is moved into the notify callback's closure environment.
            std::future::pending::<()>().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "watcher: native notifications unavailable, falling back to polling");
            fallback_scan_loop(summaries_dir, completions_dir, tx).await;
        }
    }
}

fn try_native_watch(
    summaries_dir: &Path,
    completions_dir: &Path,
    tx: mpsc::Sender<WatchEvent>,
) -> notify::Result<RecommendedWatcher> {
    let (raw_tx, raw_rx) = std_mpsc::channel();
    let mut watcher = notify::recommended_watcher(raw_tx)?;
    watcher.watch(summaries_dir, RecursiveMode::NonRecursive)?;
    watcher.watch(completions_dir, RecursiveMode::NonRecursive)?;

    let summaries_dir = summaries_dir.to_path_buf();
    let completions_dir = completions_dir.to_path_buf();
    std::thread::spawn(move || {
        let mut seen = HashSet::new();
        for event in raw_rx.into_iter().flatten() {
            for path in event.paths {
                if let Some(watch_event) = classify(&path, &summaries_dir, &completions_dir, &mut seen) {
                    if tx.blocking_send(watch_event).is_err() {
                        return;
                    }
                }
            }
        }
    });

    Ok(watcher)
}

async fn fallback_scan_loop(summaries_dir: PathBuf, completions_dir: PathBuf, tx: mpsc::Sender<WatchEvent>) {
    let mut seen = HashSet::new();
    let mut interval = tokio::time::interval(FALLBACK_SCAN_INTERVAL);
    loop {
        interval.tick().await;
        let mut found = Vec::new();
        for path in list_json_files(&summaries_dir) {
            found.push(path);
        }
        for path in list_json_files(&completions_dir) {
            found.push(path);
        }
        for path in found {
            if let Some(watch_event) = classify(&path, &summaries_dir, &completions_dir, &mut seen) {
                if tx.send(watch_event).await.is_err() {
                    return;
                }
            }
        }
    }
}

/// Classifies a candidate path, deduplicating by filename so a `notify`
/// double-fire or a repeated poll doesn't enqueue the same file twice.
fn classify(
    path: &Path,
    summaries_dir: &Path,
    completions_dir: &Path,
    seen: &mut HashSet<PathBuf>,
) -> Option<WatchEvent> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return None;
    }
    if !seen.insert(path.to_path_buf()) {
        return None;
    }

    let kind = if path.parent() == Some(summaries_dir) {
        WatchKind::Summary
    } else if path.parent() == Some(completions_dir) {
        WatchKind::Completion
    } else {
        return None;
    };

    Some(WatchEvent { kind, path: path.to_path_buf() })
}

fn list_json_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
                .collect()
        })
        .unwrap_or_default()
}
