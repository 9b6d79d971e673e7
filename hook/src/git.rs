//! Collects `git_status` for the summary. Tolerates non-repo workspaces and
//! follows the hook's pipefail policy: an absent or empty result from a
//! subcommand is not an error, it is simply zero.

use ipc::schema::GitStatus;
use std::path::Path;
use tokio::process::Command;

pub async fn collect_status(workspace_path: &Path) -> GitStatus {
    let branch = current_branch(workspace_path).await;
    let Some(branch) = branch else {
        return GitStatus::default();
    };

    let (modified_files, staged_files, untracked_files) = porcelain_counts(workspace_path).await;
    let (ahead_commits, behind_commits) = ahead_behind_counts(workspace_path).await;

    GitStatus { branch, modified_files, untracked_files, staged_files, ahead_commits, behind_commits }
}

async fn current_branch(workspace_path: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(workspace_path)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

async fn porcelain_counts(workspace_path: &Path) -> (u32, u32, u32) {
    let output = Command::new("git")
        .args(["status", "--porcelain=v2", "--branch"])
        .current_dir(workspace_path)
        .output()
        .await;
    let Ok(output) = output else {
        return (0, 0, 0);
    };
    let text = String::from_utf8_lossy(&output.stdout);

    let mut modified = 0u32;
    let mut staged = 0u32;
    let mut untracked = 0u32;

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("1 ") {
            // "1 <XY> ..." — XY is the two-char index/worktree status pair.
            if let Some(xy) = rest.split_whitespace().next() {
                let mut chars = xy.chars();
                let index = chars.next().unwrap_or('.');
                let worktree = chars.next().unwrap_or('.');
                if index != '.' {
                    staged += 1;
                }
                if worktree != '.' {
                    modified += 1;
                }
            }
        } else if line.starts_with('2') {
            // Renames/copies: count as both index and worktree changes.
            staged += 1;
        } else if line.starts_with('?') {
            untracked += 1;
        }
    }

    (modified, staged, untracked)
}

async fn ahead_behind_counts(workspace_path: &Path) -> (u32, u32) {
    let output = Command::new("git")
        .args(["rev-list", "--left-right", "--count", "@{u}...HEAD"])
        .current_dir(workspace_path)
        .output()
        .await;
    let Ok(output) = output else {
        return (0, 0);
    };
    if !output.status.success() {
        // No upstream configured is not an error; just unavailable.
        return (0, 0);
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let mut parts = text.split_whitespace();
    let behind = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let ahead = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    (ahead, behind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_repo_workspace_yields_default_status() {
        let dir = tempfile::tempdir().unwrap();
        let status = collect_status(dir.path()).await;
        assert_eq!(status, GitStatus::default());
    }

    #[tokio::test]
    async fn real_repo_reports_a_branch() {
        let dir = tempfile::tempdir().unwrap();
        let run = |args: &[&str]| {
            std::process::Command::new("git").args(args).current_dir(dir.path()).output()
        };
        if run(&["init", "-q"]).is_err() {
            return; // git not available in this environment; skip
        }
        let _ = run(&["config", "user.email", "test@example.com"]);
        let _ = run(&["config", "user.name", "Test"]);
        std::fs::write(dir.path().join("a.txt"), "hi").unwrap();
        let _ = run(&["add", "a.txt"]);
        let _ = run(&["commit", "-q", "-m", "init"]);
        std::fs::write(dir.path().join("a.txt"), "changed").unwrap();

        let status = collect_status(dir.path()).await;
        assert_ne!(status.branch, "unknown");
        assert!(status.modified_files >= 1);
    }
}
