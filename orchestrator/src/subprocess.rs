//! Spawns the headless CLI subprocess with the rendered prompt under a
//! timeout. Mirrors the teacher's `BashTool::run_shell_command` timeout
//! pattern, but invokes the CLI binary directly rather than through a
//! shell, since the subject is a single trusted argv/stdin payload rather
//! than an arbitrary shell command line. Unlike the teacher's helper,
//! a timed-out child is explicitly killed rather than left to become an
//! orphan once its future is dropped.

use ipc::schema::ExecutionStatus;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

const DEFAULT_OUTPUT_CEILING: usize = 10 * 1024;
const DEFAULT_CLI_BIN: &str = "claude";

pub struct SubprocessResult {
    pub status: ExecutionStatus,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// `argv` mode passes the prompt as a trailing CLI argument; `stdin` mode
/// writes it to the child's stdin and closes it. Selected by
/// `CLAUDE_CLI_INVOCATION_MODE` (`argv` | `stdin`, default `argv`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvocationMode {
    Argv,
    Stdin,
}

impl InvocationMode {
    pub fn from_env() -> Self {
        match std::env::var("CLAUDE_CLI_INVOCATION_MODE").as_deref() {
            Ok("stdin") => InvocationMode::Stdin,
            _ => InvocationMode::Argv,
        }
    }
}

pub async fn run(prompt: &str, workspace_path: &str, timeout: Duration, mode: InvocationMode) -> SubprocessResult {
    let bin = std::env::var("CLAUDE_CLI_BIN").unwrap_or_else(|_| DEFAULT_CLI_BIN.to_string());
    let started = Instant::now();

    let mut cmd = Command::new(&bin);
    cmd.current_dir(workspace_path);
    cmd.stdout(std::process::Stdio::piped()).stderr(std::process::Stdio::piped());
    if mode == InvocationMode::Argv {
        cmd.arg(prompt);
        cmd.stdin(std::process::Stdio::null());
    } else {
        cmd.stdin(std::process::Stdio::piped());
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return SubprocessResult {
                status: ExecutionStatus::Error,
                exit_code: -1,
                stdout: String::new(),
                stderr: format!("failed to start {bin}: {e}"),
                elapsed: started.elapsed(),
            };
        }
    };

    if mode == InvocationMode::Stdin {
        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(prompt.as_bytes()).await;
            let _ = stdin.shutdown().await;
        }
    }

    // Read stdout/stderr on their own tasks so a kill on timeout below
    // doesn't race the pipes being drained.
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(pipe) = stdout_pipe.as_mut() {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    });

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(exit_status)) => {
            let exit_code = exit_status.code().unwrap_or(-1);
            let status = if exit_status.success() { ExecutionStatus::Success } else { ExecutionStatus::Error };
            let stdout = stdout_task.await.unwrap_or_default();
            let stderr = stderr_task.await.unwrap_or_default();
            SubprocessResult {
                status,
                exit_code,
                stdout: truncate(&String::from_utf8_lossy(&stdout)),
                stderr: truncate(&String::from_utf8_lossy(&stderr)),
                elapsed: started.elapsed(),
            }
        }
        Ok(Err(e)) => SubprocessResult {
            status: ExecutionStatus::Error,
            exit_code: -1,
            stdout: String::new(),
            stderr: format!("failed to collect subprocess output: {e}"),
            elapsed: started.elapsed(),
        },
        Err(_) => {
            // Timed out: terminate the orphaned subprocess before returning
            // (spec.md §5 — "on expiry the subprocess is terminated").
            let _ = child.kill().await;
            let _ = child.wait().await;
            let stdout = stdout_task.await.unwrap_or_default();
            let stderr = stderr_task.await.unwrap_or_default();
            SubprocessResult {
                status: ExecutionStatus::Timeout,
                exit_code: -1,
                stdout: truncate(&String::from_utf8_lossy(&stdout)),
                stderr: truncate(&String::from_utf8_lossy(&stderr)),
                elapsed: started.elapsed(),
            }
        }
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= DEFAULT_OUTPUT_CEILING {
        return text.to_string();
    }
    let mut end = DEFAULT_OUTPUT_CEILING;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_mode_defaults_to_argv() {
        std::env::remove_var("CLAUDE_CLI_INVOCATION_MODE");
        assert_eq!(InvocationMode::from_env(), InvocationMode::Argv);
    }

    #[test]
    fn invocation_mode_reads_stdin_from_env() {
        std::env::set_var("CLAUDE_CLI_INVOCATION_MODE", "stdin");
        assert_eq!(InvocationMode::from_env(), InvocationMode::Stdin);
        std::env::remove_var("CLAUDE_CLI_INVOCATION_MODE");
    }

    #[tokio::test]
    async fn missing_binary_is_classified_as_error_not_a_panic() {
        let result = run("hello", ".", Duration::from_secs(5), InvocationMode::Argv).await;
        // CLAUDE_CLI_BIN defaults to "claude", almost certainly absent here.
        if std::env::var("CLAUDE_CLI_BIN").is_err() {
            assert_eq!(result.status, ExecutionStatus::Error);
        }
    }

    #[test]
    fn truncate_leaves_short_output_untouched() {
        assert_eq!(truncate("short"), "short");
    }
}
