//! External tool invocation.

use std::ffi::OsStr;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tubely_core::AppError;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid {tool} path: {path}")]
    InvalidPath { tool: &'static str, path: String },

    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} timed out after {}s", .timeout.as_secs())]
    TimedOut {
        tool: &'static str,
        timeout: Duration,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("unusable {tool} output: {message}")]
    InvalidOutput { tool: &'static str, message: String },
}

impl ToolError {
    pub fn tool(&self) -> &'static str {
        match self {
            ToolError::InvalidPath { tool, .. }
            | ToolError::Spawn { tool, .. }
            | ToolError::TimedOut { tool, .. }
            | ToolError::Failed { tool, .. }
            | ToolError::InvalidOutput { tool, .. } => *tool,
        }
    }
}

impl From<ToolError> for AppError {
    fn from(err: ToolError) -> Self {
        AppError::external_tool(err.tool(), err.to_string())
    }
}

/// Reject executable paths with shell metacharacters or traversal.
pub(crate) fn validate_tool_path(tool: &'static str, path: &str) -> Result<(), ToolError> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() || path.chars().any(|c| dangerous_chars.contains(&c)) || path.contains("..")
    {
        return Err(ToolError::InvalidPath {
            tool,
            path: path.to_string(),
        });
    }
    Ok(())
}

/// Run `program` to completion, capturing stdout and stderr in full.
///
/// The child is killed when `timeout` elapses or when the returned future is
/// dropped. A non-zero exit becomes [`ToolError::Failed`] carrying stderr.
pub(crate) async fn run_tool<I, S>(
    tool: &'static str,
    program: &str,
    args: I,
    timeout: Duration,
) -> Result<Output, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => return Err(ToolError::Spawn { tool, source }),
        Err(_) => {
            tracing::warn!(
                process.executable.name = tool,
                timeout_secs = timeout.as_secs(),
                "External tool timed out and was killed"
            );
            return Err(ToolError::TimedOut { tool, timeout });
        }
    };

    if !output.status.success() {
        return Err(ToolError::Failed {
            tool,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_shell_metacharacters() {
        assert!(validate_tool_path("ffmpeg", "/usr/bin/ffmpeg").is_ok());
        assert!(validate_tool_path("ffmpeg", "ffmpeg; rm -rf /").is_err());
        assert!(validate_tool_path("ffmpeg", "../ffmpeg").is_err());
        assert!(validate_tool_path("ffmpeg", "").is_err());
    }

    #[test]
    fn tool_error_becomes_external_tool_failure() {
        let err: AppError = ToolError::Failed {
            tool: "ffprobe",
            status: "exit status: 1".to_string(),
            stderr: "Invalid data found when processing input".to_string(),
        }
        .into();

        match err {
            AppError::ExternalToolFailure { tool, message } => {
                assert_eq!(tool, "ffprobe");
                assert!(message.contains("Invalid data found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let result = run_tool(
            "ffprobe",
            "/nonexistent/tubely-ffprobe",
            ["-version"],
            Duration::from_secs(5),
        )
        .await;
        assert!(matches!(result, Err(ToolError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_captures_stderr() {
        let result = run_tool(
            "ffmpeg",
            "sh",
            ["-c", "echo broken pipe >&2; exit 3"],
            Duration::from_secs(5),
        )
        .await;

        match result {
            Err(ToolError::Failed { stderr, .. }) => assert_eq!(stderr, "broken pipe"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_tool_times_out() {
        let result = run_tool(
            "ffmpeg",
            "sh",
            ["-c", "sleep 5"],
            Duration::from_millis(100),
        )
        .await;
        assert!(matches!(result, Err(ToolError::TimedOut { .. })));
    }
}
