// ============================================================================
// Command Runner Module
// ============================================================================
// One-shot external command execution with a timeout

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("'{program}' command not found. Make sure it's installed and in your PATH")]
    NotFound { program: String },

    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("'{program}' exited with {status}: {stderr}")]
    NonZeroExit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Render a command line for log messages.
pub fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `program` with `args` and return its stdout.
///
/// The child is killed if it outlives `timeout`. A non-zero exit status is an
/// error carrying the trimmed stderr.
pub async fn run_command(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, CommandError> {
    debug!(command = %display_command(program, args), "running external command");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
            return Err(CommandError::NotFound {
                program: program.to_string(),
            })
        }
        Ok(Err(e)) => {
            return Err(CommandError::Spawn {
                program: program.to_string(),
                source: e,
            })
        }
        Err(_) => {
            return Err(CommandError::Timeout {
                program: program.to_string(),
                timeout,
            })
        }
    };

    if !output.status.success() {
        return Err(CommandError::NonZeroExit {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_command() {
        assert_eq!(
            display_command("solana", &["gossip", "--output=json"]),
            "solana gossip --output=json"
        );
        assert_eq!(display_command("ip", &[]), "ip");
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let out = run_command("sh", &["-c", "echo hello"], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = run_command("definitely-not-a-real-binary-xyz", &[], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_non_zero_exit_keeps_stderr() {
        let err = run_command("sh", &["-c", "echo boom >&2; exit 3"], Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            CommandError::NonZeroExit { stderr, status, .. } => {
                assert_eq!(stderr, "boom");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = run_command("sh", &["-c", "sleep 5"], Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
    }
}
