use std::ffi::OsStr;
use std::process::Stdio;

use orchestrator::{ServiceError, ServiceResult};
use tokio::process::Command;
use tracing::debug;

const STDERR_TAIL_CHARS: usize = 600;

/// Runs an external program to completion and returns its stdout.
///
/// A non-zero exit maps to [`ServiceError::Command`] carrying the tail of
/// stderr, which is where ffmpeg and friends put the useful part.
pub async fn run_command<I, S>(program: &str, args: I) -> ServiceResult<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
    debug!("Running {} {:?}", program, args);

    let output = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ServiceError::command(program, "not found on PATH"),
            _ => ServiceError::command(program, e.to_string()),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ServiceError::command(
            program,
            format!("{}: {}", output.status, tail(stderr.trim(), STDERR_TAIL_CHARS)),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn tail(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    let start = text
        .char_indices()
        .nth(skip)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    &text[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail() {
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("abc", 10), "abc");
        assert_eq!(tail("ééé", 2), "éé");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = run_command("definitely-not-a-real-binary-xyz", ["--help"])
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "definitely-not-a-real-binary-xyz failed: not found on PATH"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_carries_stderr() {
        let err = run_command("sh", ["-c", "echo boom >&2; exit 3"])
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("sh failed:"), "{message}");
        assert!(message.contains("boom"), "{message}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_returns_stdout() {
        let out = run_command("sh", ["-c", "echo 12.5"]).await.unwrap();
        assert_eq!(out.trim(), "12.5");
    }
}
