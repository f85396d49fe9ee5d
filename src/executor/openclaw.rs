//! Executor that runs the `openclaw` agent CLI as a child process.
//!
//! The invocation is `openclaw agent --session-id <id> --message <msg> --json`.
//! Stdout and stderr are drained concurrently while the execution context
//! is watched; when the context finishes first the child is killed and
//! reaped before returning.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::{CommandExecutor, ExecContext, Interruption};
use crate::config::DEFAULT_AGENT_PROGRAM;
use crate::error::ExecError;

/// Subcommand passed to the agent program.
pub const AGENT_SUBCOMMAND: &str = "agent";

/// Flags appended after the session and message arguments.
pub const TRAILING_FLAGS: &[&str] = &["--json"];

/// Runs the agent CLI once per request.
#[derive(Debug, Clone)]
pub struct OpenClawExecutor {
    program: String,
}

impl Default for OpenClawExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenClawExecutor {
    /// Creates an executor for the `openclaw` program on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_program(DEFAULT_AGENT_PROGRAM)
    }

    /// Creates an executor for a specific program name or path.
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Builds the process invocation for one request.
    ///
    /// Stdin is closed, both output streams are piped, and the child is
    /// killed if the handle is dropped before it exits.
    #[must_use]
    pub fn build_command(&self, session_id: &str, message: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg(AGENT_SUBCOMMAND)
            .arg("--session-id")
            .arg(session_id)
            .arg("--message")
            .arg(message)
            .args(TRAILING_FLAGS);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command.kill_on_drop(true);
        command
    }

    fn interrupted(&self, cause: Interruption, output: String) -> ExecError {
        let program = self.program.clone();
        match cause {
            Interruption::Cancelled => ExecError::Cancelled { program, output },
            Interruption::DeadlineExceeded => ExecError::DeadlineExceeded { program, output },
        }
    }
}

#[async_trait]
impl CommandExecutor for OpenClawExecutor {
    async fn run(
        &self,
        ctx: &ExecContext,
        session_id: &str,
        message: &str,
    ) -> Result<String, ExecError> {
        if let Some(cause) = ctx.interruption() {
            return Err(self.interrupted(cause, String::new()));
        }

        tracing::info!(session_id, program = %self.program, "start agent command");

        let mut child = self
            .build_command(session_id, message)
            .spawn()
            .map_err(|source| {
                tracing::warn!(
                    session_id,
                    program = %self.program,
                    error = %source,
                    "agent command failed to start"
                );
                ExecError::Spawn {
                    program: self.program.clone(),
                    source,
                }
            })?;
        let child_pid = child.id();

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let finished = {
            let collect = async {
                let (out_res, err_res) = tokio::join!(
                    drain(stdout_pipe, &mut stdout),
                    drain(stderr_pipe, &mut stderr)
                );
                match out_res.and(err_res) {
                    Ok(()) => child.wait().await,
                    Err(err) => Err(err),
                }
            };
            tokio::select! {
                result = collect => Ok(result),
                cause = ctx.done() => Err(cause),
            }
        };

        let status = match finished {
            Ok(Ok(status)) => status,
            Ok(Err(source)) => {
                reap(&mut child, session_id).await;
                tracing::warn!(session_id, error = %source, "agent output capture failed");
                return Err(ExecError::Capture {
                    program: self.program.clone(),
                    source,
                    output: combine(&stdout, &stderr),
                });
            }
            Err(cause) => {
                reap(&mut child, session_id).await;
                tracing::warn!(
                    session_id,
                    child_pid = ?child_pid,
                    cause = ?cause,
                    "agent command interrupted"
                );
                return Err(self.interrupted(cause, combine(&stdout, &stderr)));
            }
        };

        if !stderr.is_empty() {
            tracing::warn!(
                session_id,
                stderr = %String::from_utf8_lossy(&stderr),
                "agent command wrote to stderr"
            );
        }

        let output = combine(&stdout, &stderr);
        if !status.success() {
            tracing::warn!(session_id, %status, "agent command failed");
            return Err(ExecError::Exited {
                program: self.program.clone(),
                status,
                output,
            });
        }

        tracing::info!(session_id, output_bytes = output.len(), "agent command finished");
        Ok(output)
    }
}

/// Reads a pipe to EOF into `buf`. Bytes read before an error or before
/// the future is dropped stay in `buf`.
async fn drain<R>(pipe: Option<R>, buf: &mut Vec<u8>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(buf).await?;
    }
    Ok(())
}

/// Kills the child and waits for it so no zombie is left behind.
async fn reap(child: &mut tokio::process::Child, session_id: &str) {
    if let Err(err) = child.start_kill() {
        tracing::debug!(session_id, error = %err, "agent command already exited");
    }
    if let Err(err) = child.wait().await {
        tracing::warn!(session_id, error = %err, "failed to reap agent command");
    }
}

/// Stdout followed by stderr, decoded lossily.
fn combine(stdout: &[u8], stderr: &[u8]) -> String {
    let mut output = String::from_utf8_lossy(stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(stderr));
    output
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::ffi::OsStr;
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::*;

    fn ctx(timeout: Duration) -> ExecContext {
        ExecContext::with_timeout(&CancellationToken::new(), timeout)
    }

    #[test]
    fn builds_agent_invocation() {
        let cmd = OpenClawExecutor::new().build_command("dev-123", "hello world");
        let std_cmd = cmd.as_std();

        assert_eq!(std_cmd.get_program(), OsStr::new("openclaw"));
        let args: Vec<&OsStr> = std_cmd.get_args().collect();
        let expected: Vec<&OsStr> = [
            "agent",
            "--session-id",
            "dev-123",
            "--message",
            "hello world",
            "--json",
        ]
        .into_iter()
        .map(OsStr::new)
        .collect();
        assert_eq!(args, expected);
    }

    #[test]
    fn message_is_a_single_argument() {
        let cmd = OpenClawExecutor::new().build_command("d", "a; rm -rf / && echo 'x'");
        let args: Vec<&OsStr> = cmd.as_std().get_args().collect();
        assert_eq!(args.get(4), Some(&OsStr::new("a; rm -rf / && echo 'x'")));
        assert_eq!(args.len(), 6);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_output_on_success() {
        let exec = OpenClawExecutor::with_program("echo");
        let result = exec.run(&ctx(Duration::from_secs(10)), "dev-1", "hi").await;
        let Ok(output) = result else {
            panic!("echo should succeed: {result:?}");
        };
        assert_eq!(output, "agent --session-id dev-1 --message hi --json\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_an_error() {
        let exec = OpenClawExecutor::with_program("false");
        let result = exec.run(&ctx(Duration::from_secs(10)), "dev-1", "hi").await;
        let Err(err) = result else {
            panic!("false should fail");
        };
        assert!(matches!(err, ExecError::Exited { .. }));
        assert!(err.to_string().starts_with("run false agent command: "));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_exit_keeps_both_streams() {
        use std::os::unix::fs::PermissionsExt;

        let script = std::env::temp_dir().join(format!(
            "clawproxy-failing-agent-{}.sh",
            std::process::id()
        ));
        let Ok(()) = std::fs::write(&script, "#!/bin/sh\necho out\necho err 1>&2\nexit 3\n") else {
            panic!("write script");
        };
        let Ok(()) = std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
        else {
            panic!("chmod script");
        };

        let exec = OpenClawExecutor::with_program(script.to_string_lossy());
        let result = exec.run(&ctx(Duration::from_secs(10)), "dev-1", "hi").await;
        let _ = std::fs::remove_file(&script);

        let Err(err) = result else {
            panic!("script exits with 3");
        };
        let ExecError::Exited { status, .. } = &err else {
            panic!("expected exit error, got {err:?}");
        };
        assert_eq!(status.code(), Some(3));
        assert_eq!(err.output(), "out\nerr\n");
        assert!(err.to_string().ends_with("exit status: 3"));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let exec = OpenClawExecutor::with_program("clawproxy-test-no-such-program");
        let result = exec.run(&ctx(Duration::from_secs(10)), "dev-1", "hi").await;
        assert!(matches!(result, Err(ExecError::Spawn { .. })));
    }

    #[tokio::test]
    async fn cancelled_context_does_not_spawn() {
        let parent = CancellationToken::new();
        let ctx = ExecContext::with_timeout(&parent, Duration::from_secs(10));
        ctx.cancel();

        let exec = OpenClawExecutor::with_program("clawproxy-test-no-such-program");
        let result = exec.run(&ctx, "dev-1", "hi").await;
        assert!(matches!(result, Err(ExecError::Cancelled { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn deadline_kills_slow_process() {
        use std::os::unix::fs::PermissionsExt;

        let script = std::env::temp_dir().join(format!(
            "clawproxy-slow-agent-{}.sh",
            std::process::id()
        ));
        let Ok(()) = std::fs::write(&script, "#!/bin/sh\necho started\nexec sleep 30\n") else {
            panic!("write script");
        };
        let Ok(()) = std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
        else {
            panic!("chmod script");
        };

        let exec = OpenClawExecutor::with_program(script.to_string_lossy());
        let started = std::time::Instant::now();
        let result = exec.run(&ctx(Duration::from_millis(500)), "dev-1", "hi").await;
        let _ = std::fs::remove_file(&script);

        let Err(err) = result else {
            panic!("slow agent should time out");
        };
        assert!(matches!(err, ExecError::DeadlineExceeded { .. }));
        assert!(err.output().contains("started"));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
