//! Secure process execution.
//!
//! Programs are spawned from an argv array, never through a shell. The
//! child gets a cleared environment with only `PATH`, the service's own
//! working directory, a null stdin, and is killed when its timeout or the
//! output ceiling is hit.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use galaxy_core::config::ExecutorConfig;

use crate::error::ExecError;
use crate::policy::CommandPolicy;

const READ_CHUNK: usize = 8 * 1024;

/// Captured result of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutput {
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
    /// Always 0 for a returned output; non-zero exits are errors.
    pub exit_code: i32,
    /// Wall-clock run time.
    pub duration_ms: u64,
}

/// Runs whitelisted commands under the limits of a [`CommandPolicy`].
#[derive(Debug, Clone)]
pub struct SecureExecutor {
    policy: Arc<CommandPolicy>,
    max_output_bytes: usize,
    child_path: String,
    working_dir: PathBuf,
}

impl SecureExecutor {
    /// Creates an executor rooted at the process's current directory.
    pub fn new(policy: CommandPolicy, config: &ExecutorConfig) -> Result<Self, ExecError> {
        let working_dir = std::env::current_dir()?;
        Ok(Self::with_working_dir(policy, config, working_dir))
    }

    /// Creates an executor with an explicit working directory.
    pub fn with_working_dir(
        policy: CommandPolicy,
        config: &ExecutorConfig,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            policy: Arc::new(policy),
            max_output_bytes: config.max_output_bytes,
            child_path: config.child_path.clone(),
            working_dir: working_dir.into(),
        }
    }

    /// The policy consulted before every spawn.
    pub fn policy(&self) -> &CommandPolicy {
        &self.policy
    }

    /// Directory every child runs in.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Runs `command` with `args` under the policy's timeout.
    pub async fn execute(
        &self,
        command: &str,
        args: &[String],
    ) -> Result<ExecutionOutput, ExecError> {
        self.execute_with_timeout(command, args, None).await
    }

    /// Runs `command` with a caller-requested timeout, clamped to the policy ceiling.
    pub async fn execute_with_timeout(
        &self,
        command: &str,
        args: &[String],
        requested: Option<Duration>,
    ) -> Result<ExecutionOutput, ExecError> {
        let entry = match self.policy.check(command, args) {
            Ok(entry) => entry,
            Err(reason) => {
                warn!(command = %command, reason = %reason, "Rejected command");
                return Err(reason.into());
            }
        };
        let timeout = requested.map_or(entry.timeout, |t| t.min(entry.timeout));

        info!(
            command = %command,
            arg_count = args.len(),
            timeout_ms = timeout.as_millis() as u64,
            "Executing command"
        );

        let start = Instant::now();
        let mut child = Command::new(&entry.program)
            .args(args)
            .env_clear()
            .env("PATH", &self.child_path)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let run = tokio::time::timeout(
            timeout,
            collect_output(&mut child, self.max_output_bytes),
        )
        .await;

        let (stdout, stderr, status) = match run {
            Ok(Ok(captured)) => captured,
            Ok(Err(e)) => {
                terminate(&mut child, command).await;
                if matches!(e, ExecError::OutputLimitExceeded { .. }) {
                    warn!(command = %command, limit = self.max_output_bytes, "Output limit exceeded");
                }
                return Err(e);
            }
            Err(_) => {
                terminate(&mut child, command).await;
                warn!(
                    command = %command,
                    timeout_ms = timeout.as_millis() as u64,
                    "Command timed out"
                );
                return Err(ExecError::Timeout { timeout });
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        match status.code() {
            Some(0) => {
                debug!(command = %command, duration_ms, "Command completed");
                Ok(ExecutionOutput {
                    stdout,
                    stderr,
                    exit_code: 0,
                    duration_ms,
                })
            }
            Some(code) => {
                warn!(command = %command, code, duration_ms, "Command exited with failure");
                Err(ExecError::ProcessExit { code, stderr })
            }
            None => Err(ExecError::ProcessSignaled {
                signal: exit_signal(&status),
            }),
        }
    }

    /// Splits `line` on whitespace and runs the result.
    ///
    /// This only tokenizes. The parsed command is checked against the
    /// policy like any other request; quoting has no meaning.
    pub async fn parse_and_execute(&self, line: &str) -> Result<ExecutionOutput, ExecError> {
        let (command, args) = parse_command_line(line)?;
        self.execute(&command, &args).await
    }
}

/// Splits a command line into command name and arguments.
pub fn parse_command_line(line: &str) -> Result<(String, Vec<String>), ExecError> {
    let mut parts = line.split_whitespace().map(str::to_string);
    let command = parts.next().ok_or(ExecError::EmptyCommand)?;
    Ok((command, parts.collect()))
}

/// Reads both pipes concurrently against one shared byte budget, then reaps the child.
async fn collect_output(
    child: &mut Child,
    limit: usize,
) -> Result<(Vec<u8>, Vec<u8>, ExitStatus), ExecError> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ExecError::Io(std::io::Error::other("stdout not captured")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ExecError::Io(std::io::Error::other("stderr not captured")))?;

    let used = AtomicUsize::new(0);
    let (out, err) = tokio::try_join!(
        read_bounded(stdout, &used, limit),
        read_bounded(stderr, &used, limit),
    )?;
    let status = child.wait().await?;
    Ok((out, err, status))
}

async fn read_bounded<R>(mut reader: R, used: &AtomicUsize, limit: usize) -> Result<Vec<u8>, ExecError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(buf);
        }
        if used.fetch_add(n, Ordering::SeqCst) + n > limit {
            return Err(ExecError::OutputLimitExceeded { limit });
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

async fn terminate(child: &mut Child, command: &str) {
    if let Err(e) = child.kill().await {
        warn!(command = %command, error = %e, "Failed to kill child process");
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}
