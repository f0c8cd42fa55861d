// Subprocess execution: argument vectors in, captured output out

use crate::config::GatewayConfig;
use crate::error::CommandError;
use crate::sanitize::escape_quotes;
use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{ChildStderr, Command};
use tokio::time::timeout;

/// Stderr kept for error messages; the rest is drained and dropped
const MAX_STDERR_BYTES: u64 = 64 * 1024;

/// A program and its arguments as discrete tokens. Never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append `--name=value` as a single token.
    pub fn flag(self, name: &str, value: impl fmt::Display) -> Self {
        self.arg(format!("--{}={}", name, value))
    }

    /// Human-readable command line for logs. Tokens with whitespace or quotes
    /// are double-quoted with embedded quotes escaped.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote_token)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote_token(token: &str) -> String {
    let needs_quotes = token.is_empty()
        || token
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\'' || c == '\\');
    if needs_quotes {
        format!("\"{}\"", escape_quotes(token))
    } else {
        token.to_string()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout as UTF-8 on success, a `Failed` error carrying stderr otherwise.
    pub fn into_stdout(self) -> Result<String, CommandError> {
        if self.success() {
            Ok(String::from_utf8(self.stdout)?)
        } else {
            Err(CommandError::Failed {
                code: self.code,
                stderr: String::from_utf8_lossy(&self.stderr).into_owned(),
            })
        }
    }
}

/// Executes one command and waits for it to finish.
///
/// A non-zero exit is not an error at this level; callers decide what the
/// exit status means.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, CommandError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
    max_output_bytes: usize,
}

impl ProcessRunner {
    pub fn new(timeout: Duration, max_output_bytes: usize) -> Self {
        Self {
            timeout,
            max_output_bytes,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.timeout, config.max_output_bytes)
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}

#[async_trait::async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, CommandError> {
        tracing::debug!("Running: {}", command);

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = tokio::spawn(read_stderr(child.stderr.take()));
        let limit = self.max_output_bytes;

        // At most one byte past the ceiling is ever buffered.
        let collected = timeout(self.timeout, async {
            let mut buf = Vec::new();
            if let Some(stdout) = stdout {
                stdout.take(limit as u64 + 1).read_to_end(&mut buf).await?;
            }
            if buf.len() > limit {
                return Ok(None);
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>(Some((status, buf)))
        })
        .await
        // The child is killed when it goes out of scope.
        .map_err(|_| CommandError::Timeout(self.timeout))?
        .map_err(|source| CommandError::Io {
            program: command.program.clone(),
            source,
        })?;

        let Some((status, stdout)) = collected else {
            tracing::warn!("{} exceeded {} bytes of output", command.program, limit);
            let _ = child.start_kill();
            return Err(CommandError::OutputTooLarge { limit });
        };

        let output = CommandOutput {
            code: status.code(),
            stdout,
            stderr: stderr.await.unwrap_or_default(),
        };
        tracing::debug!(
            "{} exited with {:?} ({} bytes stdout)",
            command.program,
            output.code,
            output.stdout.len()
        );
        Ok(output)
    }
}

async fn read_stderr(stderr: Option<ChildStderr>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut stderr) = stderr {
        let _ = (&mut stderr)
            .take(MAX_STDERR_BYTES)
            .read_to_end(&mut buf)
            .await;
        let _ = tokio::io::copy(&mut stderr, &mut tokio::io::sink()).await;
    }
    buf
}
