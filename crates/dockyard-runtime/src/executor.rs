use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::UnboundedSender;

use crate::docker::DockerError;

/// Abstraction over docker CLI execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
#[async_trait]
pub trait DockerExecutor: Send + Sync {
    /// Execute a docker command and capture stdout.
    async fn exec(&self, args: &[String]) -> Result<String, DockerError>;

    /// Execute a docker command, forwarding every stdout and stderr line to `lines`.
    async fn exec_streaming(
        &self,
        args: &[String],
        lines: UnboundedSender<String>,
    ) -> Result<(), DockerError>;
}

/// Real docker CLI executor, optionally bound to a remote engine.
#[derive(Debug, Clone)]
pub struct RealExecutor {
    binary: String,
    host: Option<String>,
}

impl RealExecutor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            host: None,
        }
    }

    /// Target the engine at `host` (`unix:///…`, `ssh://…`, `tcp://…`).
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    fn command(&self, args: &[String]) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.binary);
        if let Some(host) = &self.host {
            cmd.arg("--host").arg(host);
        }
        cmd.args(args).kill_on_drop(true);
        cmd
    }
}

impl Default for RealExecutor {
    fn default() -> Self {
        Self::new("docker")
    }
}

#[async_trait]
impl DockerExecutor for RealExecutor {
    async fn exec(&self, args: &[String]) -> Result<String, DockerError> {
        let output = self
            .command(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| DockerError::NotFound { source: e })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| DockerError::InvalidUtf8 { source: e })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(DockerError::CommandFailed {
                args: args.to_vec(),
                stderr,
            })
        }
    }

    async fn exec_streaming(
        &self,
        args: &[String],
        lines: UnboundedSender<String>,
    ) -> Result<(), DockerError> {
        let mut child = self
            .command(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DockerError::NotFound { source: e })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (out, err, status) = tokio::join!(
            forward_lines(stdout, lines.clone()),
            forward_lines(stderr, lines),
            child.wait(),
        );
        out?;
        let last_error_line = err?;
        let status = status.map_err(|e| DockerError::Output { source: e })?;

        if status.success() {
            Ok(())
        } else {
            Err(DockerError::CommandFailed {
                args: args.to_vec(),
                stderr: last_error_line.unwrap_or_else(|| format!("exit code: {status}")),
            })
        }
    }
}

/// Forward each line of `reader` and return the last non-empty one.
async fn forward_lines<R>(
    reader: Option<R>,
    lines: UnboundedSender<String>,
) -> Result<Option<String>, DockerError>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(None);
    };

    let mut last = None;
    let mut reader = BufReader::new(reader).lines();
    while let Some(line) = reader
        .next_line()
        .await
        .map_err(|e| DockerError::Output { source: e })?
    {
        if !line.trim().is_empty() {
            last = Some(line.clone());
        }
        // The receiver may already be gone; keep draining so the child never blocks.
        let _ = lines.send(line);
    }
    Ok(last)
}
