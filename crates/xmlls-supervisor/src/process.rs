//! Spawning the server and talking to it.

use std::fmt;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tracing::debug;
use xmlls_core::{ExecutableSpec, Result, XmlLsError};

/// The server's side of the protocol stream: we write requests to `input`
/// and read responses from `output`. Payloads are never interpreted here.
pub struct ServerChannel {
    /// Server stdin
    pub input: Box<dyn AsyncWrite + Send + Unpin>,
    /// Server stdout
    pub output: Box<dyn AsyncRead + Send + Unpin>,
}

impl fmt::Debug for ServerChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerChannel").finish_non_exhaustive()
    }
}

/// How a server process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// A running server
#[async_trait]
pub trait ServerProcess: Send {
    /// OS process id, when known
    fn id(&self) -> Option<u32>;

    /// Take the stdio channel; `None` after the first call
    fn take_channel(&mut self) -> Option<ServerChannel>;

    /// Wait for the process to end
    async fn wait(&mut self) -> Result<ProcessExit>;

    /// Kill the process and reap it
    async fn kill(&mut self) -> Result<()>;
}

/// Starts server processes from a launch description
#[async_trait]
pub trait ProcessSpawner: Send + Sync {
    /// Spawn `spec` with piped stdin and stdout
    async fn spawn(&self, spec: &ExecutableSpec) -> Result<Box<dyn ServerProcess>>;
}

/// Spawns real OS processes with `tokio::process`.
///
/// The child inherits our environment with the launch description's
/// variables layered on top. Stderr is inherited so server logs reach the
/// terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

#[async_trait]
impl ProcessSpawner for TokioSpawner {
    async fn spawn(&self, spec: &ExecutableSpec) -> Result<Box<dyn ServerProcess>> {
        let mut command = Command::new(&spec.command);
        command
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(env) = &spec.env {
            command.envs(env);
        }

        let child = command
            .spawn()
            .map_err(|e| XmlLsError::io(&spec.command, e))?;
        debug!(pid = ?child.id(), command = %spec.command.display(), "spawned server");

        Ok(Box::new(TokioProcess {
            command: spec.command.display().to_string(),
            child,
        }))
    }
}

struct TokioProcess {
    command: String,
    child: Child,
}

#[async_trait]
impl ServerProcess for TokioProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn take_channel(&mut self) -> Option<ServerChannel> {
        let input = self.child.stdin.take()?;
        let output = self.child.stdout.take()?;
        Some(ServerChannel {
            input: Box::new(input),
            output: Box::new(output),
        })
    }

    async fn wait(&mut self) -> Result<ProcessExit> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| XmlLsError::io(&self.command, e))?;
        Ok(ProcessExit {
            code: status.code(),
        })
    }

    async fn kill(&mut self) -> Result<()> {
        self.child
            .kill()
            .await
            .map_err(|e| XmlLsError::io(&self.command, e))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn channel_is_the_child_stdio() {
        let spec = ExecutableSpec::new("cat");
        let mut process = TokioSpawner.spawn(&spec).await.unwrap();
        let mut channel = process.take_channel().unwrap();
        assert!(process.take_channel().is_none());

        channel.input.write_all(b"Content-Length: 2\r\n\r\n{}").await.unwrap();
        drop(channel.input);

        let mut echoed = String::new();
        channel.output.read_to_string(&mut echoed).await.unwrap();
        assert_eq!(echoed, "Content-Length: 2\r\n\r\n{}");
        assert_eq!(process.wait().await.unwrap().code, Some(0));
    }

    #[tokio::test]
    async fn env_is_layered_over_inherited_one() {
        let mut env = std::collections::BTreeMap::new();
        env.insert("HTTP_PROXY_HOST".to_string(), "proxy.corp".to_string());
        let spec = ExecutableSpec::new("/usr/bin/env").with_env(env);

        let mut process = TokioSpawner.spawn(&spec).await.unwrap();
        let mut channel = process.take_channel().unwrap();
        let mut printed = String::new();
        channel.output.read_to_string(&mut printed).await.unwrap();
        assert!(printed.lines().any(|l| l == "HTTP_PROXY_HOST=proxy.corp"));
        assert!(printed.lines().any(|l| l.starts_with("PATH=")));
    }

    #[tokio::test]
    async fn missing_command_is_an_io_error() {
        let spec = ExecutableSpec::new("/nonexistent/lemminx");
        let err = TokioSpawner.spawn(&spec).await.err().unwrap();
        assert!(matches!(err, XmlLsError::Io { .. }));
    }

    #[tokio::test]
    async fn kill_ends_the_process() {
        let spec = ExecutableSpec::new("sleep").with_args({
            let mut args = xmlls_core::ArgList::new();
            args.push("30");
            args
        });
        let mut process = TokioSpawner.spawn(&spec).await.unwrap();
        process.kill().await.unwrap();
        assert_eq!(process.wait().await.unwrap().code, None);
    }
}
