use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::Error;

/// How long a stopping server may take to exit before it is killed.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// A channel exchanging JSON-RPC messages with an MCP server.
#[async_trait]
pub trait McpTransport: Send + 'static {
    /// Sends one message.
    async fn send(&mut self, message: &Value) -> Result<(), Error>;

    /// Receives the next message.
    async fn receive(&mut self) -> Result<Value, Error>;

    /// Shuts the server down. Stopping twice is a no-op.
    async fn stop(&mut self);
}

struct Running {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Talks to an MCP server spawned as a subprocess, one JSON message per
/// line over its stdin and stdout.
pub struct StdioTransport {
    program: String,
    args: Vec<String>,
    workdir: Option<PathBuf>,
    stop_timeout: Duration,
    started: bool,
    running: Option<Running>,
}

impl StdioTransport {
    /// Creates a transport that will run `program` with `args`.
    pub fn new<S: Into<String>>(program: S, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            workdir: None,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            started: false,
            running: None,
        }
    }

    /// Parses a whitespace-separated command line. Returns `None` if it's
    /// empty.
    pub fn from_command_line(cmdline: &str) -> Option<Self> {
        let mut parts = cmdline.split_whitespace().map(ToOwned::to_owned);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    /// Runs the server in `workdir` instead of the current directory.
    #[inline]
    pub fn with_workdir<P: Into<PathBuf>>(mut self, workdir: P) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    /// Sets how long [`stop`](McpTransport::stop) waits before killing
    /// the server.
    #[inline]
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    #[inline]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[inline]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Spawns the server process.
    pub fn start(&mut self) -> Result<(), Error> {
        if self.running.is_some() {
            debug!("`{}` is already running", self.program);
            return Ok(());
        }

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(workdir) = &self.workdir {
            command.current_dir(workdir);
        }

        let mut child = command.spawn().map_err(|source| Error::Spawn {
            program: self.program.clone(),
            source,
        })?;
        let (Some(stdin), Some(stdout)) =
            (child.stdin.take(), child.stdout.take())
        else {
            return Err(Error::Io(io::Error::other("stdio is not piped")));
        };

        info!("started MCP server `{}`", self.program);
        self.started = true;
        self.running = Some(Running {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        });
        Ok(())
    }

    /// Returns whether the server process is still running.
    pub fn is_alive(&mut self) -> bool {
        self.running
            .as_mut()
            .is_some_and(|running| matches!(running.child.try_wait(), Ok(None)))
    }

    fn running(&mut self) -> Result<&mut Running, Error> {
        if !self.started {
            return Err(Error::NotStarted);
        }
        self.running.as_mut().ok_or(Error::Exited)
    }
}

#[async_trait]
impl McpTransport for StdioTransport {
    async fn send(&mut self, message: &Value) -> Result<(), Error> {
        let running = self.running()?;
        if !matches!(running.child.try_wait(), Ok(None)) {
            return Err(Error::Exited);
        }

        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        let stdin = &mut running.stdin;
        let written = async {
            stdin.write_all(line.as_bytes()).await?;
            stdin.flush().await
        }
        .await;
        written.map_err(|err| match err.kind() {
            io::ErrorKind::BrokenPipe => Error::Exited,
            _ => Error::Io(err),
        })
    }

    async fn receive(&mut self) -> Result<Value, Error> {
        let running = self.running()?;

        // Lines already written are read even if the server exited since.
        let mut line = String::new();
        if running.stdout.read_line(&mut line).await? == 0 {
            return Err(Error::Exited);
        }
        let line = line.trim();
        if line.is_empty() {
            return Err(Error::NoResponse);
        }
        Ok(serde_json::from_str(line)?)
    }

    async fn stop(&mut self) {
        let Some(Running {
            mut child, stdin, ..
        }) = self.running.take()
        else {
            return;
        };
        drop(stdin);

        if matches!(child.try_wait(), Ok(None)) {
            terminate(&mut child);
            let waited =
                tokio::time::timeout(self.stop_timeout, child.wait()).await;
            if waited.is_err() {
                warn!("`{}` did not exit in time, killing it", self.program);
                if let Err(err) = child.kill().await {
                    error!("cannot kill `{}`: {err}", self.program);
                }
            }
        }
        info!("stopped MCP server `{}`", self.program);
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    let Some(pid) = child.id() else {
        return;
    };
    // SAFETY: `kill` has no memory-safety preconditions. The child hasn't
    // been reaped, so the pid still refers to it.
    let ret = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if ret != 0 {
        debug!("cannot signal {pid}: {}", io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    if let Err(err) = child.start_kill() {
        debug!("cannot terminate the server: {err}");
    }
}
