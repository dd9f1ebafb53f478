//! The process runner: spawning, the draining loop that serializes output
//! callbacks, the wall-clock timeout, and the termination protocol.

use std::sync::Arc;
use std::time::Instant;

use tokio::process::Command as OsCommand;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};

use crate::child::ChildProcess;
use crate::command::Command;
use crate::config::{EnvProvider, InvokeConfig, SystemEnv};
use crate::error::{InvokeError, Result};
use crate::output::{OutputChunk, RunOutput, StreamChannel};
use crate::pump;
use crate::redirect::{OutputSink, StdinSource};

/// Bound for each poll of the hand-off queue. Short enough to notice reader
/// or process exit promptly, long enough not to spin.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Spawns child processes and drives their I/O to completion.
///
/// Three operations of increasing control: [`run`](Self::run) captures
/// everything into a [`RunOutput`], [`stream`](Self::stream) delivers chunks
/// to caller callbacks, and [`spawn`](Self::spawn) only constructs the child
/// and hands back the handle.
pub struct ProcessRunner {
    env: Arc<dyn EnvProvider>,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    /// Runner backed by the real process environment.
    pub fn new() -> Self {
        Self {
            env: Arc::new(SystemEnv),
        }
    }

    /// Substitute the source of the parent environment map, mainly for
    /// tests.
    pub fn with_env_provider(provider: Arc<dyn EnvProvider>) -> Self {
        Self { env: provider }
    }

    /// Run to completion, collecting both output streams into an ordered
    /// chunk sequence.
    ///
    /// Always returns the captured output regardless of exit code, unless
    /// the config opted into [`check`](InvokeConfig::check), in which case a
    /// non-zero exit becomes [`InvokeError::CommandFailed`] carrying the
    /// same output.
    pub async fn run(&self, command: &Command, config: InvokeConfig) -> Result<RunOutput> {
        let check = config.check;
        let mut chunks = Vec::new();
        let exit_code = self
            .drive(command, config, |chunk| chunks.push(chunk))
            .await?;
        let output = RunOutput::new(exit_code, chunks);
        if check && exit_code != 0 {
            return Err(InvokeError::CommandFailed { output });
        }
        Ok(output)
    }

    /// Run to completion, delivering chunks to `on_out`/`on_err` instead of
    /// aggregating. Returns the exit code.
    ///
    /// Both callbacks are invoked only from the calling task, one at a time,
    /// in queue hand-off order; they may freely mutate caller state without
    /// synchronization.
    pub async fn stream<O, E>(
        &self,
        command: &Command,
        config: InvokeConfig,
        mut on_out: O,
        mut on_err: E,
    ) -> Result<i32>
    where
        O: FnMut(&[u8]),
        E: FnMut(&[u8]),
    {
        self.drive(command, config, |chunk| match chunk.channel {
            StreamChannel::Stdout => on_out(&chunk.bytes),
            StreamChannel::Stderr => on_err(&chunk.bytes),
        })
        .await
    }

    /// Construct and start the child, then hand the handle back. No pumping,
    /// no draining, no waiting: the caller owns the whole lifecycle.
    pub fn spawn(&self, command: &Command, config: &InvokeConfig) -> Result<ChildProcess> {
        let program = command.program().ok_or(InvokeError::EmptyCommand)?;

        let mut cmd = OsCommand::new(program);
        cmd.args(command.args_slice());
        if let Some(cwd) = &config.cwd {
            cmd.current_dir(cwd);
        }

        cmd.env_clear();
        for (name, value) in config.resolved_env(self.env.as_ref()) {
            cmd.env(name, value);
        }

        cmd.stdin(stdio(config.stdin.to_stdio())?);
        cmd.stdout(stdio(config.stdout.to_stdio())?);
        if config.merge_stderr {
            // Merged stderr is always captured; its chunks come back tagged
            // as stdout.
            cmd.stderr(stdio(OutputSink::Pipe.to_stdio())?);
        } else {
            cmd.stderr(stdio(config.stderr.to_stdio())?);
        }

        let child = cmd.spawn().map_err(|source| InvokeError::Spawn {
            program: program.to_string(),
            source,
        })?;
        tracing::debug!("spawned '{command}' as pid {:?}", child.id());
        Ok(ChildProcess::new(child, program.to_string()))
    }

    /// Shared driver behind `run` and `stream`: spawn, pump, drain, enforce
    /// the timeout, terminate, reap.
    async fn drive(
        &self,
        command: &Command,
        config: InvokeConfig,
        mut on_chunk: impl FnMut(OutputChunk),
    ) -> Result<i32> {
        let mut child = self.spawn(command, &config)?;

        let timeout = config.timeout;
        let merge = config.merge_stderr;
        let stdin_bytes = match config.stdin {
            StdinSource::Bytes(bytes) => Some(bytes),
            _ => None,
        };

        // Capacity 1 forces producer/consumer rendezvous: memory stays
        // bounded and each reader is paced to the drain loop, so hand-off
        // order is true production order.
        let (tx, mut rx) = mpsc::channel::<OutputChunk>(1);

        let stdin_task: Option<JoinHandle<()>> = match (child.take_stdin(), stdin_bytes) {
            (Some(stdin), Some(bytes)) => Some(tokio::spawn(pump::feed_stdin(stdin, bytes))),
            _ => None,
        };
        let out_task: Option<JoinHandle<()>> = child.take_stdout().map(|stdout| {
            let tx = tx.clone();
            tokio::spawn(pump::pump_output(stdout, StreamChannel::Stdout, tx))
        });
        let err_channel = if merge {
            StreamChannel::Stdout
        } else {
            StreamChannel::Stderr
        };
        let err_task: Option<JoinHandle<()>> = child.take_stderr().map(|stderr| {
            let tx = tx.clone();
            tokio::spawn(pump::pump_output(stderr, err_channel, tx))
        });
        drop(tx);

        // Drain on the calling task: keep polling while any reader or the
        // process is alive and the clock has not run out. Every delivered
        // chunk is dispatched synchronously, so callbacks are strictly
        // serialized.
        let started = Instant::now();
        let timed_out = loop {
            let readers_alive = task_alive(&out_task) || task_alive(&err_task);
            if !readers_alive && !child.is_alive() {
                break false;
            }
            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    break true;
                }
            }
            match time::timeout(POLL_INTERVAL, rx.recv()).await {
                Ok(Some(chunk)) => on_chunk(chunk),
                // Channel closed: no producers left, pace the liveness
                // checks instead of spinning.
                Ok(None) => time::sleep(POLL_INTERVAL).await,
                Err(_) => {}
            }
        };

        if timed_out {
            tracing::debug!("'{command}' hit its {timeout:?} limit, abandoning drain");
        } else {
            // A final chunk can land in the queue slot in the instant
            // between the last poll and the liveness check going false;
            // sweep it up so natural completion delivers every byte.
            while let Ok(chunk) = rx.try_recv() {
                on_chunk(chunk);
            }
        }

        // Graceful then immediately forced, then an interruption-resilient
        // wait. No grace period between the two requests.
        child.terminate();
        child.kill();
        let exit_code = child.wait_exit_code().await;

        // Readers normally end on their own once the pipes close; anything
        // still blocked (a grandchild holding the descriptor open) gets cut
        // loose here.
        for task in [stdin_task, out_task, err_task].into_iter().flatten() {
            task.abort();
        }

        Ok(exit_code)
    }
}

fn task_alive(task: &Option<JoinHandle<()>>) -> bool {
    task.as_ref().is_some_and(|task| !task.is_finished())
}

fn stdio(projected: std::io::Result<std::process::Stdio>) -> Result<std::process::Stdio> {
    projected.map_err(|source| InvokeError::Redirect { source })
}
