//! Live handle to a spawned child process.

use std::fmt;
use std::io::ErrorKind;
use std::process::ExitStatus;

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout};

#[cfg(unix)]
use crate::signal::{self, KillSignal};

/// One running child, exclusively owned for the duration of an invocation.
///
/// [`ProcessRunner::run`] and [`ProcessRunner::stream`] always drive the
/// handle to termination before returning. A handle obtained from
/// [`ProcessRunner::spawn`] leaves every lifecycle duty to the caller.
///
/// [`ProcessRunner::run`]: crate::ProcessRunner::run
/// [`ProcessRunner::stream`]: crate::ProcessRunner::stream
/// [`ProcessRunner::spawn`]: crate::ProcessRunner::spawn
pub struct ChildProcess {
    child: Child,
    program: String,
    exit_code: Option<i32>,
}

impl fmt::Debug for ChildProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildProcess")
            .field("program", &self.program)
            .field("exit_code", &self.exit_code)
            .finish()
    }
}

impl ChildProcess {
    pub(crate) fn new(child: Child, program: String) -> Self {
        Self {
            child,
            program,
            exit_code: None,
        }
    }

    /// OS process id, while the child has not been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Take the writable end of the child's stdin pipe, if piped.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    /// Take the readable end of the child's stdout pipe, if piped.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Take the readable end of the child's stderr pipe, if piped.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// True while the OS has not yet reported an exit status.
    pub fn is_alive(&mut self) -> bool {
        if self.exit_code.is_some() {
            return false;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.exit_code = Some(exit_code_of(status));
                false
            }
            Ok(None) => true,
            Err(err) => {
                tracing::debug!("liveness check for '{}' failed: {err}", self.program);
                false
            }
        }
    }

    /// Request cooperative termination: SIGTERM on Unix, a plain kill
    /// elsewhere. Best-effort; a child that is already gone is fine.
    pub fn terminate(&mut self) {
        #[cfg(unix)]
        {
            if let Some(pid) = self.child.id() {
                if let Err(err) = signal::send_signal(pid, KillSignal::Term) {
                    tracing::debug!("graceful terminate of '{}' failed: {err}", self.program);
                }
            }
        }
        #[cfg(not(unix))]
        {
            self.kill();
        }
    }

    /// Request unconditional termination. Best-effort.
    pub fn kill(&mut self) {
        if let Err(err) = self.child.start_kill() {
            // InvalidInput here means the child already exited.
            if err.kind() != ErrorKind::InvalidInput {
                tracing::debug!("forced kill of '{}' failed: {err}", self.program);
            }
        }
    }

    /// Wait for the exit code, retrying when the wait itself is interrupted
    /// by a signal.
    ///
    /// Pagers, editors, and remote shells routinely survive an interrupt
    /// delivered to the parent; abandoning the wait would leave a live
    /// orphan still wired to our pipes. Only interruption retries; any other
    /// wait failure maps to exit code -1, as does an exit without a code
    /// (killed by signal).
    pub async fn wait_exit_code(&mut self) -> i32 {
        if let Some(code) = self.exit_code {
            return code;
        }
        loop {
            match wait_step(self.child.wait().await) {
                WaitStep::Done(code) => {
                    self.exit_code = Some(code);
                    return code;
                }
                WaitStep::Retry => continue,
                WaitStep::Abandon(err) => {
                    tracing::warn!("wait for '{}' failed: {err}", self.program);
                    self.exit_code = Some(-1);
                    return -1;
                }
            }
        }
    }
}

/// Verdict on one wait attempt.
#[derive(Debug)]
enum WaitStep {
    Done(i32),
    Retry,
    Abandon(std::io::Error),
}

/// An interrupted wait is retried; any other failure abandons the wait with
/// exit code -1 rather than looping forever on something like ECHILD.
fn wait_step(result: std::io::Result<ExitStatus>) -> WaitStep {
    match result {
        Ok(status) => WaitStep::Done(exit_code_of(status)),
        Err(err) if err.kind() == ErrorKind::Interrupted => WaitStep::Retry,
        Err(err) => WaitStep::Abandon(err),
    }
}

fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::{exit_code_of, wait_step, WaitStep};
    use std::io::{Error, ErrorKind};

    #[cfg(unix)]
    #[test]
    fn signal_exits_map_to_minus_one() {
        use std::os::unix::process::ExitStatusExt as _;
        let status = std::process::ExitStatus::from_raw(libc::SIGKILL);
        assert_eq!(exit_code_of(status), -1);
    }

    #[cfg(unix)]
    #[test]
    fn normal_exits_keep_their_code() {
        use std::os::unix::process::ExitStatusExt as _;
        let status = std::process::ExitStatus::from_raw(7 << 8);
        assert_eq!(exit_code_of(status), 7);
    }

    #[cfg(unix)]
    #[test]
    fn successful_wait_ends_the_retry_loop() {
        use std::os::unix::process::ExitStatusExt as _;
        let status = std::process::ExitStatus::from_raw(7 << 8);
        assert!(matches!(wait_step(Ok(status)), WaitStep::Done(7)));
    }

    #[test]
    fn interrupted_wait_is_retried() {
        let step = wait_step(Err(Error::from(ErrorKind::Interrupted)));
        assert!(matches!(step, WaitStep::Retry));
    }

    #[test]
    fn other_wait_failures_are_abandoned() {
        let step = wait_step(Err(Error::from(ErrorKind::NotFound)));
        assert!(matches!(step, WaitStep::Abandon(_)));
    }
}
