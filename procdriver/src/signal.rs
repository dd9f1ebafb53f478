//! Unix signal helpers for child termination. Process groups are out of
//! scope here; signals target a single PID.

use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KillSignal {
    /// SIGTERM - allows graceful shutdown
    Term,
    /// SIGKILL - immediate termination
    Kill,
}

impl KillSignal {
    fn as_libc_signal(self) -> libc::c_int {
        match self {
            KillSignal::Term => libc::SIGTERM,
            KillSignal::Kill => libc::SIGKILL,
        }
    }
}

/// Send `signal` to `pid` (best-effort; a process that is already gone is
/// not an error).
pub(crate) fn send_signal(pid: u32, signal: KillSignal) -> io::Result<()> {
    let result = unsafe { libc::kill(pid as libc::pid_t, signal.as_libc_signal()) };
    if result == -1 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            return Err(err);
        }
    }
    Ok(())
}
