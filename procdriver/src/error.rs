//! Error taxonomy: setup failures are fatal, runtime stream failures never
//! are, and a non-zero exit only errors when the caller opted in.

use std::io;

use thiserror::Error;

use crate::output::RunOutput;

pub type Result<T> = std::result::Result<T, InvokeError>;

/// Errors surfaced by [`ProcessRunner`][crate::ProcessRunner].
///
/// Only the setup phase and (opted-in) exit-code checking produce errors.
/// I/O failures on the streams during the run are absorbed by the pump
/// tasks, and a timeout ends the drain silently rather than erroring.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("command has no tokens to execute")]
    EmptyCommand,

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to open redirect target: {source}")]
    Redirect {
        #[source]
        source: io::Error,
    },

    #[error("command exited with status {}", output.exit_code())]
    CommandFailed { output: RunOutput },
}

#[cfg(test)]
mod tests {
    use super::InvokeError;
    use crate::output::RunOutput;

    #[test]
    fn command_failed_reports_the_exit_code() {
        let err = InvokeError::CommandFailed {
            output: RunOutput::new(7, Vec::new()),
        };
        assert_eq!(err.to_string(), "command exited with status 7");
    }

    #[test]
    fn spawn_error_names_the_program() {
        let err = InvokeError::Spawn {
            program: "missing".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("missing"));
    }
}
