//! Redirect targets for the child's standard streams, with the two
//! projections the runner needs: a `Stdio` for spawning, and whether the
//! target requires a pump task on our side of the pipe.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;

/// Where the child's stdin comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StdinSource {
    /// Immediate EOF.
    #[default]
    Null,
    /// The parent's own stdin.
    Inherit,
    /// Fixed bytes fed by the input pump, then closed.
    Bytes(Vec<u8>),
    /// An existing file, wired up by the OS.
    File(PathBuf),
}

impl StdinSource {
    pub(crate) fn to_stdio(&self) -> io::Result<Stdio> {
        match self {
            Self::Null => Ok(Stdio::null()),
            Self::Inherit => Ok(Stdio::inherit()),
            Self::Bytes(_) => Ok(Stdio::piped()),
            Self::File(path) => Ok(Stdio::from(fs::File::open(path)?)),
        }
    }
}

impl From<&str> for StdinSource {
    fn from(value: &str) -> Self {
        Self::Bytes(value.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for StdinSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// Where the child's stdout or stderr goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputSink {
    /// Captured through a pipe and delivered as ordered chunks.
    #[default]
    Pipe,
    /// The parent's own stream.
    Inherit,
    /// Discarded.
    Null,
    /// Written to a file (created or truncated), without parent involvement.
    File(PathBuf),
}

impl OutputSink {
    pub(crate) fn to_stdio(&self) -> io::Result<Stdio> {
        match self {
            Self::Pipe => Ok(Stdio::piped()),
            Self::Inherit => Ok(Stdio::inherit()),
            Self::Null => Ok(Stdio::null()),
            Self::File(path) => Ok(Stdio::from(fs::File::create(path)?)),
        }
    }
}
