//! Captured output: tagged chunks in arrival order, with convenience views
//! computed on demand.

use bytes::Bytes;
use std::fmt;

/// Origin of an output chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamChannel {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// One read's worth of bytes from a child stream.
///
/// Produced by a reader task, handed through the single-slot queue to the
/// draining loop, and owned by the consumer from then on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub channel: StreamChannel,
    pub bytes: Bytes,
}

impl OutputChunk {
    pub fn new(channel: StreamChannel, bytes: impl Into<Bytes>) -> Self {
        Self {
            channel,
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Exit code plus everything the child wrote, in arrival order across both
/// channels. Within one channel order is the child's write order; across
/// channels it is whatever reached the hand-off queue first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    exit_code: i32,
    chunks: Vec<OutputChunk>,
}

impl RunOutput {
    pub(crate) fn new(exit_code: i32, chunks: Vec<OutputChunk>) -> Self {
        Self { exit_code, chunks }
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn chunks(&self) -> &[OutputChunk] {
        &self.chunks
    }

    fn channel_bytes(&self, channel: StreamChannel) -> Vec<u8> {
        let mut bytes = Vec::new();
        for chunk in &self.chunks {
            if chunk.channel == channel {
                bytes.extend_from_slice(&chunk.bytes);
            }
        }
        bytes
    }

    /// All stdout bytes, concatenated on demand.
    pub fn stdout_bytes(&self) -> Vec<u8> {
        self.channel_bytes(StreamChannel::Stdout)
    }

    /// All stderr bytes, concatenated on demand.
    pub fn stderr_bytes(&self) -> Vec<u8> {
        self.channel_bytes(StreamChannel::Stderr)
    }

    /// Stdout as text, invalid sequences replaced.
    pub fn stdout_utf8(&self) -> String {
        String::from_utf8_lossy(&self.stdout_bytes()).into_owned()
    }

    /// Stderr as text, invalid sequences replaced.
    pub fn stderr_utf8(&self) -> String {
        String::from_utf8_lossy(&self.stderr_bytes()).into_owned()
    }

    pub fn stdout_trimmed(&self) -> String {
        self.stdout_utf8().trim().to_string()
    }

    pub fn stderr_trimmed(&self) -> String {
        self.stderr_utf8().trim().to_string()
    }
}
