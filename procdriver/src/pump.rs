//! Stream pump workers: one feeding the child's stdin, one per captured
//! output stream reading into the hand-off queue.

use std::io::ErrorKind;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt as _, AsyncWriteExt as _};
use tokio::process::ChildStdin;
use tokio::sync::mpsc;

use crate::output::{OutputChunk, StreamChannel};

pub(crate) const READ_BUF_SIZE: usize = 8_192;

/// Write the configured input into the child's stdin, then close it so the
/// child sees EOF.
///
/// Failures here are expected (the child may close its end at any point) and
/// never fail the invocation.
pub(crate) async fn feed_stdin(mut stdin: ChildStdin, bytes: Vec<u8>) {
    if let Err(err) = stdin.write_all(&bytes).await {
        tracing::debug!("stdin pump stopped early: {err}");
    }
    if let Err(err) = stdin.shutdown().await {
        tracing::debug!("stdin close failed: {err}");
    }
}

/// Read a child output stream to EOF, handing every non-empty read to the
/// draining loop as a tagged chunk.
///
/// The channel has capacity 1: a send blocks until the drainer has taken the
/// previous chunk, which paces this reader to the consumer and keeps hand-off
/// order equal to production order. A dropped receiver ends the pump; so does
/// any read error other than an interrupted syscall, treated the same as
/// end-of-stream.
pub(crate) async fn pump_output<R>(
    mut reader: R,
    channel: StreamChannel,
    tx: mpsc::Sender<OutputChunk>,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = OutputChunk::new(channel, Bytes::copy_from_slice(&buf[..n]));
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
            Err(ref err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                tracing::debug!("{channel} reader stopped: {err}");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{pump_output, READ_BUF_SIZE};
    use crate::output::{OutputChunk, StreamChannel};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn pump_preserves_bytes_and_tags() {
        let data = b"hello pump".to_vec();
        let (tx, mut rx) = mpsc::channel::<OutputChunk>(1);
        let source = data.clone();
        let pump = tokio::spawn(async move {
            pump_output(source.as_slice(), StreamChannel::Stderr, tx).await;
        });

        let mut collected = Vec::new();
        while let Some(chunk) = rx.recv().await {
            assert_eq!(chunk.channel, StreamChannel::Stderr);
            collected.extend_from_slice(&chunk.bytes);
        }
        pump.await.expect("pump task");
        assert_eq!(collected, data);
    }

    #[tokio::test]
    async fn large_input_arrives_in_bounded_chunks() {
        let data = vec![0x5a_u8; READ_BUF_SIZE * 2 + 17];
        let (tx, mut rx) = mpsc::channel::<OutputChunk>(1);
        let source = data.clone();
        let pump = tokio::spawn(async move {
            pump_output(source.as_slice(), StreamChannel::Stdout, tx).await;
        });

        let mut collected = Vec::new();
        while let Some(chunk) = rx.recv().await {
            assert!(chunk.len() <= READ_BUF_SIZE);
            assert!(!chunk.is_empty());
            collected.extend_from_slice(&chunk.bytes);
        }
        pump.await.expect("pump task");
        assert_eq!(collected, data);
    }

    #[tokio::test]
    async fn dropped_receiver_ends_the_pump() {
        let data = vec![1_u8; READ_BUF_SIZE * 4];
        let (tx, rx) = mpsc::channel::<OutputChunk>(1);
        drop(rx);
        pump_output(data.as_slice(), StreamChannel::Stdout, tx).await;
    }
}
