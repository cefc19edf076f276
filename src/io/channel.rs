// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Newline-delimited JSON framing over any async byte stream.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::message::{ComputeMessage, Frame, FrameHeader};
use crate::config::consts::PROTOCOL_VERSION;
use crate::errors::TransportError;

/// Reads one line of at most `max_bytes` bytes, newline excluded.
///
/// Returns `Ok(None)` at end of stream. A longer line is consumed up to and
/// including its newline and reported as [`TransportError::FrameTooLong`], so
/// the next call starts on a fresh line.
async fn read_line_bounded<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    max_bytes: usize,
) -> Result<Option<Vec<u8>>, TransportError> {
    let mut line = Vec::new();
    let mut overflowed = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            if overflowed {
                return Err(TransportError::FrameTooLong { max: max_bytes });
            }
            return Ok(if line.is_empty() { None } else { Some(line) });
        }

        let (end, found_newline) = match available.iter().position(|&b| b == b'\n') {
            Some(pos) => (pos + 1, true),
            None => (available.len(), false),
        };
        let content = if found_newline { end - 1 } else { end };

        if !overflowed {
            if line.len() + content > max_bytes {
                overflowed = true;
                line.clear();
            } else {
                line.extend_from_slice(&available[..content]);
            }
        }
        reader.consume(end);

        if found_newline {
            if overflowed {
                return Err(TransportError::FrameTooLong { max: max_bytes });
            }
            return Ok(Some(line));
        }
    }
}

fn decode_frame(line: &[u8]) -> Result<Frame, TransportError> {
    let header: FrameHeader = serde_json::from_slice(line)?;
    if header.ver != PROTOCOL_VERSION {
        return Err(TransportError::UnsupportedVersion {
            found: header.ver,
            expected: PROTOCOL_VERSION,
        });
    }
    Ok(serde_json::from_slice(line)?)
}

/// Receiving half of a [`ComputeChannel`].
pub struct FrameReader<R> {
    reader: R,
    max_frame_bytes: usize,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    pub fn new(reader: R, max_frame_bytes: usize) -> Self {
        Self {
            reader,
            max_frame_bytes,
        }
    }

    /// Next frame, `None` at end of stream. Decode failures are returned as
    /// errors and the reader stays usable; I/O errors are final.
    pub async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        loop {
            match read_line_bounded(&mut self.reader, self.max_frame_bytes).await {
                Ok(None) => return None,
                Ok(Some(line)) if line.iter().all(u8::is_ascii_whitespace) => continue,
                Ok(Some(line)) => return Some(decode_frame(&line)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Sending half of a [`ComputeChannel`]. Numbers frames from 1.
pub struct FrameWriter<W> {
    writer: W,
    next_id: u64,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, next_id: 1 }
    }

    /// Writes `message` as one frame and returns the id it was sent with.
    pub async fn send(&mut self, message: ComputeMessage) -> Result<u64, TransportError> {
        let id = self.next_id;
        let frame = Frame {
            ver: PROTOCOL_VERSION,
            id,
            message,
        };
        let mut line = serde_json::to_vec(&frame)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        self.next_id += 1;
        Ok(id)
    }

    pub async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// A bidirectional compute message channel.
pub struct ComputeChannel<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
}

impl<R: AsyncBufRead + Unpin, W: AsyncWrite + Unpin> ComputeChannel<R, W> {
    pub fn new(reader: R, writer: W, max_frame_bytes: usize) -> Self {
        Self {
            reader: FrameReader::new(reader, max_frame_bytes),
            writer: FrameWriter::new(writer),
        }
    }

    pub async fn send(&mut self, message: ComputeMessage) -> Result<u64, TransportError> {
        self.writer.send(message).await
    }

    pub async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        self.reader.next_frame().await
    }

    pub fn split(self) -> (FrameReader<R>, FrameWriter<W>) {
        (self.reader, self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComputeBatch, ComputeLambda, ComputeLogEntry};
    use tokio::io::{duplex, split, BufReader, DuplexStream, ReadHalf, WriteHalf};

    type DuplexChannel = ComputeChannel<BufReader<ReadHalf<DuplexStream>>, WriteHalf<DuplexStream>>;

    fn pair(max_frame_bytes: usize) -> (DuplexChannel, DuplexChannel) {
        let (left, right) = duplex(64 * 1024);
        let (left_read, left_write) = split(left);
        let (right_read, right_write) = split(right);
        (
            ComputeChannel::new(BufReader::new(left_read), left_write, max_frame_bytes),
            ComputeChannel::new(BufReader::new(right_read), right_write, max_frame_bytes),
        )
    }

    #[tokio::test]
    async fn test_messages_arrive_in_order_with_increasing_ids() {
        let (mut service, mut client) = pair(1024);

        let messages = vec![
            ComputeMessage::ServiceLambda(ComputeLambda::new(1, "lcm:register(function (b) return b end)")),
            ComputeMessage::ServiceBatch(ComputeBatch::new(1, 2, vec![0u8, 1, 2, 255])),
            ComputeMessage::ServiceImAlive,
            ComputeMessage::ServiceExit,
        ];
        for message in messages.clone() {
            service.send(message).await.unwrap();
        }

        for (i, expected) in messages.into_iter().enumerate() {
            let frame = client.recv().await.unwrap().unwrap();
            assert_eq!(frame.id, i as u64 + 1);
            assert_eq!(frame.ver, PROTOCOL_VERSION);
            assert_eq!(frame.message, expected);
        }
    }

    #[tokio::test]
    async fn test_bad_lines_are_reported_and_skipped() {
        let (left, right) = duplex(64 * 1024);
        let mut reader = FrameReader::new(BufReader::new(left), 128);
        let mut raw = right;

        let entry = ComputeMessage::ClientLogEntry(ComputeLogEntry::new(1, 1, "ok"));
        let good = serde_json::to_string(&Frame { ver: 1, id: 5, message: entry.clone() }).unwrap();
        let input = format!(
            "not json\n{{\"ver\":2,\"id\":1,\"typ\":\"client_exit\"}}\n{}\n\n{}\n",
            "x".repeat(300),
            good,
        );
        raw.write_all(input.as_bytes()).await.unwrap();
        drop(raw);

        assert!(matches!(reader.next_frame().await, Some(Err(TransportError::Decode(_)))));
        assert!(matches!(
            reader.next_frame().await,
            Some(Err(TransportError::UnsupportedVersion { found: 2, expected: 1 }))
        ));
        assert!(matches!(
            reader.next_frame().await,
            Some(Err(TransportError::FrameTooLong { max: 128 }))
        ));
        let frame = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.message, entry);
        assert!(reader.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn test_error_code_zero_is_rejected() {
        let (left, mut right) = duplex(1024);
        let mut reader = FrameReader::new(BufReader::new(left), 1024);
        right
            .write_all(b"{\"ver\":1,\"id\":1,\"typ\":\"client_error\",\"cod\":0,\"msg\":\"fine\"}\n")
            .await
            .unwrap();
        drop(right);

        assert!(matches!(reader.next_frame().await, Some(Err(TransportError::Decode(_)))));
        assert!(reader.next_frame().await.is_none());
    }
}
