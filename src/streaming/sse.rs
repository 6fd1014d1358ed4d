//! Server-sent-event decoding.
//!
//! Streaming calls return `data: <json>` lines separated by a blank line. Network
//! chunks do not respect those boundaries (or UTF-8 character boundaries), so the
//! [`SseDecoder`] buffers text and only yields a frame once its terminator has
//! arrived.

use bytes::Bytes;
use futures::stream::Stream;
use serde_json::Value;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::{GenAiError, GenAiResult, ProtocolError};
use crate::transport::ChunkedStream;

const DATA_PREFIX: &str = "data: ";
const TERMINATORS: [&str; 3] = ["\n\n", "\r\r", "\r\n\r\n"];

/// Incremental decoder for `data:` frames.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Decoded text not yet consumed by a frame.
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
}

impl SseDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw bytes. A multi-byte character split across calls is held back
    /// until its remaining bytes arrive.
    pub fn push(&mut self, bytes: &[u8]) -> GenAiResult<()> {
        self.pending.extend_from_slice(bytes);
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                self.buffer.push_str(text);
                self.pending.clear();
                return Ok(());
            }
            Err(e) if e.error_len().is_some() => {
                return Err(ProtocolError::InvalidEncoding { message: e.to_string() }.into());
            }
            Err(e) => e.valid_up_to(),
        };

        let text = std::str::from_utf8(&self.pending[..valid])
            .map_err(|e| ProtocolError::InvalidEncoding { message: e.to_string() })?;
        self.buffer.push_str(text);
        self.pending.drain(..valid);
        Ok(())
    }

    /// Extracts the next complete frame, if one is buffered.
    ///
    /// A frame whose payload is not valid JSON is an error; the stream it came from
    /// cannot be trusted past that point.
    pub fn next_frame(&mut self) -> Option<GenAiResult<Value>> {
        let (payload_end, consumed) = match_frame(&self.buffer)?;
        let payload = self.buffer[DATA_PREFIX.len()..payload_end].to_string();
        self.buffer.drain(..consumed);

        Some(serde_json::from_str(&payload).map_err(|e| {
            GenAiError::from(ProtocolError::MalformedChunk {
                payload,
                message: e.to_string(),
            })
        }))
    }

    /// Appends bytes and drains every complete frame.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<GenAiResult<Value>> {
        if let Err(e) = self.push(bytes) {
            return vec![Err(e)];
        }
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame() {
            let failed = frame.is_err();
            frames.push(frame);
            if failed {
                break;
            }
        }
        frames
    }

    /// Checks the leftover buffer at end of stream. Anything but whitespace means a
    /// frame was cut off.
    pub fn finish(&mut self) -> GenAiResult<()> {
        if !self.pending.is_empty() || !self.buffer.trim().is_empty() {
            let mut remainder = std::mem::take(&mut self.buffer);
            remainder.push_str(&String::from_utf8_lossy(&std::mem::take(&mut self.pending)));
            return Err(ProtocolError::IncompleteStream { remainder }.into());
        }
        self.buffer.clear();
        Ok(())
    }
}

/// Matches `data: <payload>` followed by a blank-line terminator at the start of the
/// buffer. Returns the end of the payload and the number of bytes to consume.
fn match_frame(buffer: &str) -> Option<(usize, usize)> {
    let rest = buffer.strip_prefix(DATA_PREFIX)?;
    let line_end = rest.find(['\n', '\r'])?;
    let terminator = TERMINATORS
        .iter()
        .find(|t| rest[line_end..].starts_with(*t))?;

    let payload_end = DATA_PREFIX.len() + line_end;
    Some((payload_end, payload_end + terminator.len()))
}

/// Lazy, single-pass sequence of frames decoded from a response body.
///
/// The body reader is dropped as soon as the sequence ends, fails, or is itself
/// dropped before completion.
pub struct SseFrameStream {
    reader: Option<ChunkedStream>,
    decoder: SseDecoder,
    done: bool,
}

impl SseFrameStream {
    /// Wraps a response body.
    pub fn new(body: ChunkedStream) -> Self {
        Self {
            reader: Some(body),
            decoder: SseDecoder::new(),
            done: false,
        }
    }

    /// True once the body reader has been released.
    pub fn is_released(&self) -> bool {
        self.reader.is_none()
    }

    fn release(&mut self) {
        if self.reader.take().is_some() {
            tracing::trace!(completed = self.done, "SSE reader released");
        }
    }

    fn fail(&mut self) {
        self.done = true;
        self.release();
    }
}

impl Stream for SseFrameStream {
    type Item = GenAiResult<Value>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            if this.done {
                return Poll::Ready(None);
            }

            if let Some(frame) = this.decoder.next_frame() {
                if frame.is_err() {
                    this.fail();
                }
                return Poll::Ready(Some(frame));
            }

            let Some(reader) = this.reader.as_mut() else {
                this.done = true;
                return Poll::Ready(None);
            };

            match reader.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    if let Err(e) = this.decoder.push(&bytes) {
                        this.fail();
                        return Poll::Ready(Some(Err(e)));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    this.fail();
                    return Poll::Ready(Some(Err(e.into())));
                }
                Poll::Ready(None) => {
                    this.done = true;
                    this.release();
                    return Poll::Ready(this.decoder.finish().err().map(Err));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for SseFrameStream {
    fn drop(&mut self) {
        if !self.done && self.reader.is_some() {
            tracing::debug!("SSE stream abandoned before completion");
        }
        self.release();
    }
}

/// Turns a fixed list of byte chunks into a body stream.
pub fn body_from_chunks(chunks: Vec<Bytes>) -> ChunkedStream {
    Box::pin(futures::stream::iter(chunks.into_iter().map(Ok)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_decoder_single_push() {
        let mut decoder = SseDecoder::new();
        let frames: Vec<Value> = decoder
            .feed(b"data: {\"a\":1}\n\ndata: {\"b\":2}\r\n\r\n")
            .into_iter()
            .map(Result::unwrap)
            .collect();

        assert_eq!(frames, vec![json!({"a": 1}), json!({"b": 2})]);
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn test_decoder_carriage_return_terminator() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"data: [1]\r\r");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap(), &json!([1]));
    }

    #[test]
    fn test_decoder_waits_for_terminator() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"a\":1}\n").is_empty());
        assert_eq!(decoder.feed(b"\n").len(), 1);

        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"a\":1}\r\n\r").is_empty());
        assert_eq!(decoder.feed(b"\n").len(), 1);
    }

    #[test]
    fn test_decoder_multibyte_split() {
        let bytes = "data: {\"t\":\"héllo\"}\n\n".as_bytes();
        let split = bytes.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(&bytes[..split]).is_empty());
        let frames = decoder.feed(&bytes[split..]);

        assert_eq!(frames[0].as_ref().unwrap(), &json!({"t": "héllo"}));
    }

    #[test]
    fn test_decoder_malformed_payload() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"data: {oops}\n\n");
        assert!(matches!(
            frames[0],
            Err(GenAiError::Protocol(ProtocolError::MalformedChunk { .. }))
        ));
    }

    #[test]
    fn test_decoder_incomplete_at_end() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b"data: {\"a\":1}\n\ndata: {incomplete");
        assert!(matches!(
            decoder.finish(),
            Err(GenAiError::Protocol(ProtocolError::IncompleteStream { .. }))
        ));
    }

    #[test]
    fn test_decoder_whitespace_remainder_is_fine() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b"data: {}\n\n\r\n");
        assert!(decoder.finish().is_ok());
    }

    #[tokio::test]
    async fn test_stream_releases_reader_on_completion() {
        let mut stream = SseFrameStream::new(body_from_chunks(vec![
            Bytes::from_static(b"data: {\"a\":"),
            Bytes::from_static(b"1}\n\n"),
        ]));

        assert_eq!(stream.next().await.unwrap().unwrap(), json!({"a": 1}));
        assert!(stream.next().await.is_none());
        assert!(stream.is_released());
    }
}
