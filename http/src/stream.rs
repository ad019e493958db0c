//! Line-delimited streamed response decoding.
//!
//! The marketplace streams newline-delimited records, optionally in
//! server-sent-event style with a `data:` prefix. Chunks from the transport
//! are buffered at the byte level, so multi-byte characters split across
//! chunk boundaries survive, and only complete lines are classified. Any
//! fragmentation of the same bytes therefore yields the same events.
//!
//! A final fragment without a terminating newline is never emitted.

use crate::error::ApiError;
use artisan_studio_core::StreamEvent;
use async_stream::stream;
use futures::stream::{Stream, StreamExt};
use std::fmt::Display;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// Decoded event sequence.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ApiError>> + Send>>;

/// Prefix of server-sent-event data lines.
pub const DATA_PREFIX: &str = "data:";

/// Carry-over buffer splitting a byte stream into lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed, without the `\n`.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let Some(last_newline) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        let complete: Vec<u8> = self.pending.drain(..=last_newline).collect();
        let body = complete.strip_suffix(b"\n").unwrap_or(complete.as_slice());
        body.split(|b| *b == b'\n')
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    /// Bytes waiting for a newline.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop the unterminated fragment, returning how many bytes it held.
    pub fn discard(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}

/// Classify one raw line.
///
/// Returns `None` for blank lines and for a `data:` prefix with nothing
/// after it. The prefix is stripped before classification.
///
/// # Examples
///
/// ```
/// use artisan_studio_core::StreamEvent;
/// use artisan_studio_http::stream::classify_line;
///
/// assert_eq!(
///     classify_line(r#"data: {"delta":"Hel"}"#),
///     Some(StreamEvent::Delta("Hel".into()))
/// );
/// assert_eq!(classify_line("   "), None);
/// ```
#[must_use]
pub fn classify_line(raw: &str) -> Option<StreamEvent> {
    let line = raw.trim();
    if line.is_empty() {
        return None;
    }
    let payload = line.strip_prefix(DATA_PREFIX).map_or(line, str::trim);
    if payload.is_empty() {
        return None;
    }
    Some(StreamEvent::from_payload(payload))
}

/// Decode a chunked byte source into stream events.
///
/// The returned stream is lazy and finite. A transport error yields a
/// single [`ApiError::Stream`] and ends the stream. When `cancel` fires the
/// stream ends without further items and the source is dropped.
pub fn decode<S, B, E>(source: S, cancel: Option<CancellationToken>) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(stream! {
        let mut source = Box::pin(source);
        let mut buffer = LineBuffer::new();

        loop {
            let Some(next) = next_chunk(&mut source, cancel.as_ref()).await else {
                tracing::debug!("stream cancelled");
                return;
            };

            match next {
                Some(Ok(chunk)) => {
                    for line in buffer.push(chunk.as_ref()) {
                        if let Some(event) = classify_line(&line) {
                            yield Ok(event);
                        }
                    }
                }
                Some(Err(e)) => {
                    yield Err(ApiError::Stream(e.to_string()));
                    return;
                }
                None => break,
            }
        }

        let dropped = buffer.discard();
        if dropped > 0 {
            tracing::debug!(bytes = dropped, "discarding unterminated trailing line");
        }
    })
}

/// Next item of `source`, or `None` if `cancel` fired first.
async fn next_chunk<S>(
    source: &mut Pin<Box<S>>,
    cancel: Option<&CancellationToken>,
) -> Option<Option<S::Item>>
where
    S: Stream + ?Sized,
{
    match cancel {
        Some(token) => {
            if token.is_cancelled() {
                return None;
            }
            tokio::select! {
                biased;
                () = token.cancelled() => None,
                item = source.next() => Some(item),
            }
        }
        None => Some(source.next().await),
    }
}
