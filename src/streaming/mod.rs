//! Streaming response decoding.
//!
//! Streaming calls are issued with `alt=sse` and answered with server-sent events,
//! one JSON document per `data:` line:
//! ```text
//! data: {"candidates":[...]}
//!
//! data: {"candidates":[...],"usageMetadata":{...}}
//!
//! ```
//!
//! [`SseFrameStream`] turns the response body into a stream of JSON frames and
//! guarantees the body reader is released on every exit path.
//!
//! ## Example
//!
//! ```rust,no_run
//! use integrations_genai::streaming::SseFrameStream;
//! use integrations_genai::transport::ChunkedStream;
//! use futures::StreamExt;
//!
//! async fn process_stream(body: ChunkedStream) {
//!     let mut frames = SseFrameStream::new(body);
//!     while let Some(frame) = frames.next().await {
//!         match frame {
//!             Ok(json) => tracing::info!(%json, "frame"),
//!             Err(e) => tracing::error!(error = %e, "stream failed"),
//!         }
//!     }
//! }
//! ```

mod sse;

pub use sse::{body_from_chunks, SseDecoder, SseFrameStream};
