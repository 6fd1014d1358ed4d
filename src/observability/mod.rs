//! Observability for the transport core.
//!
//! Spans and structured events go through `tracing`; the [`Logger`] seam carries
//! redacted operational messages and can be swapped out in tests.
//!
//! ```rust
//! use integrations_genai::observability::{Logger, StructuredLogger};
//! use integrations_genai::config::LogLevel;
//! use serde_json::json;
//!
//! let logger = StructuredLogger::new("genai.transport").with_level(LogLevel::Debug);
//!
//! logger.info("Request sent", json!({ "path": "models/gemini-pro:generateContent" }));
//! ```

pub mod logging;

pub use logging::{redact_sensitive_fields, DefaultLogger, Logger, StructuredLogger};
