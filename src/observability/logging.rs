//! Structured logging for transport events.
//!
//! Fields are passed as JSON and credential-bearing keys are masked before they
//! reach any sink.

use serde_json::Value;

use crate::config::LogLevel;

const REDACTED: &str = "***REDACTED***";

const SENSITIVE_KEYS: &[&str] = &[
    "api_key",
    "apiKey",
    "key",
    "x-goog-api-key",
    "token",
    "access_token",
    "accessToken",
    "secret",
    "password",
    "credential",
    "authorization",
    "Authorization",
];

/// Logger trait for structured logging.
///
/// Implementations can forward to `tracing`, a test sink, or nothing at all.
pub trait Logger: Send + Sync {
    /// Log a debug message with structured context.
    fn debug(&self, message: &str, fields: Value);

    /// Log an info message with structured context.
    fn info(&self, message: &str, fields: Value);

    /// Log a warning message with structured context.
    fn warn(&self, message: &str, fields: Value);

    /// Log an error message with structured context.
    fn error(&self, message: &str, fields: Value);
}

/// Masks credential-bearing keys at any depth, including inside arrays.
pub fn redact_sensitive_fields(fields: Value) -> Value {
    match fields {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    if SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(&key)) {
                        (key, Value::String(REDACTED.to_string()))
                    } else {
                        (key, redact_sensitive_fields(value))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact_sensitive_fields).collect()),
        other => other,
    }
}

/// Logger that emits `tracing` events.
///
/// `tracing` targets must be static, so the logger name travels as a field.
pub struct StructuredLogger {
    name: String,
    level: LogLevel,
}

impl StructuredLogger {
    /// Create a new structured logger with the given name.
    ///
    /// ```
    /// use integrations_genai::observability::StructuredLogger;
    ///
    /// let logger = StructuredLogger::new("genai.transport");
    /// ```
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            level: LogLevel::Info,
        }
    }

    /// Set the minimum log level for this logger.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Logger name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn should_log(&self, level: LogLevel) -> bool {
        self.level.admits(level)
    }
}

impl Logger for StructuredLogger {
    fn debug(&self, message: &str, fields: Value) {
        if !self.should_log(LogLevel::Debug) {
            return;
        }
        let fields = redact_sensitive_fields(fields);
        tracing::debug!(logger = %self.name, fields = %fields, "{}", message);
    }

    fn info(&self, message: &str, fields: Value) {
        if !self.should_log(LogLevel::Info) {
            return;
        }
        let fields = redact_sensitive_fields(fields);
        tracing::info!(logger = %self.name, fields = %fields, "{}", message);
    }

    fn warn(&self, message: &str, fields: Value) {
        if !self.should_log(LogLevel::Warn) {
            return;
        }
        let fields = redact_sensitive_fields(fields);
        tracing::warn!(logger = %self.name, fields = %fields, "{}", message);
    }

    fn error(&self, message: &str, fields: Value) {
        if !self.should_log(LogLevel::Error) {
            return;
        }
        let fields = redact_sensitive_fields(fields);
        tracing::error!(logger = %self.name, fields = %fields, "{}", message);
    }
}

/// Logger that writes to stderr. Suitable for development and tests.
pub struct DefaultLogger {
    prefix: String,
    level: LogLevel,
}

impl DefaultLogger {
    /// Creates a new default logger.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            level: LogLevel::Warn,
        }
    }

    /// Set the minimum log level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    fn emit(&self, level: LogLevel, label: &str, message: &str, fields: Value) {
        if self.level.admits(level) {
            eprintln!("[{}] {}: {} {}", self.prefix, label, message, redact_sensitive_fields(fields));
        }
    }
}

impl Logger for DefaultLogger {
    fn debug(&self, message: &str, fields: Value) {
        self.emit(LogLevel::Debug, "DEBUG", message, fields);
    }

    fn info(&self, message: &str, fields: Value) {
        self.emit(LogLevel::Info, "INFO", message, fields);
    }

    fn warn(&self, message: &str, fields: Value) {
        self.emit(LogLevel::Warn, "WARN", message, fields);
    }

    fn error(&self, message: &str, fields: Value) {
        self.emit(LogLevel::Error, "ERROR", message, fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_logger_with_level() {
        let logger = StructuredLogger::new("test").with_level(LogLevel::Debug);
        assert_eq!(logger.name(), "test");
        assert!(logger.should_log(LogLevel::Debug));
        assert!(!logger.should_log(LogLevel::Trace));
    }

    #[test]
    fn test_should_log() {
        let logger = StructuredLogger::new("test").with_level(LogLevel::Info);
        assert!(logger.should_log(LogLevel::Error));
        assert!(logger.should_log(LogLevel::Warn));
        assert!(logger.should_log(LogLevel::Info));
        assert!(!logger.should_log(LogLevel::Debug));
    }

    #[test]
    fn test_redact_sensitive_fields() {
        let redacted = redact_sensitive_fields(json!({
            "x-goog-api-key": "secret-key-123",
            "model": "gemini-pro",
        }));

        assert_eq!(redacted["x-goog-api-key"], REDACTED);
        assert_eq!(redacted["model"], "gemini-pro");
    }

    #[test]
    fn test_redact_nested_and_array_fields() {
        let redacted = redact_sensitive_fields(json!({
            "request": { "Authorization": "Bearer token-123", "path": "models" },
            "attempts": [{ "token": "abc" }, { "status": 503 }],
        }));

        assert_eq!(redacted["request"]["Authorization"], REDACTED);
        assert_eq!(redacted["request"]["path"], "models");
        assert_eq!(redacted["attempts"][0]["token"], REDACTED);
        assert_eq!(redacted["attempts"][1]["status"], 503);
    }

    #[test]
    fn test_default_logger_level_filtering() {
        let logger = DefaultLogger::new("test").with_level(LogLevel::Warn);
        assert!(logger.level.admits(LogLevel::Error));
        assert!(logger.level.admits(LogLevel::Warn));
        assert!(!logger.level.admits(LogLevel::Info));
        logger.info("suppressed", json!({}));
    }
}
