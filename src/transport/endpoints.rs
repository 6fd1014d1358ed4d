//! Endpoint paths.
//!
//! Paths are relative to the versioned base URL and take names that have already
//! been normalized by the active dialect.

/// Collection path for uploaded files.
pub const FILES: &str = "files";

/// Collection path for cached contents.
pub const CACHED_CONTENTS: &str = "cachedContents";

/// Resumable upload negotiation path. Sent with an empty API version.
pub const UPLOAD_FILES: &str = "upload/v1beta/files";

/// Constructs the generateContent path for a normalized model name.
///
/// # Example
///
/// ```
/// use integrations_genai::transport::endpoints;
///
/// let path = endpoints::generate_content("models/gemini-2.0-flash");
/// assert_eq!(path, "models/gemini-2.0-flash:generateContent");
/// ```
pub fn generate_content(model: &str) -> String {
    format!("{model}:generateContent")
}

/// Constructs the streaming path, with the event-stream format selected.
///
/// # Example
///
/// ```
/// use integrations_genai::transport::endpoints;
///
/// let path = endpoints::stream_generate_content("models/gemini-2.0-flash");
/// assert_eq!(path, "models/gemini-2.0-flash:streamGenerateContent?alt=sse");
/// ```
pub fn stream_generate_content(model: &str) -> String {
    format!("{model}:streamGenerateContent?alt=sse")
}

/// Constructs the countTokens path.
pub fn count_tokens(model: &str) -> String {
    format!("{model}:countTokens")
}

/// Constructs the path of a single file from a name with or without the
/// `files/` prefix.
///
/// # Example
///
/// ```
/// use integrations_genai::transport::endpoints;
///
/// assert_eq!(endpoints::file("files/abc"), "files/abc");
/// assert_eq!(endpoints::file("abc"), "files/abc");
/// ```
pub fn file(name: &str) -> String {
    format!("{FILES}/{}", file_id(name))
}

/// Strips the `files/` prefix from a file name.
pub fn file_id(name: &str) -> &str {
    name.strip_prefix("files/").unwrap_or(name)
}
