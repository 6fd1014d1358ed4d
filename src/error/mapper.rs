//! Classification of non-success HTTP responses.

use serde::Deserialize;
use serde_json::{json, Value};
use super::categories::*;
use super::types::GenAiError;

/// Structured API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Detailed error information from the API.
#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Canonical reason phrase for an HTTP status code.
pub fn status_text(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
        .to_string()
}

/// Maps a non-2xx response to a client (4xx) or server (5xx) error.
///
/// A JSON body is kept verbatim when the response declares a JSON content type; any
/// other body is replaced with a synthesized `{"error": {...}}` object so that callers
/// always see the same shape.
pub fn map_http_status_with_body(
    status: u16,
    content_type: Option<&str>,
    body: &[u8],
) -> GenAiError {
    let status_text = status_text(status);
    let is_json = content_type
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .map_or(false, |m| m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON));

    let error_body = is_json
        .then(|| serde_json::from_slice::<Value>(body).ok())
        .flatten()
        .unwrap_or_else(|| {
            json!({
                "error": {
                    "message": "exception parsing response",
                    "code": status,
                    "status": status_text,
                }
            })
        });

    let body_text = error_body.to_string();
    let error_status = serde_json::from_value::<ApiErrorResponse>(error_body)
        .ok()
        .and_then(|r| r.error.status);

    let error = ApiError {
        status,
        message: format!("got status: {status} {status_text}. {body_text}"),
        status_text,
        body: body_text,
        error_status,
    };

    match status {
        400..=499 => GenAiError::Client(error),
        500..=599 => GenAiError::Server(error),
        _ => GenAiError::Response(ResponseError::UnexpectedStatus {
            status,
            message: error.message,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_4xx_json_body_is_client_error() {
        let body = r#"{"error":{"code":400,"message":"Invalid parameter","status":"INVALID_ARGUMENT"}}"#;
        let error = map_http_status_with_body(400, Some("application/json; charset=UTF-8"), body.as_bytes());

        match error {
            GenAiError::Client(e) => {
                assert_eq!(e.status, 400);
                assert_eq!(e.status_text, "Bad Request");
                assert_eq!(e.error_status.as_deref(), Some("INVALID_ARGUMENT"));
                assert!(e.message.starts_with("got status: 400 Bad Request. {"));
                assert!(e.body.contains("Invalid parameter"));
            }
            other => panic!("Expected client error, got {other:?}"),
        }
    }

    #[test]
    fn test_5xx_is_server_error() {
        let body = r#"{"error":{"code":503,"message":"overloaded","status":"UNAVAILABLE"}}"#;
        let error = map_http_status_with_body(503, Some("application/json"), body.as_bytes());
        assert!(matches!(error, GenAiError::Server(ref e) if e.status == 503));
    }

    #[test]
    fn test_non_json_body_is_synthesized() {
        let error = map_http_status_with_body(502, Some("text/html"), b"<html>bad gateway</html>");

        let GenAiError::Server(e) = error else {
            panic!("Expected server error");
        };
        let body: Value = serde_json::from_str(&e.body).unwrap();
        assert_eq!(body["error"]["message"], "exception parsing response");
        assert_eq!(body["error"]["code"], 502);
        assert_eq!(body["error"]["status"], "Bad Gateway");
    }

    #[test]
    fn test_unparseable_json_falls_back() {
        let error = map_http_status_with_body(404, Some("application/json"), b"not json");
        let GenAiError::Client(e) = error else {
            panic!("Expected client error");
        };
        assert!(e.body.contains("exception parsing response"));
    }

    #[test]
    fn test_other_status_is_unexpected() {
        let error = map_http_status_with_body(302, None, b"");
        assert!(matches!(
            error,
            GenAiError::Response(ResponseError::UnexpectedStatus { status: 302, .. })
        ));
    }
}
