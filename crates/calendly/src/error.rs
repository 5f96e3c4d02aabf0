//! Error types for calendly

use std::fmt;

use reqwest::StatusCode;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Parsed response body attached to API errors.
///
/// JSON when the server sent a decodable JSON document, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(JsonValue),
    Text(String),
}

impl ResponseBody {
    /// Parse a raw body, honouring the response content-type.
    pub fn parse(content_type: Option<&str>, raw: &str) -> Self {
        let is_json = content_type
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);

        if is_json {
            if let Ok(value) = serde_json::from_str(raw) {
                return Self::Json(value);
            }
        }

        Self::Text(raw.to_string())
    }

    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Json(_) => false,
            Self::Text(text) => text.is_empty(),
        }
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => write!(f, "{}", value),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// calendly error type
#[derive(Error, Debug)]
pub enum CalendlyError {
    /// 400 Bad Request
    #[error("Wrong format input: {0}")]
    WrongFormatInput(ResponseBody),

    /// 401 Unauthorized
    #[error("Unauthorized: {0}")]
    Unauthorized(ResponseBody),

    /// 406 Not Acceptable
    #[error("Contacts limit exceeded: {0}")]
    ContactsLimitExceeded(ResponseBody),

    #[error("Calendly server error: {status} - {body}")]
    Server { status: StatusCode, body: ResponseBody },

    #[error("Unexpected response status: {status} - {body}")]
    UnexpectedStatus { status: StatusCode, body: ResponseBody },

    #[error("Failed to decode response: {message}")]
    Decode { message: String, body: ResponseBody },

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid path segment: {0:?}")]
    InvalidPathSegment(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CalendlyError {
    /// Map a non-success status to its error kind.
    pub fn from_status(status: StatusCode, body: ResponseBody) -> Self {
        match status.as_u16() {
            400 => Self::WrongFormatInput(body),
            401 => Self::Unauthorized(body),
            406 => Self::ContactsLimitExceeded(body),
            _ if status.is_server_error() => Self::Server { status, body },
            _ => Self::UnexpectedStatus { status, body },
        }
    }

    /// HTTP status that produced this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::WrongFormatInput(_) => Some(StatusCode::BAD_REQUEST),
            Self::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            Self::ContactsLimitExceeded(_) => Some(StatusCode::NOT_ACCEPTABLE),
            Self::Server { status, .. } | Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Response body carried by this error, if any.
    pub fn body(&self) -> Option<&ResponseBody> {
        match self {
            Self::WrongFormatInput(body)
            | Self::Unauthorized(body)
            | Self::ContactsLimitExceeded(body)
            | Self::Server { body, .. }
            | Self::UnexpectedStatus { body, .. }
            | Self::Decode { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CalendlyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json_body() {
        let body = ResponseBody::parse(Some("application/json; charset=utf-8"), r#"{"x":1}"#);
        assert_eq!(body, ResponseBody::Json(json!({"x": 1})));
        assert_eq!(body.as_json().unwrap()["x"], 1);
    }

    #[test]
    fn test_parse_invalid_json_falls_back_to_text() {
        let body = ResponseBody::parse(Some("application/json"), "not json");
        assert_eq!(body, ResponseBody::Text("not json".to_string()));
        assert!(body.as_json().is_none());
    }

    #[test]
    fn test_parse_non_json_content_type() {
        let body = ResponseBody::parse(Some("text/html"), r#"{"x":1}"#);
        assert_eq!(body, ResponseBody::Text(r#"{"x":1}"#.to_string()));

        let body = ResponseBody::parse(None, "");
        assert!(body.is_empty());
    }

    #[test]
    fn test_from_status_named_kinds() {
        let body = ResponseBody::Json(json!({"error": "bad"}));

        let err = CalendlyError::from_status(StatusCode::BAD_REQUEST, body.clone());
        assert!(matches!(err, CalendlyError::WrongFormatInput(ref b) if *b == body));

        let err = CalendlyError::from_status(StatusCode::UNAUTHORIZED, body.clone());
        assert!(matches!(err, CalendlyError::Unauthorized(_)));

        let err = CalendlyError::from_status(StatusCode::NOT_ACCEPTABLE, body.clone());
        assert!(matches!(err, CalendlyError::ContactsLimitExceeded(_)));
    }

    #[test]
    fn test_from_status_server_and_unexpected() {
        let body = ResponseBody::Text("boom".to_string());

        let err = CalendlyError::from_status(StatusCode::INTERNAL_SERVER_ERROR, body.clone());
        assert!(matches!(err, CalendlyError::Server { .. }));
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.body(), Some(&body));

        let err = CalendlyError::from_status(StatusCode::NOT_FOUND, body.clone());
        assert!(matches!(err, CalendlyError::UnexpectedStatus { .. }));
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_error_display_includes_body() {
        let err = CalendlyError::WrongFormatInput(ResponseBody::Json(json!({"error": "bad"})));
        assert_eq!(err.to_string(), r#"Wrong format input: {"error":"bad"}"#);
    }
}
