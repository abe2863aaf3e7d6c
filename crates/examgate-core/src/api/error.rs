use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Unauthorized - session has been cleared")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request rejected with status {status}: {body}")]
    Validation { status: u16, body: String },

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Coarse classification used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// No response reached the client
    Transport,
    /// The session was rejected and has been cleared
    Authorization,
    /// The request itself was refused (4xx other than 401)
    Client,
    /// The server failed; retry later
    Server,
    /// A response arrived but could not be read
    Unparsable,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Body text kept on the error. An oversized body is reduced to the
    /// message it carries, and cut at the length limit when it carries none.
    fn body_text(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        match extract_message(body) {
            Some(message) => json!({ "message": message }).to_string(),
            None => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let text = Self::body_text(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(text),
            403 => ApiError::AccessDenied(text),
            404 => ApiError::NotFound(text),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(text),
            code @ 400..=499 => ApiError::Validation {
                status: code,
                body: text,
            },
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, text)),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// HTTP status behind this error, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NetworkError(e) => e.status().map(|s| s.as_u16()),
            ApiError::Unauthorized(_) => Some(401),
            ApiError::AccessDenied(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Validation { status, .. } => Some(*status),
            ApiError::RateLimited => Some(429),
            ApiError::ServerError(_) | ApiError::InvalidResponse(_) => None,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ApiError::NetworkError(_) => ErrorClass::Transport,
            ApiError::Unauthorized(_) => ErrorClass::Authorization,
            ApiError::AccessDenied(_)
            | ApiError::NotFound(_)
            | ApiError::Validation { .. }
            | ApiError::RateLimited => ErrorClass::Client,
            ApiError::ServerError(_) => ErrorClass::Server,
            ApiError::InvalidResponse(_) => ErrorClass::Unparsable,
        }
    }

    /// Human-readable message for display.
    ///
    /// Prefers a message carried in the response body and falls back to a
    /// generic message for the status.
    pub fn user_message(&self) -> String {
        let body = match self {
            ApiError::Unauthorized(body)
            | ApiError::AccessDenied(body)
            | ApiError::NotFound(body)
            | ApiError::Validation { body, .. } => Some(body.as_str()),
            _ => None,
        };
        body.and_then(extract_message)
            .unwrap_or_else(|| self.generic_message().to_string())
    }

    fn generic_message(&self) -> &'static str {
        match self {
            ApiError::NetworkError(_) => {
                "Could not connect to the server. Check your internet connection or the server status."
            }
            ApiError::InvalidResponse(_) => {
                "Could not read the server response. Please try again later."
            }
            ApiError::ServerError(_) => "Server error. Please try again later.",
            ApiError::RateLimited => "Too many requests. Please wait before retrying.",
            ApiError::Unauthorized(_) => {
                "Not authorized. The phone number or password may be incorrect."
            }
            ApiError::AccessDenied(_) => "Access denied. You do not have sufficient permissions.",
            ApiError::NotFound(_) => "The requested address was not found. Please try again later.",
            ApiError::Validation { status: 400, .. } => {
                "The submitted data is invalid. Please check it and try again."
            }
            ApiError::Validation { status: 409, .. } => {
                "Data conflict. The phone number may already be registered."
            }
            ApiError::Validation { status: 422, .. } => {
                "Validation failed. Please review the submitted data."
            }
            ApiError::Validation { .. } => "An unknown error occurred.",
        }
    }
}

/// Pull a displayable message out of a JSON error body.
///
/// Recognized shapes: a bare string, `message`, `error`, `detail`, and
/// `errors` as a list of strings or a map of field to list of strings.
pub fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = match &value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => ["message", "error", "detail"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str).filter(|s| !s.is_empty()))
            .or_else(|| match map.get("errors") {
                Some(Value::Array(items)) => items.first().and_then(Value::as_str),
                Some(Value::Object(fields)) => fields.values().next().and_then(|field| match field {
                    Value::Array(items) => items.first().and_then(Value::as_str),
                    other => other.as_str(),
                }),
                _ => None,
            }),
        _ => None,
    };
    message.filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "").is_unauthorized());
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "no"),
            ApiError::AccessDenied(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::CONFLICT, "{}"),
            ApiError::Validation { status: 409, .. }
        ));
        assert_eq!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "").class(),
            ErrorClass::Server
        );
    }

    #[test]
    fn test_truncate_body() {
        let long = "é".repeat(400);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated, 800 total bytes"));
        assert_eq!(ApiError::truncate_body("short"), "short");
    }

    #[test]
    fn test_extract_message_shapes() {
        assert_eq!(extract_message(r#""plain""#).as_deref(), Some("plain"));
        assert_eq!(extract_message(r#"{"message":"m"}"#).as_deref(), Some("m"));
        assert_eq!(extract_message(r#"{"error":"e"}"#).as_deref(), Some("e"));
        assert_eq!(extract_message(r#"{"detail":"d"}"#).as_deref(), Some("d"));
        assert_eq!(extract_message(r#"{"errors":["first","second"]}"#).as_deref(), Some("first"));
        assert_eq!(
            extract_message(r#"{"errors":{"phoneNumber":["taken"]}}"#).as_deref(),
            Some("taken")
        );
        assert_eq!(extract_message(r#"{"message":"","error":"e"}"#).as_deref(), Some("e"));
        assert_eq!(extract_message("<html>bad gateway</html>"), None);
        assert_eq!(extract_message(r#"{"status":500}"#), None);
    }

    #[test]
    fn test_user_message_prefers_body() {
        let error = ApiError::from_status(StatusCode::CONFLICT, r#"{"message":"Phone already registered"}"#);
        assert_eq!(error.user_message(), "Phone already registered");
    }

    #[test]
    fn test_user_message_survives_long_body() {
        let body = format!(
            r#"{{"message":"Phone already registered","trace":"{}"}}"#,
            "x".repeat(600)
        );
        let error = ApiError::from_status(StatusCode::CONFLICT, &body);
        assert_eq!(error.user_message(), "Phone already registered");
        assert!(!error.to_string().contains("xxxx"));

        let html = format!("<html>{}</html>", "x".repeat(600));
        let error = ApiError::from_status(StatusCode::NOT_FOUND, &html);
        assert!(error.to_string().contains("truncated"));
        assert!(error.user_message().contains("not found"));
    }

    #[test]
    fn test_user_message_falls_back_to_status() {
        let conflict = ApiError::from_status(StatusCode::CONFLICT, "");
        assert!(conflict.user_message().contains("already be registered"));

        let server = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, r#"{"message":"boom"}"#);
        assert_eq!(server.user_message(), "Server error. Please try again later.");

        let teapot = ApiError::from_status(StatusCode::IM_A_TEAPOT, "");
        assert_eq!(teapot.user_message(), "An unknown error occurred.");
    }
}
