//! API error taxonomy.
//!
//! Client-side validation failures live next to the state machines that
//! produce them; this module only covers failures of an issued request.

use std::error::Error;
use std::fmt;

use serde_json::Value;

/// Categories of request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Connection refused, DNS failure, timeout, broken body stream.
    Transport,
    /// Non-2xx response from the server.
    Status,
    /// 2xx response whose body did not match the expected shape.
    Parse,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::Status => write!(f, "http_status"),
            ApiErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured failure of a request.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// HTTP status for `Status` errors.
    pub status: Option<u16>,
    /// Server-supplied `detail` message, shown to the user verbatim.
    pub detail: Option<String>,
    /// One-line summary for logs and CLI output.
    pub message: String,
}

impl ApiError {
    pub fn transport(err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "Request timed out".to_string()
        } else if err.is_connect() {
            "Could not connect to the server".to_string()
        } else {
            format!("Request failed: {err}")
        };
        Self {
            kind: ApiErrorKind::Transport,
            status: None,
            detail: None,
            message,
        }
    }

    /// Builds a status error, extracting `detail` from a JSON body when present.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = extract_detail(body);
        let message = match &detail {
            Some(detail) => format!("HTTP {status}: {detail}"),
            None => format!("HTTP {status}"),
        };
        Self {
            kind: ApiErrorKind::Status,
            status: Some(status),
            detail,
            message,
        }
    }

    pub fn parse(what: &str, err: &impl fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            status: None,
            detail: None,
            message: format!("Failed to parse {what}: {err}"),
        }
    }

    /// The request could not be built (client construction, URL, body).
    pub fn setup(err: &impl fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Transport,
            status: None,
            detail: None,
            message: format!("Failed to prepare request: {err}"),
        }
    }

    /// Attaches a message to show the user in place of the generic fallback.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }

    /// Message for the user: the server's detail verbatim, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail.clone().unwrap_or_else(|| fallback.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ApiError {}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Pulls a displayable message out of an error body.
///
/// `detail` is either a string (`HTTPException`) or a list of validation
/// items carrying `msg` (request validation errors).
fn extract_detail(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    match json.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_detail_is_kept_verbatim() {
        let err = ApiError::from_status(400, r#"{"detail":"Email already registered"}"#);
        assert_eq!(err.kind, ApiErrorKind::Status);
        assert_eq!(err.detail.as_deref(), Some("Email already registered"));
        assert_eq!(err.user_message("Registration failed"), "Email already registered");
        assert_eq!(err.to_string(), "HTTP 400: Email already registered");
    }

    #[test]
    fn test_validation_detail_list_is_flattened() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address","type":"value_error"},{"loc":["body","password"],"msg":"field required"}]}"#;
        let err = ApiError::from_status(422, body);
        assert_eq!(
            err.detail.as_deref(),
            Some("value is not a valid email address; field required")
        );
    }

    #[test]
    fn test_non_json_body_uses_fallback() {
        let err = ApiError::from_status(502, "<html>Bad Gateway</html>");
        assert_eq!(err.detail, None);
        assert_eq!(err.user_message("Analysis failed"), "Analysis failed");
        assert_eq!(err.to_string(), "HTTP 502");
    }

    #[test]
    fn test_unauthorized_detection() {
        assert!(ApiError::from_status(401, r#"{"detail":"Token has expired"}"#).is_unauthorized());
        assert!(!ApiError::from_status(403, "").is_unauthorized());
    }
}
