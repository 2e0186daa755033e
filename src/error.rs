//! Gateway error type and domain-error classification.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Structured error code the backend may attach to a stock-sufficiency
/// rejection (`{"code": "insufficient_stock", "message": "..."}`).
pub const INSUFFICIENT_STOCK_CODE: &str = "insufficient_stock";

/// Legacy marker: older backends only report stock shortages in the
/// human-readable message ("Stok barang tidak mencukupi").
const INSUFFICIENT_STOCK_MARKER: &str = "tidak mencukupi";

#[derive(Debug, Error)]
pub enum ApiError {
    /// A mutating call was attempted while no token is stored.
    #[error("Token tidak ditemukan")]
    MissingToken,

    /// The request never produced an HTTP response.
    #[error("{0}")]
    Transport(String),

    /// The backend answered with a non-2xx status.
    #[error("{message} (HTTP {status})")]
    Status {
        status: u16,
        message: String,
        code: Option<String>,
        body: String,
    },

    /// The body of a 2xx response could not be decoded.
    #[error("Invalid JSON from inventory API: {0}")]
    Decode(String),

    #[error("Credential store error: {0}")]
    Credential(String),
}

/// How a failed mutation should be surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InsufficientStock,
    Generic,
}

impl ApiError {
    /// Build a status error from the raw response body, pulling `message`
    /// (or `error`) and `code` out of a JSON body when there is one.
    pub fn from_response(status: StatusCode, body_text: String) -> Self {
        let trimmed = body_text.trim();
        let parsed = serde_json::from_str::<Value>(trimmed).ok();

        let message = parsed
            .as_ref()
            .and_then(|json| json.get("message").or_else(|| json.get("error")))
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|m| !m.trim().is_empty())
            .or_else(|| (!trimmed.is_empty()).then(|| trimmed.to_string()))
            .unwrap_or_else(|| status_error(status));

        let code = parsed
            .as_ref()
            .and_then(|json| json.get("code"))
            .and_then(Value::as_str)
            .map(str::to_string);

        ApiError::Status {
            status: status.as_u16(),
            message,
            code,
            body: body_text,
        }
    }

    /// Backend-provided message, or the display text for local failures.
    pub fn message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Classify a failure. A structured `code` wins; otherwise the message is
    /// matched case-insensitively against the legacy marker.
    pub fn failure_kind(&self) -> FailureKind {
        if let ApiError::Status {
            code: Some(code), ..
        } = self
        {
            if code.eq_ignore_ascii_case(INSUFFICIENT_STOCK_CODE) {
                return FailureKind::InsufficientStock;
            }
        }
        classify_message(&self.message())
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status: 401, .. })
    }
}

/// Message-only classification used when no structured code is available.
pub fn classify_message(message: &str) -> FailureKind {
    if message.to_lowercase().contains(INSUFFICIENT_STOCK_MARKER) {
        FailureKind::InsufficientStock
    } else {
        FailureKind::Generic
    }
}

/// Convert a `reqwest::Error` into a user-friendly message.
pub(crate) fn friendly_error(url: &str, err: &reqwest::Error) -> ApiError {
    let message = if err.is_connect() {
        format!("Cannot reach inventory API at {url}")
    } else if err.is_timeout() {
        format!("Connection to {url} timed out")
    } else if err.is_builder() {
        format!("Invalid inventory API URL: {url}")
    } else {
        format!("Network error communicating with {url}: {err}")
    };
    ApiError::Transport(message)
}

/// Convert an HTTP status code into a user-friendly message.
pub(crate) fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "Session is invalid or expired".to_string(),
        403 => "Not authorized for this resource".to_string(),
        404 => "Inventory API endpoint not found".to_string(),
        422 => "Request rejected by validation".to_string(),
        s if s >= 500 => format!("Inventory API server error (HTTP {s})"),
        s => format!("Unexpected response from inventory API (HTTP {s})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_marker_is_case_insensitive() {
        assert_eq!(
            classify_message("Stok barang TIDAK MENCUKUPI"),
            FailureKind::InsufficientStock
        );
        assert_eq!(
            classify_message("stok tidak mencukupi untuk barang Widget"),
            FailureKind::InsufficientStock
        );
        assert_eq!(classify_message("Server error"), FailureKind::Generic);
        assert_eq!(classify_message(""), FailureKind::Generic);
    }

    #[test]
    fn status_error_prefers_json_message() {
        let err = ApiError::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"Stok barang tidak mencukupi"}"#.to_string(),
        );
        assert_eq!(err.message(), "Stok barang tidak mencukupi");
        assert_eq!(err.failure_kind(), FailureKind::InsufficientStock);
    }

    #[test]
    fn structured_code_wins_over_message_text() {
        let err = ApiError::from_response(
            StatusCode::CONFLICT,
            r#"{"code":"insufficient_stock","message":"Quantity exceeds stock"}"#.to_string(),
        );
        assert_eq!(err.failure_kind(), FailureKind::InsufficientStock);

        let other = ApiError::from_response(
            StatusCode::CONFLICT,
            r#"{"code":"duplicate","message":"Order already exists"}"#.to_string(),
        );
        assert_eq!(other.failure_kind(), FailureKind::Generic);
    }

    #[test]
    fn plain_text_body_becomes_message() {
        let err = ApiError::from_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "  boom  ".to_string(),
        );
        assert_eq!(err.message(), "boom");
        assert_eq!(err.to_string(), "boom (HTTP 500)");
    }

    #[test]
    fn empty_body_falls_back_to_status_text() {
        let err = ApiError::from_response(StatusCode::UNAUTHORIZED, String::new());
        assert_eq!(err.message(), "Session is invalid or expired");
        assert!(err.is_unauthorized());
    }

    #[test]
    fn local_failures_are_generic() {
        assert_eq!(ApiError::MissingToken.failure_kind(), FailureKind::Generic);
        assert_eq!(ApiError::MissingToken.message(), "Token tidak ditemukan");
        assert_eq!(
            ApiError::Transport("Cannot reach inventory API".into()).failure_kind(),
            FailureKind::Generic
        );
    }
}
